//! The pool aggregate: a fixed token set with per-token weights and
//! balances, a running total of issued ownership shares, and a cached value
//! of the weighted geometric-mean invariant.

use crate::{
    error::{Error, Result},
    math,
};
use itertools::Itertools;
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// The maximum supply of pool shares. Share-pricing formulas use this fixed
/// constant as their supply denominator; it is distinct from the running
/// [`Pool::shares_issued`] total and the two are never unified.
pub const MAX_SUPPLY: f64 = 1e15;

/// The amount of shares issued to the first depositor.
pub const FIRST_ISSUE: f64 = 1e8;

/// A token symbol. Ordered so it can key the pool's balance and weight maps.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Token(pub String);

impl Token {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(symbol: &str) -> Self {
        Self(symbol.to_string())
    }
}

/// A weighted constant-value-function liquidity pool.
///
/// The token set is fixed at construction. Weights are all zero until the
/// first deposit assigns them from the deposit's relative proportions, and
/// are fixed for the pool's lifetime thereafter.
///
/// The pool is a bare state container with no internal synchronization;
/// concurrent callers must serialize access externally (one lock or actor
/// per pool instance).
#[derive(Clone, Debug)]
pub struct Pool {
    pub(crate) tokens: Vec<Token>,
    pub(crate) weights: BTreeMap<Token, f64>,
    pub(crate) balances: BTreeMap<Token, f64>,
    pub(crate) shares_issued: f64,
    pub(crate) invariant: f64,
}

/// A point-in-time snapshot of the pool's full state.
#[derive(Clone, Debug, Serialize)]
pub struct Status {
    pub tokens: Vec<Token>,
    pub weights: BTreeMap<Token, f64>,
    pub balances: BTreeMap<Token, f64>,
    pub max_supply: f64,
    pub shares_issued: f64,
    pub invariant: f64,
}

impl Pool {
    /// Creates an uninitialized pool over the given token set. Returns `Err`
    /// for fewer than two tokens or duplicate symbols.
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Result<Self> {
        let tokens = tokens.into_iter().collect::<Vec<_>>();
        if tokens.len() < 2 {
            return Err(Error::TooFewTokens);
        }
        if let Some(duplicate) = tokens.iter().duplicates().next() {
            return Err(Error::InvalidToken(duplicate.clone()));
        }

        let zeroed = tokens
            .iter()
            .map(|token| (token.clone(), 0.))
            .collect::<BTreeMap<_, _>>();
        Ok(Self {
            weights: zeroed.clone(),
            balances: zeroed,
            tokens,
            shares_issued: 0.,
            invariant: 0.,
        })
    }

    /// Returns `true` once the first deposit has assigned weights.
    pub fn is_initialized(&self) -> bool {
        self.weights.values().any(|weight| *weight != 0.)
    }

    /// The pool's tokens in construction order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The first token in construction order. All-asset deposits price their
    /// shares off this token; the choice is arbitrary but consistent since
    /// the deposit ratio is uniform across tokens.
    pub(crate) fn reference_token(&self) -> &Token {
        &self.tokens[0]
    }

    /// The weight of `token`, or `Err` if it is not a pool member.
    pub fn weight(&self, token: &Token) -> Result<f64> {
        self.weights
            .get(token)
            .copied()
            .ok_or_else(|| Error::InvalidToken(token.clone()))
    }

    /// The balance of `token`, or `Err` if it is not a pool member.
    pub fn balance(&self, token: &Token) -> Result<f64> {
        self.balances
            .get(token)
            .copied()
            .ok_or_else(|| Error::InvalidToken(token.clone()))
    }

    /// The running total of issued pool shares.
    pub fn shares_issued(&self) -> f64 {
        self.shares_issued
    }

    /// The cached invariant value; zero before initialization.
    pub fn invariant(&self) -> f64 {
        self.invariant
    }

    /// Recomputes the invariant from the current balances and caches it.
    /// Every balance-changing operation except swap ends with this; swaps
    /// hold the invariant constant by construction.
    pub(crate) fn refresh_invariant(&mut self) {
        self.invariant = math::invariant(&self.balances, &self.weights);
    }

    /// The spot price of `asset` denominated in `currency`: the ratio of the
    /// two balances normalized by their weights.
    pub fn spot_price(&self, asset: &Token, currency: &Token) -> Result<f64> {
        if !self.is_initialized() {
            return Err(Error::UninitializedPool);
        }
        Ok(math::spot_price(
            self.balance(asset)?,
            self.weight(asset)?,
            self.balance(currency)?,
            self.weight(currency)?,
        ))
    }

    /// Snapshots the pool's full state.
    pub fn status(&self) -> Status {
        Status {
            tokens: self.tokens.clone(),
            weights: self.weights.clone(),
            balances: self.balances.clone(),
            max_supply: MAX_SUPPLY,
            shares_issued: self.shares_issued,
            invariant: self.invariant,
        }
    }
}

//! Withdrawal operations: all-asset, single-asset and arbitrary-basket.
//!
//! Each operation computes its full per-token result from the pre-call
//! state and validates it before committing any balance or share mutation,
//! so a failed call leaves the pool untouched.

use crate::{
    error::{Error, Result},
    pool::{MAX_SUPPLY, Pool, Token},
};
use std::collections::BTreeMap;

impl Pool {
    /// Redeems `redeem` shares for a proportional amount of every pool
    /// token:
    ///
    /// ```text
    /// amount_out[t] = (redeem / MAX_SUPPLY) * balances[t]
    /// ```
    pub fn withdraw_all(&mut self, redeem: f64) -> Result<BTreeMap<Token, f64>> {
        if !self.is_initialized() {
            return Err(Error::UninitializedPool);
        }
        Self::check_redeemable(redeem)?;

        let fraction = redeem / MAX_SUPPLY;
        let amount_out = self
            .balances
            .iter()
            .map(|(token, balance)| (token.clone(), fraction * balance))
            .collect::<BTreeMap<_, _>>();

        self.commit_withdrawal(&amount_out, redeem);
        tracing::debug!(redeem, "all-asset withdrawal");
        Ok(amount_out)
    }

    /// Redeems `redeem` shares for a single token:
    ///
    /// ```text
    /// amount_out = balance * (1 - (1 - redeem / MAX_SUPPLY) ^ (1 / weight))
    /// ```
    pub fn withdraw_one(&mut self, token: &Token, redeem: f64) -> Result<f64> {
        if !self.is_initialized() {
            return Err(Error::UninitializedPool);
        }
        Self::check_redeemable(redeem)?;

        let balance = self.balance(token)?;
        let weight = self.weight(token)?;
        let amount_out = balance * (1. - (1. - redeem / MAX_SUPPLY).powf(1. / weight));

        self.commit_withdrawal(&BTreeMap::from([(token.clone(), amount_out)]), redeem);
        tracing::debug!(%token, redeem, amount_out, "single-asset withdrawal");
        Ok(amount_out)
    }

    /// Redeems `redeem` shares for a basket of tokens in the proportions
    /// given by `ratios`, returning a per-token output map over the whole
    /// token set.
    ///
    /// The redemption is split across tokens proportionally to `ratios` and
    /// each slice goes through the single-asset formula:
    ///
    /// ```text
    /// redeem_t     = redeem * ratios[t] / Σ ratios
    /// amount_out[t] = balances[t] * (1 - (1 - redeem_t / MAX_SUPPLY) ^ (1 / weights[t]))
    /// ```
    ///
    /// `shares_issued` is decremented once by the full `redeem`. A zero
    /// `redeem` or all-zero `ratios` is a no-op returning a zero-filled map;
    /// the composite equalize operation relies on this for its share-only
    /// lane.
    pub fn withdraw_any(
        &mut self,
        redeem: f64,
        ratios: &BTreeMap<Token, f64>,
    ) -> Result<BTreeMap<Token, f64>> {
        if !self.is_initialized() {
            return Err(Error::UninitializedPool);
        }
        if redeem != 0. {
            Self::check_redeemable(redeem)?;
        }
        for (token, ratio) in ratios {
            if !self.balances.contains_key(token) {
                return Err(Error::InvalidToken(token.clone()));
            }
            if *ratio < 0. {
                return Err(Error::NonPositiveAmount);
            }
        }

        let mut amount_out = self
            .tokens
            .iter()
            .map(|token| (token.clone(), 0.))
            .collect::<BTreeMap<_, _>>();
        let total_ratio = ratios.values().sum::<f64>();
        if redeem == 0. || total_ratio == 0. {
            return Ok(amount_out);
        }

        for (token, ratio) in ratios {
            let redeem_t = redeem * ratio / total_ratio;
            let amount = self.balances[token]
                * (1. - (1. - redeem_t / MAX_SUPPLY).powf(1. / self.weights[token]));
            amount_out.insert(token.clone(), amount);
        }

        self.commit_withdrawal(&amount_out, redeem);
        tracing::debug!(redeem, "basket withdrawal");
        Ok(amount_out)
    }

    /// A redemption must be positive and must leave the fixed share supply
    /// positive: at `MAX_SUPPLY` and beyond the single-asset formula's
    /// remaining-supply term goes non-positive and its fractional power is
    /// no longer defined.
    fn check_redeemable(redeem: f64) -> Result<()> {
        if redeem <= 0. || redeem >= MAX_SUPPLY {
            return Err(Error::NonPositiveAmount);
        }
        Ok(())
    }

    /// Applies a fully computed withdrawal: per-token balance decrements and
    /// a single share decrement, followed by the invariant refresh.
    fn commit_withdrawal(&mut self, amount_out: &BTreeMap<Token, f64>, redeem: f64) {
        for (token, amount) in amount_out {
            if let Some(balance) = self.balances.get_mut(token) {
                *balance -= amount;
            }
        }
        self.shares_issued -= redeem;
        self.refresh_invariant();
    }
}

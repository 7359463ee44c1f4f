//! Deposit operations: all-asset, single-asset and arbitrary-basket.
//!
//! The outstanding supply of pool shares tracks the value function: a
//! deposit that grows the value function by some fraction mints that same
//! fraction of new shares for the depositor.

use crate::{
    error::{Error, Result},
    math,
    pool::{FIRST_ISSUE, MAX_SUPPLY, Pool, Token},
};
use std::collections::BTreeMap;

/// Relative tolerance for matching an all-asset deposit's proportions
/// against the pool's existing balance proportions.
const RATIO_TOLERANCE: f64 = 1e-6;

impl Pool {
    /// Deposits an amount of every pool token, following the distribution of
    /// the existing reserves, and returns the shares issued.
    ///
    /// The first call on a fresh pool is the initialization step: it fixes
    /// the weights from the deposit's relative proportions, seeds the
    /// balances, and issues [`FIRST_ISSUE`] shares. Subsequent calls require
    /// the deposit's proportions to match the existing balance proportions
    /// and price their shares off the reference token:
    ///
    /// ```text
    /// shares = amount_in[t0] * MAX_SUPPLY / balances[t0]
    /// ```
    ///
    /// with `balances[t0]` taken after the deposit is applied.
    pub fn deposit_all(&mut self, amount_in: &BTreeMap<Token, f64>) -> Result<f64> {
        if amount_in.len() != self.tokens.len()
            || self.tokens.iter().any(|token| !amount_in.contains_key(token))
        {
            return Err(Error::TokenSetMismatch);
        }
        if amount_in.values().any(|amount| *amount <= 0.) {
            return Err(Error::NonPositiveAmount);
        }

        let shares = if self.is_initialized() {
            if !math::same_proportions(&self.balances, amount_in, RATIO_TOLERANCE) {
                return Err(Error::RatioMismatch);
            }
            for (token, amount) in amount_in {
                if let Some(balance) = self.balances.get_mut(token) {
                    *balance += amount;
                }
            }
            let reference = self.reference_token().clone();
            amount_in[&reference] * MAX_SUPPLY / self.balances[&reference]
        } else {
            self.initialize(amount_in);
            FIRST_ISSUE
        };

        self.shares_issued += shares;
        self.refresh_invariant();
        tracing::debug!(shares, invariant = self.invariant, "all-asset deposit");
        Ok(shares)
    }

    /// Deposits a single token and returns the shares issued. Exactly one
    /// entry of `amount_in` must be non-zero, and positive.
    ///
    /// ```text
    /// shares = MAX_SUPPLY * (amount / balance) ^ weight
    /// ```
    ///
    /// with `balance` taken before the deposit is applied. This pre-mutation
    /// timing differs from [`Pool::deposit_any`], which prices each token
    /// off its post-mutation balance; the two are deliberately separate
    /// code paths.
    pub fn deposit_one(&mut self, amount_in: &BTreeMap<Token, f64>) -> Result<f64> {
        if !self.is_initialized() {
            return Err(Error::UninitializedPool);
        }
        let mut non_zero = amount_in.iter().filter(|(_, amount)| **amount != 0.);
        let (token, amount) = match (non_zero.next(), non_zero.next()) {
            (Some(entry), None) => entry,
            _ => return Err(Error::ExactlyOneNonZero),
        };
        if *amount < 0. {
            return Err(Error::NonPositiveAmount);
        }

        let shares = MAX_SUPPLY * (amount / self.balance(token)?).powf(self.weight(token)?);
        if let Some(balance) = self.balances.get_mut(token) {
            *balance += amount;
        }
        self.shares_issued += shares;
        self.refresh_invariant();
        tracing::debug!(%token, amount, shares, "single-asset deposit");
        Ok(shares)
    }

    /// Deposits an arbitrary basket of tokens and returns the summed shares
    /// issued. Entries may cover any subset of the pool's tokens; zero
    /// amounts are skipped.
    ///
    /// All balance additions are applied first; each token's share
    /// contribution is then priced off its post-deposit balance:
    ///
    /// ```text
    /// shares = Σ MAX_SUPPLY * (amount_t / balance_t) ^ weight_t
    /// ```
    pub fn deposit_any(&mut self, amount_in: &BTreeMap<Token, f64>) -> Result<f64> {
        if !self.is_initialized() {
            return Err(Error::UninitializedPool);
        }
        for (token, amount) in amount_in {
            if !self.balances.contains_key(token) {
                return Err(Error::InvalidToken(token.clone()));
            }
            if *amount < 0. {
                return Err(Error::NonPositiveAmount);
            }
        }

        for (token, amount) in amount_in {
            if let Some(balance) = self.balances.get_mut(token) {
                *balance += amount;
            }
        }
        let shares = amount_in
            .iter()
            .map(|(token, amount)| {
                MAX_SUPPLY * (amount / self.balances[token]).powf(self.weights[token])
            })
            .sum::<f64>();

        self.shares_issued += shares;
        self.refresh_invariant();
        tracing::debug!(shares, invariant = self.invariant, "basket deposit");
        Ok(shares)
    }

    /// The first deposit: fixes the weights from the deposit's relative
    /// proportions and seeds the balances.
    fn initialize(&mut self, amount_in: &BTreeMap<Token, f64>) {
        let total = amount_in.values().sum::<f64>();
        self.weights = amount_in
            .iter()
            .map(|(token, amount)| (token.clone(), amount / total))
            .collect();
        self.balances = amount_in.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use maplit::btreemap;

    fn xyz_pool() -> Pool {
        Pool::new(["X", "Y", "Z"].map(Token::from)).unwrap()
    }

    /// Scenario state shared by most tests: X=200, Y=300, Z=150.
    fn seeded_pool() -> Pool {
        let mut pool = xyz_pool();
        pool.deposit_all(&btreemap! {
            Token::from("X") => 200.,
            Token::from("Y") => 300.,
            Token::from("Z") => 150.,
        })
        .unwrap();
        pool
    }

    #[test]
    fn first_deposit_initializes_weights_and_shares() {
        let pool = seeded_pool();

        assert!(pool.is_initialized());
        assert_approx_eq!(pool.weight(&Token::from("X")).unwrap(), 0.3077, 1e-4);
        assert_approx_eq!(pool.weight(&Token::from("Y")).unwrap(), 0.4615, 1e-4);
        assert_approx_eq!(pool.weight(&Token::from("Z")).unwrap(), 0.2308, 1e-4);
        assert_approx_eq!(pool.weights.values().sum::<f64>(), 1., 1e-9);
        assert_eq!(pool.shares_issued(), FIRST_ISSUE);
        assert_approx_eq!(pool.invariant(), 225.67, 0.5);
    }

    #[test]
    fn first_deposit_requires_the_full_token_set() {
        let mut pool = xyz_pool();
        assert_eq!(
            pool.deposit_all(&btreemap! {
                Token::from("X") => 200.,
                Token::from("Y") => 300.,
            }),
            Err(Error::TokenSetMismatch),
        );
        assert_eq!(
            pool.deposit_all(&btreemap! {
                Token::from("X") => 200.,
                Token::from("Y") => 300.,
                Token::from("Q") => 150.,
            }),
            Err(Error::TokenSetMismatch),
        );
        assert_eq!(
            pool.deposit_all(&btreemap! {
                Token::from("X") => 200.,
                Token::from("Y") => 300.,
                Token::from("Z") => 0.,
            }),
            Err(Error::NonPositiveAmount),
        );
        assert!(!pool.is_initialized());
    }

    #[test]
    fn proportional_deposit_issues_supply_fraction() {
        let mut pool = seeded_pool();
        // A 10% top-up of every reserve.
        let shares = pool
            .deposit_all(&btreemap! {
                Token::from("X") => 20.,
                Token::from("Y") => 30.,
                Token::from("Z") => 15.,
            })
            .unwrap();

        // shares = 20 * MAX_SUPPLY / 220
        assert_approx_eq!(shares, MAX_SUPPLY / 11., 1.);
        assert_eq!(pool.balance(&Token::from("X")).unwrap(), 220.);
        assert_eq!(pool.shares_issued(), FIRST_ISSUE + shares);
    }

    #[test]
    fn misproportioned_deposit_is_rejected() {
        let mut pool = seeded_pool();
        let result = pool.deposit_all(&btreemap! {
            Token::from("X") => 20.,
            Token::from("Y") => 30.,
            Token::from("Z") => 16.,
        });
        assert_eq!(result, Err(Error::RatioMismatch));
        assert_eq!(pool.balance(&Token::from("Z")).unwrap(), 150.);
    }

    #[test]
    fn single_asset_deposit_prices_off_the_pre_deposit_balance() {
        let mut pool = seeded_pool();
        let shares = pool
            .deposit_one(&btreemap! {
                Token::from("X") => 100.,
                Token::from("Y") => 0.,
                Token::from("Z") => 0.,
            })
            .unwrap();

        // MAX_SUPPLY * (100 / 200) ^ (200 / 650)
        assert_approx_eq!(shares, 8.0793e14, 4e12);
        assert_eq!(pool.balance(&Token::from("X")).unwrap(), 300.);
        assert_eq!(pool.shares_issued(), FIRST_ISSUE + shares);
    }

    #[test]
    fn single_asset_deposit_requires_exactly_one_entry() {
        let mut pool = seeded_pool();
        assert_eq!(
            pool.deposit_one(&btreemap! {
                Token::from("X") => 100.,
                Token::from("Y") => 1.,
            }),
            Err(Error::ExactlyOneNonZero),
        );
        assert_eq!(
            pool.deposit_one(&btreemap! {
                Token::from("X") => 0.,
                Token::from("Y") => 0.,
            }),
            Err(Error::ExactlyOneNonZero),
        );
        assert_eq!(
            pool.deposit_one(&btreemap! { Token::from("X") => -1. }),
            Err(Error::NonPositiveAmount),
        );
    }

    #[test]
    fn basket_deposit_prices_off_the_post_deposit_balance() {
        let mut pool = seeded_pool();
        let amount = btreemap! { Token::from("X") => 100. };
        let shares = pool.deposit_any(&amount).unwrap();

        // MAX_SUPPLY * (100 / 300) ^ (200 / 650): the denominator already
        // includes the deposit, unlike `deposit_one`.
        let expected = MAX_SUPPLY * (100f64 / 300.).powf(200. / 650.);
        assert_approx_eq!(shares, expected, expected * 1e-12);

        let shares_one = seeded_pool().deposit_one(&amount).unwrap();
        assert!(shares < shares_one);
    }

    #[test]
    fn basket_deposit_sums_per_token_contributions() {
        let mut pool = seeded_pool();
        let shares = pool
            .deposit_any(&btreemap! {
                Token::from("X") => 200.,
                Token::from("Y") => 300.,
                Token::from("Z") => 0.,
            })
            .unwrap();

        let expected = MAX_SUPPLY * (200f64 / 400.).powf(200. / 650.)
            + MAX_SUPPLY * (300f64 / 600.).powf(300. / 650.);
        assert_approx_eq!(shares, expected, expected * 1e-12);
        assert_eq!(pool.balance(&Token::from("Z")).unwrap(), 150.);
    }

    #[test]
    fn basket_deposit_rejects_unknown_and_negative_tokens() {
        let mut pool = seeded_pool();
        assert_eq!(
            pool.deposit_any(&btreemap! { Token::from("Q") => 1. }),
            Err(Error::InvalidToken(Token::from("Q"))),
        );
        assert_eq!(
            pool.deposit_any(&btreemap! { Token::from("X") => -1. }),
            Err(Error::NonPositiveAmount),
        );
    }

    #[test]
    fn non_initializing_deposits_require_an_initialized_pool() {
        let mut pool = xyz_pool();
        let amount = btreemap! { Token::from("X") => 1. };
        assert_eq!(pool.deposit_one(&amount), Err(Error::UninitializedPool));
        assert_eq!(pool.deposit_any(&amount), Err(Error::UninitializedPool));
    }
}

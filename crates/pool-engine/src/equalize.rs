//! The composite entry point: one call expressing "deposit these tokens
//! and/or these shares, and receive back this basket ratio and/or these
//! shares".
//!
//! This is the operation recommended to external callers; the individual
//! deposit, withdrawal and swap operations remain independently callable
//! for callers that do not need the composite behavior.

use crate::{
    error::{Error, Result},
    pool::{Pool, Token},
};
use std::collections::BTreeMap;

/// What the caller puts into the pool: a basket of token amounts and/or an
/// amount of previously issued shares.
#[derive(Clone, Debug, Default)]
pub struct DepositIntent {
    pub amounts: BTreeMap<Token, f64>,
    pub shares: f64,
}

/// How the caller wants value returned: a per-token basket ratio and/or a
/// relative share-return weight. Only the proportions matter, not the
/// magnitudes.
#[derive(Clone, Debug, Default)]
pub struct WithdrawIntent {
    pub ratios: BTreeMap<Token, f64>,
    pub share_ratio: f64,
}

impl Pool {
    /// Atomically applies a mixed deposit-and-withdrawal request and returns
    /// the net `(tokens_out, shares_out)` delivered to the caller.
    ///
    /// On an uninitialized pool the call must be a pure all-asset deposit
    /// (no output ratios, no share redemption, some of every token) and
    /// performs the initialization.
    ///
    /// On an active pool the deposited basket and shares are combined into
    /// a single owed total, which is then split between a token-return lane
    /// and a share-return lane in proportion to
    /// `Σ ratios : share_ratio`. The share lane is the exact complement of
    /// the token lane, so the two always account for the full owed total;
    /// when both ratios are zero everything is returned as shares.
    pub fn equalize(
        &mut self,
        deposit: &DepositIntent,
        withdraw: &WithdrawIntent,
    ) -> Result<(BTreeMap<Token, f64>, f64)> {
        let total_ratio = withdraw.ratios.values().sum::<f64>();

        if !self.is_initialized() {
            if total_ratio != 0. || withdraw.share_ratio != 0. {
                return Err(Error::RatioOnInitialDeposit);
            }
            if deposit.shares != 0. {
                return Err(Error::ShareRedemptionOnFirstDeposit);
            }
            if self
                .tokens
                .iter()
                .any(|token| deposit.amounts.get(token).copied().unwrap_or_default() == 0.)
            {
                return Err(Error::IncompleteFirstDeposit);
            }

            let shares_out = self.deposit_all(&deposit.amounts)?;
            let tokens_out = self
                .tokens
                .iter()
                .map(|token| (token.clone(), 0.))
                .collect();
            return Ok((tokens_out, shares_out));
        }

        // Validate both intents before the deposit mutates anything, so a
        // rejected request leaves the pool untouched. A negative share
        // ratio would push the token lane's fraction past 1 and a negative
        // share amount would drive the owed total negative.
        for (token, ratio) in &withdraw.ratios {
            self.balance(token)?;
            if *ratio < 0. {
                return Err(Error::NonPositiveAmount);
            }
        }
        if withdraw.share_ratio < 0. || deposit.shares < 0. {
            return Err(Error::NonPositiveAmount);
        }

        let shares_owed = deposit.shares + self.deposit_any(&deposit.amounts)?;
        let denominator = total_ratio + withdraw.share_ratio;
        let token_fraction = if denominator > 0. {
            total_ratio / denominator
        } else {
            0.
        };

        let tokens_out = self.withdraw_any(shares_owed * token_fraction, &withdraw.ratios)?;
        let shares_out = shares_owed * (1. - token_fraction);
        tracing::debug!(shares_owed, token_fraction, "equalize");
        Ok((tokens_out, shares_out))
    }
}

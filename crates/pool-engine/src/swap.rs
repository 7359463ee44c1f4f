//! Pairwise token exchange along the invariant surface.

use crate::{
    error::{Error, Result},
    pool::{Pool, Token},
};

impl Pool {
    /// Swaps `amount_in` of `token_in` for the amount of `token_out` that
    /// leaves the value function unchanged:
    ///
    /// ```text
    /// amount_out = b_out * (1 - (b_in / (b_in + amount_in)) ^ (w_in / w_out))
    /// ```
    ///
    /// The formula is derived from holding the invariant constant, so the
    /// cached invariant is not recomputed here; conservation is a testable
    /// property, not a runtime assertion.
    pub fn swap(&mut self, token_in: &Token, token_out: &Token, amount_in: f64) -> Result<f64> {
        if !self.is_initialized() {
            return Err(Error::UninitializedPool);
        }
        let balance_in = self.balance(token_in)?;
        let balance_out = self.balance(token_out)?;
        if token_in == token_out {
            return Err(Error::SameTokenSwap);
        }
        if amount_in <= 0. {
            return Err(Error::NonPositiveAmount);
        }

        let exponent = self.weight(token_in)? / self.weight(token_out)?;
        let amount_out =
            balance_out * (1. - (balance_in / (balance_in + amount_in)).powf(exponent));

        if let Some(balance) = self.balances.get_mut(token_in) {
            *balance += amount_in;
        }
        if let Some(balance) = self.balances.get_mut(token_out) {
            *balance -= amount_out;
        }
        tracing::debug!(%token_in, %token_out, amount_in, amount_out, "swap");
        Ok(amount_out)
    }
}

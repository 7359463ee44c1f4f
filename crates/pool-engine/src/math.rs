//! Pure value-function math.
//!
//! The pool's exchange behavior is a surface obtained by constraining a
//! value function of its weights and balances to a constant: the weighted
//! geometric mean of the balances. The surface implies a spot price at each
//! point such that the share of value held in each token stays constant no
//! matter what exchanges are carried out.

use crate::pool::Token;
use std::collections::BTreeMap;

/// The weighted geometric mean of the balances:
///
/// ```text
/// k = Π balances[t] ^ weights[t]
/// ```
///
/// Returns 0 for an uninitialized pool (all weights zero). The value stays
/// constant across swaps, grows on deposits and shrinks on withdrawals.
pub fn invariant(balances: &BTreeMap<Token, f64>, weights: &BTreeMap<Token, f64>) -> f64 {
    if weights.values().all(|weight| *weight == 0.) {
        return 0.;
    }
    balances
        .iter()
        .filter_map(|(token, balance)| weights.get(token).map(|weight| balance.powf(*weight)))
        .product()
}

/// The instantaneous price of the asset in units of the currency, implied by
/// the ratio of the two balances normalized by their weights:
///
/// ```text
/// sp = (b_asset / w_asset) / (b_currency / w_currency)
/// ```
pub fn spot_price(
    asset_balance: f64,
    asset_weight: f64,
    currency_balance: f64,
    currency_weight: f64,
) -> f64 {
    (asset_balance / asset_weight) / (currency_balance / currency_weight)
}

/// Pool shares issued for a single-asset deposit of `amount_in` against a
/// share supply of `supply`:
///
/// ```text
/// pool_out = supply * ((1 + amount_in / balance) ^ weight - 1)
/// ```
///
/// Exact inverse of [`single_out_given_pool_in`] for the same `supply`, so
/// a fee-less deposit followed by a withdrawal of the issued shares returns
/// the deposited amount. The engine's own deposit paths price against the
/// fixed maximum supply instead; this pair lets callers pick the
/// supply-sensitive semantics.
pub fn pool_out_given_single_in(balance: f64, weight: f64, supply: f64, amount_in: f64) -> f64 {
    supply * ((1. + amount_in / balance).powf(weight) - 1.)
}

/// Token amount withdrawn for redeeming `pool_in` shares of a single asset
/// against a share supply of `supply`:
///
/// ```text
/// amount_out = balance * (1 - (1 - pool_in / supply) ^ (1 / weight))
/// ```
pub fn single_out_given_pool_in(balance: f64, weight: f64, supply: f64, pool_in: f64) -> f64 {
    balance * (1. - (1. - pool_in / supply).powf(1. / weight))
}

/// Whether two sets of per-token amounts describe the same proportions
/// within `tolerance` (relative, per token).
pub fn same_proportions(
    lhs: &BTreeMap<Token, f64>,
    rhs: &BTreeMap<Token, f64>,
    tolerance: f64,
) -> bool {
    let lhs_total = lhs.values().sum::<f64>();
    let rhs_total = rhs.values().sum::<f64>();
    lhs.iter().all(|(token, lhs_amount)| {
        let lhs_ratio = lhs_amount / lhs_total;
        let rhs_ratio = rhs.get(token).copied().unwrap_or_default() / rhs_total;
        (lhs_ratio - rhs_ratio).abs() <= tolerance * lhs_ratio.abs().max(rhs_ratio.abs())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use maplit::btreemap;

    #[test]
    fn invariant_of_uninitialized_pool_is_zero() {
        let zero = btreemap! {
            Token::from("X") => 0.,
            Token::from("Y") => 0.,
        };
        assert_eq!(invariant(&zero, &zero), 0.);
    }

    #[test]
    fn invariant_is_weighted_geometric_mean() {
        let balances = btreemap! {
            Token::from("X") => 200.,
            Token::from("Y") => 300.,
            Token::from("Z") => 150.,
        };
        let weights = btreemap! {
            Token::from("X") => 200. / 650.,
            Token::from("Y") => 300. / 650.,
            Token::from("Z") => 150. / 650.,
        };
        assert_approx_eq!(invariant(&balances, &weights), 225.67, 0.5);
    }

    #[test]
    fn spot_price_of_balanced_equal_weight_pair_is_one() {
        assert_approx_eq!(spot_price(100., 0.5, 100., 0.5), 1.);
        // Twice the balance at equal weight: half the price per unit.
        assert_approx_eq!(spot_price(200., 0.5, 100., 0.5), 2.);
    }

    #[test]
    fn single_asset_pair_round_trips_against_a_running_supply() {
        let (balance, weight, supply) = (200., 4. / 13., 1e8);
        let amount_in = 100.;

        let pool_out = pool_out_given_single_in(balance, weight, supply, amount_in);
        let amount_out = single_out_given_pool_in(
            balance + amount_in,
            weight,
            supply + pool_out,
            pool_out,
        );

        assert_approx_eq!(amount_out, amount_in, amount_in * 1e-6);
    }

    #[test]
    fn same_proportions_tolerates_scaling() {
        let balances = btreemap! {
            Token::from("X") => 200.,
            Token::from("Y") => 300.,
        };
        let deposit = btreemap! {
            Token::from("X") => 20.,
            Token::from("Y") => 30.,
        };
        let skewed = btreemap! {
            Token::from("X") => 20.,
            Token::from("Y") => 31.,
        };
        assert!(same_proportions(&balances, &deposit, 1e-6));
        assert!(!same_proportions(&balances, &skewed, 1e-6));
    }
}

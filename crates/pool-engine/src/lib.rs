//! A weighted constant-value-function liquidity pool: a multi-asset
//! reserve that issues fungible ownership shares, prices trades between any
//! two of its assets from a single invariant surface, and supports
//! deposits, withdrawals and an atomic composite rebalancing operation
//! ([`Pool::equalize`]).
//!
//! This is a pricing and accounting engine, not a ledger or a service: no
//! persistence, no authentication, no transport, no fees. The [`Pool`] is a
//! bare in-memory state container; callers exposing it to multiple threads
//! must serialize access themselves.

pub mod equalize;
pub mod error;
pub mod math;
pub mod pool;

mod deposit;
mod swap;
mod withdraw;

pub use self::{
    equalize::{DepositIntent, WithdrawIntent},
    error::{Error, Result},
    pool::{FIRST_ISSUE, MAX_SUPPLY, Pool, Status, Token},
};

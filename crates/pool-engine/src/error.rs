use crate::pool::Token;

/// Failures surfaced by pool operations.
///
/// All validation is synchronous; no error is retried or recovered
/// internally.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("a pool must contain at least two tokens")]
    TooFewTokens,

    #[error("deposit keys must exactly match the pool's token set")]
    TokenSetMismatch,

    #[error("a required amount is zero or negative")]
    NonPositiveAmount,

    #[error("operation requires an initialized pool")]
    UninitializedPool,

    #[error("token {0} is not a member of the pool")]
    InvalidToken(Token),

    #[error("cannot swap a token for itself")]
    SameTokenSwap,

    #[error("deposit ratio does not match the existing balance ratio")]
    RatioMismatch,

    #[error("exactly one entry must be non-zero")]
    ExactlyOneNonZero,

    #[error("cannot specify an output ratio on the initial deposit")]
    RatioOnInitialDeposit,

    #[error("cannot redeem shares on the first deposit")]
    ShareRedemptionOnFirstDeposit,

    #[error("the first deposit must contain some of each token")]
    IncompleteFirstDeposit,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

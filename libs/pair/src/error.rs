//! Unified error type for pair arithmetic and address derivation.
//!
//! Every variant signals a caller invariant violation; none of them are
//! transient or retryable. Network-side failures never reach this enum:
//! the address resolver degrades to a provisional address instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PairError>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PairError {
    /// Tokens from different chains were compared or combined.
    #[error("chain mismatch: {0} vs {1}")]
    ChainMismatch(u64, u64),

    /// A token was ordered against itself.
    #[error("identical token addresses cannot be ordered")]
    IdenticalAddresses,

    /// The token argument is not one of the pair's two tokens.
    #[error("token is not part of this pair")]
    TokenNotInPair,

    /// An amount is denominated in a different token than required.
    #[error("token mismatch between amounts")]
    TokenMismatch,

    /// A reserve is zero, or a requested output meets or exceeds its reserve.
    #[error("insufficient reserves")]
    InsufficientReserves,

    /// A computed amount came out non-positive.
    #[error("insufficient input amount")]
    InsufficientInputAmount,

    /// `k_last` is required when the protocol fee is enabled.
    #[error("k_last is required when fee_on is set")]
    MissingKLast,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,
}

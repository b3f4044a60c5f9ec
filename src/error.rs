use thiserror::Error;

/// Boundary errors for [`crate::ring::MirrorRing`].
///
/// These are the only recoverable errors in the crate: everything past
/// construction (`set_coefficients`, `process`) assumes validated input and
/// asserts instead, per the contract in `spec.md` §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    #[error("invalid argument: size must be non-zero")]
    InvalidArgument,
    #[error("put exceeds available capacity")]
    ExceedCapacity,
    #[error("peek/get exceeds buffered data")]
    ExceedRemain,
    #[error("peek/get exceeds the configured maximum required size")]
    ExceedRequired,
}

/// Construction-time configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid engine configuration: max_coefficients and max_input_samples must both be >= 1")]
    InvalidArgument,
}

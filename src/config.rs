use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Immutable configuration shared by every [`crate::engine::ConvolveEngine`].
///
/// Validated once at construction; downstream engines take an already-valid
/// `EngineConfig` and cannot fail on configuration grounds afterwards
/// (the C API's `work_size`/`Create` pair collapses into Rust's
/// validate-once-at-the-boundary idiom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    max_coefficients: usize,
    max_input_samples: usize,
}

impl EngineConfig {
    pub fn new(max_coefficients: usize, max_input_samples: usize) -> Result<Self, ConfigError> {
        if max_coefficients == 0 || max_input_samples == 0 {
            return Err(ConfigError::InvalidArgument);
        }
        Ok(Self {
            max_coefficients,
            max_input_samples,
        })
    }

    #[must_use]
    pub const fn max_coefficients(&self) -> usize {
        self.max_coefficients
    }

    #[must_use]
    pub const fn max_input_samples(&self) -> usize {
        self.max_input_samples
    }
}

/// Rounds `val` up to the next power of two (`val` itself if already one).
#[must_use]
pub const fn next_pow2(val: usize) -> usize {
    if val <= 1 {
        return 1;
    }
    let mut v = val - 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v |= v >> 32;
    v + 1
}

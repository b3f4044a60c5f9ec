// Enable pedantic lints globally, then allow the noisy ones we're not fixing.
#![warn(clippy::pedantic, clippy::nursery)]
// DSP index-heavy code performs intentional numeric casts.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap
)]
// Not a public API surface of its own crate family — no need for doc sections.
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::doc_markdown,
    clippy::must_use_candidate
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod fft;
pub mod hybrid;
pub mod karatsuba;
pub mod partitioned;
pub mod ring;

pub use config::EngineConfig;
pub use engine::{ConvolveEngine, Engine, EngineKind};
pub use error::{ConfigError, RingError};

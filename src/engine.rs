//! The common surface shared by all three convolution strategies, and an
//! enum that picks one of them at construction time.

use crate::config::EngineConfig;
use crate::hybrid::HybridEngine;
use crate::karatsuba::KaratsubaEngine;
use crate::partitioned::FftEngine;

/// Operations every streaming convolution engine supports.
pub trait ConvolveEngine {
    /// Clears all internal state (history, carry, ring contents) without
    /// forgetting the current coefficients.
    fn reset(&mut self);

    /// Replaces the filter coefficients. `coefficients.len()` must be
    /// `<= max_coefficients` from the configuration the engine was built
    /// with.
    fn set_coefficients(&mut self, coefficients: &[f32]);

    /// Convolves `input` against the current coefficients, writing
    /// `input.len()` samples into `output`. `input.len()` must be
    /// `<= max_input_samples` and `output.len() == input.len()`.
    fn process(&mut self, input: &[f32], output: &mut [f32]);

    /// Samples of output delay this engine introduces relative to a
    /// hypothetical zero-latency reference.
    fn latency(&self) -> usize;
}

impl ConvolveEngine for KaratsubaEngine {
    fn reset(&mut self) {
        KaratsubaEngine::reset(self);
    }

    fn set_coefficients(&mut self, coefficients: &[f32]) {
        KaratsubaEngine::set_coefficients(self, coefficients);
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        KaratsubaEngine::process(self, input, output);
    }

    fn latency(&self) -> usize {
        KaratsubaEngine::latency(self)
    }
}

impl ConvolveEngine for FftEngine {
    fn reset(&mut self) {
        FftEngine::reset(self);
    }

    fn set_coefficients(&mut self, coefficients: &[f32]) {
        FftEngine::set_coefficients(self, coefficients);
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        FftEngine::process(self, input, output);
    }

    fn latency(&self) -> usize {
        FftEngine::latency(self)
    }
}

impl ConvolveEngine for HybridEngine {
    fn reset(&mut self) {
        HybridEngine::reset(self);
    }

    fn set_coefficients(&mut self, coefficients: &[f32]) {
        HybridEngine::set_coefficients(self, coefficients);
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) {
        HybridEngine::process(self, input, output);
    }

    fn latency(&self) -> usize {
        HybridEngine::latency(self)
    }
}

/// Which [`ConvolveEngine`] strategy to build, chosen by IR length and
/// the latency/CPU tradeoff the caller cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Pure time-domain Karatsuba convolution. Zero latency; cost grows
    /// faster than the filter length, so best kept to short IRs.
    Karatsuba,
    /// Partitioned overlap-save FFT convolution. Latency of
    /// `partition_size` samples; near-constant cost per sample regardless
    /// of filter length.
    Fft,
    /// Short time-domain head plus FFT tail, with the tail's latency
    /// compensated out. Zero latency at the FFT engine's efficiency for
    /// long filters.
    Hybrid,
}

/// A convolution engine of one of the three strategies, dispatched by a
/// single match in each method rather than a vtable.
pub enum Engine {
    Karatsuba(KaratsubaEngine),
    Fft(FftEngine),
    Hybrid(HybridEngine),
}

impl Engine {
    #[must_use]
    pub fn new(kind: EngineKind, config: EngineConfig) -> Self {
        match kind {
            EngineKind::Karatsuba => Self::Karatsuba(KaratsubaEngine::new(config)),
            EngineKind::Fft => Self::Fft(FftEngine::new(config)),
            EngineKind::Hybrid => Self::Hybrid(HybridEngine::new(config)),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::Karatsuba(e) => e.reset(),
            Self::Fft(e) => e.reset(),
            Self::Hybrid(e) => e.reset(),
        }
    }

    pub fn set_coefficients(&mut self, coefficients: &[f32]) {
        match self {
            Self::Karatsuba(e) => e.set_coefficients(coefficients),
            Self::Fft(e) => e.set_coefficients(coefficients),
            Self::Hybrid(e) => e.set_coefficients(coefficients),
        }
    }

    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        match self {
            Self::Karatsuba(e) => e.process(input, output),
            Self::Fft(e) => e.process(input, output),
            Self::Hybrid(e) => e.process(input, output),
        }
    }

    #[must_use]
    pub fn latency(&self) -> usize {
        match self {
            Self::Karatsuba(e) => e.latency(),
            Self::Fft(e) => e.latency(),
            Self::Hybrid(e) => e.latency(),
        }
    }
}

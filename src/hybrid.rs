//! Zero-latency hybrid convolution: a short time-domain head plus a long
//! FFT tail, with the tail's algorithmic delay compensated by holding the
//! head's portion of the input back by the same amount (the Gardner
//! method).
//!
//! Ported from `ribara_convolve.c`.

use crate::config::EngineConfig;
use crate::karatsuba::KaratsubaEngine;
use crate::partitioned::FftEngine;
use crate::ring::MirrorRing;

/// Number of leading taps handled by the time-domain head. The remainder
/// (if any) goes to the FFT tail.
const HEAD_TAPS: usize = 1024;

/// Composes a [`KaratsubaEngine`] head and an [`FftEngine`] tail so the
/// combined engine has zero output latency regardless of filter length.
pub struct HybridEngine {
    time: KaratsubaEngine,
    freq: FftEngine,
    use_freq: bool,
    max_input_samples: usize,
    delay_buffer: MirrorRing<f32>,
    tail_scratch: Vec<f32>,
    tail_out: Vec<f32>,
}

impl HybridEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let max_input_samples = config.max_input_samples();
        let time_config = EngineConfig::new(HEAD_TAPS, max_input_samples).unwrap();
        let tail_max_coefficients = config.max_coefficients().saturating_sub(HEAD_TAPS).max(1);
        let freq_config = EngineConfig::new(tail_max_coefficients, max_input_samples).unwrap();

        let delay_max_size = max_input_samples + HEAD_TAPS;
        let mut engine = Self {
            time: KaratsubaEngine::new(time_config),
            freq: FftEngine::new(freq_config),
            use_freq: false,
            max_input_samples,
            delay_buffer: MirrorRing::new(delay_max_size, max_input_samples).unwrap(),
            tail_scratch: vec![0.0; max_input_samples],
            tail_out: vec![0.0; max_input_samples],
        };
        engine.reset();
        engine
    }

    /// Samples of output delay introduced by this engine: always zero.
    #[must_use]
    pub const fn latency(&self) -> usize {
        0
    }

    pub fn reset(&mut self) {
        self.time.reset();
        self.freq.reset();
        self.delay_buffer.clear();

        let num_input_delay = HEAD_TAPS
            .checked_sub(self.freq.latency())
            .expect("FFT tail latency must not exceed the time-domain head length");

        self.tail_scratch.iter_mut().for_each(|v| *v = 0.0);
        let mut smpl = 0;
        while smpl < num_input_delay {
            let n = self.max_input_samples.min(num_input_delay - smpl);
            self.delay_buffer.put(&self.tail_scratch[..n]).unwrap();
            smpl += n;
        }
    }

    /// Replaces the filter coefficients. Taps `0..HEAD_TAPS` (or all of
    /// them, if shorter) go to the time-domain head; any remainder goes
    /// to the FFT tail.
    pub fn set_coefficients(&mut self, coefficients: &[f32]) {
        if coefficients.len() > HEAD_TAPS {
            self.use_freq = true;
            self.time.set_coefficients(&coefficients[..HEAD_TAPS]);
            self.freq.set_coefficients(&coefficients[HEAD_TAPS..]);
        } else {
            self.use_freq = false;
            self.time.set_coefficients(coefficients);
        }
        self.reset();
    }

    /// Convolves `input` against the current coefficients, writing
    /// `input.len()` samples into `output`. `input.len()` must be
    /// `<= max_input_samples` and `output.len() == input.len()`.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        assert_eq!(input.len(), output.len());
        assert!(input.len() <= self.max_input_samples);

        if input.is_empty() {
            return;
        }

        let num_samples = input.len();
        self.time.process(input, output);

        if self.use_freq {
            self.delay_buffer.put(input).unwrap();
            let delayed = self.delay_buffer.get(num_samples).unwrap();
            self.tail_scratch[..num_samples].copy_from_slice(delayed);
            self.freq
                .process(&self.tail_scratch[..num_samples], &mut self.tail_out[..num_samples]);
            for (o, t) in output.iter_mut().zip(self.tail_out[..num_samples].iter()) {
                *o += t;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_convolve(input: &[f32], coeffs: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0f32; input.len() + coeffs.len() - 1];
        for (i, &x) in input.iter().enumerate() {
            for (j, &h) in coeffs.iter().enumerate() {
                out[i + j] += x * h;
            }
        }
        out
    }

    #[test]
    fn zero_latency_with_short_ir() {
        let config = EngineConfig::new(8, 256).unwrap();
        let mut engine = HybridEngine::new(config);
        engine.set_coefficients(&[1.0, 0.5, -0.25]);

        let mut impulse = vec![0.0f32; 64];
        impulse[0] = 1.0;
        let mut out = vec![0.0f32; 64];
        engine.process(&impulse, &mut out);

        assert!((out[0] - 1.0).abs() < 1e-3);
        assert!((out[1] - 0.5).abs() < 1e-3);
        assert!((out[2] - (-0.25)).abs() < 1e-3);
    }

    #[test]
    fn zero_latency_with_long_ir_spanning_both_stages() {
        let num_taps = 1536;
        let config = EngineConfig::new(num_taps, 512).unwrap();
        let mut engine = HybridEngine::new(config);

        let coeffs: Vec<f32> = (0..num_taps).map(|i| 1.0 / (i as f32 + 1.0)).collect();
        engine.set_coefficients(&coeffs);

        let total = 8192;
        let mut impulse = vec![0.0f32; total];
        impulse[0] = 1.0;
        let mut out = vec![0.0f32; total];
        let mut pos = 0;
        while pos < total {
            let end = (pos + 512).min(total);
            engine.process(&impulse[pos..end], &mut out[pos..end]);
            pos = end;
        }

        for (i, &c) in coeffs.iter().enumerate().take(64) {
            assert!((out[i] - c).abs() < 5e-2, "tap {i}: {} vs {c}", out[i]);
        }
    }

    #[test]
    fn matches_direct_convolution_across_the_head_tail_boundary() {
        let num_taps = 1280;
        let config = EngineConfig::new(num_taps, 256).unwrap();
        let mut engine = HybridEngine::new(config);
        let coeffs: Vec<f32> = (0..num_taps)
            .map(|i| ((i as f32) * 0.02).cos() / (i as f32 + 1.0))
            .collect();
        engine.set_coefficients(&coeffs);

        let total = 8192;
        let input: Vec<f32> = (0..total).map(|i| ((i as f32) * 0.03).sin()).collect();
        let mut out = vec![0.0f32; total];
        let mut pos = 0;
        while pos < total {
            let end = (pos + 256).min(total);
            engine.process(&input[pos..end], &mut out[pos..end]);
            pos = end;
        }

        let expected = direct_convolve(&input, &coeffs);
        for i in 0..(total - num_taps) {
            assert!((out[i] - expected[i]).abs() < 0.15, "sample {i}: {} vs {}", out[i], expected[i]);
        }
    }

    #[test]
    fn silence_in_silence_out() {
        let config = EngineConfig::new(2048, 256).unwrap();
        let mut engine = HybridEngine::new(config);
        let coeffs: Vec<f32> = (0..2048).map(|i| 1.0 / (i as f32 + 1.0)).collect();
        engine.set_coefficients(&coeffs);

        let silence = vec![0.0f32; 4096];
        let mut out = vec![0.0f32; 4096];
        let mut pos = 0;
        while pos < silence.len() {
            let end = (pos + 256).min(silence.len());
            engine.process(&silence[pos..end], &mut out[pos..end]);
            pos = end;
        }
        for v in out {
            assert!(v.abs() < 1e-6);
        }
    }
}

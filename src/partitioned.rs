//! Uniformly-partitioned overlap-save FFT convolution.
//!
//! Ported from `ri_fft_convolve.c`. Splits the impulse response into
//! `partition_size`-sample blocks, each transformed once at
//! [`FftEngine::set_coefficients`] time, and amortises the per-partition
//! spectral multiply-adds across the samples leading up to each new FFT
//! frame so no single `process` call pays for the whole filter at once.

use crate::config::{next_pow2, EngineConfig};
use crate::fft::RealFft;
use crate::ring::MirrorRing;

const FFT_SIZE: usize = 2048;

fn roundup_mult(val: usize, n: usize) -> usize {
    (val + n - 1) / n * n
}

/// Complex-multiplies the packed spectrum `src` by `coef` and accumulates
/// into `dst`. `num_complex` is `partition_size` (= `fft_size / 2`);
/// index 0 holds the DC/Nyquist real pair, the rest are `(re, im)` pairs.
fn mul_add_spectrum(dst: &mut [f32], src: &[f32], coef: &[f32], num_complex: usize) {
    dst[0] += src[0] * coef[0];
    dst[1] += src[1] * coef[1];
    for c in 1..num_complex {
        let src_re = src[2 * c];
        let src_im = src[2 * c + 1];
        let coef_re = coef[2 * c];
        let coef_im = coef[2 * c + 1];
        dst[2 * c] += src_re * coef_re - src_im * coef_im;
        dst[2 * c + 1] += src_im * coef_re + src_re * coef_im;
    }
}

/// Partitioned overlap-save FFT convolver with a fixed `partition_size`
/// (= `fft_size / 2`) latency.
pub struct FftEngine {
    fft_size: usize,
    partition_size: usize,
    max_num_coefficients: usize,
    max_num_input_samples: usize,
    num_coefficients: usize,
    num_partitions: usize,
    buffer_count: usize,
    current_part: usize,
    ir_freq: Vec<f32>,
    input_buffer: MirrorRing<f32>,
    output_buffer: MirrorRing<f32>,
    freq_buffer: MirrorRing<f32>,
    fft: RealFft,
    work: Vec<f32>,
    comp_muladd: Vec<f32>,
    partition_scratch: Vec<f32>,
}

impl FftEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let fft_size = FFT_SIZE;
        let partition_size = fft_size / 2;
        let max_num_coefficients = next_pow2(config.max_coefficients());
        let max_fft_size = fft_size.max(2 * max_num_coefficients);
        let max_num_partitions = max_fft_size / fft_size;
        let max_num_input_samples = config.max_input_samples();

        let buffer_max_size = fft_size + max_num_input_samples;
        let buffer_max_required = fft_size.max(max_num_input_samples);

        let mut engine = Self {
            fft_size,
            partition_size,
            max_num_coefficients,
            max_num_input_samples,
            num_coefficients: partition_size,
            num_partitions: 1,
            buffer_count: 0,
            current_part: 0,
            ir_freq: vec![0.0; max_num_partitions * fft_size],
            input_buffer: MirrorRing::new(buffer_max_size, buffer_max_required).unwrap(),
            output_buffer: MirrorRing::new(buffer_max_size, buffer_max_required).unwrap(),
            freq_buffer: MirrorRing::new(fft_size, fft_size).unwrap(),
            fft: RealFft::new(fft_size),
            work: vec![0.0; fft_size],
            comp_muladd: vec![0.0; fft_size],
            partition_scratch: vec![0.0; fft_size],
        };
        engine.reset();
        engine
    }

    /// Samples of output delay introduced by this engine: always
    /// `partition_size` (`fft_size / 2`).
    #[must_use]
    pub const fn latency(&self) -> usize {
        self.partition_size
    }

    pub fn reset(&mut self) {
        self.work.iter_mut().for_each(|v| *v = 0.0);
        self.comp_muladd.iter_mut().for_each(|v| *v = 0.0);

        self.input_buffer.clear();
        self.output_buffer.clear();
        self.freq_buffer.clear();

        let silence = vec![0.0f32; self.fft_size];
        self.input_buffer.put(&silence[..self.partition_size]).unwrap();
        self.output_buffer.put(&silence[..self.partition_size]).unwrap();
        for _ in 0..self.num_partitions.saturating_sub(1) {
            self.freq_buffer.put(&silence).unwrap();
        }

        self.buffer_count = self.partition_size;
        self.current_part = 1;
    }

    /// Replaces the filter coefficients. `coefficients.len()` must be
    /// `<= max_coefficients` from the configuration this engine was built
    /// with.
    pub fn set_coefficients(&mut self, coefficients: &[f32]) {
        assert!(coefficients.len() <= self.max_num_coefficients);

        self.num_coefficients = roundup_mult(coefficients.len(), self.partition_size);
        self.num_partitions = self.num_coefficients / self.partition_size;

        let norm_factor_inverse = 2.0 / self.fft_size as f32;
        let mut smpl = 0;
        while smpl < self.num_coefficients {
            let copy_samples = self
                .partition_size
                .min(coefficients.len().saturating_sub(smpl));
            self.work.iter_mut().for_each(|v| *v = 0.0);
            self.work[..copy_samples].copy_from_slice(&coefficients[smpl..smpl + copy_samples]);
            self.work[..copy_samples]
                .iter_mut()
                .for_each(|v| *v *= norm_factor_inverse);
            self.fft.forward(&mut self.work[..self.fft_size]);
            self.ir_freq[2 * smpl..2 * smpl + self.fft_size].copy_from_slice(&self.work[..self.fft_size]);
            smpl += self.partition_size;
        }

        self.freq_buffer =
            MirrorRing::new(self.num_partitions * self.fft_size, self.fft_size).unwrap();

        self.reset();
    }

    fn drain_partitions(&mut self, goal: usize) {
        while self.current_part < goal {
            let part_offset = (self.num_partitions - self.current_part) * self.fft_size;
            let got = self.freq_buffer.get(self.fft_size).unwrap();
            self.partition_scratch.copy_from_slice(got);
            mul_add_spectrum(
                &mut self.comp_muladd,
                &self.partition_scratch,
                &self.ir_freq[part_offset..part_offset + self.fft_size],
                self.partition_size,
            );
            self.freq_buffer.put(&self.partition_scratch).unwrap();
            self.current_part += 1;
        }
    }

    /// Convolves `input` against the current coefficients, writing
    /// `input.len()` samples (delayed by [`Self::latency`]) into `output`.
    /// `input.len()` must be `<= max_input_samples` and
    /// `output.len() == input.len()`.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        assert_eq!(input.len(), output.len());
        assert!(input.len() <= self.max_num_input_samples);

        if input.is_empty() {
            return;
        }

        let num_samples = input.len();
        self.input_buffer.put(input).unwrap();
        self.buffer_count += num_samples;

        if self.buffer_count < self.fft_size {
            let goal_part = ((self.num_partitions + 1) * (self.buffer_count - self.partition_size))
                / self.partition_size;
            let goal_part = goal_part.min(self.num_partitions);
            self.drain_partitions(goal_part);
        }

        while self.buffer_count >= self.fft_size {
            self.drain_partitions(self.num_partitions);

            let window = self.input_buffer.peek(self.fft_size).unwrap();
            self.work[..self.fft_size].copy_from_slice(window);
            self.input_buffer.get(self.partition_size).unwrap();

            self.fft.forward(&mut self.work[..self.fft_size]);

            // Discard the oldest partition to make room for the new one.
            // With a single partition (num_partitions == 1) there's nothing
            // buffered yet to discard, so this is a no-op, not an error.
            if self.freq_buffer.remain() >= self.fft_size {
                self.freq_buffer.get(self.fft_size).unwrap();
            }
            self.freq_buffer.put(&self.work[..self.fft_size]).unwrap();

            mul_add_spectrum(
                &mut self.comp_muladd,
                &self.work[..self.fft_size],
                &self.ir_freq[..self.fft_size],
                self.partition_size,
            );

            self.fft.inverse(&mut self.comp_muladd[..self.fft_size]);

            self.output_buffer
                .put(&self.comp_muladd[self.fft_size / 2..self.fft_size])
                .unwrap();

            self.comp_muladd.iter_mut().for_each(|v| *v = 0.0);
            self.buffer_count -= self.fft_size / 2;
            self.current_part = 1;
        }

        let out = self.output_buffer.get(num_samples).unwrap();
        output.copy_from_slice(out);
    }
}

//! Time-domain convolution via recursive Karatsuba multiplication.
//!
//! Ported from `ri_karatsuba.c`. Zero latency, but cost grows faster than
//! the FFT engines for long filters — intended for short IRs or as the
//! head stage of [`crate::hybrid::HybridEngine`].

use crate::config::{next_pow2, EngineConfig};

/// `z` must have length `2 * n`. Direct O(n^2) linear convolution,
/// used as the Karatsuba recursion's base case.
fn convolve_naive(a: &[f32], b: &[f32], z: &mut [f32], n: usize) {
    debug_assert_eq!(a.len(), n);
    debug_assert_eq!(b.len(), n);
    debug_assert_eq!(z.len(), 2 * n);

    z.iter_mut().for_each(|v| *v = 0.0);
    for (j, &bj) in b.iter().enumerate() {
        for (i, &ai) in a.iter().enumerate() {
            z[j + i] += ai * bj;
        }
    }
}

/// `z` must have length `6 * n`; on return the linear convolution of `a`
/// and `b` (length `2 * n`) occupies `z[0..2*n]`. `n` must be a power of
/// two and `a.len() == b.len() == n`.
///
/// `z[5n..5n + n/2]` and `z[5n + n/2..6n]` hold the scratch sums
/// `a0 + a1` and `b0 + b1`; `z[0..n]`, `z[n..2n]`, `z[2n..3n]` hold the
/// three sub-products, each recursing into its own region of `z` as
/// scratch for the next level down.
fn convolve_karatsuba(a: &[f32], b: &[f32], z: &mut [f32], n: usize) {
    debug_assert_eq!(a.len(), n);
    debug_assert_eq!(b.len(), n);
    debug_assert!(z.len() >= 6 * n);

    if n <= 8 {
        debug_assert_eq!(n, 8);
        convolve_naive(a, b, &mut z[..2 * n], n);
        return;
    }

    let n2 = n / 2;
    let (a0, a1) = a.split_at(n2);
    let (b0, b1) = b.split_at(n2);

    let (left, right) = z.split_at_mut(5 * n);
    let (v, w) = right.split_at_mut(n2);
    for i in 0..n2 {
        v[i] = a1[i] + a0[i];
        w[i] = b1[i] + b0[i];
    }

    // x1 = a0 * b0, scratch z[0..3n)
    convolve_karatsuba(a0, b0, &mut left[0..3 * n], n2);
    // x2 = a1 * b1, scratch z[n..4n)
    convolve_karatsuba(a1, b1, &mut left[n..4 * n], n2);
    // x3 = v * w, scratch z[2n..5n)
    convolve_karatsuba(&*v, &*w, &mut left[2 * n..5 * n], n2);

    // x3 -= x1 + x2 first, entirely within the disjoint x3 region, then
    // fold into z[n2..n+n2) in a second pass — merging these into one loop
    // would read x1's upper half (z[n2..n)) after it's already overwritten
    // by the z[n2+i] write below.
    for i in 0..n {
        let x1i = left[i];
        let x2i = left[n + i];
        left[2 * n + i] -= x1i + x2i;
    }
    for i in 0..n {
        let x3i = left[2 * n + i];
        left[n2 + i] += x3i;
    }
}

/// Rounds `val` up to the next power of two, `1` if `val == 0`.
fn roundup_pow2(val: usize) -> usize {
    next_pow2(val)
}

/// Zero-latency time-domain FIR convolver using recursive Karatsuba
/// multiplication, with a carry buffer so blocks shorter than the filter
/// length still produce a correct continuous output.
pub struct KaratsubaEngine {
    max_block: usize,
    coefficients: Vec<f32>,
    num_coefficients: usize,
    input_buffer: Vec<f32>,
    output_buffer: Vec<f32>,
    work_buffer: Vec<f32>,
}

impl KaratsubaEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let max_block = roundup_pow2(config.max_coefficients().max(config.max_input_samples())).max(8);
        let mut engine = Self {
            max_block,
            coefficients: vec![0.0; max_block],
            num_coefficients: 0,
            input_buffer: vec![0.0; max_block],
            output_buffer: vec![0.0; max_block],
            work_buffer: vec![0.0; 6 * max_block],
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
        self.input_buffer.iter_mut().for_each(|v| *v = 0.0);
        self.output_buffer.iter_mut().for_each(|v| *v = 0.0);
        self.work_buffer.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Replaces the filter coefficients. `coefficients.len()` must be
    /// `<= max_coefficients` from the configuration this engine was built
    /// with; tail positions up to the next power of two are zero-padded.
    pub fn set_coefficients(&mut self, coefficients: &[f32]) {
        assert!(coefficients.len() <= self.max_block);
        self.coefficients[..coefficients.len()].copy_from_slice(coefficients);
        self.coefficients[coefficients.len()..].iter_mut().for_each(|v| *v = 0.0);
        self.num_coefficients = roundup_pow2(coefficients.len());
        self.reset();
    }

    /// Convolves `input` against the current coefficients, writing
    /// `input.len()` samples into `output`. `input.len()` must be
    /// `<= max_input_samples` and `output.len() == input.len()`.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        assert_eq!(input.len(), output.len());
        assert!(input.len() <= self.max_block);

        let num_samples = input.len();
        let conv_size = roundup_pow2(num_samples.max(self.num_coefficients)).max(8);

        self.input_buffer[..num_samples].copy_from_slice(input);
        self.input_buffer[num_samples..conv_size].iter_mut().for_each(|v| *v = 0.0);

        convolve_karatsuba(
            &self.input_buffer[..conv_size],
            &self.coefficients[..conv_size],
            &mut self.work_buffer[..6 * conv_size],
            conv_size,
        );

        for smpl in 0..num_samples {
            output[smpl] = self.output_buffer[smpl] + self.work_buffer[smpl];
        }

        let mut i = 0;
        for smpl in num_samples..conv_size {
            self.output_buffer[i] = self.output_buffer[smpl] + self.work_buffer[smpl];
            i += 1;
        }
        for smpl in conv_size..(conv_size + num_samples) {
            self.output_buffer[i] = self.work_buffer[smpl];
            i += 1;
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
    fn base_case_matches_naive_for_n_eq_8() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let b = [8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        let mut z = vec![0.0f32; 48];
        convolve_karatsuba(&a, &b, &mut z, 8);
        let expected = direct_convolve(&a, &b);
        for (got, want) in z[..16].iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-3);
        }
    }

    #[test]
    fn recursive_case_matches_naive_for_n_eq_32() {
        let n = 32;
        let a: Vec<f32> = (0..n).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..n).map(|i| (i as f32 * 0.71).cos()).collect();
        let mut z = vec![0.0f32; 6 * n];
        convolve_karatsuba(&a, &b, &mut z, n);
        let expected = direct_convolve(&a, &b);
        for (got, want) in z[..2 * n].iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-2, "{got} vs {want}");
        }
    }

    #[test]
    fn impulse_reproduces_coefficients() {
        let config = EngineConfig::new(16, 32).unwrap();
        let mut engine = KaratsubaEngine::new(config);
        let coeffs = [1.0, 0.5, -0.25, 0.125];
        engine.set_coefficients(&coeffs);

        let mut impulse = vec![0.0f32; 32];
        impulse[0] = 1.0;
        let mut out = vec![0.0f32; 32];
        engine.process(&impulse, &mut out);

        for (i, &c) in coeffs.iter().enumerate() {
            assert!((out[i] - c).abs() < 1e-3);
        }
        for &v in &out[coeffs.len()..] {
            assert!(v.abs() < 1e-3);
        }
    }

    #[test]
    fn block_segmentation_matches_single_shot() {
        let config = EngineConfig::new(8, 64).unwrap();
        let coeffs = [0.2, -0.1, 0.05, 0.4];

        let input: Vec<f32> = (0..40).map(|i| ((i as f32) * 0.13).sin()).collect();

        let mut single = KaratsubaEngine::new(config);
        single.set_coefficients(&coeffs);
        let mut single_out = vec![0.0f32; input.len()];
        single.process(&input, &mut single_out);

        let mut chunked = KaratsubaEngine::new(config);
        chunked.set_coefficients(&coeffs);
        let mut chunked_out = vec![0.0f32; input.len()];
        for chunk_start in (0..input.len()).step_by(7) {
            let end = (chunk_start + 7).min(input.len());
            chunked.process(&input[chunk_start..end], &mut chunked_out[chunk_start..end]);
        }

        for (a, b) in single_out.iter().zip(chunked_out.iter()) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn reset_clears_carry() {
        let config = EngineConfig::new(8, 16).unwrap();
        let mut engine = KaratsubaEngine::new(config);
        engine.set_coefficients(&[1.0, 1.0, 1.0, 1.0]);

        let block = vec![1.0f32; 16];
        let mut out = vec![0.0f32; 16];
        engine.process(&block, &mut out);

        engine.reset();
        let silence = vec![0.0f32; 16];
        let mut out2 = vec![0.0f32; 16];
        engine.process(&silence, &mut out2);
        for v in out2 {
            assert!(v.abs() < 1e-6);
        }
    }
}

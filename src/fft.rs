//! In-place real FFT: a radix-4 Stockham complex FFT plus the classic
//! "pack two reals into one complex FFT" trick for real input.
//!
//! Ported from `ri_fft.c`. No normalisation is applied here; the
//! documented constant is `2/n`, applied by callers (see `partitioned.rs`).

#[derive(Clone, Copy, Default)]
struct Complex32 {
    re: f32,
    im: f32,
}

impl Complex32 {
    const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

/// A reusable real FFT plan for a fixed power-of-two length `n >= 4`.
///
/// Holds two ping-pong scratch buffers sized once at construction so
/// `forward`/`inverse` never allocate.
pub struct RealFft {
    n: usize,
    a: Vec<Complex32>,
    b: Vec<Complex32>,
}

impl RealFft {
    #[must_use]
    pub fn new(n: usize) -> Self {
        assert!(n.is_power_of_two() && n >= 4, "n must be a power of two >= 4");
        Self {
            n,
            a: vec![Complex32::default(); n / 2],
            b: vec![Complex32::default(); n / 2],
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.n
    }

    /// Forward real FFT: `x[0..n)` in, packed spectrum out (`x[0]` = DC
    /// real, `x[1]` = Nyquist real, pairs thereafter). Unnormalised.
    pub fn forward(&mut self, x: &mut [f32]) {
        self.real_fft(-1.0, x);
    }

    /// Inverse of [`Self::forward`]. Unnormalised (apply `2/n` yourself).
    pub fn inverse(&mut self, x: &mut [f32]) {
        self.real_fft(1.0, x);
    }

    /// 4-basis (radix-4) Stockham FFT over `n/2` complex values stored
    /// interleaved in `x` as `(re, im)` pairs, with a radix-2 finishing
    /// stage when `log2(n/2)` is odd.
    fn complex_fft(&mut self, flag: f32, x: &mut [f32]) {
        assert_eq!(x.len() % 2, 0);
        let count = x.len() / 2;
        assert!(count.is_power_of_two());
        debug_assert!(self.a.len() >= count && self.b.len() >= count);

        for i in 0..count {
            self.a[i] = Complex32::new(x[2 * i], x[2 * i + 1]);
        }
        // Ping-pong between the two persistent scratch buffers exactly as
        // the original swaps its `x`/`y` pointers; `use_a` tracks which one
        // currently holds the live data.
        let mut use_a = true;

        let mut n = count;
        let mut s = 1usize;

        while n > 2 {
            let n1 = n >> 2;
            let n2 = n >> 1;
            let n3 = n1 + n2;
            let theta0 = 2.0 * std::f32::consts::PI / n as f32;
            let j = Complex32::new(0.0, flag);
            let wdelta = Complex32::new(theta0.cos(), -flag * theta0.sin());
            let mut w1p = Complex32::new(1.0, 0.0);

            let (cur, nxt) = if use_a {
                (&self.a, &mut self.b)
            } else {
                (&self.b, &mut self.a)
            };

            for p in 0..n1 {
                let w2p = w1p.mul(w1p);
                let w3p = w1p.mul(w2p);
                for q in 0..s {
                    let a = cur[q + s * p];
                    let b = cur[q + s * (p + n1)];
                    let c = cur[q + s * (p + n2)];
                    let d = cur[q + s * (p + n3)];
                    let apc = a.add(c);
                    let amc = a.sub(c);
                    let bpd = b.add(d);
                    let jbmd = j.mul(b.sub(d));
                    nxt[q + s * (4 * p)] = apc.add(bpd);
                    nxt[q + s * (4 * p + 1)] = w1p.mul(amc.sub(jbmd));
                    nxt[q + s * (4 * p + 2)] = w2p.mul(apc.sub(bpd));
                    nxt[q + s * (4 * p + 3)] = w3p.mul(amc.add(jbmd));
                }
                w1p = w1p.mul(wdelta);
            }

            n >>= 2;
            s <<= 2;
            use_a = !use_a;
        }

        if n == 2 {
            let (cur, nxt) = if use_a {
                (&self.a, &mut self.b)
            } else {
                (&self.b, &mut self.a)
            };
            for q in 0..s {
                let a = cur[q];
                let b = cur[q + s];
                nxt[q] = a.add(b);
                nxt[q + s] = a.sub(b);
            }
            s <<= 1;
            use_a = !use_a;
        }

        debug_assert_eq!(s, count);
        let result = if use_a { &self.a } else { &self.b };
        for (i, c) in result.iter().enumerate().take(count) {
            x[2 * i] = c.re;
            x[2 * i + 1] = c.im;
        }
    }

    /// Real-sequence FFT/IFFT via spectral symmetry, as `RIFFT_RealFFT`.
    fn real_fft(&mut self, flag: f32, x: &mut [f32]) {
        let n = self.n;
        assert_eq!(x.len(), n);

        if flag < 0.0 {
            self.complex_fft(-1.0, &mut x[..n]);
        }

        let theta = -flag * 2.0 * std::f32::consts::PI / n as f32;
        let wpi = theta.sin();
        let wpr = theta.cos() - 1.0;
        let c2 = flag * 0.5;

        let mut wr = 1.0 + wpr;
        let mut wi = wpi;

        for i in 1..(n / 4) {
            let i1 = i << 1;
            let i2 = i1 + 1;
            let i3 = n - i1;
            let i4 = i3 + 1;

            let h1r = 0.5 * (x[i1] + x[i3]);
            let h1i = 0.5 * (x[i2] - x[i4]);
            let h2r = -c2 * (x[i2] + x[i4]);
            let h2i = c2 * (x[i1] - x[i3]);

            x[i1] = h1r + (wr * h2r) - (wi * h2i);
            x[i2] = h1i + (wr * h2i) + (wi * h2r);
            x[i3] = h1r - (wr * h2r) + (wi * h2i);
            x[i4] = -h1i + (wr * h2i) + (wi * h2r);

            let wtmp = wr;
            wr += wtmp * wpr - wi * wpi;
            wi += wi * wpr + wtmp * wpi;
        }

        let h1r = x[0];
        if flag < 0.0 {
            x[0] = h1r + x[1];
            x[1] = h1r - x[1];
        } else {
            x[0] = 0.5 * (h1r + x[1]);
            x[1] = 0.5 * (h1r - x[1]);
            self.complex_fft(1.0, &mut x[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dc_signal(n: usize, value: f32) -> Vec<f32> {
        vec![value; n]
    }

    #[test]
    fn forward_then_inverse_round_trips() {
        let n = 256;
        let mut fft = RealFft::new(n);
        let original: Vec<f32> = (0..n)
            .map(|i| (i as f32 * 0.1).sin() + 0.3 * (i as f32 * 0.37).cos())
            .collect();
        let mut x = original.clone();

        fft.forward(&mut x);
        fft.inverse(&mut x);

        let scale = 2.0 / n as f32;
        for (a, b) in x.iter().zip(original.iter()) {
            assert!((a * scale - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn dc_signal_has_energy_only_at_bin_zero() {
        let n = 64;
        let mut fft = RealFft::new(n);
        let mut x = dc_signal(n, 1.0);
        fft.forward(&mut x);

        assert!((x[0] - n as f32).abs() < 1e-2);
        assert!(x[1].abs() < 1e-2);
        for v in &x[2..] {
            assert!(v.abs() < 1e-2);
        }
    }

    #[test]
    fn impulse_has_flat_spectrum() {
        let n = 32;
        let mut fft = RealFft::new(n);
        let mut x = vec![0.0f32; n];
        x[0] = 1.0;
        fft.forward(&mut x);

        assert!((x[0] - 1.0).abs() < 1e-3);
        assert!((x[1] - 1.0).abs() < 1e-3);
        for i in 1..(n / 2) {
            let re = x[2 * i];
            let im = x[2 * i + 1];
            assert!((re * re + im * im - 1.0).abs() < 1e-2);
        }
    }
}

//! In-place radix-2 complex FFT
//!
//! Operates on an interleaved re/im buffer of `2 * FFT_SIZE` floats. No
//! allocation, no normalization in either direction; callers divide by
//! the transform length where they need unit magnitudes. Twiddle factors
//! are accumulated in f64 so repeated 256-point transforms stay stable at
//! single precision.

/// Transform length used by the classifiers.
pub const FFT_SIZE: usize = 256;

/// Compute an in-place complex FFT over interleaved re/im pairs.
///
/// `sign` selects the transform direction: −1 for the forward (analysis)
/// transform, +1 for the inverse. The buffer length must be twice a power
/// of two.
pub fn fft(buffer: &mut [f32], sign: i32) {
    let n = buffer.len() / 2;
    debug_assert!(n.is_power_of_two(), "transform length must be a power of two");
    debug_assert_eq!(buffer.len(), 2 * n);

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 0..n {
        if i < j {
            buffer.swap(2 * i, 2 * j);
            buffer.swap(2 * i + 1, 2 * j + 1);
        }
        let mut m = n >> 1;
        while m >= 1 && j >= m {
            j -= m;
            m >>= 1;
        }
        j += m;
    }

    // Danielson-Lanczos butterflies.
    let mut len = 2usize;
    while len <= n {
        let angle = sign as f64 * 2.0 * std::f64::consts::PI / len as f64;
        let (wlen_im, wlen_re) = angle.sin_cos();
        let half = len / 2;
        for start in (0..n).step_by(len) {
            let mut w_re = 1.0f64;
            let mut w_im = 0.0f64;
            for k in 0..half {
                let a = 2 * (start + k);
                let b = 2 * (start + k + half);
                let u_re = buffer[a];
                let u_im = buffer[a + 1];
                let v_re = buffer[b] * w_re as f32 - buffer[b + 1] * w_im as f32;
                let v_im = buffer[b] * w_im as f32 + buffer[b + 1] * w_re as f32;
                buffer[a] = u_re + v_re;
                buffer[a + 1] = u_im + v_im;
                buffer[b] = u_re - v_re;
                buffer[b + 1] = u_im - v_im;
                let next_re = w_re * wlen_re - w_im * wlen_im;
                w_im = w_re * wlen_im + w_im * wlen_re;
                w_re = next_re;
            }
        }
        len <<= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward(signal: &[f32]) -> Vec<f32> {
        let mut buffer = vec![0.0f32; 2 * signal.len()];
        for (i, &s) in signal.iter().enumerate() {
            buffer[2 * i] = s;
        }
        fft(&mut buffer, -1);
        buffer
    }

    #[test]
    fn impulse_has_a_flat_spectrum() {
        let mut signal = vec![0.0f32; FFT_SIZE];
        signal[0] = 1.0;
        let spectrum = forward(&signal);
        for k in 0..FFT_SIZE {
            assert!((spectrum[2 * k] - 1.0).abs() < 1e-4, "re[{}]", k);
            assert!(spectrum[2 * k + 1].abs() < 1e-4, "im[{}]", k);
        }
    }

    #[test]
    fn dc_lands_in_bin_zero() {
        let signal = vec![1.0f32; FFT_SIZE];
        let spectrum = forward(&signal);
        assert!((spectrum[0] - FFT_SIZE as f32).abs() < 1e-2);
        for k in 1..FFT_SIZE {
            let mag = (spectrum[2 * k].powi(2) + spectrum[2 * k + 1].powi(2)).sqrt();
            assert!(mag < 1e-2, "bin {} magnitude {}", k, mag);
        }
    }

    #[test]
    fn cosine_lands_in_its_bin() {
        let bin = 32usize;
        let signal: Vec<f32> = (0..FFT_SIZE)
            .map(|i| {
                (2.0 * std::f64::consts::PI * bin as f64 * i as f64 / FFT_SIZE as f64).cos() as f32
            })
            .collect();
        let spectrum = forward(&signal);
        // A real cosine splits between bin k and N-k with amplitude N/2.
        let mag =
            (spectrum[2 * bin].powi(2) + spectrum[2 * bin + 1].powi(2)).sqrt();
        assert!((mag - (FFT_SIZE / 2) as f32).abs() < 0.1, "mag {}", mag);
        // Off bins stay small.
        let off = (spectrum[2 * 40].powi(2) + spectrum[2 * 40 + 1].powi(2)).sqrt();
        assert!(off < 0.1, "off-bin magnitude {}", off);
    }

    #[test]
    fn inverse_round_trips() {
        let signal: Vec<f32> = (0..FFT_SIZE).map(|i| ((i * 7919) % 100) as f32 / 100.0).collect();
        let mut buffer = vec![0.0f32; 2 * FFT_SIZE];
        for (i, &s) in signal.iter().enumerate() {
            buffer[2 * i] = s;
        }
        fft(&mut buffer, -1);
        fft(&mut buffer, 1);
        for (i, &s) in signal.iter().enumerate() {
            let got = buffer[2 * i] / FFT_SIZE as f32;
            assert!((got - s).abs() < 1e-4, "sample {}: {} vs {}", i, got, s);
        }
    }
}

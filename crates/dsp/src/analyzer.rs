//! Shared spectral front-end for the tone classifiers
//!
//! Reassembles arbitrary input chunks into 256-sample windows, applies a
//! running-peak auto-scaler and a Hamming window, transforms, and hands
//! each window's magnitude spectrum to the classifier together with the
//! peak/argmax/average summary the detection rules work from.

use crate::fft::{fft, FFT_SIZE};
use once_cell::sync::Lazy;
use tracing::trace;

/// Magnitude bins per window (the real half of the spectrum).
pub(crate) const BINS: usize = FFT_SIZE / 2;

/// Duration of one analysis window at 8 kHz, in milliseconds.
pub(crate) const WINDOW_MS: u32 = 32;

/// Hamming window, built once per process.
static HAMMING: Lazy<[f32; FFT_SIZE]> = Lazy::new(|| {
    let mut window = [0.0f32; FFT_SIZE];
    for (i, w) in window.iter_mut().enumerate() {
        *w = 0.53836
            - 0.46164 * ((2.0 * std::f32::consts::PI * i as f32) / 255.0).cos();
    }
    window
});

/// One analyzed window.
pub(crate) struct WindowSummary {
    /// Magnitude spectrum of this window
    pub mag: [f32; BINS],
    /// Largest magnitude
    pub peak: f32,
    /// Bin index of the largest magnitude
    pub pos: usize,
    /// Mean magnitude across all bins
    pub avg: f32,
    /// The previous window's magnitude at this window's peak bin
    pub prev_at_peak: f32,
}

pub(crate) struct SpectralAnalyzer {
    /// Previous window's magnitude spectrum
    prev: [f32; BINS],
    /// Input reassembly buffer
    pending: [i16; FFT_SIZE],
    fill: usize,
    /// Running peak input amplitude, for auto-scaling
    peak_level: i32,
    /// Interleaved re/im FFT workspace
    buffer: [f32; 2 * FFT_SIZE],
}

impl SpectralAnalyzer {
    pub fn new() -> SpectralAnalyzer {
        SpectralAnalyzer {
            prev: [0.0; BINS],
            pending: [0; FFT_SIZE],
            fill: 0,
            peak_level: 0,
            buffer: [0.0; 2 * FFT_SIZE],
        }
    }

    /// Feed samples of any length; `sink` runs once per completed
    /// 256-sample window. A tail shorter than a window is held for the
    /// next call.
    pub fn feed(&mut self, samples: &[i16], sink: &mut dyn FnMut(&WindowSummary)) {
        let mut rest = samples;
        while !rest.is_empty() {
            let take = (FFT_SIZE - self.fill).min(rest.len());
            self.pending[self.fill..self.fill + take].copy_from_slice(&rest[..take]);
            self.fill += take;
            rest = &rest[take..];
            if self.fill == FFT_SIZE {
                let summary = self.process_window();
                self.fill = 0;
                sink(&summary);
            }
        }
    }

    /// Analyze the 256 samples sitting in the reassembly buffer.
    fn process_window(&mut self) -> WindowSummary {
        let window = &*HAMMING;

        // Scale by the running peak. A sample above the current peak
        // raises it and restarts the pass; the peak only grows, so this
        // retries at most once per new maximum.
        let mut moved_peak = true;
        while moved_peak {
            moved_peak = false;
            let scale = if self.peak_level > 0 {
                1.0 / self.peak_level as f32
            } else {
                0.0
            };
            for i in 0..FFT_SIZE {
                let s = self.pending[i];
                self.buffer[2 * i] = s as f32 * scale * window[i];
                self.buffer[2 * i + 1] = 0.0;
                if s as i32 > self.peak_level {
                    self.peak_level = s as i32;
                    moved_peak = true;
                }
            }
            if moved_peak {
                trace!(peak = self.peak_level, "auto-scale peak raised");
            }
        }

        fft(&mut self.buffer, -1);

        let mut mag = [0.0f32; BINS];
        let mut peak = 0.0f32;
        let mut pos = 0usize;
        let mut avg = 0.0f32;
        for (k, m) in mag.iter_mut().enumerate() {
            let re = self.buffer[2 * k] / FFT_SIZE as f32;
            let im = self.buffer[2 * k + 1] / FFT_SIZE as f32;
            *m = (re * re + im * im).sqrt() / 2.0;
            avg += *m;
            if *m > peak {
                peak = *m;
                pos = k;
            }
        }
        avg /= BINS as f32;

        let prev_at_peak = self.prev[pos];
        self.prev = mag;
        WindowSummary {
            mag,
            peak,
            pos,
            avg,
            prev_at_peak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_windows(analyzer: &mut SpectralAnalyzer, samples: &[i16]) -> usize {
        let mut n = 0;
        analyzer.feed(samples, &mut |_| n += 1);
        n
    }

    #[test]
    fn window_reassembly_across_chunk_sizes() {
        let mut analyzer = SpectralAnalyzer::new();
        // 160-sample chunks: a window completes every 1.6 chunks.
        assert_eq!(count_windows(&mut analyzer, &[0i16; 160]), 0);
        assert_eq!(count_windows(&mut analyzer, &[0i16; 160]), 1);
        assert_eq!(count_windows(&mut analyzer, &[0i16; 160]), 0);
        assert_eq!(count_windows(&mut analyzer, &[0i16; 160]), 1);

        // Exactly one window per 256-sample chunk.
        let mut analyzer = SpectralAnalyzer::new();
        assert_eq!(count_windows(&mut analyzer, &[0i16; 256]), 1);
        assert_eq!(count_windows(&mut analyzer, &[0i16; 256]), 1);

        // An oversized chunk yields every full window it contains.
        let mut analyzer = SpectralAnalyzer::new();
        assert_eq!(count_windows(&mut analyzer, &[0i16; 1024]), 4);
    }

    #[test]
    fn silence_produces_an_empty_spectrum() {
        let mut analyzer = SpectralAnalyzer::new();
        let mut peaks = Vec::new();
        analyzer.feed(&[0i16; 512], &mut |w| peaks.push(w.peak));
        assert_eq!(peaks, vec![0.0, 0.0]);
    }

    #[test]
    fn peak_scaling_normalizes_a_full_scale_tone() {
        let mut analyzer = SpectralAnalyzer::new();
        // 1 kHz at full scale: bin 32 of a 256-point window at 8 kHz.
        let samples: Vec<i16> = (0..256)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * 1000.0 * i as f64 / 8000.0;
                (t.sin() * 32000.0) as i16
            })
            .collect();
        let mut summaries = Vec::new();
        analyzer.feed(&samples, &mut |w| summaries.push((w.pos, w.peak, w.avg)));
        let (pos, peak, avg) = summaries[0];
        assert_eq!(pos, 32);
        assert!(peak > 0.09, "peak {}", peak);
        assert!(peak > 45.0 * avg, "peak {} avg {}", peak, avg);
    }

    #[test]
    fn hamming_window_endpoints() {
        let w = &*HAMMING;
        assert!((w[0] - 0.07672).abs() < 1e-4);
        assert!((w[255] - 0.07672).abs() < 1e-4);
        assert!((w[127] - 1.0).abs() < 2e-2);
    }
}

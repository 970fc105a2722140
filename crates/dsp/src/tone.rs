//! Generic tone / escape-tone classifier
//!
//! Runs the spectral front-end over an 8 kHz mono PCM16 stream and raises
//! two sticky flags: a stable narrowband peak above ~156 Hz is a tone; a
//! long-held peak in bin 3 (~94 Hz) is the escape signal. Once raised a
//! flag stays raised for the life of the detector.

use crate::analyzer::{SpectralAnalyzer, WINDOW_MS};

/// Streaming tone detector over 8 kHz mono PCM16.
pub struct ToneDetector {
    analyzer: SpectralAnalyzer,
    /// Current candidate peak bin
    freq: usize,
    /// How long the candidate has held, in ms
    len_ms: u32,
    tone: bool,
    escape: bool,
}

impl ToneDetector {
    pub fn new() -> ToneDetector {
        ToneDetector {
            analyzer: SpectralAnalyzer::new(),
            freq: 0,
            len_ms: 0,
            tone: false,
            escape: false,
        }
    }

    /// Process a chunk of samples of any length.
    pub fn process(&mut self, samples: &[i16]) {
        let Self {
            analyzer,
            freq,
            len_ms,
            tone,
            escape,
        } = self;
        analyzer.feed(samples, &mut |w| {
            // Track how long the dominant bin has stayed dominant.
            if w.peak > 0.005 && w.peak > 45.0 * w.avg {
                if w.pos == *freq {
                    *len_ms += WINDOW_MS;
                } else {
                    *freq = w.pos;
                    *len_ms = WINDOW_MS;
                }
            } else {
                *freq = 0;
                *len_ms = 0;
            }

            // A loud peak that barely moved since the last window counts
            // immediately; otherwise the run length has to reach 96 ms.
            // 64 ms catches more tones but false-triggers on some music.
            let strong_stable = w.peak > 0.09
                && w.peak > 15.0 * w.avg
                && (w.peak - w.prev_at_peak).abs() < w.peak * 0.03;
            if strong_stable || *len_ms >= 96 {
                if w.pos > 5 {
                    *tone = true;
                } else if w.pos == 3 && *len_ms >= 300 {
                    *escape = true;
                }
            }
        });
    }

    /// Whether a tone has ever been detected.
    pub fn tone_detected(&self) -> bool {
        self.tone
    }

    /// Whether the escape signal has ever been detected.
    pub fn escape_detected(&self) -> bool {
        self.escape
    }
}

impl Default for ToneDetector {
    fn default() -> Self {
        ToneDetector::new()
    }
}

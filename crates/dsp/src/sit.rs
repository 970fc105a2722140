//! SIT / busy classifier
//!
//! Special Information Tones are a fixed three-tone preamble played
//! before PSTN failure announcements; the (first, second) tone pair
//! encodes the cause. This detector runs the shared spectral front-end,
//! tracks the three-tone sequence with a 200 ms inter-tone timeout, and
//! independently watches the 480 Hz + 620 Hz pair of a US busy signal.

use crate::analyzer::{SpectralAnalyzer, BINS, WINDOW_MS};

/// Classified result of a SIT / busy detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitCause {
    /// SIT NC: no circuit found
    NoCircuit,
    /// SIT IC: operator intercept
    Intercept,
    /// SIT VC: vacant circuit
    VacantCircuit,
    /// SIT RO: reorder (system busy)
    Reorder,
    /// Plain busy signal
    Busy,
}

impl SitCause {
    /// Human-readable cause string.
    pub fn describe(self) -> &'static str {
        match self {
            SitCause::NoCircuit => "No circuit found",
            SitCause::Intercept => "Operator intercept",
            SitCause::VacantCircuit => "Vacant circuit",
            SitCause::Reorder => "Reorder (system busy)",
            SitCause::Busy => "Busy signal",
        }
    }
}

impl std::fmt::Display for SitCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// First SIT tone: 913.8 Hz or 985.2 Hz (bins 29 / 31, ±1).
fn valid_t1(pos: usize) -> usize {
    let pos = pos as i32;
    if (31 - pos).abs() < 2 {
        31
    } else if (29 - pos).abs() < 2 {
        29
    } else {
        0
    }
}

/// Second SIT tone: 1370.6 Hz or 1428.5 Hz (bins 43 / 45, ±1).
fn valid_t2(pos: usize) -> usize {
    let pos = pos as i32;
    if (43 - pos).abs() < 2 {
        43
    } else if (45 - pos).abs() < 2 {
        45
    } else {
        0
    }
}

/// Third SIT tone: 1776.7 Hz (bin 56, ±2).
fn valid_t3(pos: usize) -> usize {
    if (56 - pos as i32).abs() < 3 {
        56
    } else {
        0
    }
}

/// Prominence of bin `f` over its immediate neighbours, in dB.
fn peak_strength(mag: &[f32; BINS], f: usize) -> f32 {
    let neighbours = (mag[f - 1] + mag[f + 1]) / 2.0;
    if neighbours > 0.0 {
        10.0 * (mag[f] / neighbours).log10()
    } else {
        -96.0
    }
}

/// Streaming SIT / busy detector over 8 kHz mono PCM16.
pub struct SitDetector {
    analyzer: SpectralAnalyzer,
    freq: usize,
    len_ms: u32,
    /// Detected tone bins of the sequence; 0 when not yet seen
    t1: usize,
    t2: usize,
    t3: usize,
    /// Milliseconds since the last accepted tone
    nt_ms: u32,
    /// Run length of the busy-pair test, in ms
    busy_ms: u32,
}

impl SitDetector {
    pub fn new() -> SitDetector {
        SitDetector {
            analyzer: SpectralAnalyzer::new(),
            freq: 0,
            len_ms: 0,
            t1: 0,
            t2: 0,
            t3: 0,
            nt_ms: 0,
            busy_ms: 0,
        }
    }

    /// Process a chunk of samples of any length.
    pub fn process(&mut self, samples: &[i16]) {
        let Self {
            analyzer,
            freq,
            len_ms,
            t1,
            t2,
            t3,
            nt_ms,
            busy_ms,
        } = self;
        analyzer.feed(samples, &mut |w| {
            if w.pos > 5 && w.peak > 0.005 && w.peak > 45.0 * w.avg {
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

            // Busy runs on the raw spectrum, independent of the SIT
            // sequence: both 480 Hz (bin 15) and 620 Hz (bin 20) must
            // stand at least 1 dB over their neighbours.
            if peak_strength(&w.mag, 15) > 1.0 && peak_strength(&w.mag, 20) > 1.0 {
                *busy_ms += WINDOW_MS;
            } else {
                *busy_ms = 0;
            }

            let tone_present = (w.peak > 0.09
                && w.peak > 15.0 * w.avg
                && (w.peak - w.prev_at_peak).abs() < w.peak * 0.03
                && w.pos > 5)
                || *len_ms >= 96;
            if tone_present {
                if *t1 == 0 {
                    let hit = valid_t1(*freq);
                    if hit != 0 {
                        *t1 = hit;
                        *nt_ms = 0;
                    }
                } else if *t2 == 0 {
                    let hit = valid_t2(*freq);
                    if hit != 0 {
                        *t2 = hit;
                        *nt_ms = 0;
                    }
                } else if *t3 == 0 {
                    let hit = valid_t3(*freq);
                    if hit != 0 {
                        *t3 = hit;
                        *nt_ms = 0;
                    }
                } else {
                    *nt_ms += WINDOW_MS;
                }
            } else {
                *nt_ms += WINDOW_MS;
            }

            // Too long without progress aborts a partial sequence. A
            // completed sequence is kept; the flags are sticky.
            if *t1 != 0 && *t3 == 0 && *nt_ms > 200 {
                *t1 = 0;
                *t2 = 0;
                *t3 = 0;
            }
        });
    }

    /// Current classification, busy first, then the completed sequence.
    pub fn detection(&self) -> Option<SitCause> {
        if self.busy_ms >= 192 {
            return Some(SitCause::Busy);
        }
        if self.t3 != 0 {
            return match (self.t1, self.t2) {
                (31, 45) => Some(SitCause::NoCircuit),
                (31, 43) => Some(SitCause::VacantCircuit),
                (29, 45) => Some(SitCause::Reorder),
                (29, 43) => Some(SitCause::Intercept),
                _ => None,
            };
        }
        None
    }
}

impl Default for SitDetector {
    fn default() -> Self {
        SitDetector::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsig::{dual_sine, sine};

    #[test]
    fn silence_classifies_as_nothing() {
        let mut detector = SitDetector::new();
        detector.process(&[0i16; 16000]);
        assert_eq!(detector.detection(), None);
    }

    #[test]
    fn tone_tolerances_are_bin_centered() {
        assert_eq!(valid_t1(29), 29);
        assert_eq!(valid_t1(30), 31);
        assert_eq!(valid_t1(32), 31);
        assert_eq!(valid_t1(33), 0);
        assert_eq!(valid_t2(44), 43);
        assert_eq!(valid_t2(46), 45);
        assert_eq!(valid_t3(58), 56);
        assert_eq!(valid_t3(59), 0);
    }

    #[test]
    fn an_intercept_sequence_classifies_as_ic() {
        let mut detector = SitDetector::new();
        // 913.8 Hz, 1370.6 Hz, 1776.7 Hz: the IC ordering.
        detector.process(&sine(913.8, 16384.0, 2640));
        detector.process(&sine(1370.6, 16384.0, 2640));
        detector.process(&sine(1776.7, 16384.0, 3040));
        assert_eq!(detector.detection(), Some(SitCause::Intercept));
    }

    #[test]
    fn a_long_gap_aborts_a_partial_sequence() {
        let mut detector = SitDetector::new();
        detector.process(&sine(913.8, 16384.0, 2640));
        // Well over 200 ms of silence between the first two tones.
        detector.process(&[0i16; 4096]);
        detector.process(&sine(1370.6, 16384.0, 2640));
        detector.process(&sine(1776.7, 16384.0, 3040));
        assert_eq!(detector.detection(), None);
    }

    #[test]
    fn busy_pair_classifies_as_busy() {
        let mut detector = SitDetector::new();
        detector.process(&dual_sine(480.0, 620.0, 8192.0, 2000));
        assert_eq!(detector.detection(), Some(SitCause::Busy));
    }

    #[test]
    fn cause_strings_match_the_tool_output() {
        assert_eq!(SitCause::NoCircuit.describe(), "No circuit found");
        assert_eq!(SitCause::Intercept.describe(), "Operator intercept");
        assert_eq!(SitCause::VacantCircuit.describe(), "Vacant circuit");
        assert_eq!(SitCause::Reorder.describe(), "Reorder (system busy)");
        assert_eq!(SitCause::Busy.describe(), "Busy signal");
    }
}

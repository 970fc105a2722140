//! # FFT tone classifiers
//!
//! `switchyard-dsp` provides two real-time spectral classifiers for
//! 8 kHz mono PCM16 streams, built on one 256-point FFT front-end:
//!
//! - [`ToneDetector`]: raises sticky flags for a stable narrowband tone
//!   and for the low-frequency escape signal.
//! - [`SitDetector`]: tracks the three-tone Special Information Tone
//!   sequence preceding PSTN failure announcements and the 480 + 620 Hz
//!   busy pair, classifying the result as a [`SitCause`].
//!
//! Both accept arbitrary chunk sizes and re-buffer internally into
//! 32 ms analysis windows. Detection flags never clear; destroy and
//! recreate a detector for a fresh detection.
//!
//! The companion `tone-detect` and `sit-detect` binaries run the
//! classifiers over raw PCM16 from stdin and report the first detection.

pub mod fft;
pub mod tone;
pub mod sit;

mod analyzer;
#[cfg(test)]
pub(crate) mod testsig;

pub use sit::{SitCause, SitDetector};
pub use tone::ToneDetector;

//! Media frame values
//!
//! The planner consumes and produces [`Frame`]s at its boundaries. A frame
//! carries a payload, a sample count, and two independent notions of time:
//! an optional wall-clock delivery stamp driving the pipeline's timing
//! prediction, and optional RTP-style timing info that rides through a
//! translation chain untouched.

use crate::format::FormatMask;
use bytes::Bytes;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fallback rate used when a frame's subclass does not name a rated format.
pub const DEFAULT_SAMPLE_RATE: u32 = 8000;

/// Payload offset reserved in translator output buffers so downstream
/// consumers can prepend headers without copying.
pub const FRIENDLY_OFFSET: usize = 64;

/// What a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Audio payload
    Voice,
    /// Video payload
    Video,
    /// DTMF digit
    Dtmf,
    /// Control indication
    Control,
    /// Modem pass-through
    Modem,
    /// Empty placeholder
    Null,
    /// Comfort-noise marker; opens a silence period
    Cng,
}

/// Jitter-buffer timing info carried through translation bit-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingInfo {
    pub ts: i64,
    pub len: i64,
    pub seqno: i32,
}

/// Wall-clock instant in microseconds since the Unix epoch.
///
/// Frames with no delivery stamp (`delivery == None`) pass through the
/// pipeline without touching timing prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WallTime(i64);

impl WallTime {
    /// The current wall-clock time.
    pub fn now() -> WallTime {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        WallTime(micros)
    }

    /// Construct from microseconds since the epoch.
    pub fn from_micros(micros: i64) -> WallTime {
        WallTime(micros)
    }

    /// Microseconds since the epoch.
    pub fn micros(self) -> i64 {
        self.0
    }

    /// Offset by a signed number of microseconds.
    pub fn offset(self, micros: i64) -> WallTime {
        WallTime(self.0.saturating_add(micros))
    }

    /// Signed distance to another instant, in microseconds.
    pub fn micros_since(self, earlier: WallTime) -> i64 {
        self.0 - earlier.0
    }

    /// Advance by the duration of `samples` samples at `rate` Hz.
    pub fn advance_samples(self, samples: usize, rate: u32) -> WallTime {
        self.offset(samples_to_micros(samples, rate))
    }
}

/// Duration of `samples` samples at `rate` Hz, in microseconds.
pub fn samples_to_micros(samples: usize, rate: u32) -> i64 {
    if rate == 0 {
        return 0;
    }
    (samples as i64).saturating_mul(1_000_000) / rate as i64
}

/// A media frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Payload kind
    pub frametype: FrameType,
    /// Codec bit for voice/video frames, digit or indication otherwise
    pub subclass: FormatMask,
    /// Number of samples represented
    pub samples: usize,
    /// Encoded payload
    pub data: Bytes,
    /// Bytes of headroom the producer kept in front of the payload
    pub offset: usize,
    /// Wall-clock delivery stamp; `None` means "no timing"
    pub delivery: Option<WallTime>,
    /// RTP-style timing info, present only when the source had it
    pub timing: Option<TimingInfo>,
    /// Name of the producer, for diagnostics
    pub src: Option<String>,
}

impl Frame {
    /// A voice frame with the given subclass, samples and payload.
    pub fn voice(subclass: FormatMask, samples: usize, data: Bytes) -> Frame {
        Frame {
            frametype: FrameType::Voice,
            subclass,
            samples,
            data,
            offset: 0,
            delivery: None,
            timing: None,
            src: None,
        }
    }

    /// Sample rate implied by the frame's subclass.
    pub fn rate(&self) -> u32 {
        self.subclass
            .lowest_format()
            .map(|f| f.sample_rate())
            .filter(|&r| r != 0)
            .unwrap_or(DEFAULT_SAMPLE_RATE)
    }
}

//! Transcoder capability contract
//!
//! A [`Transcoder`] is the registered entity: the static facts the registry
//! and matrix need (formats, buffer sizing, costs are measured elsewhere)
//! plus factories for per-path state and for synthetic sample frames used
//! by cost measurement. A [`TranscoderState`] is one leg of a live chain;
//! it encodes into a core-owned [`TransBuffer`] rather than allocating its
//! own output.

use crate::error::{Result, TranslateError};
use crate::frame::{Frame, FrameType, FRIENDLY_OFFSET};
use crate::format::FormatMask;

/// Parameters of one flushed output frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    /// Payload length in bytes, counted from the buffer's data region
    pub datalen: usize,
    /// Samples represented by the payload
    pub samples: usize,
    /// Frame kind; almost always [`FrameType::Voice`]
    pub frametype: FrameType,
}

/// Output buffer owned by a chain link.
///
/// The data region starts [`FRIENDLY_OFFSET`] bytes in, so frames built
/// from it keep header headroom. `samples`/`datalen` accumulate between
/// flushes, mirroring how codec implementations batch partial frames.
#[derive(Debug)]
pub struct TransBuffer {
    buf: Vec<u8>,
    /// Samples accumulated since the last flush
    pub samples: usize,
    /// Payload bytes accumulated since the last flush
    pub datalen: usize,
}

impl TransBuffer {
    pub(crate) fn new(buf_size: usize) -> TransBuffer {
        TransBuffer {
            buf: vec![0; FRIENDLY_OFFSET + buf_size],
            samples: 0,
            datalen: 0,
        }
    }

    /// Capacity of the data region in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len() - FRIENDLY_OFFSET
    }

    /// The accumulated payload.
    pub fn data(&self) -> &[u8] {
        &self.buf[FRIENDLY_OFFSET..FRIENDLY_OFFSET + self.datalen]
    }

    /// The first `len` payload bytes; used after a flush has already
    /// reset the counters.
    pub(crate) fn payload(&self, len: usize) -> &[u8] {
        &self.buf[FRIENDLY_OFFSET..FRIENDLY_OFFSET + len]
    }

    /// Append encoded bytes to the data region.
    pub fn push_bytes(&mut self, bytes: &[u8], name: &str) -> Result<()> {
        if self.datalen + bytes.len() > self.capacity() {
            tracing::warn!(translator = name, "out of buffer space");
            return Err(TranslateError::OutOfBufferSpace { name: name.to_string() });
        }
        let start = FRIENDLY_OFFSET + self.datalen;
        self.buf[start..start + bytes.len()].copy_from_slice(bytes);
        self.datalen += bytes.len();
        Ok(())
    }

    /// Append `len` zero bytes to the data region.
    pub fn push_zeros(&mut self, len: usize, name: &str) -> Result<()> {
        if self.datalen + len > self.capacity() {
            tracing::warn!(translator = name, "out of buffer space");
            return Err(TranslateError::OutOfBufferSpace { name: name.to_string() });
        }
        let start = FRIENDLY_OFFSET + self.datalen;
        self.buf[start..start + len].fill(0);
        self.datalen += len;
        Ok(())
    }

    /// Generic flusher: take whatever has accumulated, reset the counters.
    /// Returns `None` when no samples are pending.
    pub fn take_pending(&mut self) -> Option<FrameParams> {
        if self.samples == 0 {
            return None;
        }
        let params = FrameParams {
            datalen: self.datalen,
            samples: self.samples,
            frametype: FrameType::Voice,
        };
        self.samples = 0;
        self.datalen = 0;
        Some(params)
    }
}

/// Per-chain-link transcoder state.
pub trait TranscoderState: Send {
    /// Consume one input frame, appending output into `buf` and advancing
    /// `buf.samples` by the samples produced.
    fn frame_in(&mut self, buf: &mut TransBuffer, frame: &Frame) -> Result<()>;

    /// Drain one pending output frame's parameters, or `None` when nothing
    /// is ready. The default is the generic flusher.
    fn frame_out(&mut self, buf: &mut TransBuffer) -> Option<FrameParams> {
        buf.take_pending()
    }
}

/// A registered translation capability.
pub trait Transcoder: Send + Sync {
    /// Human-readable name, e.g. `"ulawtoslin"`.
    fn name(&self) -> &str;

    /// Source format as a single-bit mask.
    fn src_format(&self) -> FormatMask;

    /// Destination format as a single-bit mask.
    fn dst_format(&self) -> FormatMask;

    /// Output buffer size in bytes. Must be non-zero; the registry rounds
    /// it up to pointer alignment.
    fn buf_size(&self) -> usize;

    /// Maximum samples buffered between flushes; 0 disables the bound
    /// check and the empty-frame PLC handling.
    fn buffer_samples(&self) -> usize {
        0
    }

    /// Whether the transcoder conceals packet loss natively (empty input
    /// frames are passed through to it instead of being swallowed).
    fn native_plc(&self) -> bool {
        false
    }

    /// Build a fresh private state for one chain leg.
    fn new_state(&self) -> Result<Box<dyn TranscoderState>>;

    /// Produce a synthetic input frame for cost measurement. Transcoders
    /// without sample frames are assigned the sentinel cost.
    fn sample(&self) -> Option<Frame> {
        None
    }
}

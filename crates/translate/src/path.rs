//! Translation path executor
//!
//! A [`TransPath`] is an ordered chain of translator instances built from
//! the path matrix. Frames are pushed through the chain one at a time;
//! the chain head keeps a prediction of the next input and output
//! delivery times so re-timed streams stay continuous across translation.

use crate::error::{Result, TranslateError};
use crate::format::Format;
use crate::frame::{Frame, FrameType, WallTime, FRIENDLY_OFFSET};
use crate::transcoder::{TransBuffer, Transcoder, TranscoderState};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// One live chain leg: a transcoder instance plus its output buffer.
///
/// Holding the `Arc` pins the transcoder (and whatever owns it) for the
/// life of the chain, so unregistration cannot invalidate a built path.
pub struct TransPvt {
    transcoder: Arc<dyn Transcoder>,
    state: Box<dyn TranscoderState>,
    buf: TransBuffer,
    src: Format,
    dst: Format,
    pending_timing: Option<crate::frame::TimingInfo>,
}

impl TransPvt {
    pub(crate) fn new(
        transcoder: Arc<dyn Transcoder>,
        buf_size: usize,
        src: Format,
        dst: Format,
    ) -> Result<TransPvt> {
        let state = transcoder.new_state()?;
        Ok(TransPvt {
            transcoder,
            state,
            buf: TransBuffer::new(buf_size),
            src,
            dst,
            pending_timing: None,
        })
    }

    pub(crate) fn src(&self) -> Format {
        self.src
    }

    pub(crate) fn dst(&self) -> Format {
        self.dst
    }

    /// Feed one frame in, dealing with the bound checks the transcoder
    /// itself does not perform.
    pub(crate) fn frame_in(&mut self, frame: &Frame) -> Result<()> {
        self.pending_timing = frame.timing;

        if frame.samples == 0 {
            warn!(translator = self.transcoder.name(), "no samples in input frame");
        }
        let buffer_samples = self.transcoder.buffer_samples();
        if buffer_samples > 0 {
            if frame.data.is_empty() && !self.transcoder.native_plc() {
                // Empty frame and no native PLC: consume silently.
                return Ok(());
            }
            if self.buf.samples + frame.samples > buffer_samples {
                warn!(translator = self.transcoder.name(), "out of buffer space");
                return Err(TranslateError::OutOfBufferSpace {
                    name: self.transcoder.name().to_string(),
                });
            }
        }

        let samples_before = self.buf.samples;
        self.state.frame_in(&mut self.buf, frame)?;
        if self.buf.samples == samples_before {
            warn!(
                translator = self.transcoder.name(),
                samples = self.buf.samples,
                "translator did not update samples"
            );
        }
        Ok(())
    }

    /// Drain one output frame, if any is pending.
    pub(crate) fn frame_out(&mut self) -> Option<Frame> {
        let params = self.state.frame_out(&mut self.buf)?;
        Some(Frame {
            frametype: params.frametype,
            subclass: self.dst.mask(),
            samples: params.samples,
            data: Bytes::copy_from_slice(self.buf.payload(params.datalen)),
            offset: FRIENDLY_OFFSET,
            delivery: None,
            timing: self.pending_timing,
            src: Some(self.transcoder.name().to_string()),
        })
    }
}

impl fmt::Debug for TransPvt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransPvt")
            .field("translator", &self.transcoder.name())
            .field("src", &self.src)
            .field("dst", &self.dst)
            .finish()
    }
}

/// A chain of translator instances from a source to a destination format.
///
/// An empty chain is valid: it is the identity translation and frames pass
/// through untouched.
#[derive(Debug, Default)]
pub struct TransPath {
    links: Vec<TransPvt>,
    nextin: Option<WallTime>,
    nextout: Option<WallTime>,
}

impl TransPath {
    pub(crate) fn new(links: Vec<TransPvt>) -> TransPath {
        TransPath {
            links,
            nextin: None,
            nextout: None,
        }
    }

    /// Number of legs in the chain.
    pub fn steps(&self) -> usize {
        self.links.len()
    }

    /// True for the identity chain.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Predicted delivery time of the next input frame.
    pub fn next_input_time(&self) -> Option<WallTime> {
        self.nextin
    }

    /// Predicted delivery time of the next output frame.
    pub fn next_output_time(&self) -> Option<WallTime> {
        self.nextout
    }

    /// Push one frame through every link of the chain.
    ///
    /// Returns `Ok(None)` when the chain consumed the frame without
    /// producing output (codecs batching partial frames). Timed frames
    /// get their delivery stamp rewritten from the output prediction;
    /// untimed frames pass their timing info through bit-exact.
    pub fn translate(&mut self, frame: &Frame) -> Result<Option<Frame>> {
        let Some((head, rest)) = self.links.split_first_mut() else {
            return Ok(Some(frame.clone()));
        };

        if let Some(delivery) = frame.delivery {
            match self.nextin {
                Some(nextin) => {
                    if delivery != nextin {
                        // Delivery diverged from the prediction. Shift a
                        // live output prediction by the same amount.
                        if let Some(nextout) = self.nextout {
                            self.nextout =
                                Some(nextout.offset(delivery.micros_since(nextin)));
                        }
                        self.nextin = Some(delivery);
                    }
                }
                None => {
                    // First timestamped frame seeds both predictions.
                    self.nextin = Some(delivery);
                    self.nextout = Some(delivery);
                }
            }
            // Predict the next incoming frame.
            self.nextin = self
                .nextin
                .map(|t| t.advance_samples(frame.samples, frame.rate()));
        }

        head.frame_in(frame)?;
        let mut out = head.frame_out();
        for link in rest {
            let Some(ref current) = out else {
                break;
            };
            link.frame_in(current)?;
            out = link.frame_out();
        }

        let Some(mut out) = out else {
            return Ok(None);
        };

        if frame.delivery.is_some() {
            // Regenerate the prediction after a discontinuity.
            if self.nextout.is_none() {
                self.nextout = Some(WallTime::now());
            }
            out.delivery = self.nextout;
            // Predict the next outgoing frame from this one's length.
            self.nextout = self
                .nextout
                .map(|t| t.advance_samples(out.samples, out.rate()));
        } else {
            out.delivery = None;
            out.timing = frame.timing;
        }

        // Entering a silence period invalidates the prediction.
        if out.frametype == FrameType::Cng {
            self.nextout = None;
        }
        Ok(Some(out))
    }
}

impl fmt::Display for TransPath {
    /// Renders `"src->hop->...->dst"`; the identity chain renders empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.links.first() else {
            return Ok(());
        };
        write!(f, "{}", first.src())?;
        for link in &self.links {
            write!(f, "->{}", link.dst())?;
        }
        Ok(())
    }
}

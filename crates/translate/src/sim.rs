//! Simulation transcoders
//!
//! Byte-repacking stand-ins for real codec modules: they honour the whole
//! capability contract (sample frames, buffer accounting, measurable
//! cost, resampling sample counts) without doing codec math, so the
//! planner, the CLI and the tests can run against a fully populated
//! matrix. Payload bytes are zeros.

use crate::error::Result;
use crate::format::{Format, FormatMask};
use crate::frame::Frame;
use crate::registry::{TranslatorId, TranslatorRegistry};
use crate::transcoder::{TransBuffer, Transcoder, TranscoderState};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Samples buffered between flushes, matching the classic codec modules.
const SIM_BUFFER_SAMPLES: usize = 8192;

/// Payload size of `samples` samples in `fmt`, using the classic 20 ms
/// frame sizes of each codec.
fn bytes_for_samples(fmt: Format, samples: usize) -> usize {
    match fmt {
        Format::Slin | Format::Slin16 => samples * 2,
        Format::Ulaw | Format::Alaw => samples,
        Format::G722 | Format::Adpcm | Format::G726 | Format::G726Aal2 => samples / 2,
        Format::Gsm | Format::Speex => samples * 33 / 160,
        Format::G729 => samples / 8,
        Format::G723 => samples * 24 / 240,
        Format::Ilbc => samples * 50 / 240,
        Format::Lpc10 => samples * 7 / 180,
        Format::Siren7 => samples * 60 / 320,
        Format::Siren14 => samples * 120 / 640,
        _ => samples,
    }
}

/// A simulated translator between two audio formats.
pub struct SimTranscoder {
    name: String,
    src: Format,
    dst: Format,
    busy_work: Duration,
}

impl SimTranscoder {
    /// A simulation translating `src` to `dst`, named `"<src>to<dst>"`.
    pub fn new(src: Format, dst: Format) -> SimTranscoder {
        SimTranscoder {
            name: format!("{}to{}", src.name(), dst.name()),
            src,
            dst,
            busy_work: Duration::ZERO,
        }
    }

    /// Burn roughly `micros` of wall-clock per input frame, so tests can
    /// give duplicate providers distinguishable measured costs.
    pub fn with_busy_work(mut self, micros: u64) -> SimTranscoder {
        self.busy_work = Duration::from_micros(micros);
        self
    }

    /// Override the generated name.
    pub fn with_name(mut self, name: &str) -> SimTranscoder {
        self.name = name.to_string();
        self
    }
}

struct SimState {
    name: String,
    src_rate: u32,
    dst_rate: u32,
    dst: Format,
    busy_work: Duration,
}

impl TranscoderState for SimState {
    fn frame_in(&mut self, buf: &mut TransBuffer, frame: &Frame) -> Result<()> {
        if !self.busy_work.is_zero() {
            std::thread::sleep(self.busy_work);
        }
        let out_samples = frame.samples * self.dst_rate as usize / self.src_rate as usize;
        buf.push_zeros(bytes_for_samples(self.dst, out_samples), &self.name)?;
        buf.samples += out_samples;
        Ok(())
    }
}

impl Transcoder for SimTranscoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn src_format(&self) -> FormatMask {
        self.src.mask()
    }

    fn dst_format(&self) -> FormatMask {
        self.dst.mask()
    }

    fn buf_size(&self) -> usize {
        bytes_for_samples(self.dst, SIM_BUFFER_SAMPLES).max(64)
    }

    fn buffer_samples(&self) -> usize {
        SIM_BUFFER_SAMPLES
    }

    fn new_state(&self) -> Result<Box<dyn TranscoderState>> {
        Ok(Box::new(SimState {
            name: self.name.clone(),
            src_rate: self.src.sample_rate().max(1),
            dst_rate: self.dst.sample_rate().max(1),
            dst: self.dst,
            busy_work: self.busy_work,
        }))
    }

    fn sample(&self) -> Option<Frame> {
        // One 20 ms frame of silence in the source format.
        let samples = self.src.sample_rate() as usize / 50;
        let mut frame = Frame::voice(
            self.src.mask(),
            samples,
            Bytes::from(vec![0u8; bytes_for_samples(self.src, samples)]),
        );
        frame.src = Some(self.name.clone());
        Some(frame)
    }
}

/// The standard simulation set: G.711/GSM against slin at 8 kHz, G.722
/// against slin16, and the slin<->slin16 resampling pair joining them.
pub fn standard_set() -> Vec<SimTranscoder> {
    let pairs = [
        (Format::Ulaw, Format::Slin),
        (Format::Alaw, Format::Slin),
        (Format::Gsm, Format::Slin),
        (Format::G722, Format::Slin16),
    ];
    let mut set = Vec::new();
    for (lossy, lin) in pairs {
        set.push(SimTranscoder::new(lossy, lin));
        set.push(SimTranscoder::new(lin, lossy));
    }
    set.push(SimTranscoder::new(Format::Slin, Format::Slin16));
    set.push(SimTranscoder::new(Format::Slin16, Format::Slin));
    set
}

/// Register the standard simulation set into `registry`.
pub fn register_standard_set(registry: &TranslatorRegistry) -> Result<Vec<TranslatorId>> {
    standard_set()
        .into_iter()
        .map(|t| registry.register(Arc::new(t)))
        .collect()
}

//! Translator registry
//!
//! The process-wide list of registered transcoders and the path matrix
//! derived from it. Both live behind one read/write lock: registration,
//! unregistration, (de)activation and recalculation take the write lock
//! and rebuild the matrix; path building and the query surface take the
//! read lock.

use crate::error::{Result, TranslateError};
use crate::format::{Format, FormatMask, MAX_FORMAT};
use crate::matrix::{DirectLeg, TransMatrix};
use crate::path::{TransPath, TransPvt};
use crate::transcoder::Transcoder;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Cost assigned to translators that cannot be measured. High enough that
/// they are chosen last, low enough not to overflow summed path costs.
pub const SENTINEL_COST: u32 = 999_999;

/// Upper bound on `recalc` measurement seconds.
pub const MAX_RECALC: u32 = 1000;

/// Stable handle to a registered translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranslatorId(u64);

/// Aggregate facts about a known path, for diagnostics and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathInfo {
    /// Cumulative cost in µs per second of output
    pub cost: u32,
    /// 1 for a direct path, 2 for any multistep path
    pub steps: u32,
    /// Summed rate-change class
    pub rate_change: u32,
}

pub(crate) struct TranslatorEntry {
    pub id: TranslatorId,
    pub transcoder: Arc<dyn Transcoder>,
    pub src: Format,
    pub dst: Format,
    pub buf_size: usize,
    pub cost: u32,
    pub active: bool,
}

pub(crate) struct RegistryCore {
    pub translators: Vec<TranslatorEntry>,
    pub matrix: TransMatrix,
    next_id: u64,
}

impl RegistryCore {
    fn entry(&self, id: TranslatorId) -> Option<&TranslatorEntry> {
        self.translators.iter().find(|e| e.id == id)
    }

    /// Rebuild the matrix from the active translators, optionally
    /// re-measuring their costs over `samples` seconds first.
    fn rebuild_matrix(&mut self, samples: u32) {
        if samples > 0 {
            for entry in &mut self.translators {
                if entry.active {
                    entry.cost = calc_cost(&entry.transcoder, entry.buf_size, samples);
                }
            }
        }
        let legs = self.translators.iter().filter(|e| e.active).map(|e| DirectLeg {
            id: e.id,
            src: e.src,
            dst: e.dst,
            cost: e.cost,
        });
        self.matrix.rebuild(legs);
    }
}

/// The translator list and path matrix under a single read/write lock.
pub struct TranslatorRegistry {
    core: RwLock<RegistryCore>,
}

static GLOBAL: Lazy<TranslatorRegistry> = Lazy::new(TranslatorRegistry::new);

/// The process-wide registry.
pub fn global() -> &'static TranslatorRegistry {
    &GLOBAL
}

impl TranslatorRegistry {
    /// An empty registry.
    pub fn new() -> TranslatorRegistry {
        TranslatorRegistry {
            core: RwLock::new(RegistryCore {
                translators: Vec::new(),
                matrix: TransMatrix::new(),
                next_id: 1,
            }),
        }
    }

    /// Register a transcoder: validate it, measure its cost, insert it
    /// into the list (cheapest first within its format pair) and rebuild
    /// the matrix.
    pub fn register(&self, transcoder: Arc<dyn Transcoder>) -> Result<TranslatorId> {
        let name = transcoder.name().to_string();

        if transcoder.buf_size() == 0 {
            warn!(translator = name.as_str(), "empty buf size, you need to supply one");
            return Err(TranslateError::EmptyBufferSize { name });
        }
        let src = match transcoder.src_format().lowest_format() {
            Some(f) => f,
            None => {
                warn!(translator = name.as_str(), "starting codec is not valid");
                return Err(TranslateError::InvalidFormat {
                    end: "starting",
                    mask: transcoder.src_format(),
                });
            }
        };
        let dst = match transcoder.dst_format().lowest_format() {
            Some(f) => f,
            None => {
                warn!(translator = name.as_str(), "ending codec is not valid");
                return Err(TranslateError::InvalidFormat {
                    end: "ending",
                    mask: transcoder.dst_format(),
                });
            }
        };
        if src == dst {
            warn!(translator = name.as_str(), format = %src, "source and destination are the same");
            return Err(TranslateError::SameFormat { name, format: src });
        }

        // Round the buffer up to pointer alignment.
        let align = std::mem::align_of::<*const u8>();
        let buf_size = (transcoder.buf_size() + align - 1) / align * align;

        let cost = calc_cost(&transcoder, buf_size, 1);
        debug!(
            translator = name.as_str(),
            src = %src,
            dst = %dst,
            cost,
            "registered translator"
        );

        let mut core = self.core.write();
        let id = TranslatorId(core.next_id);
        core.next_id += 1;
        let entry = TranslatorEntry {
            id,
            transcoder,
            src,
            dst,
            buf_size,
            cost,
            active: true,
        };

        // Keep duplicate (src, dst) providers ordered ascending by cost so
        // the cheapest is seen first during matrix rebuilds.
        let same_pair = |e: &TranslatorEntry| e.src == src && e.dst == dst;
        let pos = core
            .translators
            .iter()
            .position(|e| same_pair(e) && e.cost > cost)
            .or_else(|| {
                core.translators
                    .iter()
                    .rposition(|e| same_pair(e))
                    .map(|i| i + 1)
            })
            .unwrap_or(0);
        core.translators.insert(pos, entry);

        core.rebuild_matrix(0);
        Ok(id)
    }

    /// Remove a translator from the list and rebuild the matrix.
    pub fn unregister(&self, id: TranslatorId) -> Result<()> {
        let mut core = self.core.write();
        let Some(pos) = core.translators.iter().position(|e| e.id == id) else {
            return Err(TranslateError::NotRegistered);
        };
        let entry = core.translators.remove(pos);
        debug!(
            translator = entry.transcoder.name(),
            src = %entry.src,
            dst = %entry.dst,
            "unregistered translator"
        );
        core.rebuild_matrix(0);
        Ok(())
    }

    /// Mark a translator usable by the matrix build.
    pub fn activate(&self, id: TranslatorId) -> Result<()> {
        self.set_active(id, true)
    }

    /// Keep a translator on the list but hide it from the matrix build.
    pub fn deactivate(&self, id: TranslatorId) -> Result<()> {
        self.set_active(id, false)
    }

    fn set_active(&self, id: TranslatorId, active: bool) -> Result<()> {
        let mut core = self.core.write();
        let Some(entry) = core.translators.iter_mut().find(|e| e.id == id) else {
            return Err(TranslateError::NotRegistered);
        };
        entry.active = active;
        core.rebuild_matrix(0);
        Ok(())
    }

    /// Re-measure costs over `seconds` of synthetic audio and rebuild.
    pub fn recalc(&self, seconds: u32) {
        let seconds = seconds.clamp(1, MAX_RECALC);
        self.core.write().rebuild_matrix(seconds);
    }

    /// Build a chain of translator instances from `src` to `dst`.
    ///
    /// `build_path(x, x)` yields the empty (identity) chain. A hop whose
    /// state cannot be constructed aborts the build; already-built links
    /// are torn down with the partial chain.
    pub fn build_path(&self, dst: FormatMask, src: FormatMask) -> Result<TransPath> {
        let src = src.lowest_format().ok_or_else(|| {
            warn!("no translator path: starting codec is not valid");
            TranslateError::InvalidFormat { end: "starting", mask: src }
        })?;
        let dst = dst.lowest_format().ok_or_else(|| {
            warn!("no translator path: ending codec is not valid");
            TranslateError::InvalidFormat { end: "ending", mask: dst }
        })?;

        let core = self.core.read();
        let mut links = Vec::new();
        let mut cur = src;
        while cur != dst {
            let cell = core.matrix.cell(cur.index(), dst.index());
            let entry = cell.step.and_then(|id| core.entry(id));
            let Some(entry) = entry else {
                warn!(src = %cur, dst = %dst, "no translator path");
                return Err(TranslateError::NoPath { src: cur, dst });
            };
            let pvt = TransPvt::new(
                entry.transcoder.clone(),
                entry.buf_size,
                entry.src,
                entry.dst,
            )
            .map_err(|e| {
                warn!(src = %entry.src, dst = %entry.dst, "failed to build translator step");
                TranslateError::StepFailed {
                    src: entry.src,
                    dst: entry.dst,
                    reason: e.to_string(),
                }
            })?;
            links.push(pvt);
            cur = entry.dst;
        }
        Ok(TransPath::new(links))
    }

    /// Pick the best (destination, source) pair out of two format sets.
    ///
    /// The chosen formats are written back through the mutable masks.
    /// A source set covering all of audio with μ-law among the
    /// destinations short-circuits to μ-law (the unconnected-local-channel
    /// policy); a common audio format short-circuits to the common format
    /// with the highest sample rate. Only then is the matrix consulted.
    pub fn best_choice(&self, dst: &mut FormatMask, srcs: &mut FormatMask) -> Result<()> {
        if srcs.audio() == FormatMask::AUDIO && dst.contains(Format::Ulaw) {
            *srcs = Format::Ulaw.mask();
            *dst = Format::Ulaw.mask();
            return Ok(());
        }

        let common = (*dst & *srcs).audio();
        if !common.is_empty() {
            let mut best: Option<Format> = None;
            for cur in common.formats() {
                match best {
                    None => best = Some(cur),
                    Some(b) if b.sample_rate() < cur.sample_rate() => best = Some(cur),
                    _ => {}
                }
            }
            if let Some(best) = best {
                *srcs = best.mask();
                *dst = best.mask();
                return Ok(());
            }
            return Err(TranslateError::NoTranslatorAvailable);
        }

        let core = self.core.read();
        let mut best: Option<(Format, Format)> = None;
        let mut besttime = u32::MAX;
        let mut beststeps = u32::MAX;
        let mut best_rate_change = u32::MAX;
        for cur_dst in dst.audio().formats() {
            for cur_src in srcs.audio().formats() {
                let cell = core.matrix.cell(cur_src.index(), cur_dst.index());
                if cell.step.is_none() {
                    continue;
                }
                let steps = cell.multistep as u32;
                let better = cell.rate_change < best_rate_change
                    || (cell.rate_change <= best_rate_change
                        && (cell.cost < besttime || steps < beststeps));
                if better {
                    best = Some((cur_src, cur_dst));
                    besttime = cell.cost;
                    beststeps = steps;
                    best_rate_change = cell.rate_change;
                }
            }
        }
        match best {
            Some((s, d)) => {
                *srcs = s.mask();
                *dst = d.mask();
                Ok(())
            }
            None => Err(TranslateError::NoTranslatorAvailable),
        }
    }

    /// Step count of the known path between two formats: 1 when a single
    /// translator covers it, 2 when several do.
    pub fn path_steps(&self, dst: FormatMask, src: FormatMask) -> Result<u32> {
        let src = src.lowest_format().ok_or_else(|| {
            warn!("no translator path: starting codec is not valid");
            TranslateError::InvalidFormat { end: "starting", mask: src }
        })?;
        let dst_f = dst.lowest_format().ok_or_else(|| {
            warn!("no translator path: ending codec is not valid");
            TranslateError::InvalidFormat { end: "ending", mask: dst }
        })?;

        let core = self.core.read();
        let cell = core.matrix.cell(src.index(), dst_f.index());
        if cell.step.is_some() {
            Ok(cell.multistep as u32 + 1)
        } else {
            Err(TranslateError::NoPath { src, dst: dst_f })
        }
    }

    /// Filter `dest` down to formats reachable from `src` in both
    /// directions. Audio and video partitions are filtered against the
    /// source format of their own partition.
    pub fn available_formats(&self, dest: FormatMask, src: FormatMask) -> FormatMask {
        // Without a source format every destination has to be tried.
        if src.is_empty() {
            return dest;
        }

        let mut res = dest;
        let core = self.core.read();
        for (partition, src_fmt) in [
            (FormatMask::AUDIO, src.audio().lowest_format()),
            (FormatMask::VIDEO, src.video().lowest_format()),
        ] {
            let Some(src_fmt) = src_fmt else {
                continue;
            };
            for x in partition.formats() {
                if !dest.contains(x) || src.contains(x) {
                    continue;
                }
                // Keep the bit only when a path exists both ways.
                if core.matrix.cell(src_fmt.index(), x.index()).step.is_none()
                    || core.matrix.cell(x.index(), src_fmt.index()).step.is_none()
                {
                    res.remove(x);
                }
            }
        }
        res
    }

    /// Aggregate facts about the known path between two formats.
    pub fn path_info(&self, dst: FormatMask, src: FormatMask) -> Option<PathInfo> {
        let src = src.lowest_format()?;
        let dst = dst.lowest_format()?;
        let core = self.core.read();
        let cell = core.matrix.cell(src.index(), dst.index());
        cell.step.map(|_| PathInfo {
            cost: cell.cost,
            steps: cell.multistep as u32 + 1,
            rate_change: cell.rate_change,
        })
    }

    /// Render the matrix path from `src` to `dst` as `"a->b->c"`, or
    /// `None` when no path is known.
    pub fn path_description(&self, dst: Format, src: Format) -> Option<String> {
        let core = self.core.read();
        if core.matrix.cell(src.index(), dst.index()).step.is_none() {
            return None;
        }
        let mut out = src.name().to_string();
        let mut cur = src;
        while cur != dst {
            let entry = core
                .matrix
                .cell(cur.index(), dst.index())
                .step
                .and_then(|id| core.entry(id))?;
            out.push_str("->");
            out.push_str(entry.dst.name());
            cur = entry.dst;
        }
        Some(out)
    }

    /// Current measured cost of the direct or composite path per matrix
    /// cell, for every (src, dst) pair of dense indices. Used by the CLI.
    pub fn cost_table(&self) -> Vec<Vec<Option<u32>>> {
        let core = self.core.read();
        (0..MAX_FORMAT)
            .map(|x| {
                (0..MAX_FORMAT)
                    .map(|y| {
                        let cell = core.matrix.cell(x, y);
                        cell.step.map(|_| cell.cost)
                    })
                    .collect()
            })
            .collect()
    }

    /// Number of translators on the list (active or not).
    pub fn len(&self) -> usize {
        self.core.read().translators.len()
    }

    /// Measured cost of one registered translator, in µs per second of
    /// output.
    pub fn translator_cost(&self, id: TranslatorId) -> Option<u32> {
        self.core.read().entry(id).map(|e| e.cost)
    }
}

impl Default for TranslatorRegistry {
    fn default() -> Self {
        TranslatorRegistry::new()
    }
}

/// Measure a transcoder's cost in µs per second of produced output by
/// driving its own sample frames through a fresh instance.
///
/// Transcoders without sample frames, or whose instance cannot be built,
/// get [`SENTINEL_COST`] and stay registered as a last resort.
fn calc_cost(t: &Arc<dyn Transcoder>, buf_size: usize, seconds: u32) -> u32 {
    let seconds = seconds.max(1);
    let name = t.name();

    let out_rate = t
        .dst_format()
        .lowest_format()
        .map(|f| f.sample_rate())
        .unwrap_or(0);
    if out_rate == 0 {
        warn!(translator = name, "no output rate to measure against");
        return SENTINEL_COST;
    }
    if t.sample().is_none() {
        warn!(translator = name, "translator does not produce sample frames");
        return SENTINEL_COST;
    }
    let (src, dst) = match (
        t.src_format().lowest_format(),
        t.dst_format().lowest_format(),
    ) {
        (Some(s), Some(d)) => (s, d),
        _ => return SENTINEL_COST,
    };
    let mut pvt = match TransPvt::new(t.clone(), buf_size, src, dst) {
        Ok(pvt) => pvt,
        Err(_) => {
            warn!(
                translator = name,
                "translator appears to be broken and will probably fail"
            );
            return SENTINEL_COST;
        }
    };

    let start = Instant::now();
    let target = seconds as usize * out_rate as usize;
    let mut num_samples = 0usize;
    let mut stalled = 0u32;
    while num_samples < target {
        let Some(frame) = t.sample() else {
            warn!(translator = name, "translator failed to produce a sample frame");
            return SENTINEL_COST;
        };
        if pvt.frame_in(&frame).is_err() {
            return SENTINEL_COST;
        }
        let mut produced = false;
        while let Some(out) = pvt.frame_out() {
            num_samples += out.samples;
            produced = true;
        }
        // A transcoder that never emits output cannot be measured.
        if produced {
            stalled = 0;
        } else {
            stalled += 1;
            if stalled > 10_000 {
                warn!(translator = name, "translator produced no output while measuring");
                return SENTINEL_COST;
            }
        }
    }

    let cost = start.elapsed().as_micros() as u64 / seconds as u64;
    cost.clamp(1, u32::MAX as u64) as u32
}

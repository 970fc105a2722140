//! # Media translation planner
//!
//! `switchyard-translate` maintains a registry of per-codec transcoders
//! and, for every ordered pair of supported formats, the cheapest chain of
//! transcoders connecting them. It covers:
//!
//! - **Format domain**: dense-indexed codec identifiers with bitmask sets
//!   partitioned into audio and video.
//! - **Translator registry**: thread-safe (de)registration and activation
//!   with empirical per-translator cost measurement.
//! - **Path matrix**: a dense table rebuilt by a quality-first
//!   Floyd–Warshall relaxation; sample-rate quality dominates cost.
//! - **Path executor**: chains of live transcoder instances with
//!   delivery-time prediction across translation.
//! - **Query surface**: best-choice format negotiation, path step counts,
//!   bidirectional reachability filtering and a CLI rendering of it all.
//!
//! The codecs themselves live elsewhere; this crate consumes the
//! [`transcoder::Transcoder`] capability and ships byte-accurate
//! [`sim`] stand-ins for tooling and tests.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use switchyard_translate::format::Format;
//! use switchyard_translate::registry::TranslatorRegistry;
//! use switchyard_translate::sim::SimTranscoder;
//!
//! let registry = TranslatorRegistry::new();
//! registry.register(Arc::new(SimTranscoder::new(Format::Ulaw, Format::Slin)))?;
//!
//! let path = registry.build_path(Format::Slin.mask(), Format::Ulaw.mask())?;
//! assert_eq!(path.steps(), 1);
//! # Ok::<(), switchyard_translate::error::TranslateError>(())
//! ```

pub mod cli;
pub mod error;
pub mod format;
pub mod frame;
pub mod matrix;
pub mod path;
pub mod registry;
pub mod sim;
pub mod transcoder;

pub use error::{Result, TranslateError};
pub use format::{Format, FormatMask, MAX_FORMAT};
pub use frame::{Frame, FrameType, TimingInfo, WallTime};
pub use matrix::{rate_change_for, RateChange};
pub use path::TransPath;
pub use registry::{global, PathInfo, TranslatorId, TranslatorRegistry};
pub use transcoder::{Transcoder, TranscoderState};

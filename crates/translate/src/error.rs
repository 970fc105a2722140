//! Error handling for the translation planner

use crate::format::{Format, FormatMask};
use thiserror::Error;

/// Result type alias for planner operations
pub type Result<T> = std::result::Result<T, TranslateError>;

/// Errors produced by the registry, the path builder and the frame pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslateError {
    /// A mask that should name one supported format names none
    #[error("no valid {end} format in mask {mask}")]
    InvalidFormat {
        /// "starting" or "ending", matching the path direction
        end: &'static str,
        /// The offending mask
        mask: FormatMask,
    },

    /// A translator was registered with a zero output buffer size
    #[error("translator '{name}' registered with empty buffer size")]
    EmptyBufferSize { name: String },

    /// A translator was registered with identical source and destination
    #[error("translator '{name}' translates {format} to itself")]
    SameFormat { name: String, format: Format },

    /// The matrix holds no path between the requested formats
    #[error("no translator path from {src} to {dst}")]
    NoPath { src: Format, dst: Format },

    /// No registered translator satisfies a best-choice query
    #[error("no translation available between the requested format sets")]
    NoTranslatorAvailable,

    /// A chain link's private state could not be constructed
    #[error("failed to build translator step from {src} to {dst}: {reason}")]
    StepFailed {
        src: Format,
        dst: Format,
        reason: String,
    },

    /// More samples were pushed into a translator than it buffers
    #[error("out of buffer space in translator '{name}'")]
    OutOfBufferSpace { name: String },

    /// The translator handed to unregister was never registered
    #[error("translator is not on the registry list")]
    NotRegistered,
}

//! Error types for decoding rrdtool dumps.

use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;

use thiserror::Error;

use crate::coerce::FieldKind;

/// The main error type for all rrdump operations.
///
/// A decode either produces a complete [`Archive`](crate::Archive) or one of
/// these errors; there is no partially decoded result.
#[derive(Error, Debug)]
pub enum RrdError {
    /// The dump bytes could not be obtained.
    #[error("acquire error: {0}")]
    Acquire(#[from] AcquireError),

    /// The buffer is not well-formed markup or lacks a required element.
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),

    /// A leaf element's text could not be coerced to its field type.
    #[error("field error: {0}")]
    Field(#[from] FieldError),
}

/// Errors raised while obtaining dump bytes, before any decoding happens.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// The dump program could not be started.
    #[error("failed to run '{}': {source}", program.display())]
    Spawn {
        /// The program that failed to start.
        program: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The dump program ran but exited unsuccessfully.
    #[error("'{} dump {}' exited with {}: {stderr}", program.display(), path.display(), code.map_or_else(|| "signal".to_string(), |c| format!("status {c}")))]
    Failed {
        /// The program that was run.
        program: PathBuf,
        /// The database path passed to the program.
        path: PathBuf,
        /// Exit code, or `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// A saved dump file could not be read.
    #[error("failed to read dump '{}': {source}", path.display())]
    Read {
        /// The dump file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors describing malformed or incomplete markup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// The buffer is empty or contains only whitespace.
    #[error("dump is empty")]
    Empty,

    /// The markup tokenizer rejected the input.
    #[error("malformed markup at byte {position}: {reason}")]
    Markup {
        /// Byte offset into the buffer where the problem was detected.
        position: u64,
        /// Description of the problem.
        reason: String,
    },

    /// The input ended while an element was still open.
    #[error("unexpected end of input inside <{element}>")]
    Unclosed {
        /// Name of the innermost open element.
        element: String,
    },

    /// The input contains no element at all.
    #[error("no root element found")]
    NoRoot,

    /// The root element is not `rrd`.
    #[error("unexpected root element <{found}>, expected <rrd>")]
    UnexpectedRoot {
        /// The root element name that was found.
        found: String,
    },

    /// A required element is absent.
    #[error("missing required element {path}")]
    MissingElement {
        /// Element path, e.g. `rrd/rra[0]/cdp_prep`.
        path: String,
    },
}

/// A leaf element whose text does not fit its declared field type.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{path}: cannot decode {raw:?} as {kind}: {source}")]
pub struct FieldError {
    /// Element path of the offending leaf.
    pub path: String,
    /// The semantic type the leaf is declared as.
    pub kind: FieldKind,
    /// The raw element text, untrimmed.
    pub raw: String,
    /// Why the coercion failed.
    #[source]
    pub source: CoerceError,
}

/// Errors produced by the individual coercion rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoerceError {
    /// The text is not a base-10 signed integer.
    #[error("invalid integer: {0}")]
    InvalidInteger(#[from] ParseIntError),

    /// The text is not a floating-point literal.
    #[error("invalid float: {0}")]
    InvalidFloat(#[from] ParseFloatError),

    /// A duration was given as a negative number of seconds.
    #[error("negative duration: {secs}s")]
    NegativeDuration {
        /// The parsed number of seconds.
        secs: i64,
    },

    /// A timestamp cannot be represented as a UTC date-time.
    #[error("timestamp {secs} is out of range")]
    TimestampOutOfRange {
        /// The parsed number of seconds since the epoch.
        secs: i64,
    },
}

/// Type alias for `Result<T, RrdError>`.
pub type Result<T> = std::result::Result<T, RrdError>;

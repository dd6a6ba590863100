//! Error types for the file filter pipeline.
//!
//! Errors are layered the same way the pipeline is:
//!
//! - [`ConfigError`] - configuration loading and consistency checks
//! - [`SourceError`] - reading records from the input file
//! - [`SinkError`] - writing records to the filtered/rejected outputs
//! - [`StageError`] - any of the above, as seen by the controller
//! - [`PipelineError`] - top-level failure carrying the stage and partial counts
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::ProcessingResult;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised before any input or output file is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read configuration '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid YAML or wrong field types.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A required field is missing or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The declared file type has no registered processor.
    #[error("Unsupported file type: {tag}. Supported types: {supported}")]
    UnsupportedFormat { tag: String, supported: String },

    /// The fixed-delimiter format needs a non-empty delimiter.
    #[error("Delimiter must not be empty")]
    EmptyDelimiter,

    /// The encoding label is not known.
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// An output file name cannot be derived from the configuration.
    #[error("Cannot resolve {which} output file name: {reason}")]
    UnresolvableOutput { which: &'static str, reason: String },
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while opening or reading the input file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Failed to read from the input.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// The delimited-text grammar rejected a record.
    #[error("Line {line}: invalid delimited record: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    /// The text breaks the quoted-field grammar.
    #[error("Line {line}: malformed delimited record: {reason}")]
    Malformed { line: u64, reason: &'static str },

    /// The workbook could not be opened or decoded.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// The workbook has no sheet to read.
    #[error("Workbook contains no worksheet")]
    EmptyWorkbook,
}

impl From<calamine::Error> for SourceError {
    fn from(err: calamine::Error) -> Self {
        SourceError::Spreadsheet(err.to_string())
    }
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors while writing to an output file.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to create or write the output file.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialise a delimited record.
    #[error("Failed to write delimited record: {0}")]
    Csv(#[from] csv::Error),

    /// The spreadsheet writer failed.
    #[error("Spreadsheet write error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// A row is wider than a worksheet allows.
    #[error("Row has {0} columns, more than a worksheet can hold")]
    TooManyColumns(usize),
}

// =============================================================================
// Stage Errors
// =============================================================================

/// Any failure the controller can hit, regardless of which side raised it.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Controller states a run can fail in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    Opening,
    StreamingHeader,
    StreamingBody,
    Finalizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::Opening => "opening",
            Stage::StreamingHeader => "header streaming",
            Stage::StreamingBody => "body streaming",
            Stage::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level failure of one pipeline run.
///
/// This is the error returned by [`crate::pipeline::process`]. It names the
/// processor and the stage that failed and carries the counts gathered before
/// the failure, which may be partial.
#[derive(Debug, Error)]
#[error("Processing failed in {processor} during {stage}: {cause}")]
pub struct PipelineError {
    pub processor: &'static str,
    pub stage: Stage,
    pub result: ProcessingResult,
    #[source]
    pub cause: StageError,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for reading records.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for writing records.
pub type SinkResult<T> = Result<T, SinkError>;

//! # filefilter - rule-based splitting of tabular data files
//!
//! filefilter reads one CSV, fixed-delimiter text or spreadsheet file, checks
//! every record against column-level rules and writes accepted and rejected
//! records to two separate outputs in the input's own format.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Input file  │────▶│   Source    │────▶│ Validation  │──┬─▶│  Filtered   │
//! │ CSV/TXT/XLS │     │ (per format)│     │   Engine    │  │  │    sink     │
//! └─────────────┘     └─────────────┘     └─────────────┘  │  └─────────────┘
//!                                                          │  ┌─────────────┐
//!                                                          └─▶│  Rejected   │
//!                                                             │ sink (opt.) │
//!                                                             └─────────────┘
//! ```
//!
//! Records stream one at a time; text records keep their raw form and
//! spreadsheet rows keep their typed cells, so outputs reproduce the input.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use filefilter::{process, FilterConfig, ValidationRule};
//!
//! let mut config = FilterConfig::new("sourcefile/SampleData.csv", "csv");
//! config.skip_header_lines = 1;
//! config.validations = vec![
//!     ValidationRule::for_column(2).not_empty(),
//!     ValidationRule::for_column(3).matching("^[0-9]+$"),
//! ];
//! let result = process(&config)?;
//! println!("{}", result.summary("csvParser"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Records, cells and processing results
//! - [`config`] - YAML configuration and output naming
//! - [`registry`] - File type to processor lookup
//! - [`codec`] - Streaming character encoding
//! - [`source`] - Per-format record readers
//! - [`sink`] - Per-format record writers
//! - [`validation`] - Rule evaluation
//! - [`pipeline`] - The run controller
//! - [`logs`] - Logging setup

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;
pub mod registry;

// I/O
pub mod codec;
pub mod sink;
pub mod source;

// Validation
pub mod validation;

// Controller
pub mod pipeline;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    SourceError,
    SinkError,
    StageError,
    Stage,
    PipelineError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, LineEnding, Origin, ProcessingResult, RawLine, Record};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::output::{OutputConfig, OutputPaths};
pub use config::{FilterConfig, ValidationRule};
pub use registry::{FileFormat, ProcessorRegistry};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{Rejection, ValidationEngine};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::process;
pub use sink::{RecordSink, SinkRole};
pub use source::RecordSource;

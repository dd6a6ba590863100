//! Domain models for the file filter pipeline.
//!
//! - [`Record`] - one logical row: string projection used for validation plus
//!   the format-native origin used for output
//! - [`Cell`] - a typed spreadsheet cell
//! - [`RawLine`] / [`LineEnding`] - the physical text of a text record
//! - [`ProcessingResult`] - immutable statistics of one run
//!
//! Column numbering: validation rules are 1-based, every slice
//! ([`Record::fields`], [`Origin::Cells`]) is 0-based.

use std::time::Duration;

use serde::Serialize;

// =============================================================================
// Text origin
// =============================================================================

/// Line terminator that followed a text record in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    /// Last line of the input, no terminator.
    None,
}

impl LineEnding {
    /// Terminator exactly as read.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::None => "",
        }
    }

    /// Terminator to write after the record.
    ///
    /// A record that ended the input without a terminator still gets `\n` on
    /// output, since it may no longer be the last line of its destination.
    pub fn as_output(self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf | LineEnding::None => "\n",
        }
    }
}

/// Physical text of a record, without its final terminator.
///
/// For delimited text a record may span several physical lines when a quoted
/// field contains a newline; `text` then holds all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub text: String,
    pub ending: LineEnding,
}

// =============================================================================
// Spreadsheet origin
// =============================================================================

/// A spreadsheet cell with its original type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Formula text, without the leading `=`.
    Formula(String),
    /// Date-formatted number, kept as its serial value.
    Date(f64),
}

impl Cell {
    /// String projection used for validation.
    pub fn display_value(&self) -> String {
        match self {
            Cell::Blank => String::new(),
            Cell::Text(s) | Cell::Formula(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Boolean(b) => b.to_string(),
            Cell::Date(serial) => format_serial_date(*serial),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Blank)
    }
}

/// Decimal rendering of a numeric cell: `30` rather than `30.0`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// ISO rendering of an Excel serial date (1900 date system).
///
/// Whole serials render as `YYYY-MM-DD`, others as `YYYY-MM-DD HH:MM:SS`.
pub fn format_serial_date(serial: f64) -> String {
    let Some(epoch) = chrono::NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return format_number(serial);
    };
    let Some(midnight) = epoch.and_hms_opt(0, 0, 0) else {
        return format_number(serial);
    };
    let millis = (serial * 86_400_000.0).round() as i64;
    match midnight.checked_add_signed(chrono::Duration::milliseconds(millis)) {
        Some(dt) if serial.fract() == 0.0 => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format_number(serial),
    }
}

// =============================================================================
// Record
// =============================================================================

/// Format-native representation a record was read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    /// Built in memory, no source representation.
    Detached,
    /// Text record with its raw physical form.
    Line(RawLine),
    /// Spreadsheet row, 0-based by absolute column.
    Cells(Vec<Cell>),
}

/// One logical row of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<String>,
    origin: Origin,
}

impl Record {
    /// A record with no source representation.
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields, origin: Origin::Detached }
    }

    pub fn from_line(fields: Vec<String>, line: RawLine) -> Self {
        Self { fields, origin: Origin::Line(line) }
    }

    /// Builds the string projection from typed cells and keeps the cells.
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        let fields = cells.iter().map(Cell::display_value).collect();
        Self { fields, origin: Origin::Cells(cells) }
    }

    /// String values, 0-based.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

// =============================================================================
// Processing result
// =============================================================================

/// Statistics of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub total_records: u64,
    pub success_records: u64,
    pub reject_records: u64,
    #[serde(rename = "processingTimeMs", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub success: bool,
    /// Message of the error that aborted the run.
    pub error: Option<String>,
}

impl ProcessingResult {
    pub fn completed(total: u64, success: u64, reject: u64, elapsed: Duration) -> Self {
        Self {
            total_records: total,
            success_records: success,
            reject_records: reject,
            elapsed,
            success: true,
            error: None,
        }
    }

    pub fn failed(
        total: u64,
        success: u64,
        reject: u64,
        elapsed: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            total_records: total,
            success_records: success,
            reject_records: reject,
            elapsed,
            success: false,
            error: Some(error.into()),
        }
    }

    pub fn processing_time_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// One-line summary, e.g. for logs.
    pub fn summary(&self, processor: &str) -> String {
        if self.success {
            format!(
                "{}, {}ms, totalRecords={}, successRecord={}, rejectRecord={}, success=true",
                processor,
                self.processing_time_ms(),
                self.total_records,
                self.success_records,
                self.reject_records
            )
        } else {
            format!("{}, {}ms, success=false", processor, self.processing_time_ms())
        }
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

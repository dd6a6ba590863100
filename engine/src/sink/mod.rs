//! Record sinks: one writer per output format.
//!
//! A run opens one sink for accepted records and, when enabled, one for
//! rejected records. Both receive the header records first. Sinks are
//! always finished, including after a failure, so partial outputs are
//! flushed and closed.

mod delimited;
mod fixed;
mod spreadsheet;
mod text;

use crate::error::SinkResult;
use crate::models::Record;

pub use delimited::DelimitedSink;
pub use fixed::FixedDelimiterSink;
pub use spreadsheet::SpreadsheetSink;

/// Which output a sink writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkRole {
    Filtered,
    Rejected,
}

impl SinkRole {
    /// Worksheet name used for spreadsheet outputs.
    pub fn sheet_name(self) -> &'static str {
        match self {
            SinkRole::Filtered => "FilteredData",
            SinkRole::Rejected => "RejectedData",
        }
    }
}

/// Ordered consumer of records.
pub trait RecordSink {
    /// Write a header record. Defaults to [`RecordSink::write_record`].
    fn write_header(&mut self, record: &Record) -> SinkResult<()> {
        self.write_record(record)
    }

    fn write_record(&mut self, record: &Record) -> SinkResult<()>;

    /// Flush and close the output. Calling it again is a no-op.
    fn finish(&mut self) -> SinkResult<()>;
}

impl<K: RecordSink + ?Sized> RecordSink for Box<K> {
    fn write_header(&mut self, record: &Record) -> SinkResult<()> {
        (**self).write_header(record)
    }

    fn write_record(&mut self, record: &Record) -> SinkResult<()> {
        (**self).write_record(record)
    }

    fn finish(&mut self) -> SinkResult<()> {
        (**self).finish()
    }
}

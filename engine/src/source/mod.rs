//! Record sources: one reader per input format.
//!
//! Every source yields records lazily, one at a time, in file order. The
//! controller takes the first `skipHeaderLines` records as header records; a
//! source does not distinguish them.
//!
//! - [`DelimitedSource`] - CSV with `"` quoting, no escape character
//! - [`FixedDelimiterSource`] - literal-delimiter text
//! - [`SpreadsheetSource`] - first worksheet of a workbook

mod delimited;
mod fixed;
mod lines;
mod spreadsheet;

use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::models::Record;

pub use delimited::DelimitedSource;
pub(crate) use delimited::{FIELD_SEPARATOR, QUOTE};
pub use fixed::FixedDelimiterSource;
pub use lines::LineReader;
pub use spreadsheet::SpreadsheetSource;

/// Forward-only producer of records.
pub trait RecordSource {
    /// Next record, or `None` once the input is exhausted.
    fn next_record(&mut self) -> SourceResult<Option<Record>>;
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn next_record(&mut self) -> SourceResult<Option<Record>> {
        (**self).next_record()
    }
}

/// Open an input file, reporting a missing file distinctly.
pub(crate) fn open_input(path: &Path) -> SourceResult<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
        _ => SourceError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        match open_input(&missing) {
            Err(SourceError::NotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }
}

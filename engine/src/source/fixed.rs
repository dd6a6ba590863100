//! Fixed-delimiter text source.
//!
//! Each physical line is one record, split on a literal delimiter string.
//! Trailing empty fields are kept: `a|b|` is three fields.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::Encoding;

use super::lines::LineReader;
use super::{open_input, RecordSource};
use crate::error::SourceResult;
use crate::models::Record;

pub struct FixedDelimiterSource<R: Read> {
    lines: LineReader<R>,
    delimiter: String,
}

impl FixedDelimiterSource<File> {
    pub fn open(path: &Path, encoding: &'static Encoding, delimiter: &str) -> SourceResult<Self> {
        Ok(Self::new(open_input(path)?, encoding, delimiter))
    }
}

impl<R: Read> FixedDelimiterSource<R> {
    /// `delimiter` must not be empty; configuration validation ensures it.
    pub fn new(reader: R, encoding: &'static Encoding, delimiter: &str) -> Self {
        Self {
            lines: LineReader::new(reader, encoding),
            delimiter: delimiter.to_string(),
        }
    }
}

impl<R: Read> RecordSource for FixedDelimiterSource<R> {
    fn next_record(&mut self) -> SourceResult<Option<Record>> {
        let Some(line) = self.lines.next_line()? else {
            return Ok(None);
        };
        let fields = line.text.split(self.delimiter.as_str()).map(str::to_string).collect();
        Ok(Some(Record::from_line(fields, line)))
    }
}

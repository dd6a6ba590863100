//! CSV source.
//!
//! Fields are split with the standard quoted-field grammar: `,` separates,
//! `"` quotes, `""` inside quotes is a literal quote. There is no escape
//! character, so a backslash is an ordinary character. A quoted field may
//! contain newlines; the record then spans several physical lines and keeps
//! them all in its raw text.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::Encoding;

use super::lines::LineReader;
use super::{open_input, RecordSource};
use crate::error::{SourceError, SourceResult};
use crate::models::Record;

pub(crate) const FIELD_SEPARATOR: u8 = b',';
pub(crate) const QUOTE: u8 = b'"';

pub struct DelimitedSource<R: Read> {
    lines: LineReader<R>,
}

impl DelimitedSource<File> {
    pub fn open(path: &Path, encoding: &'static Encoding) -> SourceResult<Self> {
        Ok(Self::new(open_input(path)?, encoding))
    }
}

impl<R: Read> DelimitedSource<R> {
    pub fn new(reader: R, encoding: &'static Encoding) -> Self {
        Self { lines: LineReader::new(reader, encoding) }
    }
}

impl<R: Read> RecordSource for DelimitedSource<R> {
    fn next_record(&mut self) -> SourceResult<Option<Record>> {
        let Some(mut line) = self.lines.next_line()? else {
            return Ok(None);
        };
        let first_line = self.lines.line_number();

        // A quoted field still open at the end of the line continues on the next one.
        while has_open_quote(&line.text) {
            let Some(next) = self.lines.next_line()? else {
                return Err(SourceError::Malformed {
                    line: first_line,
                    reason: "unterminated quoted field",
                });
            };
            line.text.push_str(line.ending.as_str());
            line.text.push_str(&next.text);
            line.ending = next.ending;
        }

        let fields = split_fields(&line.text).map_err(|e| match e {
            SplitError::Csv(source) => SourceError::Csv { line: first_line, source },
            SplitError::TrailingData => SourceError::Malformed {
                line: first_line,
                reason: "text after the end of the record",
            },
        })?;
        Ok(Some(Record::from_line(fields, line)))
    }
}

/// Whether `text` ends inside a quoted field.
///
/// Only a quote at the start of a field opens one; a quote inside an
/// unquoted field (`5" screen`) is an ordinary character.
fn has_open_quote(text: &str) -> bool {
    let mut in_quotes = false;
    let mut field_start = true;
    let mut bytes = text.bytes().peekable();
    while let Some(b) = bytes.next() {
        if in_quotes {
            if b == QUOTE {
                if bytes.peek() == Some(&QUOTE) {
                    bytes.next();
                } else {
                    in_quotes = false;
                }
            }
        } else if b == QUOTE && field_start {
            in_quotes = true;
            field_start = false;
        } else {
            field_start = matches!(b, FIELD_SEPARATOR | b'\r' | b'\n');
        }
    }
    in_quotes
}

pub(crate) enum SplitError {
    Csv(csv::Error),
    /// The text holds more than one record.
    TrailingData,
}

/// Split one logical record. An empty line is a single empty field.
pub(crate) fn split_fields(text: &str) -> Result<Vec<String>, SplitError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(FIELD_SEPARATOR)
        .quote(QUOTE)
        .double_quote(true)
        .escape(None)
        .buffer_capacity(text.len().max(64))
        .from_reader(text.as_bytes());

    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record).map_err(SplitError::Csv)? {
        return Ok(vec![String::new()]);
    }
    let fields = record.iter().map(str::to_string).collect();
    if reader.read_record(&mut record).map_err(SplitError::Csv)? {
        return Err(SplitError::TrailingData);
    }
    Ok(fields)
}

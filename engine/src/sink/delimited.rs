//! CSV sink.
//!
//! Records read from a CSV input are written back from their raw text, so an
//! accepted or rejected record is byte-identical to its input line (quoting,
//! spacing, embedded newlines and CRLF terminators included). Records without
//! a raw form are serialised with minimal quoting.

use std::path::Path;

use encoding_rs::Encoding;

use super::text::TextOutput;
use super::RecordSink;
use crate::error::SinkResult;
use crate::models::{Origin, Record};
use crate::source::{FIELD_SEPARATOR, QUOTE};

pub struct DelimitedSink {
    output: TextOutput,
}

impl DelimitedSink {
    pub fn create(path: &Path, encoding: &'static Encoding) -> SinkResult<Self> {
        Ok(Self { output: TextOutput::create(path, encoding)? })
    }
}

impl RecordSink for DelimitedSink {
    fn write_record(&mut self, record: &Record) -> SinkResult<()> {
        match record.origin() {
            Origin::Line(line) => {
                self.output.write_str(&line.text)?;
                self.output.write_str(line.ending.as_output())
            }
            Origin::Detached | Origin::Cells(_) => {
                let text = serialize(record.fields())?;
                self.output.write_str(&text)
            }
        }
    }

    fn finish(&mut self) -> SinkResult<()> {
        self.output.finish()
    }
}

fn serialize(fields: &[String]) -> SinkResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(FIELD_SEPARATOR)
        .quote(QUOTE)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

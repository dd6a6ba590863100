//! Fixed-delimiter text sink.

use std::path::Path;

use encoding_rs::Encoding;

use super::text::TextOutput;
use super::RecordSink;
use crate::error::SinkResult;
use crate::models::{LineEnding, Origin, Record};

pub struct FixedDelimiterSink {
    output: TextOutput,
    delimiter: String,
}

impl FixedDelimiterSink {
    pub fn create(path: &Path, encoding: &'static Encoding, delimiter: &str) -> SinkResult<Self> {
        Ok(Self {
            output: TextOutput::create(path, encoding)?,
            delimiter: delimiter.to_string(),
        })
    }
}

impl RecordSink for FixedDelimiterSink {
    fn write_record(&mut self, record: &Record) -> SinkResult<()> {
        let ending = match record.origin() {
            Origin::Line(line) => line.ending,
            Origin::Detached | Origin::Cells(_) => LineEnding::Lf,
        };
        self.output.write_str(&record.fields().join(&self.delimiter))?;
        self.output.write_str(ending.as_output())
    }

    fn finish(&mut self) -> SinkResult<()> {
        self.output.finish()
    }
}

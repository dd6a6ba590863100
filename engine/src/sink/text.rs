//! Encoded text output shared by the text sinks.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use tracing::debug;

use crate::codec::EncodingWriter;
use crate::error::SinkResult;

const WRITE_BUFFER: usize = 64 * 1024;

pub(super) struct TextOutput {
    path: PathBuf,
    writer: Option<EncodingWriter<BufWriter<File>>>,
}

impl TextOutput {
    pub(super) fn create(path: &Path, encoding: &'static Encoding) -> SinkResult<Self> {
        let file = File::create(path)?;
        debug!(path = %path.display(), encoding = encoding.name(), "Opened output");
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(EncodingWriter::new(BufWriter::with_capacity(WRITE_BUFFER, file), encoding)),
        })
    }

    pub(super) fn write_str(&mut self, text: &str) -> SinkResult<()> {
        match self.writer.as_mut() {
            Some(writer) => Ok(writer.write_str(text)?),
            None => Err(closed(&self.path).into()),
        }
    }

    pub(super) fn finish(&mut self) -> SinkResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.finish()?;
        }
        Ok(())
    }
}

fn closed(path: &Path) -> std::io::Error {
    std::io::Error::other(format!("output {} already closed", path.display()))
}

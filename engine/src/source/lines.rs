//! Physical line reading over a decoded text stream.

use std::io::{BufRead, BufReader, Read};

use encoding_rs::Encoding;
use tracing::warn;

use crate::codec::DecodingReader;
use crate::error::SourceResult;
use crate::models::{LineEnding, RawLine};

const READ_BUFFER: usize = 64 * 1024;

/// Reads physical lines, keeping track of their terminators.
pub struct LineReader<R: Read> {
    reader: BufReader<DecodingReader<R>>,
    line_number: u64,
    warned_replacement: bool,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER, DecodingReader::new(inner, encoding)),
            line_number: 0,
            warned_replacement: false,
        }
    }

    /// Number of physical lines read so far.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Next physical line without its terminator.
    pub fn next_line(&mut self) -> SourceResult<Option<RawLine>> {
        let mut text = String::new();
        if self.reader.read_line(&mut text)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let ending = if text.ends_with("\r\n") {
            text.truncate(text.len() - 2);
            LineEnding::CrLf
        } else if text.ends_with('\n') {
            text.truncate(text.len() - 1);
            LineEnding::Lf
        } else {
            LineEnding::None
        };

        if !self.warned_replacement && self.reader.get_ref().had_replacements() {
            self.warned_replacement = true;
            warn!(
                line = self.line_number,
                "Input contains bytes invalid for the configured encoding; replaced with U+FFFD"
            );
        }

        Ok(Some(RawLine { text, ending }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::UTF_8;

    fn read_all(input: &str) -> Vec<RawLine> {
        let mut reader = LineReader::new(input.as_bytes(), UTF_8);
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_line_endings_are_tracked() {
        let lines = read_all("a\r\nb\nc");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], RawLine { text: "a".into(), ending: LineEnding::CrLf });
        assert_eq!(lines[1], RawLine { text: "b".into(), ending: LineEnding::Lf });
        assert_eq!(lines[2], RawLine { text: "c".into(), ending: LineEnding::None });
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let lines = read_all("a\n\nb\n");
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "", "b"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(read_all("").is_empty());
    }
}

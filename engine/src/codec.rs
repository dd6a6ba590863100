//! Character encoding of text inputs and outputs.
//!
//! Text files are decoded to UTF-8 while streaming ([`DecodingReader`]) and
//! outputs are encoded back to the same character set ([`EncodingWriter`]),
//! so a record copied unchanged keeps its original bytes. Malformed input
//! sequences are replaced with U+FFFD rather than dropping the line.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use encoding_rs::{CoderResult, Decoder, Encoder, Encoding, UTF_8};

use crate::error::{ConfigError, ConfigResult};

/// Bytes inspected when the encoding is detected.
const SNIFF_LEN: usize = 64 * 1024;
const BUF_LEN: usize = 16 * 1024;

/// Configured encoding of a text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingSpec {
    /// Detect from the first bytes of the input.
    Auto,
    Fixed(&'static Encoding),
}

impl EncodingSpec {
    /// Concrete encoding for the file at `path`.
    pub fn resolve_for(self, path: &Path) -> io::Result<&'static Encoding> {
        match self {
            EncodingSpec::Fixed(encoding) => Ok(encoding),
            EncodingSpec::Auto => {
                let mut head = Vec::with_capacity(SNIFF_LEN);
                File::open(path)?.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
                Ok(detect_encoding(&head))
            }
        }
    }
}

/// Resolve an encoding label (`UTF-8`, `ISO-8859-1`, `windows-1252`, ...).
pub fn resolve_encoding(label: &str) -> ConfigResult<EncodingSpec> {
    let label = label.trim();
    if label.eq_ignore_ascii_case("auto") {
        return Ok(EncodingSpec::Auto);
    }
    Encoding::for_label(label.as_bytes())
        .map(EncodingSpec::Fixed)
        .ok_or_else(|| ConfigError::UnknownEncoding(label.to_string()))
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    let label = match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-15".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    };
    Encoding::for_label(label.as_bytes()).unwrap_or(UTF_8)
}

// =============================================================================
// Decoding
// =============================================================================

/// Streams any supported encoding as UTF-8 bytes.
///
/// Holds one fixed-size input buffer and one output buffer regardless of the
/// input size. The byte order mark, if any, is kept so it is written back.
pub struct DecodingReader<R> {
    inner: R,
    decoder: Decoder,
    input: Box<[u8]>,
    in_start: usize,
    in_end: usize,
    output: Box<[u8]>,
    out_start: usize,
    out_end: usize,
    eof: bool,
    finished: bool,
    replaced: bool,
}

impl<R: Read> DecodingReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder_without_bom_handling(),
            input: vec![0; BUF_LEN].into_boxed_slice(),
            in_start: 0,
            in_end: 0,
            output: vec![0; BUF_LEN].into_boxed_slice(),
            out_start: 0,
            out_end: 0,
            eof: false,
            finished: false,
            replaced: false,
        }
    }

    /// Whether any malformed sequence has been replaced so far.
    pub fn had_replacements(&self) -> bool {
        self.replaced
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.out_start < self.out_end {
                let n = buf.len().min(self.out_end - self.out_start);
                buf[..n].copy_from_slice(&self.output[self.out_start..self.out_start + n]);
                self.out_start += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }

            if self.in_start == self.in_end && !self.eof {
                let n = self.inner.read(&mut self.input)?;
                self.in_start = 0;
                self.in_end = n;
                self.eof = n == 0;
            }

            let last = self.eof;
            let (result, read, written, had_errors) = self.decoder.decode_to_utf8(
                &self.input[self.in_start..self.in_end],
                &mut self.output,
                last,
            );
            self.in_start += read;
            self.out_start = 0;
            self.out_end = written;
            self.replaced |= had_errors;

            if last && result == CoderResult::InputEmpty {
                self.finished = true;
            }
        }
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Writes UTF-8 text in the target encoding.
///
/// Characters the target cannot represent are written as numeric character
/// references, the `encoding_rs` convention.
pub struct EncodingWriter<W: Write> {
    inner: W,
    encoder: Option<Encoder>,
    buffer: Box<[u8]>,
}

impl<W: Write> EncodingWriter<W> {
    pub fn new(inner: W, encoding: &'static Encoding) -> Self {
        let encoder = (encoding.output_encoding() != UTF_8).then(|| encoding.new_encoder());
        Self {
            inner,
            encoder,
            buffer: vec![0; BUF_LEN].into_boxed_slice(),
        }
    }

    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        match self.encoder.as_mut() {
            None => self.inner.write_all(text.as_bytes()),
            Some(encoder) => encode_into(encoder, &mut self.buffer, &mut self.inner, text, false),
        }
    }

    /// Flush the encoder state and the underlying writer.
    pub fn finish(&mut self) -> io::Result<()> {
        if let Some(encoder) = self.encoder.as_mut() {
            encode_into(encoder, &mut self.buffer, &mut self.inner, "", true)?;
        }
        self.inner.flush()
    }
}

fn encode_into<W: Write>(
    encoder: &mut Encoder,
    buffer: &mut [u8],
    out: &mut W,
    mut text: &str,
    last: bool,
) -> io::Result<()> {
    loop {
        let (result, read, written, _) = encoder.encode_from_utf8(text, buffer, last);
        out.write_all(&buffer[..written])?;
        text = &text[read..];
        if result == CoderResult::InputEmpty {
            return Ok(());
        }
    }
}

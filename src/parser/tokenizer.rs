//! Byte-level tokenizer
//!
//! A seekable cursor over the raw file producing lexical tokens. PDF syntax
//! is whitespace sensitive in awkward ways (`12 0 R` vs `12 0`, names
//! containing `-`, context-dependent `<` / `<<`), so the tokenizer stays
//! deliberately dumb: it splits on delimiter classes and leaves meaning to
//! the value parser. `cur_offset` always points at the first byte of the
//! most recently returned token.

use crate::error::{PdfError, Result};
use std::io::{BufReader, Read, Seek, SeekFrom};

/// Token-terminating bytes, pushed back for the next call.
const DELIMS: &[u8] = b" \t<>[]()/\0";
/// Terminate a running token only when the preceding byte was a space.
const SIGN_DELIMS: &[u8] = b"+-";
/// Single-byte tokens when seen as the first byte of a token.
const START_DELIMS: &[u8] = b"<>[]()";

pub struct Tokenizer<R> {
    reader: BufReader<R>,
    /// Current cursor position in the underlying source.
    position: u64,
    /// Offset of the first byte of the most recent token.
    cur_offset: u64,
    /// Last byte consumed by `next_token`; the stream parser inspects this
    /// to detect a `\r` before the payload.
    prev_char: u8,
}

impl<R: Read + Seek> Tokenizer<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            position: 0,
            cur_offset: 0,
            prev_char: 0,
        }
    }

    /// Current byte position of the cursor.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Offset at which the most recently returned token started.
    pub fn cur_offset(&self) -> u64 {
        self.cur_offset
    }

    /// Last byte consumed while scanning the most recent token.
    pub fn prev_char(&self) -> u8 {
        self.prev_char
    }

    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.position = offset;
        Ok(())
    }

    /// Read one byte; `None` at end of file.
    pub(crate) fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => {
                self.position += 1;
                Ok(Some(buf[0]))
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Push the last byte back.
    pub(crate) fn unread(&mut self) -> Result<()> {
        self.reader.seek_relative(-1)?;
        self.position -= 1;
        Ok(())
    }

    /// Bulk read for the stream recovery scanner.
    pub(crate) fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.reader.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    /// Consume the rest of the line, including its terminator. `\r\n` and
    /// `\n\r` pairs are consumed whole.
    pub fn finish_line(&mut self) -> Result<()> {
        loop {
            match self.read_byte()? {
                None => return Ok(()),
                Some(b'\n') | Some(b'\r') => break,
                Some(_) => {}
            }
        }
        if let Some(c) = self.read_byte()? {
            if c != b'\n' && c != b'\r' {
                self.unread()?;
            }
        }
        Ok(())
    }

    fn eof(&self, eof_is_error: bool) -> Result<()> {
        if eof_is_error {
            Err(PdfError::TruncatedFile {
                offset: self.position,
            })
        } else {
            Ok(())
        }
    }

    /// Return the next token.
    ///
    /// One of: a structural token (`<`, `<<`, `>`, `>>`, `[`, `]`, `(`, `)`,
    /// `/`), a run of non-delimiter bytes, a comment body including its `%`
    /// (only when `read_comment`), or the empty string at end of file (only
    /// when `eof_is_error` is false; otherwise `TruncatedFile`).
    pub fn next_token(&mut self, eof_is_error: bool, read_comment: bool) -> Result<String> {
        let mut res: Vec<u8> = Vec::new();
        self.prev_char = 0;

        'scan: loop {
            let prev = self.prev_char;
            let c = match self.read_byte()? {
                Some(c) => c,
                None => {
                    self.eof(eof_is_error)?;
                    break;
                }
            };
            self.prev_char = c;

            if c == b'%' {
                if read_comment {
                    self.cur_offset = self.position - 1;
                    res.push(c);
                    loop {
                        match self.read_byte()? {
                            None => {
                                self.eof(eof_is_error)?;
                                break;
                            }
                            Some(c2) => {
                                self.prev_char = c2;
                                if c2 == b'\n' || c2 == b'\r' {
                                    break;
                                }
                                res.push(c2);
                            }
                        }
                    }
                    break;
                }
                self.finish_line()?;
                if res.is_empty() {
                    continue;
                }
                break;
            }

            // Leading whitespace is skipped
            if matches!(c, b' ' | b'\t' | b'\n' | b'\r' | b'\0') && res.is_empty() {
                continue;
            }

            // A line break ends the token without push-back
            if c == b'\n' || c == b'\r' {
                if res.is_empty() {
                    continue;
                }
                break;
            }

            if !res.is_empty() {
                if DELIMS.contains(&c) {
                    self.unread()?;
                    break;
                }
                if prev == b' ' && SIGN_DELIMS.contains(&c) {
                    self.unread()?;
                    break;
                }
                res.push(c);
            } else {
                self.cur_offset = self.position - 1;
                res.push(c);
                if START_DELIMS.contains(&c) {
                    break 'scan;
                }
            }
        }

        // Pair up << and >> for dictionary delimiters
        if res == b">" || res == b"<" {
            if let Some(c) = self.read_byte()? {
                if c == res[0] {
                    self.prev_char = c;
                    res.push(c);
                } else {
                    self.unread()?;
                }
            }
        }

        Ok(String::from_utf8_lossy(&res).into_owned())
    }

    /// Release the underlying source, positioned wherever the last
    /// operation left it.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

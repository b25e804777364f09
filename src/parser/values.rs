//! Value parser
//!
//! Recursive-descent construction of values from tokens. The dispatch is on
//! the first token of the value; the tokenizer cursor is the backtracking
//! point for the number-vs-reference ambiguity.

use crate::error::{PdfError, Result};
use crate::objects::{
    Array, Dictionary, HexString, Integer, Name, Object, ObjectId, PdfString, Real, Stream,
};
use crate::parser::tokenizer::Tokenizer;
use log::warn;
use std::io::{Read, Seek};

/// Buffer size of the `endstream` recovery scan.
const SCAN_CHUNK: usize = 4 * 1024;
const ENDSTREAM: &[u8] = b"endstream";

/// Parse the numeric token `token` into an Integer or Real.
///
/// Mirrors `strtol`-style prefix semantics: the longest leading numeric
/// prefix counts, a token without leading digits is `InvalidNumber`. A `.`
/// anywhere in the prefix makes it a Real; a leading `.` is read as `0.`.
pub(crate) fn token_to_number(token: &str, sign: Option<u8>) -> Result<Object> {
    let signed = sign.is_some();
    let negative = sign == Some(b'-');

    let bytes = token.as_bytes();
    let mut len = 0;
    let mut seen_dot = false;
    while len < bytes.len() {
        match bytes[len] {
            b'0'..=b'9' => len += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                len += 1;
            }
            _ => break,
        }
    }

    let prefix = &token[..len];
    if seen_dot {
        let spelled = if prefix.starts_with('.') {
            format!("0{prefix}")
        } else {
            prefix.to_string()
        };
        let mut value: f64 = spelled.parse().map_err(|_| PdfError::InvalidNumber {
            token: token.to_string(),
        })?;
        if negative {
            value = -value;
        }
        let real = if signed {
            Real::with_sign(value)
        } else {
            Real::new(value)
        };
        return Ok(Object::Real(real));
    }

    let mut value: i64 = prefix.parse().map_err(|_| PdfError::InvalidNumber {
        token: token.to_string(),
    })?;
    if negative {
        value = -value;
    }
    let integer = if signed {
        Integer::with_sign(value)
    } else {
        Integer::new(value)
    };
    Ok(Object::Integer(integer))
}

/// Parse the value starting at `token`.
///
/// `enclosing` is the dictionary of the surrounding indirect object; the
/// stream parser reads `/Length` from it.
pub(crate) fn parse_value<R: Read + Seek>(
    tk: &mut Tokenizer<R>,
    token: &str,
    enclosing: &Dictionary,
) -> Result<Object> {
    match token {
        "<<" => {
            let mut dict = Dictionary::new();
            parse_dictionary(tk, &mut dict)?;
            return Ok(Object::Dictionary(dict));
        }
        "[" => return parse_array(tk, enclosing),
        "(" => return parse_string(tk),
        "<" => return parse_hex_string(tk),
        "stream" => return parse_stream(tk, enclosing),
        "true" => return Ok(Object::Boolean(true)),
        "false" => return Ok(Object::Boolean(false)),
        "null" => return Ok(Object::Null),
        _ => {}
    }

    match token.as_bytes().first() {
        Some(b'1'..=b'9') => parse_number_or_reference(tk, token),
        Some(b'/') => parse_name(tk, token).map(Object::Name),
        Some(b'+') | Some(b'-') => parse_signed_number(token),
        Some(b'0') | Some(b'.') => token_to_number(token, None),
        _ => Err(PdfError::InvalidToken {
            offset: tk.cur_offset(),
            token: token.to_string(),
        }),
    }
}

/// Fill `dict` from `/key value` pairs up to the closing `>>`.
///
/// A `>>` where a value is expected binds the pending key to Null.
pub(crate) fn parse_dictionary<R: Read + Seek>(
    tk: &mut Tokenizer<R>,
    dict: &mut Dictionary,
) -> Result<()> {
    let empty = Dictionary::new();
    loop {
        let token = tk.next_token(true, false)?;
        if token == ">>" {
            break;
        }

        let key = parse_name(tk, &token)?;

        let token = tk.next_token(true, false)?;
        if token == ">>" {
            dict.set(key.value().to_string(), Object::Null);
            break;
        }

        let value = parse_value(tk, &token, &empty)?;
        dict.set(key.value().to_string(), value);
    }
    Ok(())
}

fn parse_array<R: Read + Seek>(tk: &mut Tokenizer<R>, enclosing: &Dictionary) -> Result<Object> {
    let mut array = Array::new();
    loop {
        let token = tk.next_token(true, false)?;
        if token == "]" {
            break;
        }
        array.push(parse_value(tk, &token, enclosing)?);
    }
    Ok(Object::Array(array))
}

/// Read the raw body of a literal string, up to the matching unescaped `)`.
///
/// Nested balanced parentheses are kept; `\` escaping is honored but not
/// resolved, so the body is stored as it appeared.
fn parse_string<R: Read + Seek>(tk: &mut Tokenizer<R>) -> Result<Object> {
    let mut body = Vec::new();
    let mut escaped = false;
    let mut depth = 1u32;

    loop {
        let Some(c) = tk.read_byte()? else { break };

        if c == b'(' && !escaped {
            depth += 1;
        } else if c == b')' && !escaped {
            depth -= 1;
            if depth == 0 {
                break;
            }
        }

        if c == b'\\' && escaped {
            escaped = false;
        } else {
            escaped = c == b'\\';
        }

        body.push(c);
    }

    Ok(Object::String(PdfString::new(body)))
}

fn parse_hex_string<R: Read + Seek>(tk: &mut Tokenizer<R>) -> Result<Object> {
    let mut body = String::new();
    loop {
        match tk.read_byte()? {
            None | Some(b'>') => break,
            Some(c) => body.push(c as char),
        }
    }

    if body.len() % 2 != 0 {
        return Err(PdfError::InvalidHexaString {
            offset: tk.cur_offset(),
        });
    }
    Ok(Object::HexString(HexString::new(body)))
}

pub(crate) fn parse_name<R: Read + Seek>(tk: &Tokenizer<R>, token: &str) -> Result<Name> {
    if !token.starts_with('/') {
        return Err(PdfError::InvalidName {
            offset: tk.cur_offset(),
        });
    }
    Ok(Name::new(token))
}

fn parse_signed_number(token: &str) -> Result<Object> {
    let sign = token.as_bytes()[0];
    token_to_number(&token[1..], Some(sign))
}

/// `<int> <int> R` fuses into a Reference; anything else rewinds the cursor
/// to just after the first integer.
fn parse_number_or_reference<R: Read + Seek>(tk: &mut Tokenizer<R>, token: &str) -> Result<Object> {
    let number = token_to_number(token, None)?;
    let Object::Integer(first) = number else {
        return Ok(number);
    };

    let rewind = tk.position();
    let token2 = tk.next_token(true, false)?;
    let token3 = tk.next_token(true, false)?;

    let generation = match token_to_number(&token2, None) {
        Ok(value) => value,
        Err(_) => {
            tk.seek_to(rewind)?;
            return Ok(Object::Integer(first));
        }
    };

    match generation {
        Object::Integer(generation) if token3 == "R" => {
            let object_id = u32::try_from(first.value()).map_err(|_| PdfError::InvalidObject {
                offset: tk.cur_offset(),
            })?;
            let generation =
                u16::try_from(generation.value()).map_err(|_| PdfError::InvalidObject {
                    offset: tk.cur_offset(),
                })?;
            Ok(Object::Reference(ObjectId::new(object_id, generation)))
        }
        _ => {
            tk.seek_to(rewind)?;
            Ok(Object::Integer(first))
        }
    }
}

/// Parse a stream payload following the `stream` keyword.
///
/// When the enclosing dictionary declares a correct integer `/Length`, the
/// payload is the `[start, start + length)` range. Otherwise the file is
/// scanned forward for the literal `endstream` and trailing end-of-line
/// bytes are excluded from the payload.
fn parse_stream<R: Read + Seek>(tk: &mut Tokenizer<R>, enclosing: &Dictionary) -> Result<Object> {
    // A \r\n pair after the keyword belongs to the keyword line
    if tk.prev_char() == b'\r' {
        if let Some(c) = tk.read_byte()? {
            if c != b'\n' {
                tk.unread()?;
            }
        }
    }

    let start = tk.position();
    let declared = enclosing.get("Length").and_then(Object::as_integer);

    if let Some(length) = declared {
        if length >= 0 {
            let end = start + length as u64;
            tk.seek_to(end)?;
            match tk.next_token(false, false) {
                Ok(token) if token == "endstream" => {
                    return Ok(Object::Stream(Stream::from_range(start, end)))
                }
                _ => {
                    warn!(
                        "stream /Length {} at offset {} does not reach endstream, rescanning",
                        length, start
                    );
                    tk.seek_to(start)?;
                }
            }
        }
    }

    scan_for_endstream(tk, start, declared.is_some())
}

fn scan_for_endstream<R: Read + Seek>(
    tk: &mut Tokenizer<R>,
    start: u64,
    had_length: bool,
) -> Result<Object> {
    tk.seek_to(start)?;

    // Carry the tail of each chunk so a match straddling two reads is found
    let mut window: Vec<u8> = Vec::with_capacity(SCAN_CHUNK + ENDSTREAM.len());
    let mut window_base = start;

    let keyword_offset = loop {
        let carry = window.len().saturating_sub(ENDSTREAM.len() - 1);
        window.drain(..carry);
        window_base += carry as u64;

        let mut chunk = [0u8; SCAN_CHUNK];
        let n = tk.read_chunk(&mut chunk)?;
        if n == 0 {
            return Err(if had_length {
                PdfError::TruncatedFile {
                    offset: tk.position(),
                }
            } else {
                PdfError::InvalidStream { offset: start }
            });
        }
        window.extend_from_slice(&chunk[..n]);

        if let Some(pos) = window
            .windows(ENDSTREAM.len())
            .position(|w| w == ENDSTREAM)
        {
            break window_base + pos as u64;
        }
    };

    // Exclude the end-of-line bytes that terminate the payload
    let mut end = keyword_offset;
    while end > start {
        tk.seek_to(end - 1)?;
        match tk.read_byte()? {
            Some(b'\n') | Some(b'\r') => end -= 1,
            _ => break,
        }
    }

    // Reposition just past "endstream\n"
    tk.seek_to(keyword_offset + ENDSTREAM.len() as u64 + 1)?;
    Ok(Object::Stream(Stream::from_range(start, end)))
}

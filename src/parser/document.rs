//! Document parser
//!
//! Drives header, body, xref and trailer recognition over the token stream,
//! then links the parsed xref table to the object list and repairs the
//! trailer from an xref stream object when one was seen.

use crate::document::{Document, Version, XRefEntry};
use crate::error::{PdfError, Result};
use crate::object::IndirectObject;
use crate::parser::tokenizer::Tokenizer;
use crate::parser::values::{parse_dictionary, parse_value, token_to_number};
use log::{debug, warn};
use std::io::{Read, Seek};

/// Keys backfilled into a repaired trailer from the xref stream object.
const TRAILER_KEYS: [&str; 4] = ["Root", "Info", "Encrypt", "ID"];

pub struct DocumentParser<R> {
    tk: Tokenizer<R>,
    objects: Vec<IndirectObject>,
    trailer: IndirectObject,
    xref_table: Vec<XRefEntry>,
    xref_offset: Option<u64>,
    /// Index of the last parsed object with `/Type /XRef`.
    xref_object: Option<usize>,
    version: Version,
}

impl<R: Read + Seek> DocumentParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            tk: Tokenizer::new(reader),
            objects: Vec::new(),
            trailer: IndirectObject::parsed(0, 0, 0),
            xref_table: Vec::new(),
            xref_offset: None,
            xref_object: None,
            version: Version::default(),
        }
    }

    pub fn parse(mut self) -> Result<Document<R>> {
        self.tk.seek_to(0)?;
        self.parse_header()?;
        self.parse_body()?;
        self.link_xref_table();
        self.repair_trailer();

        Ok(Document::from_parts(
            self.objects,
            self.trailer,
            self.xref_table,
            self.xref_offset,
            self.version,
            Some(self.tk.into_inner()),
        ))
    }

    /// `%PDF-<digit>.<digit>`, rest of the line discarded.
    fn parse_header(&mut self) -> Result<()> {
        let mut magic = [0u8; 5];
        let mut read = 0;
        while read < magic.len() {
            match self.tk.read_byte()? {
                Some(c) => {
                    magic[read] = c;
                    read += 1;
                }
                None => return Err(PdfError::InvalidHeader),
            }
        }
        if &magic != b"%PDF-" {
            return Err(PdfError::InvalidHeader);
        }

        let major = match self.tk.read_byte()? {
            Some(c @ b'0'..=b'9') => c - b'0',
            _ => return Err(PdfError::InvalidHeader),
        };
        if self.tk.read_byte()? != Some(b'.') {
            return Err(PdfError::InvalidHeader);
        }
        let minor = match self.tk.read_byte()? {
            Some(c @ b'0'..=b'9') => c - b'0',
            _ => return Err(PdfError::InvalidHeader),
        };

        self.version = Version::new(major, minor);
        self.tk.finish_line()
    }

    /// Token dispatch until end of file.
    ///
    /// The line after the header (the binary marker line) may hold one
    /// unparsable token when it is not a comment; any later one is an
    /// `InvalidLine`.
    fn parse_body(&mut self) -> Result<()> {
        let mut second_line = true;
        loop {
            let token = self.tk.next_token(false, false)?;
            if token.is_empty() {
                break;
            }

            match token.as_bytes()[0] {
                b'1'..=b'9' => self.parse_object(&token)?,
                _ if token == "xref" => self.parse_xref()?,
                _ if token == "startxref" => self.parse_start_xref()?,
                _ if token == "trailer" => {
                    self.parse_trailer()?;
                }
                _ => {
                    if !second_line {
                        return Err(PdfError::InvalidLine {
                            offset: self.tk.cur_offset(),
                        });
                    }
                    debug!(
                        "skipping unparsable line after the header at offset {}",
                        self.tk.cur_offset()
                    );
                    self.tk.finish_line()?;
                }
            }

            if second_line {
                second_line = false;
            }
        }
        Ok(())
    }

    /// `<id> <gen> obj … endobj`.
    fn parse_object(&mut self, token: &str) -> Result<()> {
        let offset = self.tk.cur_offset();
        let invalid = |offset| PdfError::InvalidObject { offset };

        let object_id = match token_to_number(token, None) {
            Ok(n) => n.as_integer().ok_or_else(|| invalid(offset))?,
            Err(_) => return Err(invalid(offset)),
        };
        let token = self.tk.next_token(true, false)?;
        let generation = match token_to_number(&token, None) {
            Ok(n) => n.as_integer().ok_or_else(|| invalid(offset))?,
            Err(_) => return Err(invalid(offset)),
        };

        let token = self.tk.next_token(true, false)?;
        if token != "obj" {
            return Err(invalid(self.tk.cur_offset()));
        }

        let object_id = u32::try_from(object_id).map_err(|_| invalid(offset))?;
        let generation = u16::try_from(generation).map_err(|_| invalid(offset))?;
        let mut object = IndirectObject::parsed(object_id, generation, offset);

        loop {
            let token = self.tk.next_token(true, false)?;
            match token.as_str() {
                "endobj" => break,
                "<<" => parse_dictionary(&mut self.tk, object.dictionary_mut())?,
                _ if matches!(token.as_bytes().first(), Some(b'1'..=b'9')) => {
                    // A lone integer marks an indirect placeholder object
                    let number = token_to_number(&token, None)
                        .map_err(|_| invalid(self.tk.cur_offset()))?;
                    let indirect = number
                        .as_integer()
                        .ok_or_else(|| invalid(self.tk.cur_offset()))?;
                    object.set_indirect_offset(indirect);
                }
                _ => {
                    let value = parse_value(&mut self.tk, &token, object.dictionary())?;
                    object.data_mut().push(value);
                }
            }
        }

        // Keep /Length consistent with the payload actually recovered
        let stream_length = object
            .data()
            .iter()
            .find_map(crate::objects::Object::as_stream)
            .map(|s| s.len() as i64);
        if let Some(length) = stream_length {
            let declared = object.get("Length").and_then(crate::objects::Object::as_integer);
            if declared != Some(length) {
                warn!(
                    "object {} {}: stream /Length corrected from {:?} to {}",
                    object.object_id(),
                    object.generation(),
                    declared,
                    length
                );
                object.remove_key("Length");
                object.set("Length", length);
            }
        }

        if object.type_name() == Some("XRef") {
            self.xref_object = Some(self.objects.len());
        }
        self.objects.push(object);
        Ok(())
    }

    /// Classic xref section: subsection headers and fixed-width records up
    /// to the `trailer` keyword.
    ///
    /// A token of exactly ten characters is an offset record; anything else
    /// is the starting object id of a subsection, whose count token is
    /// discarded (records are recognized by width, not counted).
    fn parse_xref(&mut self) -> Result<()> {
        self.xref_offset = Some(self.tk.cur_offset());

        let mut current_id: u32 = 0;
        loop {
            let first = self.tk.next_token(true, false)?;
            if first == "trailer" {
                break;
            }

            let second = self.tk.next_token(true, false)?;

            if first.len() == 10 {
                let third = self.tk.next_token(true, false)?;
                let offset = first.parse::<u64>().map_err(|_| PdfError::InvalidNumber {
                    token: first.clone(),
                })?;
                let generation = second.parse::<u16>().map_err(|_| PdfError::InvalidNumber {
                    token: second.clone(),
                })?;
                self.xref_table.push(XRefEntry {
                    object_id: current_id,
                    offset,
                    generation,
                    used: third == "n",
                    linked: false,
                });
                current_id += 1;
            } else {
                // Subsection header: starting id, count discarded
                current_id = first.parse::<u32>().map_err(|_| PdfError::InvalidNumber {
                    token: first.clone(),
                })?;
            }
        }

        self.parse_trailer()?;
        Ok(())
    }

    /// `trailer << … >>`, optionally followed by `startxref`.
    fn parse_trailer(&mut self) -> Result<bool> {
        let token = self.tk.next_token(true, false)?;
        if token != "<<" {
            return Err(PdfError::InvalidTrailer {
                offset: self.tk.cur_offset(),
            });
        }

        parse_dictionary(&mut self.tk, self.trailer.dictionary_mut())?;

        let token = self.tk.next_token(false, false)?;
        if token != "startxref" {
            // A trailer without startxref is permitted; rewind so the body
            // loop sees the token again
            if !token.is_empty() {
                self.tk.seek_to(self.tk.cur_offset())?;
            }
            return Ok(false);
        }

        self.parse_start_xref()?;
        Ok(true)
    }

    /// `startxref <offset>` followed by the `%%EOF` marker.
    fn parse_start_xref(&mut self) -> Result<()> {
        let offset_token = self.tk.next_token(true, false)?;

        let token = self.tk.next_token(false, true)?;
        if !token.starts_with("%%EOF") {
            return Err(PdfError::InvalidTrailer {
                offset: self.tk.cur_offset(),
            });
        }
        // Some producers glue the next object to the marker: %%EOF1 0 obj
        if token.len() > 5 {
            let offset = self.tk.cur_offset() + 5;
            self.tk.seek_to(offset)?;
        }

        // Without any xref section the startxref operand is the only record
        // of the previous xref position
        if self.xref_offset.is_none() {
            let number = token_to_number(&offset_token, None)?;
            let offset = number
                .as_integer()
                .and_then(|v| u64::try_from(v).ok())
                .ok_or(PdfError::InvalidTrailer {
                    offset: self.tk.cur_offset(),
                })?;
            self.xref_offset = Some(offset);
        }

        Ok(())
    }

    /// Back-link each xref entry to its object and propagate the in-use
    /// flag.
    fn link_xref_table(&mut self) {
        for entry in &mut self.xref_table {
            let object = self
                .objects
                .iter_mut()
                .find(|o| o.matches(entry.object_id, entry.generation));
            if let Some(object) = object {
                object.set_used(entry.used);
                entry.linked = true;
            }
        }
    }

    /// Fill trailer keys missing after the parse from the xref stream
    /// object, never overwriting one already present.
    fn repair_trailer(&mut self) {
        let Some(index) = self.xref_object else {
            return;
        };
        let xref_object = &self.objects[index];

        for key in TRAILER_KEYS {
            if !self.trailer.has_key(key) {
                if let Some(value) = xref_object.get(key) {
                    warn!("backfilling trailer key /{key} from the xref stream object");
                    self.trailer.dictionary_mut().set(key, value.clone());
                }
            }
        }
    }
}

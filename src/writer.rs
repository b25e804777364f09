//! PDF writer
//!
//! Emits either a full rewrite or an incremental update. The xref section is
//! rebuilt from the live object list; every record's offset is the byte
//! position this writer was at when the object's `obj` line went out, so
//! offsets are correct by construction.

use crate::document::Document;
use crate::error::Result;
use crate::object::IndirectObject;
use log::debug;
use std::io::{Read, Seek, Write};

/// The xref free-list head every rewrite starts with.
const XREF_HEAD: &str = "xref\n0 1\n0000000000 65535 f\r\n";

pub struct PdfWriter<W: Write> {
    writer: W,
    position: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            position: 0,
        }
    }

    /// Writer appending at `position` bytes into an existing file.
    pub fn with_position(writer: W, position: u64) -> Self {
        Self { writer, position }
    }

    /// Bytes written so far (plus the starting position).
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Full rewrite: header, every object, a rebuilt classic xref table,
    /// trailer and startxref.
    pub fn write_document<R: Read + Seek>(&mut self, document: &mut Document<R>) -> Result<()> {
        let (objects, trailer, mut source, _, version) = document.writer_parts();

        self.write_bytes(format!("%PDF-{}.{}\r", version.major, version.minor).as_bytes())?;
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\r', b'\n'])?;

        let mut xref = String::from(XREF_HEAD);
        let mut max_id: u32 = 0;
        let mut xref_stm_offset: u64 = 0;

        for object in objects.iter_mut() {
            let offset = self.position;
            let rendered = object.render(source.as_mut().map(|s| &mut **s))?;
            self.write_bytes(&rendered)?;

            xref.push_str(&format!("{} 1\n", object.object_id()));
            xref.push_str(&format!(
                "{:010} {:05} {}\r\n",
                offset,
                object.generation(),
                if object.used() { 'n' } else { 'f' }
            ));
            max_id = max_id.max(object.object_id());

            if object.type_name() == Some("XRef") {
                // Chain the previous xref stream's rewritten position
                if object.has_key("Prev") && xref_stm_offset != 0 {
                    object.remove_key("Prev");
                    object.set("Prev", xref_stm_offset as i64);
                }
                xref_stm_offset = offset;
            }
        }

        let new_xref_offset = self.position;
        self.write_bytes(xref.as_bytes())?;

        trailer.remove_key("Prev");
        trailer.remove_key("Size");
        trailer.set("Size", max_id as i64 + 1);
        trailer.remove_key("XRefStm");
        if xref_stm_offset != 0 {
            trailer.set("XRefStm", xref_stm_offset as i64);
        }

        self.write_trailer(trailer, new_xref_offset)
    }

    /// Incremental update: only objects marked new, each with its own
    /// one-record xref subsection, chained to the previous xref via `/Prev`.
    ///
    /// The caller is responsible for positioning this writer at the end of
    /// the original bytes; a lone `\r` separates them from the update.
    pub fn write_update<R: Read + Seek>(&mut self, document: &mut Document<R>) -> Result<()> {
        let (objects, trailer, mut source, xref_offset, _) = document.writer_parts();

        self.write_bytes(b"\r")?;

        let mut xref = String::from("xref\n");
        let mut max_id: u32 = 0;
        let mut new_objects = 0usize;

        for object in objects.iter_mut() {
            max_id = max_id.max(object.object_id());
            if !object.is_new() {
                continue;
            }
            new_objects += 1;

            let offset = self.position;
            let rendered = object.render(source.as_mut().map(|s| &mut **s))?;
            self.write_bytes(&rendered)?;

            xref.push_str(&format!("{} 1\n", object.object_id()));
            xref.push_str(&format!("{:010} {:05} n\r\n", offset, object.generation()));
        }

        if new_objects == 0 {
            debug!("no new objects, leaving the trailer untouched");
            return Ok(());
        }

        let new_xref_offset = self.position;
        self.write_bytes(xref.as_bytes())?;

        trailer.remove_key("Prev");
        if let Some(offset) = xref_offset {
            trailer.set("Prev", offset as i64);
        }
        trailer.remove_key("Size");
        trailer.set("Size", max_id as i64 + 1);

        self.write_trailer(trailer, new_xref_offset)
    }

    fn write_trailer(&mut self, trailer: &IndirectObject, xref_offset: u64) -> Result<()> {
        self.write_bytes(b"trailer\n")?;
        let mut dict = Vec::new();
        trailer.dictionary().serialize(&mut dict)?;
        self.write_bytes(&dict)?;
        self.write_bytes(format!("startxref\n{xref_offset}\n%%EOF").as_bytes())
    }
}

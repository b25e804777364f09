//! Indirect objects
//!
//! A top-level `<id> <gen> obj … endobj` block: an identity, an optional
//! dictionary, and an ordered list of non-dictionary values (typically zero
//! or one, a stream).

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Integer, Object};
use std::io::{Read, Seek};

/// An indirect object of the document body.
#[derive(Debug)]
pub struct IndirectObject {
    object_id: u32,
    generation: u16,
    /// Byte offset the object was parsed at, 0 for built objects.
    offset: u64,
    dictionary: Dictionary,
    data: Vec<Object>,
    /// Set for objects created or mutated since the parse; the incremental
    /// writer emits only these.
    is_new: bool,
    /// In-use (`n`) vs free (`f`) xref state.
    used: bool,
    /// Non-zero marks an indirect placeholder: the body is this bare
    /// integer instead of a dictionary or data block.
    indirect_offset: i64,
}

impl IndirectObject {
    /// A client-built object, marked new so an incremental write picks it up.
    pub fn new(object_id: u32, generation: u16) -> Self {
        Self {
            object_id,
            generation,
            offset: 0,
            dictionary: Dictionary::new(),
            data: Vec::new(),
            is_new: true,
            used: true,
            indirect_offset: 0,
        }
    }

    /// An object read from the source file at `offset`.
    pub(crate) fn parsed(object_id: u32, generation: u16, offset: u64) -> Self {
        Self {
            object_id,
            generation,
            offset,
            dictionary: Dictionary::new(),
            data: Vec::new(),
            is_new: false,
            used: true,
            indirect_offset: 0,
        }
    }

    pub fn object_id(&self) -> u32 {
        self.object_id
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }

    /// Offset in the source file recorded at parse time.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    pub fn data(&self) -> &[Object] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Vec<Object> {
        &mut self.data
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Mark the object as created or modified, opting it into incremental
    /// writeout.
    pub fn mark_updated(&mut self) {
        self.is_new = true;
    }

    pub fn used(&self) -> bool {
        self.used
    }

    pub fn set_used(&mut self, used: bool) {
        self.used = used;
    }

    pub fn is_indirect(&self) -> bool {
        self.indirect_offset != 0
    }

    pub fn indirect_offset(&self) -> i64 {
        self.indirect_offset
    }

    /// Non-zero turns the object into an indirect placeholder rendered as a
    /// bare integer.
    pub fn set_indirect_offset(&mut self, offset: i64) {
        self.indirect_offset = offset;
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.dictionary.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.dictionary.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Object>) {
        self.dictionary.set(key, value);
    }

    pub fn remove_key(&mut self, key: &str) -> Option<Object> {
        self.dictionary.remove(key)
    }

    /// Value of `/Type`, when present and a name.
    pub fn type_name(&self) -> Option<&str> {
        self.get("Type").and_then(Object::as_name).map(|n| n.value())
    }

    /// Replace the stream payload and keep `/Length` consistent with it.
    ///
    /// Returns false when the object carries no stream value.
    pub fn set_stream_data(&mut self, data: impl Into<Vec<u8>>) -> bool {
        let Some(stream) = self.data.iter_mut().find_map(Object::as_stream_mut) else {
            return false;
        };
        let data = data.into();
        let length = data.len() as i64;
        stream.set_data(data);
        self.dictionary.remove("Length");
        self.dictionary.set("Length", Integer::new(length));
        true
    }

    /// Whether identity `(id, gen)` matches; container lookups use this.
    pub fn matches(&self, object_id: u32, generation: u16) -> bool {
        self.object_id == object_id && self.generation == generation
    }

    /// Render the full `<id> <gen> obj … endobj\n` block.
    ///
    /// View streams are loaded from `source` first; rendering a view stream
    /// without a source fails with `InvalidStream`.
    pub fn render<R: Read + Seek>(&mut self, mut source: Option<&mut R>) -> Result<Vec<u8>> {
        for value in &mut self.data {
            if let Object::Stream(stream) = value {
                if !stream.is_loaded() {
                    match source.as_mut() {
                        Some(src) => {
                            stream.load(&mut **src)?;
                        }
                        None => {
                            return Err(PdfError::InvalidStream {
                                offset: self.offset,
                            })
                        }
                    }
                }
            }
        }

        let mut out = Vec::new();
        out.extend_from_slice(format!("{} {} obj\n", self.object_id, self.generation).as_bytes());
        if self.indirect_offset != 0 {
            out.extend_from_slice(format!("   {}\n", self.indirect_offset).as_bytes());
        } else {
            if !self.dictionary.is_empty() {
                self.dictionary.serialize(&mut out)?;
            } else if self.data.is_empty() {
                out.extend_from_slice(b"<<>>\n");
            }
            for value in &self.data {
                value.serialize(&mut out)?;
            }
            if !matches!(out.last(), Some(b'\n') | Some(b'\r')) {
                out.push(b'\n');
            }
        }
        out.extend_from_slice(b"endobj\n");
        Ok(out)
    }
}

impl Clone for IndirectObject {
    /// Deep copy, marked new so it participates in the next incremental
    /// write.
    fn clone(&self) -> Self {
        Self {
            object_id: self.object_id,
            generation: self.generation,
            offset: self.offset,
            dictionary: self.dictionary.clone(),
            data: self.data.clone(),
            is_new: true,
            used: self.used,
            indirect_offset: self.indirect_offset,
        }
    }
}

impl PartialEq for IndirectObject {
    fn eq(&self, other: &Self) -> bool {
        self.object_id == other.object_id && self.generation == other.generation
    }
}

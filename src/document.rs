//! Document model
//!
//! The ordered collection of indirect objects, the trailer, and the parsed
//! cross-reference table. Lookups are by `(id, generation)` identity; the
//! object graph is flat and references resolve through the document, so
//! cycles in the page tree are just data.

use crate::error::{PdfError, Result};
use crate::object::IndirectObject;
use crate::parser::DocumentParser;
use crate::writer::PdfWriter;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom};
use std::path::Path;

/// PDF header version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(1, 6)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One record of the parsed cross-reference table.
///
/// The table is frozen after the parse; the writer builds its own section
/// from the live object list instead of consulting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XRefEntry {
    pub object_id: u32,
    pub offset: u64,
    pub generation: u16,
    pub used: bool,
    /// Whether an object with this identity was found in the body.
    pub linked: bool,
}

/// A parsed (or programmatically built) PDF document.
///
/// The source handle stays open for the document's lifetime because stream
/// values may still be unread byte ranges into it.
pub struct Document<R: Read + Seek = File> {
    objects: Vec<IndirectObject>,
    trailer: IndirectObject,
    xref_table: Vec<XRefEntry>,
    xref_offset: Option<u64>,
    version: Version,
    source: Option<R>,
}

impl Document<File> {
    /// An empty document with the default 1.6 version, for building a PDF
    /// from scratch.
    pub fn new() -> Self {
        Self::from_parts(
            Vec::new(),
            IndirectObject::parsed(0, 0, 0),
            Vec::new(),
            None,
            Version::default(),
            None,
        )
    }

    /// Parse the PDF file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path).map_err(|source| PdfError::UnableToOpenFile {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }
}

impl Default for Document<File> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Read + Seek> Document<R> {
    /// Parse a PDF from any seekable byte source.
    pub fn from_reader(reader: R) -> Result<Self> {
        DocumentParser::new(reader).parse()
    }

    pub(crate) fn from_parts(
        objects: Vec<IndirectObject>,
        trailer: IndirectObject,
        xref_table: Vec<XRefEntry>,
        xref_offset: Option<u64>,
        version: Version,
        source: Option<R>,
    ) -> Self {
        Self {
            objects,
            trailer,
            xref_table,
            xref_offset,
            version,
            source,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, major: u8, minor: u8) {
        self.version = Version::new(major, minor);
    }

    /// Objects in source order.
    pub fn objects(&self) -> &[IndirectObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut Vec<IndirectObject> {
        &mut self.objects
    }

    /// Append an object; id uniqueness is not checked.
    pub fn add_object(&mut self, object: IndirectObject) {
        self.objects.push(object);
    }

    /// Remove the first object matching `(object_id, generation)`.
    pub fn remove_object(&mut self, object_id: u32, generation: u16) -> Option<IndirectObject> {
        let pos = self
            .objects
            .iter()
            .position(|o| o.matches(object_id, generation))?;
        Some(self.objects.remove(pos))
    }

    pub fn get_object(&self, object_id: u32, generation: u16) -> Option<&IndirectObject> {
        self.objects
            .iter()
            .find(|o| o.matches(object_id, generation))
    }

    pub fn get_object_mut(
        &mut self,
        object_id: u32,
        generation: u16,
    ) -> Option<&mut IndirectObject> {
        self.objects
            .iter_mut()
            .find(|o| o.matches(object_id, generation))
    }

    /// The trailer object; its dictionary is mutable.
    pub fn trailer(&self) -> &IndirectObject {
        &self.trailer
    }

    pub fn trailer_mut(&mut self) -> &mut IndirectObject {
        &mut self.trailer
    }

    /// The xref table as parsed.
    pub fn xref_table(&self) -> &[XRefEntry] {
        &self.xref_table
    }

    /// Offset of the most recent xref section of the source, or of the
    /// `startxref` operand when the source had no xref section.
    pub fn xref_offset(&self) -> Option<u64> {
        self.xref_offset
    }

    /// Write a full rewrite of the document to `path`.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::create(&path).map_err(|source| PdfError::UnableToOpenFile {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        let mut writer = PdfWriter::new(BufWriter::new(file));
        writer.write_document(self)?;
        writer.flush()
    }

    /// Append an incremental update to `path`, emitting only objects marked
    /// new. When the target does not exist it is seeded with a copy of the
    /// original source bytes first.
    pub fn save_incremental<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            if let Some(source) = self.source.as_mut() {
                let mut target =
                    File::create(path).map_err(|source| PdfError::UnableToOpenFile {
                        path: path.display().to_string(),
                        source,
                    })?;
                source.seek(SeekFrom::Start(0))?;
                io::copy(source, &mut target)?;
            }
        }

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| PdfError::UnableToOpenFile {
                path: path.display().to_string(),
                source,
            })?;
        let position = file.metadata()?.len();

        let mut writer = PdfWriter::with_position(BufWriter::new(file), position);
        writer.write_update(self)?;
        writer.flush()
    }

    pub(crate) fn writer_parts(
        &mut self,
    ) -> (
        &mut Vec<IndirectObject>,
        &mut IndirectObject,
        Option<&mut R>,
        Option<u64>,
        Version,
    ) {
        (
            &mut self.objects,
            &mut self.trailer,
            self.source.as_mut(),
            self.xref_offset,
            self.version,
        )
    }
}

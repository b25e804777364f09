use crate::error::{PdfError, Result};
use std::io::{Read, Seek, SeekFrom};

/// Stream payload: either a byte range into the original source file, read
/// lazily, or an owned buffer.
#[derive(Debug, Clone, PartialEq)]
enum StreamData {
    View { start: u64, end: u64 },
    Owned(Vec<u8>),
}

/// Raw stream payload between the `stream` and `endstream` keywords.
///
/// The enclosing object's dictionary carries the `/Length` entry; replacing
/// the payload goes through the object so the length stays consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    data: StreamData,
}

impl Stream {
    /// Stream backed by a `[start, end)` range of the source file.
    pub fn from_range(start: u64, end: u64) -> Self {
        Self {
            data: StreamData::View { start, end },
        }
    }

    /// Stream owning its payload.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: StreamData::Owned(data.into()),
        }
    }

    /// Source byte range, if the payload has not been loaded yet.
    pub fn range(&self) -> Option<(u64, u64)> {
        match self.data {
            StreamData::View { start, end } => Some((start, end)),
            StreamData::Owned(_) => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.data, StreamData::Owned(_))
    }

    /// Payload length in bytes.
    pub fn len(&self) -> u64 {
        match &self.data {
            StreamData::View { start, end } => end.saturating_sub(*start),
            StreamData::Owned(data) => data.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The payload, if already in memory.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.data {
            StreamData::Owned(data) => Some(data),
            StreamData::View { .. } => None,
        }
    }

    /// Force the payload into memory, reading the recorded range from
    /// `source` if needed.
    pub fn load<R: Read + Seek>(&mut self, source: &mut R) -> Result<&[u8]> {
        if let StreamData::View { start, end } = self.data {
            let len = end.saturating_sub(start) as usize;
            let mut buf = vec![0u8; len];
            source.seek(SeekFrom::Start(start))?;
            source
                .read_exact(&mut buf)
                .map_err(|_| PdfError::InvalidStream { offset: start })?;
            self.data = StreamData::Owned(buf);
        }
        match &self.data {
            StreamData::Owned(data) => Ok(data),
            StreamData::View { .. } => unreachable!(),
        }
    }

    /// Replace the payload with an owned buffer.
    pub fn set_data(&mut self, data: impl Into<Vec<u8>>) {
        self.data = StreamData::Owned(data.into());
    }

    /// `stream\n` + payload + `\nendstream\n`.
    ///
    /// The payload must have been loaded first; a bare view cannot be
    /// serialized without its source file.
    pub(crate) fn serialize(&self, out: &mut Vec<u8>) -> Result<()> {
        match &self.data {
            StreamData::Owned(data) => {
                out.extend_from_slice(b"stream\n");
                out.extend_from_slice(data);
                out.extend_from_slice(b"\nendstream\n");
                Ok(())
            }
            StreamData::View { start, .. } => Err(PdfError::InvalidStream { offset: *start }),
        }
    }
}

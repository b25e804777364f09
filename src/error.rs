use thiserror::Error;

/// Errors raised while parsing or writing a PDF file.
///
/// Parsing errors carry the byte offset at which the problem was detected.
/// All errors are fatal to the current operation: after a failed parse the
/// document is in an undefined state and must be discarded.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("unable to open {path}: {source}")]
    UnableToOpenFile {
        path: String,
        source: std::io::Error,
    },

    #[error("unexpected end of file at offset {offset}")]
    TruncatedFile { offset: u64 },

    #[error("invalid PDF header")]
    InvalidHeader,

    #[error("invalid line at offset {offset}")]
    InvalidLine { offset: u64 },

    #[error("invalid PDF footer")]
    InvalidFooter,

    #[error("invalid dictionary at offset {offset}")]
    InvalidDictionary { offset: u64 },

    #[error("invalid name at offset {offset}")]
    InvalidName { offset: u64 },

    #[error("invalid boolean at offset {offset}")]
    InvalidBoolean { offset: u64 },

    #[error("invalid number in token {token:?}")]
    InvalidNumber { token: String },

    #[error("invalid stream at offset {offset}")]
    InvalidStream { offset: u64 },

    #[error("invalid token {token:?} at offset {offset}")]
    InvalidToken { offset: u64, token: String },

    #[error("invalid object at offset {offset}")]
    InvalidObject { offset: u64 },

    #[error("invalid trailer at offset {offset}")]
    InvalidTrailer { offset: u64 },

    #[error("invalid hexadecimal string at offset {offset}")]
    InvalidHexaString { offset: u64 },

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, PdfError>;

//! PDF parser
//!
//! Tokenizer, value parser and document parser. The flow is
//! tokenizer → value parser → document parser; the document parser produces
//! a [`crate::Document`] that keeps the source handle open for lazy stream
//! reads.

pub mod document;
pub mod tokenizer;
pub(crate) mod values;

pub use self::document::DocumentParser;
pub use self::tokenizer::Tokenizer;

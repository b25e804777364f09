//! # repdf
//!
//! A PDF file parser and incremental rewriter.
//!
//! The library reads an existing PDF into an in-memory list of indirect
//! objects plus its cross-reference table and trailer, lets you mutate
//! objects and the trailer, and writes either a full new file or an
//! incremental update appended to the original. Emitted xref offsets always
//! point at the bytes actually written.
//!
//! The parser is deliberately tolerant of real-world files: wrong stream
//! `/Length` values, missing trailers, xref streams (preserved, not
//! decoded), mixed line endings, and junk on the line after the header.
//!
//! ```rust,no_run
//! use repdf::{Document, IndirectObject};
//!
//! # fn main() -> repdf::Result<()> {
//! let mut doc = Document::open("input.pdf")?;
//!
//! // Inspect and mutate
//! println!("{} objects, PDF {}", doc.objects().len(), doc.version());
//! let mut note = IndirectObject::new(12, 0);
//! note.set("Type", repdf::objects::Name::new("Annot"));
//! doc.add_object(note);
//!
//! // Either rewrite in full or chain an incremental update
//! doc.save("rewritten.pdf")?;
//! doc.save_incremental("updated.pdf")?;
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod error;
pub mod object;
pub mod objects;
pub mod parser;
pub mod writer;

pub use document::{Document, Version, XRefEntry};
pub use error::{PdfError, Result};
pub use object::IndirectObject;
pub use objects::{Dictionary, Object};
pub use writer::PdfWriter;

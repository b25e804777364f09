//! PDF value model
//!
//! Tagged variants for every PDF value kind, with serialization to the exact
//! byte forms the writer emits.

mod array;
mod dictionary;
mod primitive;
mod stream;

pub use array::Array;
pub use dictionary::Dictionary;
pub use primitive::{HexString, Integer, Name, Object, ObjectId, PdfString, Real};
pub use stream::Stream;

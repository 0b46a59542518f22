//! Byte buffers the codecs write into and read from.
//!
//! [`ByteWriter`] grows on demand; [`ByteReader`] is a bounds-checked cursor
//! over a borrowed slice and reports exhaustion as
//! [`DecodeError::Truncated`](crate::error::DecodeError::Truncated).
//!
//! Lengths and counts use LEB128 varints; every other primitive is written
//! by its formatter.

// -----------------------------------------------------------------------------
// Modules

mod reader;
mod writer;

// -----------------------------------------------------------------------------
// Exports

pub use reader::ByteReader;
pub use writer::ByteWriter;

// -----------------------------------------------------------------------------
// Tests

//! Per-type binary codecs for plain Rust structs.
//!
//! A type describes its serializable members once with [`schema!`]; the
//! [`Synthesizer`] turns that [`Schema`] into a [`Codec`] holding one encode
//! and one decode routine. Codecs are generated once per type and version,
//! usually through a [`CodecCache`], and shared afterwards.
//!
//! **Readonly members**
//!
//! Members stored as [`Readonly<T>`] are immutable after construction.
//! Decoding them follows [`ReadonlyFieldHandling`]: they are excluded, or
//! accepted only when the decoded value matches the current one, or
//! overwritten through a [`PrivilegedWrite`](synth::PrivilegedWrite).
//!
//! **Batching**
//!
//! Adjacent plain-data members whose formatters expose a
//! [`MemoryImage`](format::MemoryImage) are copied with a single bulk copy.
//! This never changes the wire format.
//!
//! # Examples
//!
//! ```
//! use vc_codec::{CodecCache, CodecConfig, FormatterRegistry, Readonly, schema};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Account {
//!     id: Readonly<u64>,
//!     owner: String,
//!     balance: i64,
//! }
//!
//! schema! { Account { #[readonly] id: u64, owner: String, balance: i64 } }
//!
//! let cache = CodecCache::new(FormatterRegistry::new(), CodecConfig::new());
//! let codec = cache.get::<Account>().unwrap();
//!
//! let account = Account { id: Readonly::new(7), owner: "ana".into(), balance: -3 };
//! let bytes = codec.to_vec(&account);
//!
//! // The target already carries the readonly id, so it is accepted.
//! let mut target = Account { id: Readonly::new(7), ..Account::default() };
//! codec.decode_into(&mut vc_codec::ByteReader::new(&bytes), &mut target).unwrap();
//! assert_eq!(target, account);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![expect(unsafe_code, reason = "member storage is accessed through offsets and type-erased pointers")]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod hash;
mod readonly;

pub mod buffer;
pub mod config;
pub mod error;
pub mod format;
pub mod member;
pub mod schema;
pub mod synth;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use buffer::{ByteReader, ByteWriter};
pub use config::{CodecConfig, MemberOrder, ReadonlyFieldHandling};
pub use error::{CodecError, ConfigError, DecodeError};
pub use format::{Formatter, FormatterRegistry};
pub use member::{MemberClass, MemberType};
pub use readonly::Readonly;
pub use schema::{HasSchema, Schema};
pub use synth::{Codec, Synthesizer, synthesize};

#[cfg(feature = "std")]
pub use synth::CodecCache;

#[doc(hidden)]
pub mod __macro_exports {
    pub use alloc::sync::Arc;

    #[cfg(feature = "auto_register")]
    pub use inventory;
}

//! Lightweight type-erased pointers used to reach member storage.
//!
//! A synthesized codec does not know the concrete type of each member at the
//! call site; it only knows an owner pointer, a byte offset and a layout.
//! These wrappers carry a lifetime so that such accesses still read like
//! borrows instead of raw pointer arithmetic.
//!
//! **Ptr** and **PtrMut**
//!
//! [`Ptr<'a>`] and [`PtrMut<'a>`] are type-erased `&T` and `&mut T` equivalents.
//! [`byte_add`](Ptr::byte_add) moves from an owner to one of its members, and
//! [`as_bytes`](Ptr::as_bytes) / [`copy_from_bytes`](PtrMut::copy_from_bytes)
//! expose a contiguous run of plain data for bulk copies.
//!
//! **OwningPtr**
//!
//! [`OwningPtr<'a>`] points to a value that is logically moved: the receiver
//! [`read`](OwningPtr::read)s it out.
//! It never owns the allocation.
#![expect(unsafe_code, reason = "Raw pointers are inherently unsafe.")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Modules

mod type_erased;

// -----------------------------------------------------------------------------
// Top-level exports

pub use type_erased::{OwningPtr, Ptr, PtrMut};

//! Per-type formatters and the registry they are resolved from.
//!
//! A [`Formatter`] writes and reads one value. Codecs look up one formatter
//! per member through the [`FormatterRegistry`]; a formatter registered
//! explicitly takes precedence over [`MemberType::default_formatter`].
//!
//! Formatters of plain-data types may expose a [`MemoryImage`]: a promise
//! that their wire form is exactly the in-memory bytes of the value. The
//! codec planner copies adjacent members with such an image in one step.
//!
//! [`MemberType::default_formatter`]: crate::member::MemberType::default_formatter

// -----------------------------------------------------------------------------
// Modules

mod collections;
mod primitives;
mod registry;
mod shared;

#[cfg(feature = "std")]
mod sync;

// -----------------------------------------------------------------------------
// Imports

use core::any::TypeId;
use core::marker::PhantomData;

use vc_ptr::{Ptr, PtrMut};

use crate::buffer::{ByteReader, ByteWriter};
use crate::error::DecodeError;

// -----------------------------------------------------------------------------
// Exports

pub use collections::{ArrayFormatter, BoxFormatter, OptionFormatter, VecFormatter};
pub use primitives::{BoolFormatter, CharFormatter, Primitive, PrimitiveFormatter};
pub use primitives::{SizeFormatter, StringFormatter};
pub use registry::{FormatterRegistration, FormatterRegistry};
pub use shared::ArcFormatter;

#[cfg(feature = "std")]
pub use sync::{MutexFormatter, RwLockFormatter};

// -----------------------------------------------------------------------------
// Formatter

/// Writes and reads values of type `T`.
///
/// Decoding works in place: `decode` receives the current value and updates
/// it, so nested allocations can be reused.
pub trait Formatter<T>: Send + Sync + 'static {
    fn encode(&self, writer: &mut ByteWriter, value: &T);

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut T) -> Result<(), DecodeError>;

    /// Decodes through shared access, for values behind a shared handle.
    ///
    /// Returns `Ok(false)` without consuming input when `T` offers no
    /// interior mutability.
    fn decode_shared(&self, reader: &mut ByteReader<'_>, value: &T) -> Result<bool, DecodeError> {
        let _ = (reader, value);
        Ok(false)
    }

    /// The memory image of `T`, if the wire form equals its in-memory bytes.
    fn memory_image(&self) -> Option<MemoryImage> {
        None
    }
}

// -----------------------------------------------------------------------------
// Blittable

/// Types whose bytes can be copied to and from the wire verbatim.
///
/// # Safety
/// - Every bit pattern of `size_of::<Self>()` bytes is a valid value.
/// - The type has no padding bytes.
/// - The type has no drop glue. (Implied by `Copy`.)
pub unsafe trait Blittable: Copy + 'static {}

macro_rules! impl_blittable {
    ($($ty:ty),*) => {$(
        // SAFETY: integer and float types accept any bit pattern.
        unsafe impl Blittable for $ty {}
    )*};
}

impl_blittable!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

// SAFETY: arrays have no padding between elements.
unsafe impl<T: Blittable, const N: usize> Blittable for [T; N] {}

// -----------------------------------------------------------------------------
// MemoryImage

/// Proof that some [`Blittable`] type is written as its raw bytes.
///
/// Can only be obtained for blittable types, so the planner may copy the
/// member storage of a type carrying an image without further checks. The
/// planner compares [`MemoryImage::type_id`] with the member type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryImage {
    type_id: TypeId,
    size: usize,
}

impl MemoryImage {
    #[inline]
    pub fn of<T: Blittable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            size: size_of::<T>(),
        }
    }

    /// The image of `[T; N]`, given the image of `T`.
    ///
    /// Returns `None` if `self` is not the image of `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_codec::format::MemoryImage;
    ///
    /// let image = MemoryImage::of::<u16>().repeat::<u16, 3>().unwrap();
    /// assert_eq!(image, MemoryImage::of::<[u16; 3]>());
    /// assert!(MemoryImage::of::<u16>().repeat::<u32, 3>().is_none());
    /// ```
    pub fn repeat<T: 'static, const N: usize>(self) -> Option<Self> {
        if self.type_id != TypeId::of::<T>() {
            return None;
        }
        // `T` is blittable because `self` exists, hence so is `[T; N]`.
        Some(Self {
            type_id: TypeId::of::<[T; N]>(),
            size: self.size * N,
        })
    }

    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }
}

// -----------------------------------------------------------------------------
// PodFormatter

/// Writes a [`Blittable`] value as its native bytes.
///
/// This equals the little-endian wire format on little-endian targets only;
/// use it for types that never cross machines of different byte order.
pub struct PodFormatter<T>(PhantomData<fn() -> T>);

impl<T> PodFormatter<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for PodFormatter<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Blittable> Formatter<T> for PodFormatter<T> {
    #[inline]
    fn encode(&self, writer: &mut ByteWriter, value: &T) {
        // SAFETY: `T` is blittable, so all its bytes are initialized.
        unsafe { writer.copy_from(Ptr::from_ref(value), size_of::<T>()) }
    }

    #[inline]
    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut T) -> Result<(), DecodeError> {
        // SAFETY: `T` is blittable, so any bytes form a valid value.
        unsafe { reader.copy_into(PtrMut::from_mut(value), size_of::<T>()) }
    }

    #[inline]
    fn memory_image(&self) -> Option<MemoryImage> {
        Some(MemoryImage::of::<T>())
    }
}

// -----------------------------------------------------------------------------
// Tests

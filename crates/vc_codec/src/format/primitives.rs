use alloc::string::String;
use core::marker::PhantomData;

use super::{Blittable, Formatter, MemoryImage};
use crate::buffer::{ByteReader, ByteWriter};
use crate::error::DecodeError;

// -----------------------------------------------------------------------------
// Primitive

/// Numbers with a fixed little-endian wire form.
///
/// Sealed; implemented for all fixed-width integers and floats.
pub trait Primitive: Blittable + sealed::Sealed {
    #[doc(hidden)]
    fn write_le(self, writer: &mut ByteWriter);
    #[doc(hidden)]
    fn read_le(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError>;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! impl_primitive {
    ($($ty:ty),*) => {$(
        impl sealed::Sealed for $ty {}

        impl Primitive for $ty {
            #[inline]
            fn write_le(self, writer: &mut ByteWriter) {
                writer.write(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
                Ok(<$ty>::from_le_bytes(reader.read_array()?))
            }
        }
    )*};
}

impl_primitive!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

// -----------------------------------------------------------------------------
// PrimitiveFormatter

/// Writes a number as its little-endian bytes.
///
/// Exposes a [`MemoryImage`] on little-endian targets, where the wire form
/// and the memory form coincide.
pub struct PrimitiveFormatter<T>(PhantomData<fn() -> T>);

impl<T> PrimitiveFormatter<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for PrimitiveFormatter<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Primitive> Formatter<T> for PrimitiveFormatter<T> {
    #[inline]
    fn encode(&self, writer: &mut ByteWriter, value: &T) {
        value.write_le(writer);
    }

    #[inline]
    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut T) -> Result<(), DecodeError> {
        *value = T::read_le(reader)?;
        Ok(())
    }

    #[inline]
    fn memory_image(&self) -> Option<MemoryImage> {
        cfg!(target_endian = "little").then(MemoryImage::of::<T>)
    }
}

// -----------------------------------------------------------------------------
// SizeFormatter

/// Writes `usize` as `u64` and `isize` as `i64`.
///
/// The wire form does not depend on the pointer width, so there is no
/// memory image.
pub struct SizeFormatter<T>(PhantomData<fn() -> T>);

impl<T> SizeFormatter<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl Formatter<usize> for SizeFormatter<usize> {
    #[inline]
    fn encode(&self, writer: &mut ByteWriter, value: &usize) {
        (*value as u64).write_le(writer);
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut usize) -> Result<(), DecodeError> {
        let wide = u64::read_le(reader)?;
        *value = usize::try_from(wide)
            .map_err(|_| DecodeError::invalid::<usize>("value exceeds the pointer width"))?;
        Ok(())
    }
}

impl Formatter<isize> for SizeFormatter<isize> {
    #[inline]
    fn encode(&self, writer: &mut ByteWriter, value: &isize) {
        (*value as i64).write_le(writer);
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut isize) -> Result<(), DecodeError> {
        let wide = i64::read_le(reader)?;
        *value = isize::try_from(wide)
            .map_err(|_| DecodeError::invalid::<isize>("value exceeds the pointer width"))?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// BoolFormatter

/// One byte, `0` or `1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolFormatter;

impl Formatter<bool> for BoolFormatter {
    #[inline]
    fn encode(&self, writer: &mut ByteWriter, value: &bool) {
        writer.write_u8(u8::from(*value));
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut bool) -> Result<(), DecodeError> {
        *value = match reader.read_u8()? {
            0 => false,
            1 => true,
            _ => return Err(DecodeError::invalid::<bool>("expected 0 or 1")),
        };
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// CharFormatter

/// The scalar value as a little-endian `u32`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharFormatter;

impl Formatter<char> for CharFormatter {
    #[inline]
    fn encode(&self, writer: &mut ByteWriter, value: &char) {
        u32::from(*value).write_le(writer);
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut char) -> Result<(), DecodeError> {
        let scalar = u32::read_le(reader)?;
        *value = char::from_u32(scalar)
            .ok_or_else(|| DecodeError::invalid::<char>("not a unicode scalar value"))?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// StringFormatter

/// Byte length as a varint, then UTF-8.
///
/// Decoding reuses the allocation of the current string.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringFormatter;

impl Formatter<String> for StringFormatter {
    fn encode(&self, writer: &mut ByteWriter, value: &String) {
        writer.write_len(value.len());
        writer.write(value.as_bytes());
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut String) -> Result<(), DecodeError> {
        let len = reader.read_len()?;
        let bytes = reader.read(len)?;
        let text = core::str::from_utf8(bytes)
            .map_err(|_| DecodeError::invalid::<String>("invalid UTF-8"))?;
        value.clear();
        value.push_str(text);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

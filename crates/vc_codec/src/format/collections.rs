use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;

use vc_ptr::{Ptr, PtrMut};

use super::{Formatter, MemoryImage};
use crate::buffer::{ByteReader, ByteWriter};
use crate::error::DecodeError;

// -----------------------------------------------------------------------------
// VecFormatter

/// Element count as a varint, then every element.
///
/// Existing elements are decoded in place; missing ones start from
/// `T::default()`. When the element formatter has a [`MemoryImage`] and the
/// target is little-endian, the elements are copied in bulk.
pub struct VecFormatter<T: 'static> {
    element: Arc<dyn Formatter<T>>,
    bulk: Option<usize>,
}

impl<T: 'static> VecFormatter<T> {
    pub fn new(element: Arc<dyn Formatter<T>>) -> Self {
        let bulk = element
            .memory_image()
            .filter(|image| cfg!(target_endian = "little") && image.type_id() == TypeId::of::<T>())
            .map(|image| image.size());
        Self { element, bulk }
    }
}

impl<T: Default + 'static> Formatter<Vec<T>> for VecFormatter<T> {
    fn encode(&self, writer: &mut ByteWriter, value: &Vec<T>) {
        writer.write_len(value.len());
        if let Some(size) = self.bulk {
            // SAFETY: the image proves `T` blittable, so the slice has no
            // uninitialized bytes.
            unsafe { writer.copy_from(Ptr::from_ref(value.as_slice()), size * value.len()) };
            return;
        }
        for item in value {
            self.element.encode(writer, item);
        }
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut Vec<T>) -> Result<(), DecodeError> {
        let len = reader.read_count()?;

        if let Some(size) = self.bulk {
            let bytes = len
                .checked_mul(size)
                .filter(|&bytes| bytes <= reader.remaining())
                .ok_or(DecodeError::Truncated {
                    needed: len.saturating_mul(size),
                    remaining: reader.remaining(),
                })?;
            value.clear();
            value.resize_with(len, T::default);
            // SAFETY: the image proves `T` blittable, so any bytes are valid.
            return unsafe { reader.copy_into(PtrMut::from_mut(value.as_mut_slice()), bytes) };
        }

        value.truncate(len);
        for item in value.iter_mut() {
            self.element.decode(reader, item)?;
        }
        value.reserve((len - value.len()).min(reader.remaining()));
        while value.len() < len {
            let mut item = T::default();
            self.element.decode(reader, &mut item)?;
            value.push(item);
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// ArrayFormatter

/// Every element in order, no length.
pub struct ArrayFormatter<T: 'static, const N: usize> {
    element: Arc<dyn Formatter<T>>,
}

impl<T: 'static, const N: usize> ArrayFormatter<T, N> {
    #[inline]
    pub fn new(element: Arc<dyn Formatter<T>>) -> Self {
        Self { element }
    }
}

impl<T: 'static, const N: usize> Formatter<[T; N]> for ArrayFormatter<T, N> {
    fn encode(&self, writer: &mut ByteWriter, value: &[T; N]) {
        for item in value {
            self.element.encode(writer, item);
        }
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut [T; N]) -> Result<(), DecodeError> {
        for item in value {
            self.element.decode(reader, item)?;
        }
        Ok(())
    }

    fn memory_image(&self) -> Option<MemoryImage> {
        self.element.memory_image()?.repeat::<T, N>()
    }
}

// -----------------------------------------------------------------------------
// OptionFormatter

/// A tag byte, `0` for `None` and `1` for `Some`, then the value.
pub struct OptionFormatter<T: 'static> {
    inner: Arc<dyn Formatter<T>>,
}

impl<T: 'static> OptionFormatter<T> {
    #[inline]
    pub fn new(inner: Arc<dyn Formatter<T>>) -> Self {
        Self { inner }
    }
}

impl<T: Default + 'static> Formatter<Option<T>> for OptionFormatter<T> {
    fn encode(&self, writer: &mut ByteWriter, value: &Option<T>) {
        match value {
            Some(inner) => {
                writer.write_u8(1);
                self.inner.encode(writer, inner);
            }
            None => writer.write_u8(0),
        }
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut Option<T>) -> Result<(), DecodeError> {
        match reader.read_u8()? {
            0 => *value = None,
            1 => match value {
                Some(inner) => self.inner.decode(reader, inner)?,
                None => {
                    let mut inner = T::default();
                    self.inner.decode(reader, &mut inner)?;
                    *value = Some(inner);
                }
            },
            _ => return Err(DecodeError::invalid::<Option<T>>("expected tag 0 or 1")),
        }
        Ok(())
    }

    fn decode_shared(&self, reader: &mut ByteReader<'_>, value: &Option<T>) -> Result<bool, DecodeError> {
        let start = reader.clone();
        match (reader.read_u8()?, value) {
            (1, Some(inner)) if self.inner.decode_shared(reader, inner)? => Ok(true),
            _ => {
                *reader = start;
                Ok(false)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// BoxFormatter

/// Same wire form as `T`.
pub struct BoxFormatter<T: 'static> {
    inner: Arc<dyn Formatter<T>>,
}

impl<T: 'static> BoxFormatter<T> {
    #[inline]
    pub fn new(inner: Arc<dyn Formatter<T>>) -> Self {
        Self { inner }
    }
}

impl<T: 'static> Formatter<Box<T>> for BoxFormatter<T> {
    #[inline]
    fn encode(&self, writer: &mut ByteWriter, value: &Box<T>) {
        self.inner.encode(writer, value);
    }

    #[inline]
    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut Box<T>) -> Result<(), DecodeError> {
        self.inner.decode(reader, value)
    }

    #[inline]
    fn decode_shared(&self, reader: &mut ByteReader<'_>, value: &Box<T>) -> Result<bool, DecodeError> {
        self.inner.decode_shared(reader, value)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{ArrayFormatter, OptionFormatter, VecFormatter};
    use crate::buffer::{ByteReader, ByteWriter};
    use crate::error::DecodeError;
    use crate::format::{Formatter, MemoryImage, PrimitiveFormatter, SizeFormatter, StringFormatter};

    fn u16s() -> VecFormatter<u16> {
        VecFormatter::new(Arc::new(PrimitiveFormatter::<u16>::new()))
    }

    #[test]
    fn vec_bulk_matches_per_element() {
        let items: Vec<u16> = (0..100).map(|i| i * 3).collect();

        let mut bulk = ByteWriter::new();
        u16s().encode(&mut bulk, &items);

        let mut expected = ByteWriter::new();
        expected.write_len(items.len());
        for item in &items {
            expected.write(&item.to_le_bytes());
        }
        assert_eq!(bulk.as_slice(), expected.as_slice());

        let mut decoded = vec![7u16; 3];
        u16s().decode(&mut ByteReader::new(bulk.as_slice()), &mut decoded).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn vec_grows_and_shrinks() {
        let formatter = VecFormatter::<String>::new(Arc::new(StringFormatter));

        let mut writer = ByteWriter::new();
        formatter.encode(&mut writer, &vec![String::from("a"), String::from("bc")]);

        let mut shorter = Vec::new();
        formatter.decode(&mut ByteReader::new(writer.as_slice()), &mut shorter).unwrap();
        assert_eq!(shorter, ["a", "bc"]);

        let mut longer = vec![String::from("x"); 5];
        formatter.decode(&mut ByteReader::new(writer.as_slice()), &mut longer).unwrap();
        assert_eq!(longer, ["a", "bc"]);
    }

    #[test]
    fn vec_truncated_count() {
        let mut writer = ByteWriter::new();
        writer.write_len(4);
        writer.write(&[0; 5]);
        let mut value = Vec::new();
        assert!(matches!(
            u16s().decode(&mut ByteReader::new(writer.as_slice()), &mut value),
            Err(DecodeError::Truncated { needed: 8, remaining: 5 })
        ));
    }

    #[test]
    fn vec_of_empty_elements() {
        let formatter = VecFormatter::<[u8; 0]>::new(Arc::new(ArrayFormatter::<u8, 0>::new(Arc::new(
            PrimitiveFormatter::<u8>::new(),
        ))));

        let mut writer = ByteWriter::new();
        formatter.encode(&mut writer, &vec![[]; 3]);
        assert_eq!(writer.as_slice(), &[3]);

        let mut value = Vec::new();
        let mut reader = ByteReader::new(writer.as_slice());
        formatter.decode(&mut reader, &mut value).unwrap();
        assert_eq!(value.len(), 3);
        assert!(reader.is_empty());
    }

    #[test]
    fn vec_count_larger_than_input() {
        let mut writer = ByteWriter::new();
        writer.write_len(1 << 30);
        writer.write(&[1, 2]);
        let formatter = VecFormatter::<String>::new(Arc::new(StringFormatter));
        let mut value = Vec::new();
        assert!(matches!(
            formatter.decode(&mut ByteReader::new(writer.as_slice()), &mut value),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn array_image() {
        let plain = ArrayFormatter::<u32, 4>::new(Arc::new(PrimitiveFormatter::<u32>::new()));
        if cfg!(target_endian = "little") {
            assert_eq!(plain.memory_image(), Some(MemoryImage::of::<[u32; 4]>()));
        }

        let sized = ArrayFormatter::<usize, 2>::new(Arc::new(SizeFormatter::<usize>::new()));
        assert_eq!(sized.memory_image(), None);
    }

    #[test]
    fn option_tags() {
        let formatter = OptionFormatter::<u8>::new(Arc::new(PrimitiveFormatter::<u8>::new()));

        let mut writer = ByteWriter::new();
        formatter.encode(&mut writer, &Some(9));
        formatter.encode(&mut writer, &None);
        assert_eq!(writer.as_slice(), &[1, 9, 0]);

        let mut reader = ByteReader::new(writer.as_slice());
        let mut value = None;
        formatter.decode(&mut reader, &mut value).unwrap();
        assert_eq!(value, Some(9));
        formatter.decode(&mut reader, &mut value).unwrap();
        assert_eq!(value, None);

        assert!(formatter.decode(&mut ByteReader::new(&[3]), &mut value).is_err());
    }

    #[test]
    fn boxed_is_transparent() {
        let formatter = super::BoxFormatter::<u16>::new(Arc::new(PrimitiveFormatter::<u16>::new()));
        let mut writer = ByteWriter::new();
        formatter.encode(&mut writer, &Box::new(513));
        assert_eq!(writer.as_slice(), &[1, 2]);
    }
}

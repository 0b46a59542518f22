use alloc::sync::Arc;

use super::Formatter;
use crate::buffer::{ByteReader, ByteWriter};
use crate::error::DecodeError;
use crate::member::MemberType;

// -----------------------------------------------------------------------------
// ArcFormatter

/// Same wire form as `T`.
///
/// Decoding keeps the current handle whenever it can:
///
/// 1. a uniquely owned referent is decoded in place;
/// 2. a shared referent with interior mutability is decoded through it;
/// 3. otherwise a detached copy is decoded, and the handle is replaced only
///    if the result differs from the current referent.
pub struct ArcFormatter<T: 'static> {
    inner: Arc<dyn Formatter<T>>,
}

impl<T: 'static> ArcFormatter<T> {
    #[inline]
    pub fn new(inner: Arc<dyn Formatter<T>>) -> Self {
        Self { inner }
    }
}

impl<T: MemberType> Formatter<Arc<T>> for ArcFormatter<T> {
    #[inline]
    fn encode(&self, writer: &mut ByteWriter, value: &Arc<T>) {
        self.inner.encode(writer, value);
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut Arc<T>) -> Result<(), DecodeError> {
        if let Some(unique) = Arc::get_mut(value) {
            return self.inner.decode(reader, unique);
        }
        if self.inner.decode_shared(reader, &**value)? {
            return Ok(());
        }
        let Some(mut fresh) = (**value).duplicate() else {
            return Err(DecodeError::invalid::<Arc<T>>("shared value cannot be copied"));
        };
        self.inner.decode(reader, &mut fresh)?;
        if !fresh.is_same(&**value) {
            *value = Arc::new(fresh);
        }
        Ok(())
    }

    #[inline]
    fn decode_shared(&self, reader: &mut ByteReader<'_>, value: &Arc<T>) -> Result<bool, DecodeError> {
        self.inner.decode_shared(reader, value)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::ArcFormatter;
    use crate::buffer::ByteReader;
    use crate::format::{Formatter, PrimitiveFormatter};

    fn bytes_of(value: u32) -> [u8; 4] {
        value.to_le_bytes()
    }

    #[test]
    fn unique_arc_in_place() {
        let formatter = ArcFormatter::<u32>::new(Arc::new(PrimitiveFormatter::<u32>::new()));
        let mut value = Arc::new(1u32);
        let before = Arc::as_ptr(&value);
        formatter.decode(&mut ByteReader::new(&bytes_of(5)), &mut value).unwrap();
        assert_eq!(*value, 5);
        assert_eq!(Arc::as_ptr(&value), before);
    }

    #[test]
    fn shared_arc_keeps_identity_when_equal() {
        let formatter = ArcFormatter::<u32>::new(Arc::new(PrimitiveFormatter::<u32>::new()));
        let mut value = Arc::new(5u32);
        let other = Arc::clone(&value);

        formatter.decode(&mut ByteReader::new(&bytes_of(5)), &mut value).unwrap();
        assert!(Arc::ptr_eq(&value, &other));

        formatter.decode(&mut ByteReader::new(&bytes_of(6)), &mut value).unwrap();
        assert!(!Arc::ptr_eq(&value, &other));
        assert_eq!((*value, *other), (6, 5));
    }
}

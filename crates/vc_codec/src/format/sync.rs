//! Formatters for the `std::sync` locks.

use alloc::sync::Arc;
use std::sync::{Mutex, PoisonError, RwLock};

use super::Formatter;
use crate::buffer::{ByteReader, ByteWriter};
use crate::error::DecodeError;

// -----------------------------------------------------------------------------
// MutexFormatter

/// Same wire form as `T`. Encoding locks the mutex.
///
/// A poisoned lock is still used; the value is overwritten anyway.
pub struct MutexFormatter<T: 'static> {
    inner: Arc<dyn Formatter<T>>,
}

impl<T: 'static> MutexFormatter<T> {
    #[inline]
    pub fn new(inner: Arc<dyn Formatter<T>>) -> Self {
        Self { inner }
    }
}

impl<T: 'static> Formatter<Mutex<T>> for MutexFormatter<T> {
    fn encode(&self, writer: &mut ByteWriter, value: &Mutex<T>) {
        let guard = value.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.encode(writer, &guard);
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut Mutex<T>) -> Result<(), DecodeError> {
        let inner = value.get_mut().unwrap_or_else(PoisonError::into_inner);
        self.inner.decode(reader, inner)
    }

    fn decode_shared(&self, reader: &mut ByteReader<'_>, value: &Mutex<T>) -> Result<bool, DecodeError> {
        let mut guard = value.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.decode(reader, &mut guard)?;
        Ok(true)
    }
}

// -----------------------------------------------------------------------------
// RwLockFormatter

/// Same wire form as `T`. Encoding takes a read lock.
pub struct RwLockFormatter<T: 'static> {
    inner: Arc<dyn Formatter<T>>,
}

impl<T: 'static> RwLockFormatter<T> {
    #[inline]
    pub fn new(inner: Arc<dyn Formatter<T>>) -> Self {
        Self { inner }
    }
}

impl<T: 'static> Formatter<RwLock<T>> for RwLockFormatter<T> {
    fn encode(&self, writer: &mut ByteWriter, value: &RwLock<T>) {
        let guard = value.read().unwrap_or_else(PoisonError::into_inner);
        self.inner.encode(writer, &guard);
    }

    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut RwLock<T>) -> Result<(), DecodeError> {
        let inner = value.get_mut().unwrap_or_else(PoisonError::into_inner);
        self.inner.decode(reader, inner)
    }

    fn decode_shared(&self, reader: &mut ByteReader<'_>, value: &RwLock<T>) -> Result<bool, DecodeError> {
        let mut guard = value.write().unwrap_or_else(PoisonError::into_inner);
        self.inner.decode(reader, &mut guard)?;
        Ok(true)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use std::sync::{Mutex, RwLock};

    use super::{MutexFormatter, RwLockFormatter};
    use crate::buffer::{ByteReader, ByteWriter};
    use crate::format::{ArcFormatter, Formatter, PrimitiveFormatter};

    #[test]
    fn shared_mutex_updates_through_lock() {
        let mutex = Arc::new(MutexFormatter::<u32>::new(Arc::new(PrimitiveFormatter::<u32>::new())));
        let formatter = ArcFormatter::<Mutex<u32>>::new(mutex);

        let mut value = Arc::new(Mutex::new(1u32));
        let other = Arc::clone(&value);
        formatter.decode(&mut ByteReader::new(&9u32.to_le_bytes()), &mut value).unwrap();
        assert!(Arc::ptr_eq(&value, &other));
        assert_eq!(*other.lock().unwrap(), 9);

        let mut writer = ByteWriter::new();
        formatter.encode(&mut writer, &value);
        assert_eq!(writer.as_slice(), &9u32.to_le_bytes());
    }

    #[test]
    fn rwlock_decodes_in_place() {
        let formatter = RwLockFormatter::<u16>::new(Arc::new(PrimitiveFormatter::<u16>::new()));
        let lock = RwLock::new(3u16);
        assert!(formatter.decode_shared(&mut ByteReader::new(&[7, 0]), &lock).unwrap());
        assert_eq!(*lock.read().unwrap(), 7);
    }
}

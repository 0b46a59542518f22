use alloc::vec::Vec;

use vc_ptr::Ptr;

// -----------------------------------------------------------------------------
// ByteWriter

/// An expandable output buffer.
///
/// # Examples
///
/// ```
/// use vc_codec::buffer::ByteWriter;
///
/// let mut writer = ByteWriter::new();
/// writer.write(&[1, 2]);
/// writer.write_varint(300);
/// assert_eq!(writer.position(), 4);
/// assert_eq!(writer.into_vec(), [1, 2, 0xAC, 0x02]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    #[inline]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates an empty writer with at least `capacity` bytes reserved.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// The bytes written so far.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Discards the content, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    #[inline]
    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes `value` as an unsigned LEB128 varint.
    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Writes a length or element count.
    #[inline]
    pub fn write_len(&mut self, len: usize) {
        self.write_varint(len as u64);
    }

    /// Appends `len` raw bytes of member storage.
    ///
    /// # Safety
    /// - `src..src + len` must be initialized memory of a single allocation.
    #[inline]
    pub unsafe fn copy_from(&mut self, src: Ptr<'_>, len: usize) {
        // SAFETY: guaranteed by the caller.
        self.buf.extend_from_slice(unsafe { src.as_bytes(len) });
    }
}

use vc_ptr::PtrMut;

use crate::error::DecodeError;

// -----------------------------------------------------------------------------
// ByteReader

/// A bounds-checked cursor over an input buffer.
///
/// A read that fails leaves the cursor where it was.
///
/// # Examples
///
/// ```
/// use vc_codec::buffer::ByteReader;
///
/// let mut reader = ByteReader::new(&[7, 0xAC, 0x02]);
/// assert_eq!(reader.read_u8().unwrap(), 7);
/// assert_eq!(reader.read_varint().unwrap(), 300);
/// assert!(reader.read_u8().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads exactly `count` bytes.
    #[inline]
    pub fn read(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(DecodeError::Truncated {
                needed: count,
                remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    /// Reads exactly `N` bytes into an array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.read(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read(1)?[0])
    }

    /// Reads an unsigned LEB128 varint.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let start = self.pos;
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = match self.read_u8() {
                Ok(byte) => byte,
                Err(e) => {
                    self.pos = start;
                    return Err(e);
                }
            };
            if shift == 63 && byte > 1 {
                self.pos = start;
                return Err(DecodeError::invalid::<u64>("varint overflows 64 bits"));
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Reads an element count.
    ///
    /// Elements may encode to zero bytes, so the count is not checked against
    /// the remaining input. Callers bound their pre-allocation themselves.
    pub fn read_count(&mut self) -> Result<usize, DecodeError> {
        let start = self.pos;
        let count = self.read_varint()?;
        usize::try_from(count).map_err(|_| {
            self.pos = start;
            DecodeError::invalid::<usize>("element count overflows usize")
        })
    }

    /// Reads a byte length.
    ///
    /// A length larger than the remaining input is reported as truncation
    /// before anything is allocated for it.
    pub fn read_len(&mut self) -> Result<usize, DecodeError> {
        let start = self.pos;
        let len = self.read_varint()?;
        let remaining = self.remaining();
        if len > remaining as u64 {
            self.pos = start;
            return Err(DecodeError::Truncated {
                needed: usize::try_from(len).unwrap_or(usize::MAX),
                remaining,
            });
        }
        Ok(len as usize)
    }

    /// Copies the next `len` bytes straight into member storage.
    ///
    /// # Safety
    /// - `dst..dst + len` must lie in a single allocation.
    /// - Every value overlapping that range must accept any bit pattern and
    ///   must not need drop.
    #[inline]
    pub unsafe fn copy_into(&mut self, mut dst: PtrMut<'_>, len: usize) -> Result<(), DecodeError> {
        let bytes = self.read(len)?;
        // SAFETY: guaranteed by the caller; `bytes` borrows the input, never the target.
        unsafe { dst.copy_from_bytes(bytes) };
        Ok(())
    }
}

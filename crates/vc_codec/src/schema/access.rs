use alloc::sync::Arc;
use core::any::TypeId;

use vc_ptr::{OwningPtr, Ptr, PtrMut};

use crate::buffer::{ByteReader, ByteWriter};
use crate::error::DecodeError;
use crate::format::{Formatter, MemoryImage};
use crate::member::MemberType;
use crate::synth::WriteBack;

// -----------------------------------------------------------------------------
// Reconciled

/// Outcome of decoding a readonly member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reconciled {
    /// The decoded value matches the current one; nothing was written.
    Unchanged,
    /// The decoded value was written through the privileged write.
    Overwritten,
    /// The decoded value differs and may not be written.
    Conflict,
}

// -----------------------------------------------------------------------------
// MemberAccess

/// Type-erased encode and decode of one member at a fixed offset.
pub(crate) trait MemberAccess: Send + Sync {
    /// # Safety
    /// - `owner` must point to a valid owner of the schema this access belongs to.
    unsafe fn encode(&self, writer: &mut ByteWriter, owner: Ptr<'_>);

    /// Decodes straight into the member storage.
    ///
    /// # Safety
    /// - `owner` must point to a valid owner of the schema this access belongs to.
    unsafe fn decode(&self, reader: &mut ByteReader<'_>, owner: PtrMut<'_>) -> Result<(), DecodeError>;

    /// Decodes into a local copy of the member, then reconciles it with the
    /// stored value.
    ///
    /// # Safety
    /// - `owner` must point to a valid owner of the schema this access belongs to.
    /// - An overwrite in `write_back` must belong to this member.
    unsafe fn decode_readonly(
        &self,
        reader: &mut ByteReader<'_>,
        owner: PtrMut<'_>,
        write_back: &WriteBack,
    ) -> Result<Reconciled, DecodeError>;

    fn memory_image(&self) -> Option<MemoryImage>;
}

// -----------------------------------------------------------------------------
// TypedAccess

/// [`MemberAccess`] for a member of type `M`.
pub(crate) struct TypedAccess<M: 'static> {
    offset: usize,
    formatter: Arc<dyn Formatter<M>>,
}

impl<M: 'static> TypedAccess<M> {
    #[inline]
    pub(crate) fn new(offset: usize, formatter: Arc<dyn Formatter<M>>) -> Self {
        Self { offset, formatter }
    }
}

impl<M: MemberType> MemberAccess for TypedAccess<M> {
    unsafe fn encode(&self, writer: &mut ByteWriter, owner: Ptr<'_>) {
        // SAFETY: the schema places a `M` at `offset`.
        let slot = unsafe { owner.byte_add(self.offset) };
        slot.debug_assert_aligned::<M>();
        // SAFETY: aligned and of type `M`.
        self.formatter.encode(writer, unsafe { slot.as_ref::<M>() });
    }

    unsafe fn decode(&self, reader: &mut ByteReader<'_>, owner: PtrMut<'_>) -> Result<(), DecodeError> {
        // SAFETY: the schema places a `M` at `offset`.
        let mut slot = unsafe { owner.byte_add(self.offset) };
        slot.debug_assert_aligned::<M>();
        // SAFETY: aligned and of type `M`.
        self.formatter.decode(reader, unsafe { slot.as_mut::<M>() })
    }

    unsafe fn decode_readonly(
        &self,
        reader: &mut ByteReader<'_>,
        owner: PtrMut<'_>,
        write_back: &WriteBack,
    ) -> Result<Reconciled, DecodeError> {
        // SAFETY: the schema places a `Readonly<M>` at `offset`, which has the layout of `M`.
        let slot = unsafe { owner.byte_add(self.offset) };
        slot.debug_assert_aligned::<M>();
        // SAFETY: aligned and of type `M`.
        let current = unsafe { slot.as_ref::<M>() };

        let Some(mut local) = current.duplicate() else {
            return Err(DecodeError::invalid::<M>("readonly member cannot be copied for decoding"));
        };
        self.formatter.decode(reader, &mut local)?;

        match write_back {
            WriteBack::Overwrite(write) => {
                // SAFETY: `write` belongs to this member, so it writes a `M`,
                // and `local` is a `M` handed over by value.
                OwningPtr::make(local, |value| unsafe { write.apply(slot, value) });
                Ok(Reconciled::Overwritten)
            }
            WriteBack::RequireEqual | WriteBack::RequireSameInstance => {
                if local.is_same(current) {
                    Ok(Reconciled::Unchanged)
                } else {
                    Ok(Reconciled::Conflict)
                }
            }
        }
    }

    fn memory_image(&self) -> Option<MemoryImage> {
        self.formatter
            .memory_image()
            .filter(|image| image.type_id() == TypeId::of::<M>())
    }
}

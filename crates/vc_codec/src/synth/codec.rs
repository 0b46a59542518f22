use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use vc_ptr::{Ptr, PtrMut};

use super::planner::{BatchGroup, BatchPlan};
use super::resolver::WriteBack;
use crate::buffer::{ByteReader, ByteWriter};
use crate::config::ReadonlyFieldHandling;
use crate::error::DecodeError;
use crate::format::Formatter;
use crate::schema::{MemberDescriptor, Reconciled};

// -----------------------------------------------------------------------------
// Step

/// One instruction of a codec, in effective order.
#[derive(Debug, Clone, Copy)]
pub(super) enum Step {
    /// Bulk copy of the owner bytes `offset..offset + size`.
    Batch { offset: usize, size: usize },
    /// A writable member, decoded straight into its storage.
    Member { index: usize },
    /// A readonly member, decoded into a local and reconciled.
    Readonly { index: usize, write_back: WriteBack },
}

// -----------------------------------------------------------------------------
// Codec

/// The encode and decode routines of one owner type and schema version.
///
/// Generated once by the [`Synthesizer`](super::Synthesizer) and immutable
/// afterwards; every call only touches the buffer and the value it is given,
/// so a codec can be shared across threads freely.
///
/// A codec is itself a [`Formatter`], so it can be registered for nested
/// owner types.
pub struct Codec<T> {
    pub(super) type_name: &'static str,
    pub(super) version: u32,
    pub(super) policy: ReadonlyFieldHandling,
    pub(super) members: Vec<MemberDescriptor>,
    pub(super) plan: BatchPlan,
    pub(super) steps: Vec<Step>,
    pub(super) _marker: PhantomData<fn(T) -> T>,
}

impl<T> Codec<T> {
    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// The readonly policy the codec was generated for.
    #[inline]
    pub const fn policy(&self) -> ReadonlyFieldHandling {
        self.policy
    }

    /// Members in declaration order.
    #[inline]
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Member names in wire order.
    pub fn effective_order(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plan.order.iter().map(|&index| self.members[index].name())
    }

    /// The bulk-copied member runs, in wire order.
    pub fn batch_groups(&self) -> impl Iterator<Item = &BatchGroup> {
        self.plan.groups()
    }

    /// Appends the encoding of `value` to `writer`.
    ///
    /// Identical values always produce identical bytes.
    pub fn encode(&self, writer: &mut ByteWriter, value: &T) {
        let owner = Ptr::from_ref(value);
        for step in &self.steps {
            match *step {
                // SAFETY: the planner only groups blittable members that
                // tile this range without gaps.
                Step::Batch { offset, size } => unsafe { writer.copy_from(owner.byte_add(offset), size) },
                // SAFETY: the member belongs to the schema of `T`.
                Step::Member { index } | Step::Readonly { index, .. } => unsafe {
                    self.members[index].access().encode(writer, owner);
                },
            }
        }
    }

    /// Decodes into an existing value.
    ///
    /// Members are committed one by one in wire order. On failure, members
    /// before the failing one keep their decoded values and nothing after it
    /// is touched.
    pub fn decode_into(&self, reader: &mut ByteReader<'_>, value: &mut T) -> Result<(), DecodeError> {
        let mut owner = PtrMut::from_mut(value);
        for step in &self.steps {
            match *step {
                // SAFETY: the planner only groups blittable members that
                // tile this range without gaps.
                Step::Batch { offset, size } => unsafe {
                    reader.copy_into(owner.reborrow().byte_add(offset), size)?;
                },
                // SAFETY: the member belongs to the schema of `T`.
                Step::Member { index } => unsafe {
                    self.members[index].access().decode(reader, owner.reborrow())?;
                },
                Step::Readonly { index, write_back } => {
                    let member = &self.members[index];
                    // SAFETY: the member and its write-back belong to the schema of `T`.
                    let reconciled = unsafe { member.access().decode_readonly(reader, owner.reborrow(), &write_back)? };
                    if reconciled == Reconciled::Conflict {
                        return Err(self.conflict(member));
                    }
                }
            }
        }
        Ok(())
    }

    #[cold]
    fn conflict(&self, member: &MemberDescriptor) -> DecodeError {
        if member.is_value_type() {
            DecodeError::ReadonlyValueMismatch {
                type_name: self.type_name,
                member: member.name(),
                policy: self.policy,
            }
        } else {
            DecodeError::ReadonlyReferenceReassigned {
                type_name: self.type_name,
                member: member.name(),
                policy: self.policy,
            }
        }
    }

    /// Encodes `value` into a new buffer.
    pub fn to_vec(&self, value: &T) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.encode(&mut writer, value);
        writer.into_vec()
    }
}

impl<T: Default> Codec<T> {
    /// Decodes a new value, starting from `T::default()`.
    ///
    /// Readonly members are reconciled against their default values.
    pub fn decode(&self, reader: &mut ByteReader<'_>) -> Result<T, DecodeError> {
        let mut value = T::default();
        self.decode_into(reader, &mut value)?;
        Ok(value)
    }

    /// Decodes a new value from exactly `bytes`.
    pub fn from_slice(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        let mut reader = ByteReader::new(bytes);
        let value = self.decode(&mut reader)?;
        if !reader.is_empty() {
            return Err(DecodeError::InvalidData {
                type_name: self.type_name,
                reason: "trailing bytes after the encoded value",
            });
        }
        Ok(value)
    }
}

impl<T: 'static> Formatter<T> for Codec<T> {
    #[inline]
    fn encode(&self, writer: &mut ByteWriter, value: &T) {
        Codec::encode(self, writer, value);
    }

    #[inline]
    fn decode(&self, reader: &mut ByteReader<'_>, value: &mut T) -> Result<(), DecodeError> {
        self.decode_into(reader, value)
    }
}

impl<T> fmt::Debug for Codec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("type_name", &self.type_name)
            .field("version", &self.version)
            .field("policy", &self.policy)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

use alloc::sync::Arc;
use core::alloc::Layout;
use core::any::TypeId;
use core::fmt;

use bitflags::bitflags;

use super::access::MemberAccess;
use crate::member::MemberClass;
use crate::synth::PrivilegedWrite;

// -----------------------------------------------------------------------------
// MemberFlags

bitflags! {
    /// Static properties of a member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        /// Immutable after construction; stored as `Readonly<T>`.
        const READONLY     = 1 << 0;
        /// Compared by content, not identity.
        const VALUE_TYPE   = 1 << 1;
        /// The formatter writes the in-memory bytes of the member.
        const MEMORY_IMAGE = 1 << 2;
    }
}

// -----------------------------------------------------------------------------
// MemberDescriptor

/// One serializable member of an owner type.
///
/// Holds the storage location inside the owner, the member's static
/// properties, and the type-erased access used by codecs.
pub struct MemberDescriptor {
    pub(super) name: &'static str,
    pub(super) type_name: &'static str,
    pub(super) type_id: TypeId,
    pub(super) offset: usize,
    pub(super) layout: Layout,
    pub(super) class: MemberClass,
    pub(super) flags: MemberFlags,
    pub(super) overwrite: Option<PrivilegedWrite>,
    pub(super) access: Arc<dyn MemberAccess>,
}

impl MemberDescriptor {
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Name of the member type, without `Readonly`.
    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Byte offset of the member inside its owner.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// Offset one past the last byte of the member.
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset + self.layout.size()
    }

    #[inline]
    pub const fn class(&self) -> MemberClass {
        self.class
    }

    #[inline]
    pub const fn flags(&self) -> MemberFlags {
        self.flags
    }

    #[inline]
    pub const fn is_readonly(&self) -> bool {
        self.flags.contains(MemberFlags::READONLY)
    }

    #[inline]
    pub const fn is_value_type(&self) -> bool {
        self.flags.contains(MemberFlags::VALUE_TYPE)
    }

    #[inline]
    pub const fn has_memory_image(&self) -> bool {
        self.flags.contains(MemberFlags::MEMORY_IMAGE)
    }

    /// The privileged write for this member, if the build provides one.
    ///
    /// Every readonly member carries it, since the policy is chosen when the
    /// codec is synthesized, not when the schema is built. It is inert unless
    /// that policy is [`ForcedOverwrite`]: only then does the resolver place
    /// it in the decode plan.
    ///
    /// [`ForcedOverwrite`]: crate::ReadonlyFieldHandling::ForcedOverwrite
    #[inline]
    pub const fn privileged_write(&self) -> Option<PrivilegedWrite> {
        self.overwrite
    }

    #[inline]
    pub(crate) fn access(&self) -> &dyn MemberAccess {
        &*self.access
    }
}

impl Clone for MemberDescriptor {
    fn clone(&self) -> Self {
        Self {
            access: Arc::clone(&self.access),
            ..*self
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("offset", &self.offset)
            .field("size", &self.layout.size())
            .field("class", &self.class)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

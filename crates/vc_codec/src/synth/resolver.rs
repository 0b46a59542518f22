//! Decides how each readonly member is written back after decoding.

use core::fmt;

use vc_ptr::{OwningPtr, PtrMut};

use crate::config::ReadonlyFieldHandling;
use crate::error::ConfigError;
use crate::schema::MemberDescriptor;

// -----------------------------------------------------------------------------
// PrivilegedWrite

/// Writes a readonly member in place, bypassing [`Readonly`](crate::Readonly).
///
/// Only available with the `forced_overwrite` feature. The previous value is
/// dropped.
#[derive(Clone, Copy)]
pub struct PrivilegedWrite {
    func: unsafe fn(PtrMut<'_>, OwningPtr<'_>),
}

impl PrivilegedWrite {
    /// The privileged write for members of type `M`.
    ///
    /// Returns `None` when the build does not permit writing readonly members.
    #[inline]
    pub fn of<M: 'static>() -> Option<Self> {
        #[cfg(feature = "forced_overwrite")]
        {
            unsafe fn write<M>(mut slot: PtrMut<'_>, value: OwningPtr<'_>) {
                // SAFETY: the caller passes a `M` slot and a `M` value.
                unsafe { *slot.as_mut::<M>() = value.read::<M>() }
            }
            Some(Self { func: write::<M> })
        }
        #[cfg(not(feature = "forced_overwrite"))]
        {
            None
        }
    }

    /// Moves `value` into `slot`, dropping the previous value.
    ///
    /// # Safety
    /// - `slot` must point to an aligned, initialized `M`, where `M` is the
    ///   type this write was created for.
    /// - `value` must point to a `M` whose ownership is handed over.
    #[inline]
    pub unsafe fn apply(self, slot: PtrMut<'_>, value: OwningPtr<'_>) {
        // SAFETY: guaranteed by the caller.
        unsafe { (self.func)(slot, value) }
    }
}

impl fmt::Debug for PrivilegedWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivilegedWrite")
    }
}

// -----------------------------------------------------------------------------
// WriteBack

/// How a decoded readonly member reaches its storage.
#[derive(Debug, Clone, Copy)]
pub enum WriteBack {
    /// Write unconditionally through the privileged write.
    Overwrite(PrivilegedWrite),
    /// Accept only a decoded value equal to the current one; write nothing.
    RequireEqual,
    /// Accept only the current instance itself; write nothing.
    RequireSameInstance,
}

// -----------------------------------------------------------------------------
// resolve

/// Chooses the [`WriteBack`] of a readonly member under `policy`.
///
/// Fails if the policy excludes readonly members, which means the schema was
/// built under a different configuration, or if an overwrite is required but
/// unavailable.
pub fn resolve(
    type_name: &'static str,
    member: &MemberDescriptor,
    policy: ReadonlyFieldHandling,
) -> Result<WriteBack, ConfigError> {
    match policy {
        ReadonlyFieldHandling::ExcludeFromSerialization => Err(ConfigError::ReadonlyExcluded {
            type_name,
            member: member.name(),
        }),
        ReadonlyFieldHandling::ForcedOverwrite => match member.privileged_write() {
            Some(write) => Ok(WriteBack::Overwrite(write)),
            None => Err(ConfigError::OverwriteUnavailable {
                type_name,
                member: member.name(),
            }),
        },
        ReadonlyFieldHandling::Throw if member.is_value_type() => Ok(WriteBack::RequireEqual),
        ReadonlyFieldHandling::Throw => Ok(WriteBack::RequireSameInstance),
    }
}

// -----------------------------------------------------------------------------
// Tests

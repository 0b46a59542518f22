//! Static classification of member types.
//!
//! Every type that can appear as a member implements [`MemberType`]. The
//! class decides the on-wire order bucket and whether readonly reconciliation
//! compares content or identity.

// -----------------------------------------------------------------------------
// Modules

mod impls;

// -----------------------------------------------------------------------------
// Imports

use alloc::sync::Arc;

use crate::format::{Formatter, FormatterRegistry};

// -----------------------------------------------------------------------------
// MemberClass

/// Storage class of a member type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberClass {
    /// Fixed-size value without references, e.g. numbers or arrays of numbers.
    Plain,
    /// Value type that owns references, e.g. `String` or `Box<T>`.
    Composite,
    /// Array-like value of variable length, e.g. `Vec<T>`.
    Sequence,
    /// Shared handle compared by identity, e.g. `Arc<T>`.
    Reference,
}

impl MemberClass {
    /// `false` only for [`MemberClass::Reference`].
    #[inline]
    pub const fn is_value_type(self) -> bool {
        !matches!(self, MemberClass::Reference)
    }

    /// Bucket used by [`MemberOrder::Grouped`](crate::config::MemberOrder::Grouped).
    #[inline]
    pub(crate) const fn order_rank(self) -> u8 {
        match self {
            MemberClass::Plain => 0,
            MemberClass::Composite => 1,
            MemberClass::Sequence => 2,
            MemberClass::Reference => 3,
        }
    }
}

// -----------------------------------------------------------------------------
// MemberType

/// A type usable as a serializable member.
///
/// Implemented for primitives, `String`, `Vec`, arrays, `Option`, `Box`,
/// `Arc`, `Mutex` and `RwLock`. User types usually go through
/// [`impl_member_type!`](crate::impl_member_type).
pub trait MemberType: Sized + 'static {
    const CLASS: MemberClass;

    /// Whether `self` and `other` are the same for readonly reconciliation.
    ///
    /// Value classes compare content with the type's own equality; the
    /// reference class compares identity.
    fn is_same(&self, other: &Self) -> bool;

    /// A detached copy used when a shared value cannot be updated in place.
    ///
    /// Reference classes copy the handle, not the referent.
    fn duplicate(&self) -> Option<Self>;

    /// The formatter used when the registry has no explicit one.
    fn default_formatter(registry: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        let _ = registry;
        None
    }
}

// -----------------------------------------------------------------------------
// impl_member_type

/// Implements [`MemberType`] for a user type through `PartialEq` and `Clone`.
///
/// - `impl_member_type!(Ty => pod)`: a [`Blittable`](crate::format::Blittable)
///   type of class `Plain`, written through its memory image.
/// - `impl_member_type!(Ty => Class)`: any class, with no default formatter;
///   register one (e.g. the type's own codec) in the
///   [`FormatterRegistry`](crate::format::FormatterRegistry).
///
/// # Examples
///
/// ```
/// use vc_codec::{impl_member_type, format::Blittable};
///
/// #[repr(C)]
/// #[derive(Clone, Copy, PartialEq)]
/// struct Vec3 { x: f32, y: f32, z: f32 }
///
/// // SAFETY: three `f32` without padding.
/// unsafe impl Blittable for Vec3 {}
///
/// impl_member_type!(Vec3 => pod);
/// ```
#[macro_export]
macro_rules! impl_member_type {
    ($ty:ty => pod) => {
        impl $crate::member::MemberType for $ty {
            const CLASS: $crate::member::MemberClass = $crate::member::MemberClass::Plain;

            #[inline]
            fn is_same(&self, other: &Self) -> bool {
                self == other
            }

            #[inline]
            fn duplicate(&self) -> ::core::option::Option<Self> {
                ::core::option::Option::Some(*self)
            }

            fn default_formatter(
                _: &$crate::format::FormatterRegistry,
            ) -> ::core::option::Option<$crate::__macro_exports::Arc<dyn $crate::format::Formatter<Self>>> {
                ::core::option::Option::Some($crate::__macro_exports::Arc::new(
                    $crate::format::PodFormatter::<Self>::new(),
                ))
            }
        }
    };
    ($ty:ty => $class:ident) => {
        impl $crate::member::MemberType for $ty {
            const CLASS: $crate::member::MemberClass = $crate::member::MemberClass::$class;

            #[inline]
            fn is_same(&self, other: &Self) -> bool {
                self == other
            }

            #[inline]
            fn duplicate(&self) -> ::core::option::Option<Self> {
                ::core::option::Option::Some(::core::clone::Clone::clone(self))
            }
        }
    };
}

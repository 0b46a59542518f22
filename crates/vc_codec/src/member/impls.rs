use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::sync::{Mutex, PoisonError, RwLock};

use super::{MemberClass, MemberType};
use crate::format::{ArcFormatter, ArrayFormatter, BoxFormatter, OptionFormatter};
use crate::format::{BoolFormatter, CharFormatter, PrimitiveFormatter, SizeFormatter};
use crate::format::{Formatter, FormatterRegistry, StringFormatter, VecFormatter};
#[cfg(feature = "std")]
use crate::format::{MutexFormatter, RwLockFormatter};

// -----------------------------------------------------------------------------
// Primitives

macro_rules! impl_plain {
    ($formatter:ident: $($ty:ty),* $(,)?) => {$(
        impl MemberType for $ty {
            const CLASS: MemberClass = MemberClass::Plain;

            #[inline]
            fn is_same(&self, other: &Self) -> bool {
                self == other
            }

            #[inline]
            fn duplicate(&self) -> Option<Self> {
                Some(*self)
            }

            fn default_formatter(_: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
                Some(Arc::new($formatter::<$ty>::new()))
            }
        }
    )*};
}

impl_plain!(PrimitiveFormatter: u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);
impl_plain!(SizeFormatter: usize, isize);

impl MemberType for bool {
    const CLASS: MemberClass = MemberClass::Plain;

    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        self == other
    }

    #[inline]
    fn duplicate(&self) -> Option<Self> {
        Some(*self)
    }

    fn default_formatter(_: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        Some(Arc::new(BoolFormatter))
    }
}

impl MemberType for char {
    const CLASS: MemberClass = MemberClass::Plain;

    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        self == other
    }

    #[inline]
    fn duplicate(&self) -> Option<Self> {
        Some(*self)
    }

    fn default_formatter(_: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        Some(Arc::new(CharFormatter))
    }
}

impl MemberType for String {
    const CLASS: MemberClass = MemberClass::Composite;

    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        self == other
    }

    #[inline]
    fn duplicate(&self) -> Option<Self> {
        Some(self.clone())
    }

    fn default_formatter(_: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        Some(Arc::new(StringFormatter))
    }
}

// -----------------------------------------------------------------------------
// Containers

impl<T: MemberType + Default> MemberType for Vec<T> {
    const CLASS: MemberClass = MemberClass::Sequence;

    fn is_same(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.is_same(b))
    }

    fn duplicate(&self) -> Option<Self> {
        self.iter().map(MemberType::duplicate).collect()
    }

    fn default_formatter(registry: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        let element = registry.resolve::<T>()?;
        Some(Arc::new(VecFormatter::new(element)))
    }
}

impl<T: MemberType, const N: usize> MemberType for [T; N] {
    const CLASS: MemberClass = T::CLASS;

    fn is_same(&self, other: &Self) -> bool {
        self.iter().zip(other).all(|(a, b)| a.is_same(b))
    }

    fn duplicate(&self) -> Option<Self> {
        let items: Vec<T> = self.iter().map(MemberType::duplicate).collect::<Option<_>>()?;
        items.try_into().ok()
    }

    fn default_formatter(registry: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        let element = registry.resolve::<T>()?;
        Some(Arc::new(ArrayFormatter::<T, N>::new(element)))
    }
}

impl<T: MemberType + Default> MemberType for Option<T> {
    const CLASS: MemberClass = T::CLASS;

    fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.is_same(b),
            (None, None) => true,
            _ => false,
        }
    }

    fn duplicate(&self) -> Option<Self> {
        match self {
            Some(value) => value.duplicate().map(Some),
            None => Some(None),
        }
    }

    fn default_formatter(registry: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        let inner = registry.resolve::<T>()?;
        Some(Arc::new(OptionFormatter::new(inner)))
    }
}

impl<T: MemberType> MemberType for Box<T> {
    const CLASS: MemberClass = match T::CLASS {
        MemberClass::Plain => MemberClass::Composite,
        class => class,
    };

    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        (**self).is_same(other)
    }

    fn duplicate(&self) -> Option<Self> {
        (**self).duplicate().map(Box::new)
    }

    fn default_formatter(registry: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        let inner = registry.resolve::<T>()?;
        Some(Arc::new(BoxFormatter::new(inner)))
    }
}

// -----------------------------------------------------------------------------
// Shared

impl<T: MemberType> MemberType for Arc<T> {
    const CLASS: MemberClass = MemberClass::Reference;

    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }

    #[inline]
    fn duplicate(&self) -> Option<Self> {
        Some(Arc::clone(self))
    }

    fn default_formatter(registry: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        let inner = registry.resolve::<T>()?;
        Some(Arc::new(ArcFormatter::new(inner)))
    }
}

#[cfg(feature = "std")]
impl<T: MemberType> MemberType for Mutex<T> {
    const CLASS: MemberClass = T::CLASS;

    fn is_same(&self, other: &Self) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        let a = self.lock().unwrap_or_else(PoisonError::into_inner);
        let b = other.lock().unwrap_or_else(PoisonError::into_inner);
        a.is_same(&b)
    }

    fn duplicate(&self) -> Option<Self> {
        let inner = self.lock().unwrap_or_else(PoisonError::into_inner);
        inner.duplicate().map(Mutex::new)
    }

    fn default_formatter(registry: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        let inner = registry.resolve::<T>()?;
        Some(Arc::new(MutexFormatter::new(inner)))
    }
}

#[cfg(feature = "std")]
impl<T: MemberType> MemberType for RwLock<T> {
    const CLASS: MemberClass = T::CLASS;

    fn is_same(&self, other: &Self) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        let a = self.read().unwrap_or_else(PoisonError::into_inner);
        let b = other.read().unwrap_or_else(PoisonError::into_inner);
        a.is_same(&b)
    }

    fn duplicate(&self) -> Option<Self> {
        let inner = self.read().unwrap_or_else(PoisonError::into_inner);
        inner.duplicate().map(RwLock::new)
    }

    fn default_formatter(registry: &FormatterRegistry) -> Option<Arc<dyn Formatter<Self>>> {
        let inner = registry.resolve::<T>()?;
        Some(Arc::new(RwLockFormatter::new(inner)))
    }
}

// -----------------------------------------------------------------------------
// Tests

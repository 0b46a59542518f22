use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;

use super::Formatter;
use crate::hash::{HashMap, new_map};
use crate::member::MemberType;

// -----------------------------------------------------------------------------
// FormatterRegistry

/// Formatters by member type.
///
/// [`resolve`](Self::resolve) prefers an explicitly registered formatter and
/// falls back to [`MemberType::default_formatter`]. User types without a
/// default, such as nested structs, are registered here, usually with their
/// own [`Codec`](crate::synth::Codec).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_codec::format::{FormatterRegistry, PodFormatter};
///
/// let mut registry = FormatterRegistry::empty();
/// assert!(registry.resolve::<u32>().is_some());
///
/// registry.register::<u32>(Arc::new(PodFormatter::<u32>::new()));
/// assert!(registry.contains::<u32>());
/// ```
pub struct FormatterRegistry {
    formatters: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Default for FormatterRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("registered", &self.formatters.len())
            .finish()
    }
}

impl FormatterRegistry {
    /// A registry with no explicit formatters.
    #[inline]
    pub const fn empty() -> Self {
        Self { formatters: new_map() }
    }

    /// A registry with every formatter submitted through
    /// [`submit_formatter!`](crate::submit_formatter).
    ///
    /// Same as [`empty`](Self::empty) without the `auto_register` feature.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.auto_register();
        registry
    }

    /// Registers all submitted formatters.
    ///
    /// Returns `false` when the `auto_register` feature is disabled.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            for registration in inventory::iter::<FormatterRegistration> {
                (registration.register)(self);
            }
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    /// Registers the formatter for `M`, replacing any previous one.
    pub fn register<M: 'static>(&mut self, formatter: Arc<dyn Formatter<M>>) {
        self.formatters.insert(TypeId::of::<M>(), Box::new(formatter));
    }

    /// Whether `M` has an explicitly registered formatter.
    #[inline]
    pub fn contains<M: 'static>(&self) -> bool {
        self.formatters.contains_key(&TypeId::of::<M>())
    }

    /// Number of explicitly registered formatters.
    #[inline]
    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }

    /// The formatter for `M`.
    pub fn resolve<M: MemberType>(&self) -> Option<Arc<dyn Formatter<M>>> {
        match self.formatters.get(&TypeId::of::<M>()) {
            Some(entry) => entry.downcast_ref::<Arc<dyn Formatter<M>>>().cloned(),
            None => M::default_formatter(self),
        }
    }
}

// -----------------------------------------------------------------------------
// FormatterRegistration

/// A formatter registration collected at link time.
///
/// Created by [`submit_formatter!`](crate::submit_formatter).
pub struct FormatterRegistration {
    pub register: fn(&mut FormatterRegistry),
}

#[cfg(feature = "auto_register")]
inventory::collect!(FormatterRegistration);

/// Submits a formatter to every [`FormatterRegistry::new`].
///
/// Requires the `auto_register` feature; expands to nothing otherwise.
///
/// ```ignore
/// submit_formatter!(Position, PodFormatter::<Position>::new());
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_formatter {
    ($ty:ty, $formatter:expr) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::format::FormatterRegistration {
                register: |registry| {
                    registry.register::<$ty>($crate::__macro_exports::Arc::new($formatter));
                },
            }
        }
    };
}

/// Submits a formatter to every [`FormatterRegistry::new`].
///
/// Requires the `auto_register` feature; expands to nothing otherwise.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! submit_formatter {
    ($ty:ty, $formatter:expr) => {};
}

// -----------------------------------------------------------------------------
// Tests

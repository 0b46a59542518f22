use alloc::sync::Arc;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::any::{TypeId, type_name};
use core::marker::PhantomData;

use super::access::{MemberAccess, TypedAccess};
use super::descriptor::{MemberDescriptor, MemberFlags};
use crate::config::{CodecConfig, ReadonlyFieldHandling};
use crate::error::ConfigError;
use crate::format::{Formatter, FormatterRegistry};
use crate::member::MemberType;
use crate::synth::PrivilegedWrite;

// -----------------------------------------------------------------------------
// SchemaBuilder

/// Collects the members of `T` in declaration order.
///
/// Passed to [`HasSchema::describe`](super::HasSchema::describe). Members are
/// usually added through [`schema!`](crate::schema), which computes offsets
/// and checks field types.
///
/// Errors do not interrupt describing; the first one is reported when the
/// schema is built.
pub struct SchemaBuilder<'a, T> {
    registry: &'a FormatterRegistry,
    config: &'a CodecConfig,
    type_name: &'static str,
    members: Vec<MemberDescriptor>,
    error: Option<ConfigError>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: 'static> SchemaBuilder<'a, T> {
    pub(super) fn new(registry: &'a FormatterRegistry, config: &'a CodecConfig) -> Self {
        Self {
            registry,
            config,
            type_name: type_name::<T>(),
            members: Vec::new(),
            error: None,
            _marker: PhantomData,
        }
    }

    /// The configuration the schema is built for.
    #[inline]
    pub fn config(&self) -> &CodecConfig {
        self.config
    }

    #[inline]
    pub fn registry(&self) -> &FormatterRegistry {
        self.registry
    }

    /// Overrides the owner name used in errors and logs.
    #[inline]
    pub fn name(&mut self, type_name: &'static str) -> &mut Self {
        self.type_name = type_name;
        self
    }

    /// Adds a writable member of type `M`, resolving its formatter from the registry.
    ///
    /// # Safety
    /// - A field of type `M` must live at `offset` in every `T`.
    pub unsafe fn member<M: MemberType>(&mut self, name: &'static str, offset: usize) -> &mut Self {
        let formatter = self.registry.resolve::<M>();
        self.push::<M>(name, offset, formatter, false)
    }

    /// Adds a writable member with an explicit formatter.
    ///
    /// # Safety
    /// - A field of type `M` must live at `offset` in every `T`.
    pub unsafe fn member_with<M: MemberType>(
        &mut self,
        name: &'static str,
        offset: usize,
        formatter: Arc<dyn Formatter<M>>,
    ) -> &mut Self {
        self.push::<M>(name, offset, Some(formatter), false)
    }

    /// Adds a readonly member, stored as `Readonly<M>`.
    ///
    /// Skipped when the configuration excludes readonly members.
    ///
    /// # Safety
    /// - A field of type `Readonly<M>` must live at `offset` in every `T`.
    pub unsafe fn readonly_member<M: MemberType>(&mut self, name: &'static str, offset: usize) -> &mut Self {
        if self.excludes_readonly(name) {
            return self;
        }
        let formatter = self.registry.resolve::<M>();
        self.push::<M>(name, offset, formatter, true)
    }

    /// Adds a readonly member with an explicit formatter.
    ///
    /// # Safety
    /// - A field of type `Readonly<M>` must live at `offset` in every `T`.
    pub unsafe fn readonly_member_with<M: MemberType>(
        &mut self,
        name: &'static str,
        offset: usize,
        formatter: Arc<dyn Formatter<M>>,
    ) -> &mut Self {
        if self.excludes_readonly(name) {
            return self;
        }
        self.push::<M>(name, offset, Some(formatter), true)
    }

    fn excludes_readonly(&self, name: &'static str) -> bool {
        let excluded = self.config.readonly_handling == ReadonlyFieldHandling::ExcludeFromSerialization;
        if excluded {
            log::trace!("`{}.{name}` is readonly and excluded from serialization", self.type_name);
        }
        excluded
    }

    fn push<M: MemberType>(
        &mut self,
        name: &'static str,
        offset: usize,
        formatter: Option<Arc<dyn Formatter<M>>>,
        readonly: bool,
    ) -> &mut Self {
        debug_assert!(
            offset + size_of::<M>() <= size_of::<T>(),
            "member `{}.{name}` lies outside its owner",
            self.type_name,
        );

        if self.members.iter().any(|m| m.name == name) {
            self.fail(ConfigError::DuplicateMember {
                type_name: self.type_name,
                member: name,
            });
            return self;
        }

        let Some(formatter) = formatter else {
            self.fail(ConfigError::MissingFormatter {
                type_name: self.type_name,
                member: name,
                member_type: type_name::<M>(),
            });
            return self;
        };

        let access = TypedAccess::new(offset, formatter);

        let mut flags = MemberFlags::empty();
        flags.set(MemberFlags::READONLY, readonly);
        flags.set(MemberFlags::VALUE_TYPE, M::CLASS.is_value_type());
        flags.set(MemberFlags::MEMORY_IMAGE, access.memory_image().is_some());

        self.members.push(MemberDescriptor {
            name,
            type_name: type_name::<M>(),
            type_id: TypeId::of::<M>(),
            offset,
            layout: Layout::new::<M>(),
            class: M::CLASS,
            flags,
            overwrite: if readonly { PrivilegedWrite::of::<M>() } else { None },
            access: Arc::new(access),
        });
        self
    }

    fn fail(&mut self, error: ConfigError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub(super) fn finish(self) -> Result<(&'static str, Vec<MemberDescriptor>), ConfigError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok((self.type_name, self.members)),
        }
    }
}

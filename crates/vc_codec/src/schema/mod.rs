//! Member descriptions of serializable owner types.
//!
//! A [`Schema`] lists the members of one owner type in declaration order,
//! together with their storage offsets, static properties and formatters.
//! Types opt in by implementing [`HasSchema`], normally through
//! [`schema!`](crate::schema).

// -----------------------------------------------------------------------------
// Modules

mod access;
mod builder;
mod descriptor;
mod macros;

// -----------------------------------------------------------------------------
// Imports

use alloc::vec::Vec;
use core::fmt;
use core::hash::{BuildHasher, Hash, Hasher};
use core::marker::PhantomData;

use crate::config::{CodecConfig, MemberOrder};
use crate::error::ConfigError;
use crate::format::FormatterRegistry;
use crate::hash::FixedHashState;
use crate::synth::effective_order;

// -----------------------------------------------------------------------------
// Exports

pub(crate) use access::Reconciled;
pub use builder::SchemaBuilder;
pub use descriptor::{MemberDescriptor, MemberFlags};

// -----------------------------------------------------------------------------
// HasSchema

/// An owner type with a describable member list.
pub trait HasSchema: Sized + 'static {
    /// Declares the members of `Self` in declaration order.
    fn describe(builder: &mut SchemaBuilder<'_, Self>);
}

// -----------------------------------------------------------------------------
// Schema

/// The members of `T`, in declaration order.
///
/// # Examples
///
/// ```
/// use vc_codec::{Readonly, schema};
/// use vc_codec::config::CodecConfig;
/// use vc_codec::format::FormatterRegistry;
/// use vc_codec::schema::Schema;
///
/// #[derive(Default)]
/// struct Item {
///     id: Readonly<u32>,
///     name: String,
///     count: u16,
/// }
///
/// schema! { Item { #[readonly] id: u32, name: String, count: u16 } }
///
/// let schema = Schema::<Item>::build(&FormatterRegistry::new(), &CodecConfig::new()).unwrap();
/// assert_eq!(schema.len(), 3);
/// assert!(schema.member("id").unwrap().is_readonly());
/// ```
pub struct Schema<T> {
    type_name: &'static str,
    version: u32,
    member_order: MemberOrder,
    members: Vec<MemberDescriptor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: HasSchema> Schema<T> {
    /// Describes `T` against `registry` and `config`.
    ///
    /// Fails on the first member without a formatter or with a duplicate name.
    pub fn build(registry: &FormatterRegistry, config: &CodecConfig) -> Result<Self, ConfigError> {
        let mut builder = SchemaBuilder::<T>::new(registry, config);
        T::describe(&mut builder);
        let (type_name, members) = builder.finish()?;

        log::debug!(
            "built schema for `{type_name}` v{}: {} members",
            config.version,
            members.len()
        );

        Ok(Self {
            type_name,
            version: config.version,
            member_order: config.member_order,
            members,
            _marker: PhantomData,
        })
    }
}

impl<T> Schema<T> {
    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// The wire order rule taken from the build configuration.
    #[inline]
    pub const fn member_order(&self) -> MemberOrder {
        self.member_order
    }

    /// Members in declaration order.
    #[inline]
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// A hash of the version, the wire order rule and the members in wire
    /// order, with their names, types and readonly flags.
    ///
    /// Deterministic across processes running the same build. The hasher and
    /// [`type_name`](core::any::type_name) are not guaranteed to be stable
    /// across compiler or dependency versions, so only compare fingerprints
    /// of peers built from the same toolchain and lockfile. Peers with
    /// different fingerprints do not share a wire format.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FixedHashState.build_hasher();
        self.version.hash(&mut hasher);
        self.member_order.hash(&mut hasher);
        self.members.len().hash(&mut hasher);
        for index in effective_order(&self.members, self.member_order) {
            let member = &self.members[index];
            member.name().hash(&mut hasher);
            member.type_name().hash(&mut hasher);
            member.is_readonly().hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            version: self.version,
            member_order: self.member_order,
            members: self.members.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("version", &self.version)
            .field("member_order", &self.member_order)
            .field("members", &self.members)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

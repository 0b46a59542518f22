//! Serializer settings consumed by schema building and codec synthesis.

use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// ReadonlyFieldHandling

/// What decoding does with members that are immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReadonlyFieldHandling {
    /// Readonly members are left out of the schema entirely.
    ExcludeFromSerialization,
    /// Accept a decoded readonly member only if it already matches the current one.
    ///
    /// Value types are compared by content, reference types by identity.
    #[default]
    Throw,
    /// Overwrite readonly members unconditionally through the privileged write.
    ForcedOverwrite,
}

// -----------------------------------------------------------------------------
// MemberOrder

/// How the on-wire member order is derived from the declaration order.
///
/// This is part of the wire format: both peers must agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MemberOrder {
    /// Exactly the declaration order.
    Declared,
    /// Stable partition by [`MemberClass`](crate::member::MemberClass):
    /// plain data, then composites, then sequences, then shared references.
    #[default]
    Grouped,
}

// -----------------------------------------------------------------------------
// CodecConfig

/// Settings applied uniformly while generating codecs.
///
/// Missing fields fall back to [`CodecConfig::default`], so partial
/// configuration files are accepted.
///
/// # Examples
///
/// ```
/// use vc_codec::config::{CodecConfig, ReadonlyFieldHandling};
///
/// let config: CodecConfig = ron::from_str("(readonly_handling: ForcedOverwrite)").unwrap();
/// assert_eq!(config.readonly_handling, ReadonlyFieldHandling::ForcedOverwrite);
/// assert!(config.batching);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Schema version the codecs are generated for.
    pub version: u32,
    pub readonly_handling: ReadonlyFieldHandling,
    pub member_order: MemberOrder,
    /// Copy runs of plain-data members in bulk. Never changes the wire format.
    pub batching: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecConfig {
    /// The default configuration, usable in const contexts.
    pub const fn new() -> Self {
        Self {
            version: 0,
            readonly_handling: ReadonlyFieldHandling::Throw,
            member_order: MemberOrder::Grouped,
            batching: true,
        }
    }

    #[inline]
    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    #[inline]
    pub const fn with_readonly_handling(mut self, handling: ReadonlyFieldHandling) -> Self {
        self.readonly_handling = handling;
        self
    }

    #[inline]
    pub const fn with_member_order(mut self, order: MemberOrder) -> Self {
        self.member_order = order;
        self
    }

    #[inline]
    pub const fn with_batching(mut self, batching: bool) -> Self {
        self.batching = batching;
        self
    }
}

// -----------------------------------------------------------------------------
// Tests

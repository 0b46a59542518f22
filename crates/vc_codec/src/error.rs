use thiserror::Error;

use crate::config::ReadonlyFieldHandling;

// -----------------------------------------------------------------------------
// ConfigError

/// A codec could not be generated.
///
/// Raised at generation time only. A failed generation is never cached.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(
        "cannot generate a decoder for `{type_name}.{member}`: the member is readonly, \
         but readonly members are excluded from serialization by the configuration"
    )]
    ReadonlyExcluded {
        type_name: &'static str,
        member: &'static str,
    },

    #[error(
        "readonly member `{type_name}.{member}` needs a forced overwrite, \
         but this build provides no privileged write"
    )]
    OverwriteUnavailable {
        type_name: &'static str,
        member: &'static str,
    },

    #[error("no formatter for member `{type_name}.{member}` of type `{member_type}`")]
    MissingFormatter {
        type_name: &'static str,
        member: &'static str,
        member_type: &'static str,
    },

    #[error("member `{type_name}.{member}` is declared more than once")]
    DuplicateMember {
        type_name: &'static str,
        member: &'static str,
    },

    #[error("codec plan for `{type_name}` does not cover member #{index} exactly once")]
    PlanCoverage { type_name: &'static str, index: usize },
}

// -----------------------------------------------------------------------------
// DecodeError

/// A single decode call failed.
///
/// The target may hold members committed before the failing one; nothing after
/// it is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("input truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error(
        "the value-type in readonly member `{type_name}.{member}` does not match the decoded value, \
         and {policy:?} does not allow overwriting it"
    )]
    ReadonlyValueMismatch {
        type_name: &'static str,
        member: &'static str,
        policy: ReadonlyFieldHandling,
    },

    #[error(
        "the reference in readonly member `{type_name}.{member}` would have to be reassigned, \
         and {policy:?} does not allow overwriting it"
    )]
    ReadonlyReferenceReassigned {
        type_name: &'static str,
        member: &'static str,
        policy: ReadonlyFieldHandling,
    },

    #[error("invalid data for `{type_name}`: {reason}")]
    InvalidData {
        type_name: &'static str,
        reason: &'static str,
    },
}

impl DecodeError {
    #[cold]
    #[inline(never)]
    pub(crate) fn invalid<T: ?Sized>(reason: &'static str) -> Self {
        DecodeError::InvalidData {
            type_name: core::any::type_name::<T>(),
            reason,
        }
    }
}

// -----------------------------------------------------------------------------
// CodecError

/// Either a generation or a decode failure, for APIs that do both.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    #[error("codec generation failed: {0}")]
    Config(#[from] ConfigError),

    #[error("decoding failed: {0}")]
    Decode(#[from] DecodeError),
}

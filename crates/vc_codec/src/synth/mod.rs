//! Codec generation.
//!
//! The [`Synthesizer`] turns a [`Schema`] into a [`Codec`]: the planner fixes
//! the effective member order and the bulk-copied runs, the resolver decides
//! how each readonly member is written back, and the codec executes the
//! resulting steps for every value.
//!
//! Generation is fallible with [`ConfigError`]; a generated codec only fails
//! with [`DecodeError`](crate::error::DecodeError) on bad input.

// -----------------------------------------------------------------------------
// Modules

#[cfg(feature = "std")]
mod cache;
mod codec;
mod planner;
mod resolver;

// -----------------------------------------------------------------------------
// Imports

use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::config::{CodecConfig, ReadonlyFieldHandling};
use crate::error::ConfigError;
use crate::schema::Schema;
use codec::Step;

// -----------------------------------------------------------------------------
// Exports

#[cfg(feature = "std")]
pub use cache::CodecCache;
pub use codec::Codec;
pub use planner::{BatchGroup, BatchPlan, PlanEntry};
pub use resolver::{PrivilegedWrite, WriteBack};

pub(crate) use planner::effective_order;

// -----------------------------------------------------------------------------
// Synthesizer

/// Generates codecs under one configuration.
///
/// # Examples
///
/// ```
/// use vc_codec::{Readonly, schema};
/// use vc_codec::config::CodecConfig;
/// use vc_codec::format::FormatterRegistry;
/// use vc_codec::schema::Schema;
/// use vc_codec::synth::Synthesizer;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point { x: i32, y: i32, id: Readonly<u32> }
///
/// schema! { Point { x: i32, y: i32, #[readonly] id: u32 } }
///
/// let config = CodecConfig::new();
/// let schema = Schema::<Point>::build(&FormatterRegistry::new(), &config).unwrap();
/// let codec = Synthesizer::new(config).synthesize(&schema).unwrap();
///
/// let bytes = codec.to_vec(&Point { x: 1, y: -1, id: Readonly::new(0) });
/// assert_eq!(bytes.len(), 12);
/// assert_eq!(codec.from_slice(&bytes).unwrap(), Point { x: 1, y: -1, id: Readonly::new(0) });
/// ```
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: CodecConfig,
}

impl Synthesizer {
    #[inline]
    pub const fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Generates the codec of `schema`.
    ///
    /// Fails if a readonly member cannot be written back under the
    /// configured policy. Nothing is generated in that case.
    pub fn synthesize<T>(&self, schema: &Schema<T>) -> Result<Codec<T>, ConfigError> {
        let type_name = schema.type_name();
        let members = schema.members();
        let policy = self.config.readonly_handling;

        let plan = planner::plan(members, &self.config);
        planner::verify(type_name, members, &plan)?;

        let mut steps = Vec::with_capacity(plan.entries.len());
        let mut overwrites = 0usize;
        for entry in &plan.entries {
            log::trace!("`{type_name}` plan entry: {entry:?}");
            let step = match entry {
                PlanEntry::Batch(group) => Step::Batch {
                    offset: group.offset,
                    size: group.size,
                },
                PlanEntry::Member(index) if members[*index].is_readonly() => {
                    let write_back = resolver::resolve(type_name, &members[*index], policy)?;
                    if matches!(write_back, WriteBack::Overwrite(_)) {
                        overwrites += 1;
                    }
                    Step::Readonly {
                        index: *index,
                        write_back,
                    }
                }
                PlanEntry::Member(index) => Step::Member { index: *index },
            };
            steps.push(step);
        }

        if overwrites > 0 {
            log::warn!("codec for `{type_name}` overwrites {overwrites} readonly member(s) unconditionally");
        }
        log::debug!(
            "generated codec for `{type_name}` v{}: {} members, {} steps, {} batch groups",
            schema.version(),
            members.len(),
            steps.len(),
            plan.groups().count(),
        );

        Ok(Codec {
            type_name,
            version: schema.version(),
            policy,
            members: members.to_vec(),
            plan,
            steps,
            _marker: PhantomData,
        })
    }
}

/// Generates the codec of `schema` under `policy`, with the default member
/// order and batching.
#[inline]
pub fn synthesize<T>(schema: &Schema<T>, policy: ReadonlyFieldHandling) -> Result<Codec<T>, ConfigError> {
    Synthesizer::new(CodecConfig::new().with_readonly_handling(policy)).synthesize(schema)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(all(test, feature = "std"))]
mod tests {
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;
    use std::sync::Mutex;

    use super::{Codec, Step, Synthesizer, WriteBack, synthesize};
    use crate::Readonly;
    use crate::buffer::ByteReader;
    use crate::config::{CodecConfig, MemberOrder, ReadonlyFieldHandling};
    use crate::error::{ConfigError, DecodeError};
    use crate::format::FormatterRegistry;
    use crate::schema::{HasSchema, Schema};

    use ReadonlyFieldHandling::{ExcludeFromSerialization, ForcedOverwrite, Throw};

    #[repr(C)]
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Sample {
        x: u32,
        y: u32,
        z: u64,
        id: Readonly<u64>,
        tag: Readonly<String>,
        label: String,
        values: Vec<u16>,
        w: i16,
        v: i16,
        flag: bool,
    }

    crate::schema! {
        Sample {
            x: u32,
            y: u32,
            z: u64,
            #[readonly] id: u64,
            #[readonly] tag: String,
            label: String,
            values: Vec<u16>,
            w: i16,
            v: i16,
            flag: bool,
        }
    }

    fn sample() -> Sample {
        Sample {
            x: 1,
            y: 0xDEAD_BEEF,
            z: u64::MAX - 3,
            id: Readonly::new(42),
            tag: Readonly::new(String::from("fixed")),
            label: String::from("label"),
            values: vec![1, 2, 3, 500],
            w: -7,
            v: 7,
            flag: true,
        }
    }

    fn codec_with<T: HasSchema>(config: CodecConfig) -> Result<Codec<T>, ConfigError> {
        let schema = Schema::<T>::build(&FormatterRegistry::new(), &config)?;
        Synthesizer::new(config).synthesize(&schema)
    }

    fn codec<T: HasSchema>(policy: ReadonlyFieldHandling) -> Codec<T> {
        codec_with(CodecConfig::new().with_readonly_handling(policy)).unwrap()
    }

    // -------------------------------------------------------------------------
    // Round trips

    #[test]
    fn round_trip_throw() {
        let codec = codec::<Sample>(Throw);
        let value = sample();
        let bytes = codec.to_vec(&value);

        // In place, with readonly members already matching.
        let mut target = Sample {
            id: value.id,
            tag: value.tag.clone(),
            ..Sample::default()
        };
        codec.decode_into(&mut ByteReader::new(&bytes), &mut target).unwrap();
        assert_eq!(target, value);
    }

    #[test]
    fn round_trip_forced_overwrite() {
        if cfg!(not(feature = "forced_overwrite")) {
            assert!(codec_with::<Sample>(CodecConfig::new().with_readonly_handling(ForcedOverwrite)).is_err());
            return;
        }
        let codec = codec::<Sample>(ForcedOverwrite);
        let value = sample();
        assert_eq!(codec.from_slice(&codec.to_vec(&value)).unwrap(), value);
    }

    #[test]
    fn round_trip_exclude() {
        let codec = codec::<Sample>(ExcludeFromSerialization);
        assert_eq!(codec.members().len(), 8);

        let value = sample();
        let decoded = codec.from_slice(&codec.to_vec(&value)).unwrap();
        assert_eq!(
            decoded,
            Sample {
                id: Readonly::default(),
                tag: Readonly::default(),
                ..value
            }
        );
    }

    #[test]
    fn fresh_decode_compares_readonly_with_default() {
        let codec = codec::<Sample>(Throw);
        let mut value = sample();
        value.id = Readonly::new(0);
        value.tag = Readonly::new(String::new());
        assert_eq!(codec.from_slice(&codec.to_vec(&value)).unwrap(), value);

        let error = codec.from_slice(&codec.to_vec(&sample())).unwrap_err();
        assert!(matches!(error, DecodeError::ReadonlyValueMismatch { member: "id", .. }));
    }

    // -------------------------------------------------------------------------
    // Batching

    #[test]
    fn batching_is_transparent() {
        for order in [MemberOrder::Grouped, MemberOrder::Declared] {
            let config = CodecConfig::new().with_member_order(order).with_readonly_handling(Throw);
            let batched = codec_with::<Sample>(config.clone()).unwrap();
            let single = codec_with::<Sample>(config.with_batching(false)).unwrap();

            if cfg!(target_endian = "little") {
                assert!(batched.batch_groups().count() > 0);
            }
            assert_eq!(single.batch_groups().count(), 0);

            let value = sample();
            let bytes = batched.to_vec(&value);
            assert_eq!(bytes, single.to_vec(&value));

            let mut a = Sample { id: value.id, tag: value.tag.clone(), ..Sample::default() };
            let mut b = a.clone();
            batched.decode_into(&mut ByteReader::new(&bytes), &mut a).unwrap();
            single.decode_into(&mut ByteReader::new(&bytes), &mut b).unwrap();
            assert_eq!(a, b);
            assert_eq!(a, value);
        }
    }

    #[test]
    fn little_endian_wire_layout() {
        let codec = codec::<Sample>(Throw);
        let bytes = codec.to_vec(&sample());
        // x y z id w v flag, all plain, come first.
        assert_eq!(&bytes[..4], &1u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(&bytes[8..16], &(u64::MAX - 3).to_le_bytes());
        assert_eq!(&bytes[16..24], &42u64.to_le_bytes());
        assert_eq!(&bytes[24..28], &[0xF9, 0xFF, 7, 0]);
        assert_eq!(bytes[28], 1);
    }

    #[test]
    fn generation_is_deterministic() {
        let config = CodecConfig::new().with_version(2);
        let a = codec_with::<Sample>(config.clone()).unwrap();
        let b = codec_with::<Sample>(config).unwrap();

        assert!(a.effective_order().eq(b.effective_order()));
        assert!(a.batch_groups().eq(b.batch_groups()));
        assert_eq!(a.version(), 2);
        assert_eq!(
            a.effective_order().collect::<Vec<_>>(),
            ["x", "y", "z", "id", "w", "v", "flag", "tag", "label", "values"]
        );
    }

    // -------------------------------------------------------------------------
    // Readonly value types

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Guarded {
        before: u32,
        id: Readonly<u32>,
        after: String,
    }

    crate::schema! { Guarded { before: u32, #[readonly] id: u32, after: String } }

    #[test]
    fn throw_accepts_equal_value() {
        let codec = codec::<Guarded>(Throw);
        let source = Guarded { before: 1, id: Readonly::new(9), after: String::from("a") };
        let mut target = Guarded { id: Readonly::new(9), ..Guarded::default() };

        codec.decode_into(&mut ByteReader::new(&codec.to_vec(&source)), &mut target).unwrap();
        assert_eq!(target, source);
    }

    #[test]
    fn privileged_write_only_planned_under_forced_overwrite() {
        let schema = Schema::<Guarded>::build(&FormatterRegistry::new(), &CodecConfig::new()).unwrap();
        let id = schema.member("id").unwrap();
        assert_eq!(id.privileged_write().is_some(), cfg!(feature = "forced_overwrite"));

        let overwrites = |codec: &Codec<Guarded>| {
            codec
                .steps
                .iter()
                .filter(|step| matches!(step, Step::Readonly { write_back: WriteBack::Overwrite(_), .. }))
                .count()
        };
        assert_eq!(overwrites(&synthesize(&schema, Throw).unwrap()), 0);
        #[cfg(feature = "forced_overwrite")]
        assert_eq!(overwrites(&synthesize(&schema, ForcedOverwrite).unwrap()), 1);
    }

    #[test]
    fn throw_rejects_different_value_and_stops() {
        let codec = codec::<Guarded>(Throw);
        let source = Guarded { before: 1, id: Readonly::new(9), after: String::from("a") };
        let mut target = Guarded {
            before: 0,
            id: Readonly::new(3),
            after: String::from("untouched"),
        };

        let error = codec
            .decode_into(&mut ByteReader::new(&codec.to_vec(&source)), &mut target)
            .unwrap_err();
        assert_eq!(
            error,
            DecodeError::ReadonlyValueMismatch {
                type_name: "Guarded",
                member: "id",
                policy: Throw,
            }
        );
        assert_eq!(target.before, 1);
        assert_eq!(*target.id, 3);
        assert_eq!(target.after, "untouched");
    }

    #[cfg(feature = "forced_overwrite")]
    #[test]
    fn forced_overwrite_replaces_values() {
        let codec = codec::<Guarded>(ForcedOverwrite);
        let source = Guarded { before: 1, id: Readonly::new(9), after: String::from("a") };
        let mut target = Guarded { id: Readonly::new(3), ..Guarded::default() };

        codec.decode_into(&mut ByteReader::new(&codec.to_vec(&source)), &mut target).unwrap();
        assert_eq!(target, source);
    }

    #[cfg(not(feature = "forced_overwrite"))]
    #[test]
    fn forced_overwrite_unavailable() {
        let error = codec_with::<Guarded>(CodecConfig::new().with_readonly_handling(ForcedOverwrite)).unwrap_err();
        assert_eq!(
            error,
            ConfigError::OverwriteUnavailable {
                type_name: "Guarded",
                member: "id",
            }
        );
    }

    #[test]
    fn exclude_with_readonly_member_fails_generation() {
        let schema = Schema::<Guarded>::build(&FormatterRegistry::new(), &CodecConfig::new()).unwrap();
        let error = synthesize(&schema, ExcludeFromSerialization).unwrap_err();
        assert_eq!(
            error,
            ConfigError::ReadonlyExcluded {
                type_name: "Guarded",
                member: "id",
            }
        );
    }

    #[test]
    fn truncated_input() {
        let codec = codec::<Guarded>(Throw);
        let source = Guarded { before: 1, id: Readonly::new(0), after: String::from("abc") };
        let bytes = codec.to_vec(&source);

        for len in 0..bytes.len() {
            let error = codec.from_slice(&bytes[..len]).unwrap_err();
            assert!(matches!(error, DecodeError::Truncated { .. }), "{len}: {error:?}");
        }
        assert!(matches!(
            codec.from_slice(&[bytes.as_slice(), &[0u8][..]].concat()),
            Err(DecodeError::InvalidData { .. })
        ));
    }

    // -------------------------------------------------------------------------
    // Readonly reference types

    #[derive(Default)]
    struct Handles {
        cell: Readonly<Arc<Mutex<u32>>>,
        plain: Readonly<Arc<u32>>,
        slot: Readonly<Option<Arc<Mutex<u32>>>>,
    }

    crate::schema! {
        Handles {
            #[readonly] cell: Arc<Mutex<u32>>,
            #[readonly] plain: Arc<u32>,
            #[readonly] slot: Option<Arc<Mutex<u32>>>,
        }
    }

    fn handles(cell: u32, plain: u32, slot: Option<u32>) -> Handles {
        Handles {
            cell: Readonly::new(Arc::new(Mutex::new(cell))),
            plain: Readonly::new(Arc::new(plain)),
            slot: Readonly::new(slot.map(|v| Arc::new(Mutex::new(v)))),
        }
    }

    #[test]
    fn throw_accepts_in_place_reference_decode() {
        let codec = codec::<Handles>(Throw);
        let bytes = codec.to_vec(&handles(5, 6, Some(7)));

        let mut target = handles(1, 6, Some(2));
        let cell = Arc::clone(&target.cell);
        let plain = Arc::clone(&target.plain);

        codec.decode_into(&mut ByteReader::new(&bytes), &mut target).unwrap();
        assert!(Arc::ptr_eq(&target.cell, &cell));
        assert!(Arc::ptr_eq(&target.plain, &plain));
        assert_eq!(*cell.lock().unwrap(), 5);
        assert_eq!(*target.slot.as_ref().unwrap().lock().unwrap(), 7);
    }

    #[test]
    fn throw_rejects_new_reference() {
        let codec = codec::<Handles>(Throw);

        // `plain` cannot change in place, and `slot` comes after it.
        let bytes = codec.to_vec(&handles(5, 6, Some(7)));
        let mut target = handles(1, 2, Some(3));
        let error = codec.decode_into(&mut ByteReader::new(&bytes), &mut target).unwrap_err();
        assert_eq!(
            error,
            DecodeError::ReadonlyReferenceReassigned {
                type_name: "Handles",
                member: "plain",
                policy: Throw,
            }
        );
        assert_eq!(*target.cell.lock().unwrap(), 5);
        assert_eq!(**target.plain, 2);
        assert_eq!(*target.slot.as_ref().unwrap().lock().unwrap(), 3);

        // `None` to `Some` needs a new instance.
        let bytes = codec.to_vec(&handles(5, 6, Some(7)));
        let mut target = handles(1, 6, None);
        let error = codec.decode_into(&mut ByteReader::new(&bytes), &mut target).unwrap_err();
        assert!(matches!(error, DecodeError::ReadonlyReferenceReassigned { member: "slot", .. }));
        assert!(target.slot.is_none());
    }

    #[cfg(feature = "forced_overwrite")]
    #[test]
    fn forced_overwrite_replaces_references() {
        let codec = codec::<Handles>(ForcedOverwrite);
        let bytes = codec.to_vec(&handles(5, 6, Some(7)));

        let mut target = handles(1, 2, None);
        let plain = Arc::clone(&target.plain);
        codec.decode_into(&mut ByteReader::new(&bytes), &mut target).unwrap();

        assert!(!Arc::ptr_eq(&target.plain, &plain));
        assert_eq!(**target.plain, 6);
        assert_eq!(*target.cell.lock().unwrap(), 5);
        assert_eq!(*target.slot.as_ref().unwrap().lock().unwrap(), 7);
        assert_eq!(Arc::strong_count(&plain), 1);
    }

    // -------------------------------------------------------------------------
    // Nested codecs

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Inner {
        a: u16,
        name: String,
    }

    crate::schema! { Inner { a: u16, name: String } }
    crate::impl_member_type!(Inner => Composite);

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Outer {
        head: Inner,
        id: Readonly<Inner>,
        rest: Vec<Inner>,
    }

    crate::schema! { Outer { head: Inner, #[readonly] id: Inner, rest: Vec<Inner> } }

    #[test]
    fn nested_codec_as_formatter() {
        let config = CodecConfig::new();
        let mut registry = FormatterRegistry::new();
        let inner = Schema::<Inner>::build(&registry, &config).unwrap();
        let inner = Synthesizer::new(config.clone()).synthesize(&inner).unwrap();
        registry.register::<Inner>(Arc::new(inner));

        let schema = Schema::<Outer>::build(&registry, &config).unwrap();
        let codec = Synthesizer::new(config).synthesize(&schema).unwrap();

        let key = Inner { a: 1, name: String::from("key") };
        let value = Outer {
            head: Inner { a: 2, name: String::from("head") },
            id: Readonly::new(key.clone()),
            rest: vec![Inner { a: 3, name: String::new() }, Inner { a: 4, name: String::from("x") }],
        };

        let mut target = Outer { id: Readonly::new(key), ..Outer::default() };
        codec.decode_into(&mut ByteReader::new(&codec.to_vec(&value)), &mut target).unwrap();
        assert_eq!(target, value);

        let mut other = Outer::default();
        assert!(matches!(
            codec.decode_into(&mut ByteReader::new(&codec.to_vec(&value)), &mut other),
            Err(DecodeError::ReadonlyValueMismatch { member: "id", .. })
        ));
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Unit {}

    crate::schema! { Unit {} }
    crate::impl_member_type!(Unit => Composite);

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Holder {
        zs: Vec<[u8; 0]>,
        units: Vec<Unit>,
    }

    crate::schema! { Holder { zs: Vec<[u8; 0]>, units: Vec<Unit> } }

    #[test]
    fn empty_elements_round_trip() {
        let config = CodecConfig::new();
        let mut registry = FormatterRegistry::new();
        let unit = Schema::<Unit>::build(&registry, &config).unwrap();
        let unit = Synthesizer::new(config.clone()).synthesize(&unit).unwrap();
        registry.register::<Unit>(Arc::new(unit));

        let schema = Schema::<Holder>::build(&registry, &config).unwrap();
        let codec = Synthesizer::new(config).synthesize(&schema).unwrap();

        let value = Holder { zs: vec![[]; 3], units: vec![Unit {}, Unit {}] };
        let bytes = codec.to_vec(&value);
        assert_eq!(bytes, [3, 2]);
        assert_eq!(codec.from_slice(&bytes).unwrap(), value);
    }

    #[test]
    fn missing_nested_formatter() {
        let error = Schema::<Outer>::build(&FormatterRegistry::new(), &CodecConfig::new()).unwrap_err();
        assert!(matches!(error, ConfigError::MissingFormatter { type_name: "Outer", member: "head", .. }));
    }
}

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use std::sync::{Mutex, PoisonError, RwLock};

use super::{Codec, Synthesizer};
use crate::config::CodecConfig;
use crate::error::{CodecError, ConfigError};
use crate::format::FormatterRegistry;
use crate::hash::{HashMap, new_map};
use crate::schema::{HasSchema, Schema};

type Entry = Arc<dyn Any + Send + Sync>;

// -----------------------------------------------------------------------------
// CodecCache

/// Generates each codec once per owner type and version, then shares it.
///
/// Lookups of generated codecs take a read lock only. Generation is
/// serialized: concurrent first uses of the same key wait for one another
/// and all receive the same codec. Failed generations are not cached and
/// are retried on the next lookup.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_codec::schema;
/// use vc_codec::config::CodecConfig;
/// use vc_codec::format::FormatterRegistry;
/// use vc_codec::synth::CodecCache;
///
/// #[derive(Default)]
/// struct Pair { a: u8, b: u8 }
///
/// schema! { Pair { a: u8, b: u8 } }
///
/// let cache = CodecCache::new(FormatterRegistry::new(), CodecConfig::new());
/// let first = cache.get::<Pair>().unwrap();
/// let again = cache.get::<Pair>().unwrap();
/// assert!(Arc::ptr_eq(&first, &again));
/// assert_eq!(first.to_vec(&Pair { a: 1, b: 2 }), [1, 2]);
/// ```
pub struct CodecCache {
    registry: FormatterRegistry,
    config: CodecConfig,
    codecs: RwLock<HashMap<(TypeId, u32), Entry>>,
    generating: Mutex<()>,
}

impl CodecCache {
    pub fn new(registry: FormatterRegistry, config: CodecConfig) -> Self {
        Self {
            registry,
            config,
            codecs: RwLock::new(new_map()),
            generating: Mutex::new(()),
        }
    }

    #[inline]
    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// The codec of `T` for the configured version.
    #[inline]
    pub fn get<T: HasSchema>(&self) -> Result<Arc<Codec<T>>, ConfigError> {
        self.get_version::<T>(self.config.version)
    }

    /// The codec of `T` for schema `version`.
    pub fn get_version<T: HasSchema>(&self, version: u32) -> Result<Arc<Codec<T>>, ConfigError> {
        let key = (TypeId::of::<T>(), version);
        if let Some(codec) = self.lookup::<T>(&key) {
            return Ok(codec);
        }

        let _guard = self.generating.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(codec) = self.lookup::<T>(&key) {
            return Ok(codec);
        }

        let config = self.config.clone().with_version(version);
        let schema = Schema::<T>::build(&self.registry, &config)?;
        let codec = Arc::new(Synthesizer::new(config).synthesize(&schema)?);
        log::debug!("cached codec for `{}` v{version}", codec.type_name());

        self.codecs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, codec.clone() as Entry);
        Ok(codec)
    }

    /// Encodes `value` with the codec of `T`.
    pub fn to_vec<T: HasSchema>(&self, value: &T) -> Result<Vec<u8>, ConfigError> {
        Ok(self.get::<T>()?.to_vec(value))
    }

    /// Decodes a new `T` from exactly `bytes` with the codec of `T`.
    pub fn from_slice<T: HasSchema + Default>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(self.get::<T>()?.from_slice(bytes)?)
    }

    fn lookup<T: 'static>(&self, key: &(TypeId, u32)) -> Option<Arc<Codec<T>>> {
        let codecs = self.codecs.read().unwrap_or_else(PoisonError::into_inner);
        let entry = codecs.get(key)?.clone();
        entry.downcast::<Codec<T>>().ok()
    }

    /// Whether the codec of `T` for `version` has been generated.
    pub fn contains<T: 'static>(&self, version: u32) -> bool {
        let codecs = self.codecs.read().unwrap_or_else(PoisonError::into_inner);
        codecs.contains_key(&(TypeId::of::<T>(), version))
    }

    /// Number of generated codecs.
    pub fn len(&self) -> usize {
        self.codecs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for CodecCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecCache")
            .field("config", &self.config)
            .field("codecs", &self.len())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::mem::offset_of;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::CodecCache;
    use crate::Readonly;
    use crate::buffer::ByteReader;
    use crate::config::CodecConfig;
    use crate::error::{CodecError, ConfigError, DecodeError};
    use crate::format::FormatterRegistry;
    use crate::schema::{HasSchema, SchemaBuilder};

    static DESCRIBED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, Default, PartialEq)]
    struct Counted {
        a: u64,
        b: u64,
    }

    impl HasSchema for Counted {
        fn describe(builder: &mut SchemaBuilder<'_, Self>) {
            DESCRIBED.fetch_add(1, Ordering::SeqCst);
            unsafe {
                builder
                    .member::<u64>("a", offset_of!(Counted, a))
                    .member::<u64>("b", offset_of!(Counted, b));
            }
        }
    }

    #[derive(Default)]
    struct Locked {
        id: Readonly<u8>,
    }

    crate::schema! { Locked { #[readonly] id: u8 } }

    #[test]
    fn concurrent_first_use_generates_once() {
        let cache = CodecCache::new(FormatterRegistry::new(), CodecConfig::new());

        let codecs: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| cache.get::<Counted>().unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(DESCRIBED.load(Ordering::SeqCst), 1);
        assert!(codecs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);

        thread::scope(|scope| {
            for i in 0..4u64 {
                let codec = &codecs[i as usize];
                scope.spawn(move || {
                    let value = Counted { a: i, b: i * 2 };
                    let bytes = codec.to_vec(&value);
                    assert_eq!(codec.decode(&mut ByteReader::new(&bytes)).unwrap(), value);
                });
            }
        });
    }

    #[test]
    fn versions_are_separate_entries() {
        let cache = CodecCache::new(FormatterRegistry::new(), CodecConfig::new());
        let v0 = cache.get::<Locked>().unwrap();
        let v1 = cache.get_version::<Locked>(1).unwrap();
        assert_eq!((v0.version(), v1.version()), (0, 1));
        assert!(cache.contains::<Locked>(0) && cache.contains::<Locked>(1));
        assert_eq!(cache.len(), 2);
    }

    #[derive(Default, Clone, PartialEq)]
    struct Opaque;

    crate::impl_member_type!(Opaque => Composite);

    #[derive(Default)]
    struct Broken {
        inner: Opaque,
    }

    crate::schema! { Broken { inner: Opaque } }

    #[test]
    fn failures_are_not_cached() {
        let cache = CodecCache::new(FormatterRegistry::new(), CodecConfig::new());
        for _ in 0..2 {
            assert!(matches!(
                cache.get::<Broken>(),
                Err(ConfigError::MissingFormatter { type_name: "Broken", member: "inner", .. })
            ));
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn convenience_round_trip() {
        let cache = CodecCache::new(FormatterRegistry::new(), CodecConfig::new());
        let bytes = cache.to_vec(&Locked { id: Readonly::new(0) }).unwrap();
        assert_eq!(bytes, [0]);

        let decoded: Locked = cache.from_slice(&bytes).unwrap();
        assert_eq!(*decoded.id, 0);
        assert!(matches!(
            cache.from_slice::<Locked>(&[4]),
            Err(CodecError::Decode(DecodeError::ReadonlyValueMismatch { .. }))
        ));
        assert!(matches!(
            cache.from_slice::<Broken>(&[]),
            Err(CodecError::Config(ConfigError::MissingFormatter { .. }))
        ));
    }
}

use core::fmt;
use core::ops::Deref;

// -----------------------------------------------------------------------------
// Readonly

/// Storage for a member that is immutable after construction.
///
/// Only shared access is offered once the value exists. Codecs treat such
/// members specially: decoding reconciles the incoming value with the current
/// one according to
/// [`ReadonlyFieldHandling`](crate::config::ReadonlyFieldHandling), and only a
/// forced overwrite may replace it.
///
/// `Readonly<T>` is `repr(transparent)`, so it has the layout of `T`.
///
/// # Examples
///
/// ```
/// use vc_codec::Readonly;
///
/// struct Account {
///     id: Readonly<u64>,
///     balance: i64,
/// }
///
/// let account = Account { id: Readonly::new(7), balance: 0 };
/// assert_eq!(*account.id, 7);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Readonly<T>(T);

impl<T> Readonly<T> {
    /// Wraps the value. This is the only way to set it.
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    #[inline(always)]
    pub const fn get(&self) -> &T {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Readonly<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> From<T> for Readonly<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Readonly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

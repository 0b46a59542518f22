use core::fmt;
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ptr::{self, NonNull};
use core::slice;

// -----------------------------------------------------------------------------
// Common methods

macro_rules! impl_ptr {
    ($ptr:ident) => {
        impl From<$ptr<'_>> for NonNull<u8> {
            #[inline(always)]
            fn from(ptr: $ptr<'_>) -> Self {
                ptr.0
            }
        }

        impl $ptr<'_> {
            /// Check if the pointer is aligned to type `T`.
            #[inline]
            pub fn is_aligned<T>(&self) -> bool {
                self.0.as_ptr().cast::<T>().is_aligned()
            }

            /// Checks alignment for `T`, only in debug builds.
            #[cfg_attr(debug_assertions, track_caller)]
            #[cfg_attr(not(debug_assertions), inline(always))]
            pub fn debug_assert_aligned<T>(&self) {
                debug_assert!(
                    self.is_aligned::<T>(),
                    "member pointer {:p} is not aligned to {} for type {}",
                    self.0,
                    align_of::<T>(),
                    core::any::type_name::<T>(),
                );
            }

            /// Moves the pointer forward by `count` bytes.
            ///
            /// This is how an owner pointer becomes a member pointer.
            ///
            /// # Safety
            /// - The result must stay inside the allocation of the pointee.
            /// - The resulting pointer must outlive the lifetime of this pointer.
            #[inline]
            pub const unsafe fn byte_add(self, count: usize) -> Self {
                Self(
                    // SAFETY: The caller keeps the result inside the same allocation.
                    unsafe { self.0.add(count) },
                    PhantomData,
                )
            }
        }

        impl fmt::Pointer for $ptr<'_> {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Pointer::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $ptr<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($ptr), self.0)
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Ptr

/// A type-erased shared pointer, similar to `&'a dyn Any` without metadata.
///
/// The pointee must stay valid and unchanged for `'a`.
///
/// # Examples
///
/// ```
/// # use vc_ptr::Ptr;
/// #[repr(C)]
/// struct Pair { a: u32, b: u32 }
///
/// let pair = Pair { a: 1, b: 2 };
/// let owner = Ptr::from_ref(&pair);
///
/// let b = unsafe { owner.byte_add(core::mem::offset_of!(Pair, b)) };
/// b.debug_assert_aligned::<u32>();
/// assert_eq!(unsafe { *b.as_ref::<u32>() }, 2);
/// ```
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Ptr<'a>(NonNull<u8>, PhantomData<&'a u8>);

impl_ptr!(Ptr);

impl<'a> Ptr<'a> {
    /// Create a `Ptr` from a raw `NonNull<u8>` pointer.
    ///
    /// # Safety
    /// - `ptr` must point to a valid object for the lifetime `'a`.
    #[inline(always)]
    pub const unsafe fn new(ptr: NonNull<u8>) -> Ptr<'a> {
        Ptr(ptr, PhantomData)
    }

    /// Creates a `Ptr` from a reference with same lifetime.
    #[inline(always)]
    pub const fn from_ref<T: ?Sized>(val: &'a T) -> Ptr<'a> {
        Ptr(NonNull::from_ref(val).cast(), PhantomData)
    }

    /// Gets the underlying pointer, erasing the associated lifetime.
    #[inline(always)]
    pub const fn as_ptr(self) -> *const u8 {
        self.0.as_ptr()
    }

    /// Convert this [`Ptr`] into a `&T` with the same lifetime `'a`.
    ///
    /// # Safety
    /// - `T` must match the actual type of the pointee.
    /// - The pointer must be properly aligned for `T`.
    #[inline(always)]
    pub const unsafe fn as_ref<T>(self) -> &'a T {
        // SAFETY: Type correct, ptr aligned and pointee valid object.
        unsafe { &*self.0.as_ptr().cast::<T>() }
    }

    /// Views `len` bytes starting at this pointer.
    ///
    /// # Safety
    /// - The `len` bytes must be initialized, which excludes padding.
    /// - The range must lie inside a single allocation.
    #[inline(always)]
    pub const unsafe fn as_bytes(self, len: usize) -> &'a [u8] {
        // SAFETY: see function docs.
        unsafe { slice::from_raw_parts(self.0.as_ptr(), len) }
    }
}

impl<'a, T: ?Sized> From<&'a T> for Ptr<'a> {
    #[inline]
    fn from(val: &'a T) -> Self {
        Self::from_ref(val)
    }
}

// -----------------------------------------------------------------------------
// PtrMut

/// A type-erased exclusive pointer, similar to `&'a mut dyn Any` without metadata.
///
/// It is not `Clone`; use [`reborrow`](Self::reborrow) to hand out a shorter borrow.
///
/// # Examples
///
/// ```
/// # use vc_ptr::PtrMut;
/// let mut x = 8i32;
/// let mut ptr = PtrMut::from_mut(&mut x);
///
/// ptr.debug_assert_aligned::<i32>();
/// unsafe { *ptr.as_mut::<i32>() += 2; }
/// assert_eq!(x, 10);
/// ```
#[repr(transparent)]
pub struct PtrMut<'a>(NonNull<u8>, PhantomData<&'a mut u8>);

impl_ptr!(PtrMut);

impl<'a> PtrMut<'a> {
    /// Create a `PtrMut` from a raw `NonNull<u8>` pointer.
    ///
    /// # Safety
    /// - `ptr` must point to a valid object, writable and unaliased for `'a`.
    #[inline(always)]
    pub const unsafe fn new(ptr: NonNull<u8>) -> PtrMut<'a> {
        PtrMut(ptr, PhantomData)
    }

    /// Creates a `PtrMut` from a mutable reference with same lifetime.
    #[inline(always)]
    pub const fn from_mut<T: ?Sized>(val: &'a mut T) -> PtrMut<'a> {
        PtrMut(NonNull::from_mut(val).cast(), PhantomData)
    }

    /// Gets the underlying pointer, erasing the associated lifetime.
    #[inline(always)]
    pub const fn as_ptr(&self) -> *mut u8 {
        self.0.as_ptr()
    }

    /// Get a `&T` with the lifetime of `&self`.
    ///
    /// # Safety
    /// - `T` must match the actual type of the pointee.
    /// - The pointer must be properly aligned for `T`.
    #[inline(always)]
    pub const unsafe fn as_ref<T>(&self) -> &'_ T {
        // SAFETY: Type correct, ptr aligned and pointee valid object.
        unsafe { &*self.0.as_ptr().cast::<T>() }
    }

    /// Get a `&mut T` with the lifetime of `&mut self`.
    ///
    /// # Safety
    /// - `T` must match the actual type of the pointee.
    /// - The pointer must be properly aligned for `T`.
    #[inline(always)]
    pub const unsafe fn as_mut<T>(&mut self) -> &'_ mut T {
        // SAFETY: Type correct, ptr aligned and pointee valid object.
        unsafe { &mut *self.0.as_ptr().cast::<T>() }
    }

    /// Gets a [`Ptr`] with the lifetime of `&self`.
    #[inline(always)]
    pub const fn borrow(&self) -> Ptr<'_> {
        Ptr(self.0, PhantomData)
    }

    /// Gets a [`PtrMut`] with the lifetime of `&mut self`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use vc_ptr::PtrMut;
    /// fn bump(mut ptr: PtrMut<'_>) {
    ///     unsafe { *ptr.as_mut::<u8>() += 1; }
    /// }
    ///
    /// let mut x = 1u8;
    /// let mut ptr = PtrMut::from_mut(&mut x);
    /// bump(ptr.reborrow());
    /// bump(ptr.reborrow());
    /// assert_eq!(x, 3);
    /// ```
    #[inline(always)]
    pub const fn reborrow(&mut self) -> PtrMut<'_> {
        PtrMut(self.0, PhantomData)
    }

    /// Overwrites `bytes.len()` bytes starting at this pointer.
    ///
    /// Nothing is dropped; the bytes are copied verbatim.
    ///
    /// # Safety
    /// - The destination range must lie inside a single allocation.
    /// - Every value overlapping the range must accept any bit pattern and
    ///   must not need drop.
    /// - `bytes` must not overlap the destination.
    #[inline(always)]
    pub unsafe fn copy_from_bytes(&mut self, bytes: &[u8]) {
        // SAFETY: see function docs.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), self.0.as_ptr(), bytes.len()) }
    }
}

impl<'a, T: ?Sized> From<&'a mut T> for PtrMut<'a> {
    #[inline]
    fn from(val: &'a mut T) -> Self {
        Self::from_mut(val)
    }
}

// -----------------------------------------------------------------------------
// OwningPtr

/// A type-erased pointer to a value whose ownership is being handed over.
///
/// The receiver must [`read`](Self::read) the value out, otherwise it leaks. The allocation itself is never freed.
///
/// # Examples
///
/// ```
/// # use vc_ptr::OwningPtr;
/// let moved = OwningPtr::make(String::from("abc"), |ptr| unsafe { ptr.read::<String>() });
/// assert_eq!(moved, "abc");
/// ```
#[repr(transparent)]
pub struct OwningPtr<'a>(NonNull<u8>, PhantomData<&'a mut u8>);

impl_ptr!(OwningPtr);

impl<'a> OwningPtr<'a> {
    /// Creates an `OwningPtr` to a value that will not be dropped in place.
    #[inline(always)]
    pub const fn from_value<T>(r: &'a mut ManuallyDrop<T>) -> OwningPtr<'a> {
        Self(NonNull::from_mut(r).cast(), PhantomData)
    }

    /// Consumes a value and lends an [`OwningPtr`] to it to `f`.
    ///
    /// `f` takes over the value; it is never dropped here.
    #[inline]
    pub fn make<T, F: FnOnce(OwningPtr<'_>) -> R, R>(val: T, f: F) -> R {
        let mut val = ManuallyDrop::new(val);
        f(OwningPtr::from_value(&mut val))
    }

    /// Gets the underlying pointer, erasing the associated lifetime.
    #[inline(always)]
    pub const fn as_ptr(&self) -> *mut u8 {
        self.0.as_ptr()
    }

    /// Moves the value out.
    ///
    /// # Safety
    /// - `T` must be the erased pointee type, and the pointer aligned for it.
    #[inline(always)]
    pub const unsafe fn read<T>(self) -> T {
        // SAFETY: see function docs.
        unsafe { ptr::read(self.0.as_ptr().cast::<T>()) }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{OwningPtr, Ptr, PtrMut};
    use core::mem::offset_of;

    #[repr(C)]
    struct Packed {
        a: u16,
        b: u16,
        c: u32,
    }

    #[test]
    fn member_bytes() {
        let value = Packed { a: 0x0102, b: 0x0304, c: 0x0506_0708 };
        let owner = Ptr::from_ref(&value);

        let b = unsafe { owner.byte_add(offset_of!(Packed, b)) };
        assert!(b.is_aligned::<u16>());
        let bytes = unsafe { b.as_bytes(6) };
        assert_eq!(bytes.len(), 6);
        assert_eq!(&bytes[..2], &0x0304u16.to_ne_bytes());
        assert_eq!(&bytes[2..], &0x0506_0708u32.to_ne_bytes());
    }

    #[test]
    fn copy_into_members() {
        let mut value = Packed { a: 0, b: 0, c: 0 };
        let mut owner = PtrMut::from_mut(&mut value);

        let mut src = [0u8; 6];
        src[..2].copy_from_slice(&7u16.to_ne_bytes());
        src[2..].copy_from_slice(&9u32.to_ne_bytes());

        unsafe {
            let mut b = owner.reborrow().byte_add(offset_of!(Packed, b));
            b.copy_from_bytes(&src);
        }
        assert_eq!(value.a, 0);
        assert_eq!(value.b, 7);
        assert_eq!(value.c, 9);
    }

    #[test]
    fn owning_read() {
        let moved = OwningPtr::make([1u8, 2, 3], |ptr| unsafe { ptr.read::<[u8; 3]>() });
        assert_eq!(moved, [1, 2, 3]);
    }
}

// -----------------------------------------------------------------------------
// schema

/// Implements [`HasSchema`](crate::schema::HasSchema) for a struct.
///
/// Lists the fields to serialize in declaration order, each with its member
/// type. Fields stored as [`Readonly<T>`](crate::Readonly) are marked
/// `#[readonly]` and list `T`. Fields marked `#[skip]` are not serialized.
/// Field types are checked at compile time and offsets computed with
/// [`offset_of!`](core::mem::offset_of).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_codec::{Readonly, schema};
///
/// #[derive(Default)]
/// struct Player {
///     id: Readonly<u64>,
///     name: String,
///     score: u32,
///     cache: Option<Arc<Vec<u8>>>,
/// }
///
/// schema! {
///     Player {
///         #[readonly] id: u64,
///         name: String,
///         score: u32,
///         #[skip] cache: Option<Arc<Vec<u8>>>,
///     }
/// }
/// ```
#[macro_export]
macro_rules! schema {
    ($owner:ty { $($members:tt)* }) => {
        impl $crate::schema::HasSchema for $owner {
            fn describe(builder: &mut $crate::schema::SchemaBuilder<'_, Self>) {
                builder.name(::core::stringify!($owner));
                $crate::__schema_members!(builder, $owner; $($members)*);
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __schema_members {
    ($builder:ident, $owner:ty;) => {};
    ($builder:ident, $owner:ty; #[readonly] $field:ident : $ty:ty $(, $($rest:tt)*)?) => {
        let _: fn(&$owner) -> &$crate::Readonly<$ty> = |owner| &owner.$field;
        // SAFETY: the field is a `Readonly<$ty>` at this offset.
        unsafe {
            $builder.readonly_member::<$ty>(
                ::core::stringify!($field),
                ::core::mem::offset_of!($owner, $field),
            );
        }
        $crate::__schema_members!($builder, $owner; $($($rest)*)?);
    };
    ($builder:ident, $owner:ty; #[skip] $field:ident : $ty:ty $(, $($rest:tt)*)?) => {
        let _: fn(&$owner) -> &$ty = |owner| &owner.$field;
        $crate::__schema_members!($builder, $owner; $($($rest)*)?);
    };
    ($builder:ident, $owner:ty; $field:ident : $ty:ty $(, $($rest:tt)*)?) => {
        let _: fn(&$owner) -> &$ty = |owner| &owner.$field;
        // SAFETY: the field is a `$ty` at this offset.
        unsafe {
            $builder.member::<$ty>(
                ::core::stringify!($field),
                ::core::mem::offset_of!($owner, $field),
            );
        }
        $crate::__schema_members!($builder, $owner; $($($rest)*)?);
    };
}

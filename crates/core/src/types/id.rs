//! Integer primary keys, one type per table.
//!
//! Every table uses an `integer GENERATED ALWAYS AS IDENTITY` key. Wrapping
//! each in its own type means a `ProductId` can never be bound where an
//! `OrderId` is expected.

/// Declare an `i32` key type.
///
/// The generated type serializes as a bare number, prints as one, parses
/// from one, and (with the `postgres` feature) binds as `integer`.
///
/// ```rust
/// # use freshmart_core::define_id;
/// define_id!(ShelfId);
///
/// let shelf: ShelfId = "12".parse().unwrap();
/// assert_eq!(shelf.as_i32(), 12);
/// assert_eq!(serde_json::to_string(&shelf).unwrap(), "12");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Entity IDs
define_id!(UserId);
define_id!(CategoryId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(AddressId);

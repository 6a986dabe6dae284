//! Newtype IDs for type-safe entity references.
//!
//! Every entity is keyed by a UUID. The `define_id!` macro wraps the UUID in a
//! distinct type per entity so a product id can never be passed where a user
//! id is expected, and gives each wrapper a strict parser for identifiers that
//! arrive from clients.

use thiserror::Error;

/// Error returned when a client-supplied identifier is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} format: {value:?}")]
pub struct IdError {
    /// Name of the identifier type that failed to parse.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `uuid::Uuid` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `generate()`, `as_uuid()` and a validating `parse()`
/// - `Display`, `FromStr`, `From<Uuid>` and `Into<Uuid>`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use corner_shop_core::define_id;
/// define_id!(OrderId);
///
/// let id = OrderId::generate();
/// assert_eq!(OrderId::parse(&id.to_string()), Ok(id));
/// assert!(OrderId::parse("not-a-uuid").is_err());
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
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random (v4) identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }

            /// Parse an identifier supplied by a client.
            ///
            /// # Errors
            ///
            /// Returns [`IdError`]($crate::IdError) if the input is not a UUID.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdError> {
                ::uuid::Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| $crate::IdError {
                        kind: stringify!($name),
                        value: s.to_owned(),
                    })
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <::uuid::Uuid as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <::uuid::Uuid as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <::uuid::Uuid as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <::uuid::Uuid as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(CartId);
define_id!(TransactionId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hyphenated() {
        let id = ProductId::parse("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert!(ProductId::parse(" 67e55044-10b1-426f-9247-bb680e5fe0c8 ").is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = ProductId::parse("12345").unwrap_err();
        assert_eq!(err.kind, "ProductId");
        assert_eq!(err.value, "12345");
        assert_eq!(err.to_string(), "invalid ProductId format: \"12345\"");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(UserId::parse("").is_err());
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(CartId::generate(), CartId::generate());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = UserId::parse("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"67e55044-10b1-426f-9247-bb680e5fe0c8\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

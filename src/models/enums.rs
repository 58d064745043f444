//! Shared domain enums
//!
//! Stored enums are persisted as TEXT using their variant name, the same
//! string that appears on the wire.

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Implements string conversions and SQLx TEXT mapping for a unit enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($label) {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($name), s))
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: &str = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Category {
    HeavyMachinery,
    PowerTools,
    Vehicles,
    Safety,
    Surveying,
}

text_enum!(Category {
    HeavyMachinery => "HeavyMachinery",
    PowerTools => "PowerTools",
    Vehicles => "Vehicles",
    Safety => "Safety",
    Surveying => "Surveying",
});

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Physical condition of an equipment item, also recorded on return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum Condition {
    #[default]
    New,
    Excellent,
    Good,
    Fair,
    Poor,
}

text_enum!(Condition {
    New => "New",
    Excellent => "Excellent",
    Good => "Good",
    Fair => "Fair",
    Poor => "Poor",
});

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Customer role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Admin,
    #[default]
    User,
}

text_enum!(Role {
    Admin => "Admin",
    User => "User",
});

// ---------------------------------------------------------------------------
// RentalStatus
// ---------------------------------------------------------------------------

/// Derived rental status. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum RentalStatus {
    Active,
    Overdue,
    Completed,
}

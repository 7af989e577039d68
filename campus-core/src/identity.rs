//! Identity types for campus entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behaviour of the strongly-typed entity identifiers.
pub trait EntityIdType: Copy + Eq + Hash + fmt::Debug + fmt::Display {
    /// Wrap an existing UUID.
    fn new(uuid: Uuid) -> Self;

    /// Borrow the underlying UUID.
    fn as_uuid(&self) -> Uuid;

    /// Generate a fresh UUIDv7 identifier (timestamp-sortable).
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a registered student.
    StudentId
);
define_entity_id!(
    /// Identifier of a recorded fee payment.
    PaymentId
);
define_entity_id!(
    /// Identifier of an onboarded training center.
    CenterId
);

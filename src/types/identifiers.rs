//! Unique identifier types for the storefront dataset
//!
//! This module contains the opaque identifier types for visits, users, orders and
//! shipping locations, and the [`IdentityGenerator`] that mints fresh ones.
//!
//! Identifiers are serialized as plain hyphenated UUID strings so that the generated
//! CSV extracts load into `STRING` warehouse columns without any prefix handling.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::{Builder, Uuid};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid.hyphenated().to_string())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(
    /// Key of an externally supplied browsing session
    VisitId
);
opaque_id!(
    /// Identity of a registered (or visit-level) user
    UserId
);
opaque_id!(
    /// Identifier of a generated order
    OrderId
);
opaque_id!(
    /// Identifier of a shipping location
    LocationId
);

/// Mints globally unique identifiers from an injected random source
///
/// Identifiers are RFC 4122 version 4 UUIDs whose random bits come from the caller's
/// generator, so a seeded run reproduces the same identifiers.
#[derive(Debug, Default, Clone)]
pub struct IdentityGenerator {
    issued: u64,
}

impl IdentityGenerator {
    /// Create a new identity generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identifiers minted so far
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Mint a fresh user identifier
    pub fn user_id<R: Rng + ?Sized>(&mut self, rng: &mut R) -> UserId {
        UserId::from(self.next_uuid(rng))
    }

    /// Mint a fresh order identifier
    pub fn order_id<R: Rng + ?Sized>(&mut self, rng: &mut R) -> OrderId {
        OrderId::from(self.next_uuid(rng))
    }

    /// Mint a fresh shipping location identifier
    pub fn location_id<R: Rng + ?Sized>(&mut self, rng: &mut R) -> LocationId {
        LocationId::from(self.next_uuid(rng))
    }

    fn next_uuid<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Uuid {
        self.issued += 1;
        Builder::from_random_bytes(rng.gen()).into_uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut identities = IdentityGenerator::new();

        let ids: HashSet<UserId> = (0..1000).map(|_| identities.user_id(&mut rng)).collect();

        assert_eq!(ids.len(), 1000);
        assert_eq!(identities.issued(), 1000);
    }

    #[test]
    fn test_generated_ids_are_v4_uuids() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut identities = IdentityGenerator::new();

        let order_id = identities.order_id(&mut rng);
        let parsed = Uuid::parse_str(order_id.as_str()).unwrap();

        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(order_id.as_str().len(), 36);
    }

    #[test]
    fn test_seeded_generation_replays() {
        let mut first = StdRng::seed_from_u64(99);
        let mut second = StdRng::seed_from_u64(99);

        let a = IdentityGenerator::new().location_id(&mut first);
        let b = IdentityGenerator::new().location_id(&mut second);

        assert_eq!(a, b);
    }

    #[test]
    fn test_id_serialization_is_plain_string() {
        let id = VisitId::from("visit-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"visit-42\"");

        let back: VisitId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert_eq!(back.to_string(), "visit-42");
    }
}

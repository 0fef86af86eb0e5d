//! Identity types for FitArena
//!
//! Engine-owned identifiers are strongly typed wrappers around UUIDs to
//! prevent accidental mixing of different ID types. Participant identities
//! come from the reward-token chain and are canonicalized on the way in.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{ArenaError, Result};

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from a string (with or without prefix)
            pub fn parse(s: &str) -> std::result::Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id_type!(ChallengeId, "challenge", "Unique identifier for an arena challenge");
define_id_type!(ReceiptId, "receipt", "Unique identifier for a mint receipt");

impl ChallengeId {
    /// Parse a caller-supplied challenge id, rejecting malformed input
    /// before any engine logic runs.
    pub fn from_input(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ArenaError::InvalidInput {
                field: "challenge_id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Self::parse(trimmed).map_err(|_| ArenaError::InvalidInput {
            field: "challenge_id".to_string(),
            reason: format!("'{trimmed}' is not a valid challenge id"),
        })
    }
}

/// A participant's reward-chain account identifier, canonicalized.
///
/// Accounts are `0x`-prefixed 20-byte hex addresses. Input is trimmed and
/// lower-cased so that the same wallet always maps to the same key
/// regardless of checksum casing. Construction via [`AccountId::parse`] is
/// the identity normalizer: malformed input is rejected before any engine
/// logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Validate and canonicalize a participant identifier.
    pub fn parse(input: &str) -> Result<Self> {
        let canonical = input.trim().to_ascii_lowercase();
        let hex = canonical.strip_prefix("0x").ok_or_else(|| ArenaError::InvalidAccount {
            input: input.to_string(),
            reason: "missing 0x prefix".to_string(),
        })?;
        if hex.len() != 40 {
            return Err(ArenaError::InvalidAccount {
                input: input.to_string(),
                reason: format!("expected 40 hex characters, got {}", hex.len()),
            });
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ArenaError::InvalidAccount {
                input: input.to_string(),
                reason: "non-hex character in address".to_string(),
            });
        }
        Ok(Self(canonical))
    }

    /// The canonical (lower-cased) address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_id_display() {
        let id = ChallengeId::new();
        assert!(id.to_string().starts_with("challenge_"));
    }

    #[test]
    fn test_challenge_id_parse_round_trip() {
        let id = ChallengeId::new();
        let parsed = ChallengeId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_challenge_id_from_input_rejects_garbage() {
        assert!(ChallengeId::from_input("").is_err());
        assert!(ChallengeId::from_input("not-a-uuid").is_err());
    }

    #[test]
    fn test_account_canonicalization() {
        let mixed = "  0xAbCdEf0123456789abcdef0123456789ABCDEF01 ";
        let account = AccountId::parse(mixed).unwrap();
        assert_eq!(account.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");

        let lower = AccountId::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert_eq!(account, lower);
    }

    #[test]
    fn test_account_rejects_malformed_input() {
        assert!(AccountId::parse("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(AccountId::parse("0x1234").is_err());
        assert!(AccountId::parse("0xZZcdef0123456789abcdef0123456789abcdef01").is_err());
    }
}

//! Account identifiers and aliases
//!
//! An account on the rollup is addressed by `(public key, nonce)`.
//! Nonce 0 is the primary identity account derived from the privacy key;
//! nonce > 0 addresses a registered sub-account controlled by a separate
//! spending key. Aliases are human-readable names resolved to the latest
//! registered nonce through the account registry.

use std::fmt;

use alloy_primitives::hex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Uncompressed public key bytes of an account (x || y coordinates).
///
/// The all-zero value is the network's sentinel for "no such account";
/// a successfully resolved account never carries it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountPublicKey(pub [u8; 64]);

impl AccountPublicKey {
    /// The network sentinel key.
    pub const ZERO: Self = Self([0u8; 64]);

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 64] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Whether this is the zero/identity sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 64]
    }
}

// Wire format is the 0x-prefixed hex string of all 64 bytes.
impl Serialize for AccountPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for AccountPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let bytes = hex::decode(raw.trim_start_matches("0x")).map_err(D::Error::custom)?;
        Self::from_slice(&bytes)
            .ok_or_else(|| D::Error::custom("account public key must be 64 bytes"))
    }
}

impl fmt::Debug for AccountPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountPublicKey(0x{})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for AccountPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Canonical account identifier: public key plus account nonce.
///
/// Immutable once constructed; equality is structural. Re-deriving from
/// the same signed message and nonce yields an equal identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId {
    pub public_key: AccountPublicKey,
    pub nonce: u32,
}

impl AccountId {
    pub fn new(public_key: AccountPublicKey, nonce: u32) -> Self {
        Self { public_key, nonce }
    }

    /// Primary identity accounts sit at nonce 0.
    pub fn is_primary(&self) -> bool {
        self.nonce == 0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}/{}", hex::encode(&self.public_key.0[..8]), self.nonce)
    }
}

/// Lowercase-normalized human-readable alias.
///
/// Normalization happens at construction so every lookup and registration
/// sees the same casing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alias(String);

impl Alias {
    pub fn new(alias: impl AsRef<str>) -> Self {
        Self(alias.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_key() {
        assert!(AccountPublicKey::ZERO.is_zero());

        let mut bytes = [0u8; 64];
        bytes[63] = 1;
        assert!(!AccountPublicKey(bytes).is_zero());
    }

    #[test]
    fn test_account_id_equality_is_structural() {
        let pk = AccountPublicKey([0x42; 64]);
        assert_eq!(AccountId::new(pk, 1), AccountId::new(pk, 1));
        assert_ne!(AccountId::new(pk, 1), AccountId::new(pk, 2));
        assert_ne!(
            AccountId::new(pk, 1),
            AccountId::new(AccountPublicKey([0x43; 64]), 1)
        );
    }

    #[test]
    fn test_public_key_wire_format_is_hex() {
        let pk = AccountPublicKey([0x42; 64]);

        let encoded = serde_json::to_string(&pk).unwrap();
        assert_eq!(encoded, format!("\"0x{}\"", "42".repeat(64)));

        let decoded: AccountPublicKey = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, pk);

        // Wrong length never decodes
        assert!(serde_json::from_str::<AccountPublicKey>("\"0x42\"").is_err());
    }

    #[test]
    fn test_account_id_round_trips_through_json() {
        let account = AccountId::new(AccountPublicKey([0x07; 64]), 3);
        let encoded = serde_json::to_string(&account).unwrap();
        let decoded: AccountId = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, account);
    }

    #[test]
    fn test_alias_normalization() {
        assert_eq!(Alias::new("Alice"), Alias::new("alice"));
        assert_eq!(Alias::new("  BOB  ").as_str(), "bob");
    }
}

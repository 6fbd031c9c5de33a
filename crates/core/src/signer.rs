//! Proof-payload signing
//!
//! One signer per account per session. The signer owns the derived key
//! exclusively and only ever exposes signatures, never the scalar.

use async_trait::async_trait;
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::account::AccountPublicKey;
use crate::keys::AccountKey;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// A 65-byte recoverable signature (r || s || v) over a proof payload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 65]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Signature(0x{})",
            alloy_primitives::hex::encode(&self.0[..8])
        )
    }
}

/// Signs proof payloads on behalf of one account.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Public key of the account this signer controls.
    fn public_key(&self) -> AccountPublicKey;

    /// Sign the Keccak-256 digest of `message`.
    async fn sign(&self, message: &[u8]) -> Result<Signature, SignError>;
}

/// In-process signer holding a derived [`AccountKey`].
///
/// Uses deterministic ECDSA (RFC 6979), so re-signing the same payload
/// under the same key reproduces the same signature.
pub struct KeySigner {
    key: AccountKey,
}

impl KeySigner {
    pub fn new(key: AccountKey) -> Self {
        Self { key }
    }

    pub fn account_key(&self) -> &AccountKey {
        &self.key
    }
}

#[async_trait]
impl Signer for KeySigner {
    fn public_key(&self) -> AccountPublicKey {
        self.key.public_key()
    }

    async fn sign(&self, message: &[u8]) -> Result<Signature, SignError> {
        let digest: [u8; 32] = Keccak256::digest(message).into();

        let (signature, recovery_id) = self
            .key
            .signing_key()
            .sign_prehash_recoverable(&digest)
            .map_err(|e| SignError::SigningFailed(e.to_string()))?;

        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&signature.r().to_bytes());
        bytes[32..64].copy_from_slice(&signature.s().to_bytes());
        bytes[64] = recovery_id.to_byte();

        Ok(Signature(bytes))
    }
}

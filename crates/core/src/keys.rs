//! Deterministic account-key derivation from wallet signatures
//!
//! The wallet signs a fixed disclosure message ([`crate::PRIVACY_KEY_MESSAGE`]
//! for the nonce-0 identity account, [`crate::SPENDING_KEY_MESSAGE`] for
//! sub-accounts). The signature's leading 32 bytes are the raw key
//! material, reduced into a secp256k1 scalar. Because the wallet signs
//! deterministically, the same (address, message, nonce) always yields
//! the same account key across sessions.

use std::fmt;

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::ops::Reduce;
use k256::{NonZeroScalar, Scalar, U256 as CurveUint};
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::account::{AccountId, AccountPublicKey};

/// Length of the raw key material taken from the head of the signature.
pub const RAW_KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Signature too short: need at least {RAW_KEY_LEN} bytes, got {0}")]
    SignatureTooShort(usize),

    #[error("Derived key material is not a valid scalar")]
    InvalidKeyMaterial,
}

/// A derived account key: private scalar, public key, and account nonce.
///
/// The scalar never leaves this struct; signing happens through
/// [`crate::signer::KeySigner`]. `Debug` is redacted so key material
/// cannot reach logs.
#[derive(Clone)]
pub struct AccountKey {
    signing: SigningKey,
    public_key: AccountPublicKey,
    nonce: u32,
}

impl AccountKey {
    pub fn public_key(&self) -> AccountPublicKey {
        self.public_key
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    /// The canonical account identifier for this key.
    pub fn account_id(&self) -> AccountId {
        AccountId::new(self.public_key, self.nonce)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountKey")
            .field("public_key", &self.public_key)
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}

/// Derive an account key from a wallet signature and account nonce.
///
/// The leading [`RAW_KEY_LEN`] bytes of the signature are the raw key
/// material. They are reduced modulo the secp256k1 order; in the
/// negligible case where the reduction lands on zero, the material is
/// re-hashed with Keccak-256 once before giving up.
pub fn derive_account_key(signature: &[u8], nonce: u32) -> Result<AccountKey, KeyError> {
    if signature.len() < RAW_KEY_LEN {
        return Err(KeyError::SignatureTooShort(signature.len()));
    }

    let mut raw = [0u8; RAW_KEY_LEN];
    raw.copy_from_slice(&signature[..RAW_KEY_LEN]);

    let scalar = reduce_to_scalar(&raw);
    let scalar = if bool::from(scalar.is_zero()) {
        let rehashed: [u8; 32] = Keccak256::digest(raw).into();
        reduce_to_scalar(&rehashed)
    } else {
        scalar
    };

    let nonzero =
        Option::<NonZeroScalar>::from(NonZeroScalar::new(scalar)).ok_or(KeyError::InvalidKeyMaterial)?;
    let signing = SigningKey::from(nonzero);

    let point = signing.verifying_key().to_encoded_point(false);
    // Uncompressed SEC1 encoding is 0x04 || x || y
    let public_key = AccountPublicKey::from_slice(&point.as_bytes()[1..65])
        .ok_or(KeyError::InvalidKeyMaterial)?;

    Ok(AccountKey {
        signing,
        public_key,
        nonce,
    })
}

fn reduce_to_scalar(bytes: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<CurveUint>>::reduce_bytes(bytes.into())
}

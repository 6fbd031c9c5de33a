//! Veilup core - primitives for the Veilup rollup client
//!
//! This crate holds the types shared by every layer of the client:
//! account identifiers, aliases, assets with exact integer values, and
//! the deterministic account-key derivation from wallet signatures.
//!
//! # Key derivation flow
//!
//! ```text
//! Wallet signature over disclosure message
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ Raw key material │  signature[0..32]
//! └──────────────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ Scalar reduction │  secp256k1 scalar (mod curve order)
//! └──────────────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ AccountKey       │  public key + nonce -> AccountId
//! └──────────────────┘
//! ```
//!
//! The same (signature, nonce) pair always yields the same account, which
//! is what makes account re-derivation across sessions idempotent.

pub mod account;
pub mod asset;
pub mod keys;
pub mod signer;

pub use account::{AccountId, AccountPublicKey, Alias};
pub use asset::{AssetId, AssetValue, SettlementTier, TxType};
pub use keys::{derive_account_key, AccountKey, KeyError};
pub use signer::{KeySigner, SignError, Signature, Signer};

/// Disclosure message signed to derive the nonce-0 privacy/identity key.
///
/// Shown verbatim by wallets so the user knows what the signature
/// authorizes. Changing a single byte changes every derived account.
pub const PRIVACY_KEY_MESSAGE: &str = "Sign this message to generate your Veilup privacy key. \
This key lets the application decrypt your balance on the Veilup rollup.\n\nIMPORTANT: \
Only sign this message if you trust the application.";

/// Disclosure message signed to derive a sub-account spending key (nonce > 0).
pub const SPENDING_KEY_MESSAGE: &str = "Sign this message to generate your Veilup spending key. \
This key lets the application spend your funds on the Veilup rollup.\n\nIMPORTANT: \
Only sign this message if you trust the application.";

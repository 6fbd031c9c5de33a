//! Proof inputs and the proof-backend seam
//!
//! The zero-knowledge proof system itself is an external collaborator.
//! This module defines the public inputs a controller assembles, the
//! opaque proof blob the backend returns, and the [`ProofBackend`] trait
//! the controllers call through.

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use veilup_core::{AccountId, AssetId, AssetValue, SettlementTier, TxType};

#[derive(Debug, Error)]
pub enum ProofError {
    #[error("Insufficient shielded balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("Malformed bridge descriptor: {0}")]
    MalformedBridge(String),

    #[error("Inconsistent proof inputs: {0}")]
    Inconsistent(String),

    #[error("Proof backend failed: {0}")]
    Backend(String),
}

/// Identifies a DeFi bridge interaction.
///
/// `output_asset_b` is `None` for single-output bridges; the settled
/// `output_value_b` is then zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeDescriptor {
    pub bridge_address: Address,
    pub bridge_sub_id: u32,
    pub input_asset: AssetId,
    pub output_asset_a: AssetId,
    pub output_asset_b: Option<AssetId>,
}

impl BridgeDescriptor {
    /// Local well-formedness checks, run before proof construction.
    pub fn validate(&self) -> Result<(), ProofError> {
        if self.bridge_address == Address::ZERO {
            return Err(ProofError::MalformedBridge(
                "bridge address is zero".into(),
            ));
        }
        if self.output_asset_b == Some(self.output_asset_a) {
            return Err(ProofError::MalformedBridge(
                "output assets A and B must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Public inputs of one rollup transaction.
///
/// Which optional fields are set depends on the transaction type:
/// deposits carry a `public_owner` (funding address) and a shielded
/// `recipient`; withdrawals carry the `public_owner` they pay out to;
/// transfers carry a `recipient`; defi deposits carry a `bridge`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxPublicInputs {
    pub tx_type: TxType,
    pub sender: AccountId,
    pub recipient: Option<AccountId>,
    pub public_owner: Option<Address>,
    pub bridge: Option<BridgeDescriptor>,
    pub value: AssetValue,
    pub fee: AssetValue,
    pub tier: SettlementTier,
}

/// Opaque proof blob produced by the backend.
#[derive(Clone, Debug)]
pub struct ProofData {
    pub payload: Vec<u8>,
}

/// Seam to the external zero-knowledge proof system.
///
/// Implementations may offload the (CPU-bound) construction; the call is
/// logically blocking for the submitting task either way.
#[async_trait]
pub trait ProofBackend: Send + Sync {
    async fn create_proof(&self, inputs: &TxPublicInputs) -> Result<ProofData, ProofError>;
}

//! Rollup operator seam
//!
//! Everything the client needs from the sequencer/aggregator service,
//! expressed as one async trait. The production implementation is the
//! JSON-RPC client in [`crate::rpc`]; tests drive the same trait with an
//! in-process mock operator.

use std::fmt;

use alloy_primitives::B256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use veilup_core::{AccountId, Alias, AssetId, AssetValue, Signature, TxType};

use crate::fees::FeeQuote;
use crate::proofs::{ProofData, TxPublicInputs};

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Operator-side rejection of a submission (malformed proof, stale
    /// fee, nonce conflict). The caller re-quotes and retries with a
    /// fresh controller; never retried in place.
    #[error("Submission rejected by rollup operator: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Opaque identifier for a submitted transaction.
///
/// Returned on submission, consumed exactly once to await settlement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementHandle(pub B256);

impl fmt::Display for SettlementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operator-reported status of a submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Settled,
    /// The operator has no record of the handle.
    Unknown,
}

/// Settled-state watermark of the operator's ledger.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RollupStatus {
    /// Number of transactions settled so far; the local ledger is in
    /// sync when its own sequence matches this.
    pub settled_seq: u64,
}

/// One transaction as it appears in the operator's settled history.
///
/// `output_value_a`/`output_value_b` are only present for defi deposits
/// and are authoritative only here, after settlement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettledTx {
    /// Position in the global settled sequence, contiguous from 0.
    pub seq: u64,
    pub handle: SettlementHandle,
    pub inner: TxPublicInputs,
    pub output_value_a: Option<AssetValue>,
    pub output_value_b: Option<AssetValue>,
}

/// The rollup operator endpoint, as seen by the client.
#[async_trait]
pub trait RollupProvider: Send + Sync {
    /// Submit a signed proof. Returns the settlement handle on
    /// acceptance; `ProviderError::Rejected` on operator rejection.
    async fn submit_proof(
        &self,
        proof: &ProofData,
        inputs: &TxPublicInputs,
        signature: &Signature,
    ) -> Result<SettlementHandle, ProviderError>;

    /// Current fee quote for one (asset, transaction type) pair.
    /// A snapshot valid only for this call.
    async fn fee_quote(&self, asset_id: AssetId, tx_type: TxType)
        -> Result<FeeQuote, ProviderError>;

    /// Latest nonce registered under an alias; 0 when the alias is
    /// unknown (which is also the next nonce to register).
    async fn latest_alias_nonce(&self, alias: &Alias) -> Result<u32, ProviderError>;

    /// Account bound to `(alias, nonce)`, or `None` when no such
    /// registration has settled.
    async fn account_by_alias(
        &self,
        alias: &Alias,
        nonce: u32,
    ) -> Result<Option<AccountId>, ProviderError>;

    /// Register an alias binding for an account. Bootstrap/fixture
    /// surface; production registrations arrive through account
    /// registration transactions outside this client's scope.
    async fn register_alias(&self, alias: &Alias, account: &AccountId)
        -> Result<(), ProviderError>;

    /// Status of a previously submitted transaction.
    async fn tx_status(&self, handle: &SettlementHandle) -> Result<TxStatus, ProviderError>;

    /// Settled transactions with sequence >= `from_seq`, in order.
    async fn settled_txs(&self, from_seq: u64) -> Result<Vec<SettledTx>, ProviderError>;

    /// The operator's settled watermark, polled by the sync loop.
    async fn status(&self) -> Result<RollupStatus, ProviderError>;
}

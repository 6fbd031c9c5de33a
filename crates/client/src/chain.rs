//! Base-layer chain seam
//!
//! The narrow view of the base chain the client needs: identity, public
//! balances, receipts, and the deposit funding leg that moves public
//! funds into the rollup's custody contract.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use veilup_core::AssetId;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Insufficient public funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("No receipt for transaction {0} within the polling bound")]
    ReceiptTimeout(B256),
}

/// Receipt of a mined base-layer transaction.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    /// Confirmation depth at the time of the query.
    pub confirmations: u32,
}

/// Base-layer chain RPC, consumed not reimplemented.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Addresses controlled by the connected wallet.
    async fn accounts(&self) -> Result<Vec<Address>, ChainError>;

    /// On-chain balance of `address` in base units.
    async fn public_balance(&self, asset_id: AssetId, address: Address)
        -> Result<u128, ChainError>;

    /// Receipt of a transaction, blocking (polling) until it is mined.
    async fn transaction_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ChainError>;

    /// Move `total` base units of `asset_id` from `from` into the
    /// rollup's custody contract. Returns the funding transaction hash;
    /// the caller must confirm it independently before proceeding.
    async fn deposit_pending_funds(
        &self,
        asset_id: AssetId,
        total: u128,
        from: Address,
    ) -> Result<B256, ChainError>;
}

//! Top-level rollup client
//!
//! Owns the collaborator seams and the shared state (registry, settled
//! ledger), and hands out single-use transaction controllers.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use tokio::sync::RwLock;
use tokio::time::{sleep, Instant};
use tracing::info;

use veilup_core::{AccountId, AccountKey, AssetId, AssetValue, SettlementTier, Signer};

use crate::chain::{ChainClient, ChainError};
use crate::config::ClientConfig;
use crate::controllers::{
    DefiController, DepositController, TransferController, WithdrawController,
};
use crate::fees::FeeSchedule;
use crate::ledger::{DefiTx, Ledger};
use crate::proofs::{BridgeDescriptor, ProofBackend};
use crate::provider::{ProviderError, RollupProvider};
use crate::registry::{AccountRegistry, RegisterOutcome};
use crate::settlement::SettlementError;

pub struct RollupClient {
    provider: Arc<dyn RollupProvider>,
    chain: Arc<dyn ChainClient>,
    backend: Arc<dyn ProofBackend>,
    registry: AccountRegistry,
    ledger: Arc<RwLock<Ledger>>,
    config: ClientConfig,
}

impl RollupClient {
    pub fn new(
        provider: Arc<dyn RollupProvider>,
        chain: Arc<dyn ChainClient>,
        backend: Arc<dyn ProofBackend>,
        config: ClientConfig,
    ) -> Self {
        Self {
            registry: AccountRegistry::new(provider.clone()),
            ledger: Arc::new(RwLock::new(Ledger::new())),
            provider,
            chain,
            backend,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    /// Read-only view of the operator's current fee table.
    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule::new(self.provider.clone())
    }

    /// Register a derived key locally. Unless `defer_sync` is set, pulls
    /// the settled history up to date before returning so the account's
    /// balance is immediately readable.
    pub async fn add_user(
        &self,
        key: &AccountKey,
        nonce: u32,
        defer_sync: bool,
    ) -> Result<RegisterOutcome, ProviderError> {
        let outcome = self.registry.register_local_user(key, nonce);
        if !defer_sync {
            self.sync().await?;
        }
        Ok(outcome)
    }

    /// Pull newly settled transactions from the operator into the local
    /// ledger. Returns the number of transactions applied.
    pub async fn sync(&self) -> Result<usize, ProviderError> {
        let from_seq = self.ledger.read().await.next_seq();
        let txs = self.provider.settled_txs(from_seq).await?;
        if txs.is_empty() {
            return Ok(0);
        }

        let applied = self.ledger.write().await.apply(txs);
        info!(applied, from_seq, "synced settled transactions");
        Ok(applied)
    }

    /// Poll until the local ledger matches the operator's settled
    /// watermark, or time out.
    pub async fn await_synchronised(&self, timeout: Duration) -> Result<(), SettlementError> {
        let deadline = Instant::now() + timeout;

        loop {
            let remote = self.provider.status().await?.settled_seq;
            self.sync().await?;
            let local = self.ledger.read().await.next_seq();

            if local >= remote {
                return Ok(());
            }

            if Instant::now() + self.config.poll_interval > deadline {
                return Err(SettlementError::Timeout(timeout));
            }
            sleep(self.config.poll_interval).await;
        }
    }

    /// Settled shielded balance for `(asset, account)`. Reflects only
    /// state pulled in by [`Self::sync`]; pending submissions are
    /// invisible.
    pub async fn shielded_balance(&self, asset_id: AssetId, account: &AccountId) -> u128 {
        self.ledger.read().await.shielded_balance(asset_id, account)
    }

    /// On-chain balance of a base-layer address.
    pub async fn public_balance(
        &self,
        asset_id: AssetId,
        address: Address,
    ) -> Result<u128, ChainError> {
        self.chain.public_balance(asset_id, address).await
    }

    /// Settled defi interactions submitted by `account`.
    pub async fn defi_txs(&self, account: &AccountId) -> Vec<DefiTx> {
        self.ledger.read().await.defi_txs(account)
    }

    /// Build a deposit controller funding `recipient` from the
    /// base-layer address `from`.
    pub fn create_deposit(
        &self,
        signer: Arc<dyn Signer>,
        from: Address,
        recipient: AccountId,
        value: AssetValue,
        fee: AssetValue,
        tier: SettlementTier,
    ) -> DepositController {
        DepositController::new(
            self.provider.clone(),
            self.chain.clone(),
            self.backend.clone(),
            signer,
            self.config.clone(),
            from,
            recipient,
            value,
            fee,
            tier,
        )
    }

    /// Build a shielded transfer controller. `sender` must be the
    /// account the signer controls.
    pub fn create_transfer(
        &self,
        signer: Arc<dyn Signer>,
        sender: AccountId,
        recipient: AccountId,
        value: AssetValue,
        fee: AssetValue,
        tier: SettlementTier,
    ) -> TransferController {
        TransferController::new(
            self.provider.clone(),
            self.backend.clone(),
            self.ledger.clone(),
            signer,
            self.config.clone(),
            sender,
            recipient,
            value,
            fee,
            tier,
        )
    }

    /// Build a withdraw controller paying out to the base-layer address
    /// `to`.
    pub fn create_withdraw(
        &self,
        signer: Arc<dyn Signer>,
        sender: AccountId,
        to: Address,
        value: AssetValue,
        fee: AssetValue,
        tier: SettlementTier,
    ) -> WithdrawController {
        WithdrawController::new(
            self.provider.clone(),
            self.backend.clone(),
            self.ledger.clone(),
            signer,
            self.config.clone(),
            sender,
            to,
            value,
            fee,
            tier,
        )
    }

    /// Build a bridge/defi deposit controller.
    pub fn create_defi_deposit(
        &self,
        signer: Arc<dyn Signer>,
        sender: AccountId,
        bridge: BridgeDescriptor,
        deposit_value: AssetValue,
        fee: AssetValue,
        tier: SettlementTier,
    ) -> DefiController {
        DefiController::new(
            self.provider.clone(),
            self.backend.clone(),
            self.ledger.clone(),
            signer,
            self.config.clone(),
            sender,
            bridge,
            deposit_value,
            fee,
            tier,
        )
    }
}

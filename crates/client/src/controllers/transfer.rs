//! Shielded transfer controller

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use veilup_core::{AccountId, AssetValue, SettlementTier, Signer, TxType};

use crate::config::ClientConfig;
use crate::controllers::{ControllerError, Lifecycle, TxState};
use crate::ledger::Ledger;
use crate::proofs::{ProofBackend, ProofError, TxPublicInputs};
use crate::provider::{RollupProvider, SettlementHandle};

pub struct TransferController {
    provider: Arc<dyn RollupProvider>,
    backend: Arc<dyn ProofBackend>,
    ledger: Arc<RwLock<Ledger>>,
    signer: Arc<dyn Signer>,
    config: ClientConfig,

    sender: AccountId,
    recipient: AccountId,
    value: AssetValue,
    fee: AssetValue,
    tier: SettlementTier,

    lifecycle: Lifecycle,
}

impl TransferController {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        provider: Arc<dyn RollupProvider>,
        backend: Arc<dyn ProofBackend>,
        ledger: Arc<RwLock<Ledger>>,
        signer: Arc<dyn Signer>,
        config: ClientConfig,
        sender: AccountId,
        recipient: AccountId,
        value: AssetValue,
        fee: AssetValue,
        tier: SettlementTier,
    ) -> Self {
        Self {
            provider,
            backend,
            ledger,
            signer,
            config,
            sender,
            recipient,
            value,
            fee,
            tier,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn state(&self) -> TxState {
        self.lifecycle.state()
    }

    /// Build the transfer proof against the sender's settled shielded
    /// balance. Created -> ProofBuilt.
    pub async fn create_proof(&mut self) -> Result<(), ControllerError> {
        self.lifecycle.expect(&[TxState::Created], "create_proof")?;

        if self.fee.asset_id != self.value.asset_id {
            return Err(ProofError::Inconsistent(
                "fee must be denominated in the transferred asset".into(),
            )
            .into());
        }

        let needed = self
            .value
            .checked_add(&self.fee)
            .ok_or_else(|| ProofError::Inconsistent("transfer total overflows".into()))?;

        let available = self
            .ledger
            .read()
            .await
            .shielded_balance(self.value.asset_id, &self.sender);
        if available < needed.value {
            return Err(ProofError::InsufficientBalance {
                needed: needed.value,
                available,
            }
            .into());
        }

        let inputs = TxPublicInputs {
            tx_type: TxType::Transfer,
            sender: self.sender,
            recipient: Some(self.recipient),
            public_owner: None,
            bridge: None,
            value: self.value,
            fee: self.fee,
            tier: self.tier,
        };

        let proof = self.backend.create_proof(&inputs).await?;
        self.lifecycle.set_proof(proof, inputs);
        Ok(())
    }

    /// Sign the proof payload. ProofBuilt -> Signed.
    pub async fn sign(&mut self) -> Result<(), ControllerError> {
        self.lifecycle
            .sign(self.signer.as_ref(), &[TxState::ProofBuilt])
            .await
    }

    /// Submit to the rollup operator. Signed -> Submitted.
    pub async fn send(&mut self) -> Result<SettlementHandle, ControllerError> {
        self.lifecycle.send(self.provider.as_ref()).await
    }

    /// Await settlement, or time out after `timeout`.
    pub async fn await_settlement(&mut self, timeout: Duration) -> Result<(), ControllerError> {
        self.lifecycle
            .await_settlement(self.provider.as_ref(), self.config.poll_interval, timeout)
            .await
    }
}

//! Deposit controller
//!
//! Moving public funds into the shielded ledger is two sequentially
//! dependent operations: an on-chain funding transaction into the
//! rollup's custody contract, then the proof submission. The funding leg
//! must be confirmed to the configured depth before the proof may be
//! signed and sent.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use tracing::info;

use veilup_core::{AccountId, AssetValue, SettlementTier, Signer, TxType};

use crate::chain::ChainClient;
use crate::config::ClientConfig;
use crate::controllers::{ControllerError, Lifecycle, TxState};
use crate::proofs::{ProofBackend, ProofError, TxPublicInputs};
use crate::provider::{RollupProvider, SettlementHandle};

pub struct DepositController {
    provider: Arc<dyn RollupProvider>,
    chain: Arc<dyn ChainClient>,
    backend: Arc<dyn ProofBackend>,
    signer: Arc<dyn Signer>,
    config: ClientConfig,

    /// Base-layer address funding the deposit.
    from: Address,
    /// Shielded account credited on settlement.
    recipient: AccountId,
    value: AssetValue,
    fee: AssetValue,
    tier: SettlementTier,

    lifecycle: Lifecycle,
    funding_tx: Option<B256>,
}

impl DepositController {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        provider: Arc<dyn RollupProvider>,
        chain: Arc<dyn ChainClient>,
        backend: Arc<dyn ProofBackend>,
        signer: Arc<dyn Signer>,
        config: ClientConfig,
        from: Address,
        recipient: AccountId,
        value: AssetValue,
        fee: AssetValue,
        tier: SettlementTier,
    ) -> Self {
        Self {
            provider,
            chain,
            backend,
            signer,
            config,
            from,
            recipient,
            value,
            fee,
            tier,
            lifecycle: Lifecycle::new(),
            funding_tx: None,
        }
    }

    pub fn state(&self) -> TxState {
        self.lifecycle.state()
    }

    /// Hash of the funding transaction, once submitted.
    pub fn funding_tx(&self) -> Option<B256> {
        self.funding_tx
    }

    /// Build the deposit proof. Created -> ProofBuilt.
    pub async fn create_proof(&mut self) -> Result<(), ControllerError> {
        self.lifecycle.expect(&[TxState::Created], "create_proof")?;

        if self.fee.asset_id != self.value.asset_id {
            return Err(ProofError::Inconsistent(
                "fee must be denominated in the deposited asset".into(),
            )
            .into());
        }
        if self.value.value == 0 {
            return Err(ProofError::Inconsistent("deposit value must be positive".into()).into());
        }

        let inputs = TxPublicInputs {
            tx_type: TxType::Deposit,
            sender: self.recipient,
            recipient: Some(self.recipient),
            public_owner: Some(self.from),
            bridge: None,
            value: self.value,
            fee: self.fee,
            tier: self.tier,
        };

        let proof = self.backend.create_proof(&inputs).await?;
        self.lifecycle.set_proof(proof, inputs);
        Ok(())
    }

    /// Move `value + fee` of public funds into the custody contract.
    ///
    /// Returns the funding transaction hash; the deposit stays
    /// ProofBuilt until [`Self::await_funding_confirmation`] observes
    /// the required confirmation depth.
    pub async fn deposit_funds_to_contract(&mut self) -> Result<B256, ControllerError> {
        self.lifecycle
            .expect(&[TxState::ProofBuilt], "deposit_funds_to_contract")?;

        let total = self
            .value
            .checked_add(&self.fee)
            .ok_or_else(|| ProofError::Inconsistent("deposit total overflows".into()))?;

        let tx_hash = self
            .chain
            .deposit_pending_funds(total.asset_id, total.value, self.from)
            .await?;

        info!(%tx_hash, from = %self.from, value = total.value, "funding transaction submitted");
        self.funding_tx = Some(tx_hash);
        Ok(tx_hash)
    }

    /// Await the funding receipt at the configured confirmation depth.
    /// ProofBuilt -> Funded; insufficient depth is fatal to this
    /// deposit attempt.
    pub async fn await_funding_confirmation(&mut self) -> Result<(), ControllerError> {
        self.lifecycle
            .expect(&[TxState::ProofBuilt], "await_funding_confirmation")?;

        let tx_hash = self.funding_tx.ok_or_else(|| {
            ControllerError::FundingConfirmation("no funding transaction submitted".into())
        })?;

        let receipt = self.chain.transaction_receipt(tx_hash).await?;
        if receipt.confirmations < self.config.min_confirmations {
            return Err(ControllerError::FundingConfirmation(format!(
                "funding tx {tx_hash} has {} confirmations, need {}",
                receipt.confirmations, self.config.min_confirmations
            )));
        }

        self.lifecycle.mark_funded();
        Ok(())
    }

    /// Sign the proof payload. Requires the funding leg to be confirmed.
    pub async fn sign(&mut self) -> Result<(), ControllerError> {
        self.lifecycle
            .sign(self.signer.as_ref(), &[TxState::Funded])
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

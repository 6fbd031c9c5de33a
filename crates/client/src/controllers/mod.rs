//! Transaction controllers
//!
//! One controller per transaction type, each owning the full lifecycle
//! of a single transaction as an explicit typed state machine:
//!
//! ```text
//! Created -> ProofBuilt -> (Funded, deposit only) -> Signed
//!         -> Submitted -> Settled | TimedOut
//! ```
//!
//! Controllers are transient: one per transaction, never reused and
//! never retried in place. After a rejection the caller re-quotes the
//! fee and builds a fresh controller. Each phase is a separate operation
//! so partial failures report exactly where to resume.

mod defi;
mod deposit;
mod transfer;
mod withdraw;

pub use defi::DefiController;
pub use deposit::DepositController;
pub use transfer::TransferController;
pub use withdraw::WithdrawController;

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use veilup_core::{SignError, Signature, Signer};

use crate::chain::ChainError;
use crate::proofs::{ProofData, ProofError, TxPublicInputs};
use crate::provider::{ProviderError, RollupProvider, SettlementHandle};
use crate::settlement::{self, SettlementError};

/// Lifecycle state of a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxState {
    Created,
    ProofBuilt,
    Funded,
    Signed,
    Submitted,
    Settled,
    TimedOut,
}

impl TxState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::ProofBuilt => "proof-built",
            Self::Funded => "funded",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
            Self::Settled => "settled",
            Self::TimedOut => "timed-out",
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Cannot {op} while {actual}: controller must be {expected}")]
    InvalidState {
        op: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// Local validation or proof construction failed; the transaction
    /// never reached submission.
    #[error("Proof construction failed: {0}")]
    Proof(#[from] ProofError),

    #[error("Signing failed: {0}")]
    Sign(#[from] SignError),

    /// Operator rejected the submission. Retry requires a fresh
    /// controller with a fresh quote.
    #[error("Submission rejected: {0}")]
    Rejected(String),

    /// Accepted but not observed settled within the bound; distinct from
    /// rejection, since the transaction may still settle later.
    #[error("Settlement not observed within {0:?}")]
    SettlementTimeout(Duration),

    /// The deposit funding leg did not reach the required confirmation
    /// depth. Fatal to this deposit attempt.
    #[error("Funding confirmation failed: {0}")]
    FundingConfirmation(String),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Rollup provider error: {0}")]
    Provider(String),
}

fn provider_err(err: ProviderError) -> ControllerError {
    match err {
        ProviderError::Rejected(reason) => ControllerError::Rejected(reason),
        ProviderError::Transport(reason) => ControllerError::Provider(reason),
    }
}

/// Shared lifecycle plumbing: state transitions, signing, submission and
/// the settlement await. Controllers wrap this around their own proof
/// construction.
pub(crate) struct Lifecycle {
    state: TxState,
    proof: Option<ProofData>,
    inputs: Option<TxPublicInputs>,
    signature: Option<Signature>,
    handle: Option<SettlementHandle>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: TxState::Created,
            proof: None,
            inputs: None,
            signature: None,
            handle: None,
        }
    }

    pub(crate) fn state(&self) -> TxState {
        self.state
    }

    pub(crate) fn expect(
        &self,
        allowed: &[TxState],
        op: &'static str,
    ) -> Result<(), ControllerError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(ControllerError::InvalidState {
            op,
            expected: allowed.first().map(TxState::name).unwrap_or("-"),
            actual: self.state.name(),
        })
    }

    pub(crate) fn set_proof(&mut self, proof: ProofData, inputs: TxPublicInputs) {
        debug!(tx_type = inputs.tx_type.name(), "proof built");
        self.proof = Some(proof);
        self.inputs = Some(inputs);
        self.state = TxState::ProofBuilt;
    }

    pub(crate) fn mark_funded(&mut self) {
        self.state = TxState::Funded;
    }

    /// Attach the account signer's signature over the proof payload.
    pub(crate) async fn sign(
        &mut self,
        signer: &dyn Signer,
        allowed: &[TxState],
    ) -> Result<(), ControllerError> {
        self.expect(allowed, "sign")?;

        let proof = self.proof.as_ref().ok_or(ControllerError::InvalidState {
            op: "sign",
            expected: "proof-built",
            actual: self.state.name(),
        })?;

        let signature = signer.sign(&proof.payload).await?;
        self.signature = Some(signature);
        self.state = TxState::Signed;
        Ok(())
    }

    /// Submit the signed proof to the rollup operator.
    pub(crate) async fn send(
        &mut self,
        provider: &dyn RollupProvider,
    ) -> Result<SettlementHandle, ControllerError> {
        self.expect(&[TxState::Signed], "send")?;

        // Invariant: Signed implies proof, inputs and signature are set.
        let proof = self.proof.as_ref().expect("signed without proof");
        let inputs = self.inputs.as_ref().expect("signed without inputs");
        let signature = self.signature.as_ref().expect("signed without signature");

        let handle = provider
            .submit_proof(proof, inputs, signature)
            .await
            .map_err(provider_err)?;

        debug!(%handle, tx_type = inputs.tx_type.name(), "submitted to rollup");
        self.handle = Some(handle);
        self.state = TxState::Submitted;
        Ok(handle)
    }

    /// Await settlement of the submitted transaction. The handle is
    /// consumed once the await resolves (settled or timed out); a
    /// transport failure leaves the controller Submitted so the caller
    /// can await again.
    pub(crate) async fn await_settlement(
        &mut self,
        provider: &dyn RollupProvider,
        interval: Duration,
        timeout: Duration,
    ) -> Result<(), ControllerError> {
        self.expect(&[TxState::Submitted], "await_settlement")?;

        let handle = self.handle.ok_or(ControllerError::InvalidState {
            op: "await_settlement",
            expected: "submitted",
            actual: self.state.name(),
        })?;

        match settlement::await_settlement(provider, handle, interval, timeout).await {
            Ok(()) => {
                self.handle = None;
                self.state = TxState::Settled;
                Ok(())
            }
            Err(SettlementError::Timeout(bound)) => {
                self.handle = None;
                self.state = TxState::TimedOut;
                Err(ControllerError::SettlementTimeout(bound))
            }
            Err(SettlementError::Provider(err)) => Err(provider_err(err)),
        }
    }
}

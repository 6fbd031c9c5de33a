//! Veilup client - orchestration layer for the Veilup privacy rollup
//!
//! This crate coordinates everything between a user's wallet and the
//! rollup operator: account derivation and registration, alias
//! resolution, fee quoting, zero-knowledge transaction lifecycles, and
//! eventual-consistency settlement tracking.
//!
//! # Architecture
//!
//! ```text
//! Wallet signature
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ Key derivation   │  veilup-core
//! └──────────────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ Account registry │  local cache + remote alias state
//! └──────────────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ Controller       │  proof -> (fund) -> sign -> send
//! └──────────────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ Settlement       │  bounded poll until batched
//! └──────────────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ Ledger           │  balances from settled history
//! └──────────────────┘
//! ```
//!
//! # Key components
//!
//! - [`client::RollupClient`] - top-level entry point
//! - [`controllers`] - single-use, typed transaction state machines
//! - [`registry`] - idempotent key registration and alias resolution
//! - [`ledger`] - balance accounting over settled history
//! - [`provider`] / [`chain`] / [`proofs`] - external collaborator seams
//! - [`rpc`] - JSON-RPC implementations of those seams

pub mod chain;
pub mod client;
pub mod config;
pub mod controllers;
pub mod fees;
pub mod ledger;
pub mod proofs;
pub mod provider;
pub mod registry;
pub mod rpc;
pub mod settlement;

pub use chain::{ChainClient, ChainError, TxReceipt};
pub use client::RollupClient;
pub use config::ClientConfig;
pub use controllers::{
    ControllerError, DefiController, DepositController, TransferController, TxState,
    WithdrawController,
};
pub use fees::{FeeQuote, FeeSchedule};
pub use ledger::{DefiTx, Ledger};
pub use proofs::{BridgeDescriptor, ProofBackend, ProofData, ProofError, TxPublicInputs};
pub use provider::{
    ProviderError, RollupProvider, RollupStatus, SettledTx, SettlementHandle, TxStatus,
};
pub use registry::{AccountRegistry, RegisterOutcome};
pub use rpc::{HttpChainClient, RollupRpcClient};
pub use settlement::{await_settlement, SettlementError};

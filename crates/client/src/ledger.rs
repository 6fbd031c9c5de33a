//! Settled-transaction ledger and balance accounting
//!
//! The ledger is a local, append-only mirror of the operator's settled
//! history. Balances are derived state, recomputed from that history and
//! never mutated directly. Pending submissions are invisible until the
//! operator reports them settled.

use tracing::{debug, warn};

use veilup_core::{AccountId, AssetId, AssetValue, TxType};

use crate::proofs::BridgeDescriptor;
use crate::provider::{SettledTx, SettlementHandle};

/// One settled defi interaction for an account, with the authoritative
/// bridge outputs as reported at settlement.
#[derive(Clone, Debug)]
pub struct DefiTx {
    pub handle: SettlementHandle,
    pub bridge: BridgeDescriptor,
    pub deposit_value: AssetValue,
    pub fee: AssetValue,
    pub output_value_a: AssetValue,
    /// Zero-valued for single-output bridges.
    pub output_value_b: Option<AssetValue>,
}

/// Local mirror of the operator's settled transaction history.
#[derive(Default)]
pub struct Ledger {
    settled: Vec<SettledTx>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number this ledger expects; equals the number of
    /// settled transactions mirrored so far.
    pub fn next_seq(&self) -> u64 {
        self.settled.len() as u64
    }

    /// Append newly settled transactions. Entries below the current
    /// watermark are skipped so a re-delivered batch cannot double-count;
    /// a gap above it stops the batch so the mirror stays contiguous and
    /// the dropped tail is re-fetched on the next sync.
    pub fn apply(&mut self, txs: Vec<SettledTx>) -> usize {
        let mut applied = 0;
        for tx in txs {
            if tx.seq < self.next_seq() {
                continue;
            }
            if tx.seq != self.next_seq() {
                warn!(
                    seq = tx.seq,
                    expected = self.next_seq(),
                    "gap in settled sequence, dropping batch tail"
                );
                break;
            }
            self.settled.push(tx);
            applied += 1;
        }
        if applied > 0 {
            debug!(applied, watermark = self.next_seq(), "applied settled transactions");
        }
        applied
    }

    /// Settled credits minus settled debits for `(asset, account)`.
    ///
    /// Credits and debits are accumulated separately so the result is
    /// independent of iteration order; a valid history never debits more
    /// than it credited.
    pub fn shielded_balance(&self, asset_id: AssetId, account: &AccountId) -> u128 {
        let mut credits: u128 = 0;
        let mut debits: u128 = 0;

        for tx in &self.settled {
            let inner = &tx.inner;
            match inner.tx_type {
                TxType::Deposit => {
                    if inner.recipient.as_ref() == Some(account)
                        && inner.value.asset_id == asset_id
                    {
                        credits += inner.value.value;
                    }
                }
                TxType::Transfer => {
                    if inner.recipient.as_ref() == Some(account)
                        && inner.value.asset_id == asset_id
                    {
                        credits += inner.value.value;
                    }
                    if inner.sender == *account && inner.value.asset_id == asset_id {
                        debits += inner.value.value + inner.fee.value;
                    }
                }
                TxType::Withdraw => {
                    if inner.sender == *account && inner.value.asset_id == asset_id {
                        debits += inner.value.value + inner.fee.value;
                    }
                }
                TxType::DefiDeposit => {
                    if inner.sender == *account {
                        if inner.value.asset_id == asset_id {
                            debits += inner.value.value + inner.fee.value;
                        }
                        if let Some(out_a) = &tx.output_value_a {
                            if out_a.asset_id == asset_id {
                                credits += out_a.value;
                            }
                        }
                        if let Some(out_b) = &tx.output_value_b {
                            if out_b.asset_id == asset_id {
                                credits += out_b.value;
                            }
                        }
                    }
                }
            }
        }

        credits.saturating_sub(debits)
    }

    /// Settled defi interactions submitted by `account`, in settlement
    /// order.
    pub fn defi_txs(&self, account: &AccountId) -> Vec<DefiTx> {
        self.settled
            .iter()
            .filter(|tx| tx.inner.tx_type == TxType::DefiDeposit && tx.inner.sender == *account)
            .filter_map(|tx| {
                let bridge = tx.inner.bridge?;
                Some(DefiTx {
                    handle: tx.handle,
                    bridge,
                    deposit_value: tx.inner.value,
                    fee: tx.inner.fee,
                    output_value_a: tx
                        .output_value_a
                        .unwrap_or(AssetValue::new(bridge.output_asset_a, 0)),
                    output_value_b: tx.output_value_b,
                })
            })
            .collect()
    }
}

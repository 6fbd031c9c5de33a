//! Fee schedule
//!
//! Fees are quoted per (asset, transaction type) and keyed by settlement
//! tier. Quotes are read-only snapshots; nothing here caches, so callers
//! re-quote before each submission.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use veilup_core::{AssetId, AssetValue, SettlementTier, TxType};

use crate::provider::{ProviderError, RollupProvider};

/// A two-tier fee quote, denominated in the quoted asset.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FeeQuote {
    pub next_rollup: AssetValue,
    pub instant: AssetValue,
}

impl FeeQuote {
    pub fn for_tier(&self, tier: SettlementTier) -> AssetValue {
        match tier {
            SettlementTier::NextRollup => self.next_rollup,
            SettlementTier::Instant => self.instant,
        }
    }
}

/// Read-only view of the operator's current fee table.
#[derive(Clone)]
pub struct FeeSchedule {
    provider: Arc<dyn RollupProvider>,
}

impl FeeSchedule {
    pub fn new(provider: Arc<dyn RollupProvider>) -> Self {
        Self { provider }
    }

    /// Quote both tiers for one (asset, transaction type) pair.
    pub async fn quote(
        &self,
        asset_id: AssetId,
        tx_type: TxType,
    ) -> Result<FeeQuote, ProviderError> {
        self.provider.fee_quote(asset_id, tx_type).await
    }
}

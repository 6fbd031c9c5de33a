//! Assets, values, transaction types and settlement tiers
//!
//! All values are non-negative integers in base units. Arithmetic is
//! exact and checked; nothing in the client ever rounds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Asset identifier. Id 0 is the chain's native asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u32);

impl AssetId {
    pub const NATIVE: Self = Self(0);
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

/// An asset-denominated value in base units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValue {
    pub asset_id: AssetId,
    pub value: u128,
}

impl AssetValue {
    pub fn new(asset_id: AssetId, value: u128) -> Self {
        Self { asset_id, value }
    }

    /// Checked addition. `None` on overflow or asset mismatch.
    pub fn checked_add(&self, other: &AssetValue) -> Option<AssetValue> {
        if self.asset_id != other.asset_id {
            return None;
        }
        let value = self.value.checked_add(other.value)?;
        Some(AssetValue::new(self.asset_id, value))
    }

    /// Checked subtraction. `None` on underflow or asset mismatch.
    pub fn checked_sub(&self, other: &AssetValue) -> Option<AssetValue> {
        if self.asset_id != other.asset_id {
            return None;
        }
        let value = self.value.checked_sub(other.value)?;
        Some(AssetValue::new(self.asset_id, value))
    }
}

impl fmt::Display for AssetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.asset_id)
    }
}

/// Transaction type handled by a dedicated controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    Deposit,
    Transfer,
    Withdraw,
    DefiDeposit,
}

impl TxType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Transfer => "transfer",
            Self::Withdraw => "withdraw",
            Self::DefiDeposit => "defi-deposit",
        }
    }
}

/// Settlement-speed tier. Affects the quoted fee and batch priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementTier {
    /// Included in the next scheduled rollup batch (cheaper).
    NextRollup,
    /// Prioritized inclusion (costlier).
    Instant,
}

impl SettlementTier {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NextRollup => "next-rollup",
            Self::Instant => "instant",
        }
    }
}

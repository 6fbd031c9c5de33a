//! Client configuration

use std::time::Duration;

use alloy_primitives::B256;

/// Veilup client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Rollup operator endpoint URL
    pub rollup_url: String,

    /// Base-layer chain RPC URL
    pub chain_url: String,

    /// Interval between status polls (settlement awaits, sync)
    pub poll_interval: Duration,

    /// Keep local state in memory instead of persistent storage
    pub memory_db: bool,

    /// Confirmation depth required before a base-layer event is final
    pub min_confirmations: u32,

    /// Funding key for test/bootstrap flows only; never part of the
    /// core contract
    pub funding_key: Option<B256>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rollup_url: "http://localhost:8081".to_string(),
            chain_url: "http://localhost:8545".to_string(),
            poll_interval: Duration::from_millis(1000),
            memory_db: true,
            min_confirmations: 1,
            funding_key: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("VEILUP_ROLLUP_HOST") {
            config.rollup_url = val;
        }

        if let Ok(val) = std::env::var("VEILUP_CHAIN_HOST") {
            config.chain_url = val;
        }

        if let Ok(val) = std::env::var("VEILUP_POLL_INTERVAL_MS") {
            if let Ok(ms) = val.parse() {
                config.poll_interval = Duration::from_millis(ms);
            }
        }

        if let Ok(val) = std::env::var("VEILUP_MIN_CONFIRMATIONS") {
            if let Ok(depth) = val.parse() {
                config.min_confirmations = depth;
            }
        }

        if let Ok(val) = std::env::var("VEILUP_FUNDING_KEY") {
            if let Ok(key) = val.parse() {
                config.funding_key = Some(key);
            }
        }

        config
    }
}

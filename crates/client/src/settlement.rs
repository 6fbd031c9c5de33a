//! Settlement tracking
//!
//! Bounded poll loops over the operator's status surface. A submitted
//! transaction either settles within the bound or the caller gets a
//! timeout it can distinguish from rejection; there is no silent loss.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::provider::{ProviderError, RollupProvider, SettlementHandle, TxStatus};

#[derive(Debug, Error)]
pub enum SettlementError {
    /// The submission was accepted but not observed settled within the
    /// bound. The transaction may still settle later; the caller should
    /// re-query rather than assume failure.
    #[error("Settlement not observed within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Poll the operator until `handle` is observed settled.
///
/// Independent awaits may run concurrently; they have no mutual ordering
/// guarantee.
pub async fn await_settlement(
    provider: &dyn RollupProvider,
    handle: SettlementHandle,
    interval: Duration,
    timeout: Duration,
) -> Result<(), SettlementError> {
    let deadline = Instant::now() + timeout;

    loop {
        match provider.tx_status(&handle).await? {
            TxStatus::Settled => {
                debug!(%handle, "transaction settled");
                return Ok(());
            }
            TxStatus::Pending | TxStatus::Unknown => {}
        }

        if Instant::now() + interval > deadline {
            return Err(SettlementError::Timeout(timeout));
        }
        sleep(interval).await;
    }
}

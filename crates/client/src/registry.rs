//! Account registry
//!
//! Maps derived keys to canonical account identifiers and resolves
//! aliases against remote registry state. The local cache of registered
//! keys is append-only and safe for concurrent readers; duplicate
//! registration is an expected, recoverable condition reported through
//! [`RegisterOutcome`], never an error.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use veilup_core::{AccountId, AccountKey, Alias};

use crate::provider::{ProviderError, RollupProvider};

/// What a registration attempt actually did.
///
/// Callers can assert on the variant instead of relying on the absence
/// of a raised error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    AlreadyRegistered,
}

/// Local key cache plus remote alias resolution.
pub struct AccountRegistry {
    provider: Arc<dyn RollupProvider>,
    /// Append-only set of locally registered accounts. Last write wins;
    /// concurrent duplicate registration is a no-op.
    local: DashMap<AccountId, ()>,
}

impl AccountRegistry {
    pub fn new(provider: Arc<dyn RollupProvider>) -> Self {
        Self {
            provider,
            local: DashMap::new(),
        }
    }

    /// Register a derived key locally for synchronization. Idempotent:
    /// registering the same account twice reports `AlreadyRegistered`
    /// and changes nothing.
    pub fn register_local_user(&self, key: &AccountKey, nonce: u32) -> RegisterOutcome {
        let account = AccountId::new(key.public_key(), nonce);

        if self.local.insert(account, ()).is_some() {
            debug!(%account, "account already registered, ignoring duplicate");
            RegisterOutcome::AlreadyRegistered
        } else {
            debug!(%account, "registered local account");
            RegisterOutcome::Registered
        }
    }

    pub fn is_registered(&self, account: &AccountId) -> bool {
        self.local.contains_key(account)
    }

    /// Number of locally registered accounts.
    pub fn registered_count(&self) -> usize {
        self.local.len()
    }

    /// Latest nonce registered under `alias` in remote state, 0 when
    /// none is known yet (which is the next nonce to register).
    pub async fn resolve_alias_nonce(&self, alias: &Alias) -> Result<u32, ProviderError> {
        self.provider.latest_alias_nonce(alias).await
    }

    /// The account bound to `(alias, nonce)` if that registration has
    /// settled on-chain. An absent alias is an absent result, never an
    /// error.
    pub async fn resolve_account_by_alias(
        &self,
        alias: &Alias,
        nonce: u32,
    ) -> Result<Option<AccountId>, ProviderError> {
        let account = self.provider.account_by_alias(alias, nonce).await?;

        match account {
            Some(account) if account.public_key.is_zero() => {
                warn!(%alias, nonce, "registry returned sentinel key for alias");
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

//! Shared test fixtures: an in-process rollup operator, a base-layer
//! chain stub, and a proof backend stub wired into a `RollupClient`.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use sha3::{Digest, Keccak256};

use veilup_client::{
    ChainClient, ChainError, ClientConfig, FeeQuote, ProofBackend, ProofData, ProofError,
    ProviderError, RollupClient, RollupProvider, RollupStatus, SettledTx, SettlementHandle,
    TxPublicInputs, TxReceipt, TxStatus,
};
use veilup_core::{
    derive_account_key, AccountId, AccountKey, Alias, AssetId, AssetValue, KeySigner,
    SettlementTier, Signature, Signer, TxType,
};

pub const ASSET: AssetId = AssetId(0);
pub const ASSET_B: AssetId = AssetId(1);
pub const ASSET_C: AssetId = AssetId(2);

/// Output rate of a mock bridge: output = deposit * num / den.
#[derive(Clone, Copy)]
pub struct BridgeRate {
    pub rate_a: (u128, u128),
    pub rate_b: Option<(u128, u128)>,
}

struct RollupInner {
    pending: Vec<(SettlementHandle, TxPublicInputs)>,
    settled: Vec<SettledTx>,
    statuses: HashMap<SettlementHandle, TxStatus>,
    aliases: HashMap<String, BTreeMap<u32, AccountId>>,
    fees: HashMap<(u32, TxType), FeeQuote>,
    bridge_rates: HashMap<(Address, u32), BridgeRate>,
    reject_next: Option<String>,
    fail_next_status: Option<String>,
}

/// In-process rollup operator. Submissions queue as pending until
/// `settle_all` batches them, which is when balances move.
pub struct MockRollup {
    inner: Mutex<RollupInner>,
    chain: Option<Arc<MockChain>>,
}

impl MockRollup {
    pub fn new(chain: Option<Arc<MockChain>>) -> Self {
        Self {
            inner: Mutex::new(RollupInner {
                pending: Vec::new(),
                settled: Vec::new(),
                statuses: HashMap::new(),
                aliases: HashMap::new(),
                fees: HashMap::new(),
                bridge_rates: HashMap::new(),
                reject_next: None,
                fail_next_status: None,
            }),
            chain,
        }
    }

    /// Same flat fee for every transaction type on `asset`.
    pub fn set_flat_fees(&self, asset: AssetId, next_rollup: u128, instant: u128) {
        let mut inner = self.inner.lock().unwrap();
        for tx_type in [
            TxType::Deposit,
            TxType::Transfer,
            TxType::Withdraw,
            TxType::DefiDeposit,
        ] {
            inner.fees.insert(
                (asset.0, tx_type),
                FeeQuote {
                    next_rollup: AssetValue::new(asset, next_rollup),
                    instant: AssetValue::new(asset, instant),
                },
            );
        }
    }

    pub fn set_bridge_rate(&self, bridge_address: Address, bridge_sub_id: u32, rate: BridgeRate) {
        self.inner
            .lock()
            .unwrap()
            .bridge_rates
            .insert((bridge_address, bridge_sub_id), rate);
    }

    pub fn reject_next_submission(&self, reason: impl Into<String>) {
        self.inner.lock().unwrap().reject_next = Some(reason.into());
    }

    /// Fail the next status poll with a transport error.
    pub fn fail_next_status_poll(&self, reason: impl Into<String>) {
        self.inner.lock().unwrap().fail_next_status = Some(reason.into());
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }

    pub fn settled_count(&self) -> usize {
        self.inner.lock().unwrap().settled.len()
    }

    /// Settle everything pending as one batch, in submission order.
    /// (Real operators decide their own ordering; tests must not rely
    /// on more than eventual settlement.)
    pub fn settle_all(&self) {
        let mut inner = self.inner.lock().unwrap();
        let pending: Vec<_> = inner.pending.drain(..).collect();

        for (handle, tx) in pending {
            let seq = inner.settled.len() as u64;

            let (output_value_a, output_value_b) = match (&tx.bridge, tx.tx_type) {
                (Some(bridge), TxType::DefiDeposit) => {
                    let rate = inner
                        .bridge_rates
                        .get(&(bridge.bridge_address, bridge.bridge_sub_id))
                        .copied()
                        .unwrap_or(BridgeRate {
                            rate_a: (1, 1),
                            rate_b: None,
                        });
                    let out_a = AssetValue::new(
                        bridge.output_asset_a,
                        tx.value.value * rate.rate_a.0 / rate.rate_a.1,
                    );
                    let out_b = bridge.output_asset_b.map(|asset| {
                        let (num, den) = rate.rate_b.unwrap_or((0, 1));
                        AssetValue::new(asset, tx.value.value * num / den)
                    });
                    (Some(out_a), out_b)
                }
                _ => (None, None),
            };

            if tx.tx_type == TxType::Withdraw {
                if let (Some(chain), Some(owner)) = (&self.chain, tx.public_owner) {
                    chain.credit(tx.value.asset_id, owner, tx.value.value);
                }
            }

            inner.statuses.insert(handle, TxStatus::Settled);
            inner.settled.push(SettledTx {
                seq,
                handle,
                inner: tx,
                output_value_a,
                output_value_b,
            });
        }
    }

    /// Background batch scheduler for tests exercising concurrent
    /// settlement awaits.
    pub fn spawn_auto_settle(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let rollup = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                rollup.settle_all();
            }
        })
    }
}

#[async_trait]
impl RollupProvider for MockRollup {
    async fn submit_proof(
        &self,
        proof: &ProofData,
        inputs: &TxPublicInputs,
        signature: &Signature,
    ) -> Result<SettlementHandle, ProviderError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(reason) = inner.reject_next.take() {
            return Err(ProviderError::Rejected(reason));
        }

        let mut hasher = Keccak256::new();
        hasher.update(&proof.payload);
        hasher.update(signature.as_bytes());
        let handle = SettlementHandle(B256::from(<[u8; 32]>::from(hasher.finalize())));

        inner.statuses.insert(handle, TxStatus::Pending);
        inner.pending.push((handle, inputs.clone()));
        Ok(handle)
    }

    async fn fee_quote(
        &self,
        asset_id: AssetId,
        tx_type: TxType,
    ) -> Result<FeeQuote, ProviderError> {
        self.inner
            .lock()
            .unwrap()
            .fees
            .get(&(asset_id.0, tx_type))
            .copied()
            .ok_or_else(|| {
                ProviderError::Transport(format!("no fee configured for {}", tx_type.name()))
            })
    }

    async fn latest_alias_nonce(&self, alias: &Alias) -> Result<u32, ProviderError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .aliases
            .get(alias.as_str())
            .and_then(|by_nonce| by_nonce.keys().next_back().copied())
            .unwrap_or(0))
    }

    async fn account_by_alias(
        &self,
        alias: &Alias,
        nonce: u32,
    ) -> Result<Option<AccountId>, ProviderError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .aliases
            .get(alias.as_str())
            .and_then(|by_nonce| by_nonce.get(&nonce))
            .copied())
    }

    async fn register_alias(
        &self,
        alias: &Alias,
        account: &AccountId,
    ) -> Result<(), ProviderError> {
        self.inner
            .lock()
            .unwrap()
            .aliases
            .entry(alias.as_str().to_string())
            .or_default()
            .insert(account.nonce, *account);
        Ok(())
    }

    async fn tx_status(&self, handle: &SettlementHandle) -> Result<TxStatus, ProviderError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(reason) = inner.fail_next_status.take() {
            return Err(ProviderError::Transport(reason));
        }

        Ok(inner.statuses.get(handle).copied().unwrap_or(TxStatus::Unknown))
    }

    async fn settled_txs(&self, from_seq: u64) -> Result<Vec<SettledTx>, ProviderError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .settled
            .iter()
            .filter(|tx| tx.seq >= from_seq)
            .cloned()
            .collect())
    }

    async fn status(&self) -> Result<RollupStatus, ProviderError> {
        Ok(RollupStatus {
            settled_seq: self.inner.lock().unwrap().settled.len() as u64,
        })
    }
}

struct ChainInner {
    balances: HashMap<(u32, Address), u128>,
    receipts: HashMap<B256, TxReceipt>,
    accounts: Vec<Address>,
    next_confirmations: u32,
    tx_counter: u64,
}

/// Base-layer chain stub with instant mining.
pub struct MockChain {
    inner: Mutex<ChainInner>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ChainInner {
                balances: HashMap::new(),
                receipts: HashMap::new(),
                accounts: Vec::new(),
                next_confirmations: 3,
                tx_counter: 0,
            }),
        }
    }

    pub fn fund(&self, asset: AssetId, address: Address, amount: u128) {
        let mut inner = self.inner.lock().unwrap();
        *inner.balances.entry((asset.0, address)).or_insert(0) += amount;
        if !inner.accounts.contains(&address) {
            inner.accounts.push(address);
        }
    }

    pub fn credit(&self, asset: AssetId, address: Address, amount: u128) {
        *self
            .inner
            .lock()
            .unwrap()
            .balances
            .entry((asset.0, address))
            .or_insert(0) += amount;
    }

    /// Confirmation depth stamped on subsequently mined transactions.
    pub fn set_next_confirmations(&self, confirmations: u32) {
        self.inner.lock().unwrap().next_confirmations = confirmations;
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(31337)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        Ok(self.inner.lock().unwrap().accounts.clone())
    }

    async fn public_balance(
        &self,
        asset_id: AssetId,
        address: Address,
    ) -> Result<u128, ChainError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .balances
            .get(&(asset_id.0, address))
            .copied()
            .unwrap_or(0))
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ChainError> {
        self.inner
            .lock()
            .unwrap()
            .receipts
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| ChainError::Transport(format!("unknown transaction {tx_hash}")))
    }

    async fn deposit_pending_funds(
        &self,
        asset_id: AssetId,
        total: u128,
        from: Address,
    ) -> Result<B256, ChainError> {
        let mut inner = self.inner.lock().unwrap();

        let balance = inner.balances.get(&(asset_id.0, from)).copied().unwrap_or(0);
        if balance < total {
            return Err(ChainError::InsufficientFunds {
                needed: total,
                available: balance,
            });
        }
        inner.balances.insert((asset_id.0, from), balance - total);

        inner.tx_counter += 1;
        let mut hasher = Keccak256::new();
        hasher.update(inner.tx_counter.to_be_bytes());
        let tx_hash = B256::from(<[u8; 32]>::from(hasher.finalize()));

        let receipt = TxReceipt {
            tx_hash,
            block_number: inner.tx_counter,
            confirmations: inner.next_confirmations,
        };
        inner.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }
}

/// Proof backend stub: payload is the serialized public inputs plus a
/// unique counter, so every proof (and thus every handle) is distinct.
pub struct MockProofBackend {
    counter: AtomicU64,
}

impl MockProofBackend {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ProofBackend for MockProofBackend {
    async fn create_proof(&self, inputs: &TxPublicInputs) -> Result<ProofData, ProofError> {
        let mut payload =
            serde_json::to_vec(inputs).map_err(|e| ProofError::Backend(e.to_string()))?;
        payload.extend_from_slice(
            &self
                .counter
                .fetch_add(1, Ordering::Relaxed)
                .to_be_bytes(),
        );
        Ok(ProofData { payload })
    }
}

/// One fully wired client plus handles to the mocks behind it.
pub struct TestEnv {
    pub rollup: Arc<MockRollup>,
    pub chain: Arc<MockChain>,
    pub client: RollupClient,
}

pub fn test_env() -> TestEnv {
    let chain = Arc::new(MockChain::new());
    let rollup = Arc::new(MockRollup::new(Some(chain.clone())));
    rollup.set_flat_fees(ASSET, 100_000, 500_000);

    let config = ClientConfig {
        poll_interval: Duration::from_millis(10),
        ..ClientConfig::default()
    };

    let client = RollupClient::new(
        rollup.clone() as Arc<dyn RollupProvider>,
        chain.clone() as Arc<dyn ChainClient>,
        Arc::new(MockProofBackend::new()),
        config,
    );

    TestEnv {
        rollup,
        chain,
        client,
    }
}

pub struct TestUser {
    pub key: AccountKey,
    pub signer: Arc<dyn Signer>,
    pub account: AccountId,
    pub address: Address,
}

/// Derive, register and fund a user. `tag` seeds the wallet signature,
/// so equal tags re-derive the same user.
pub async fn new_user(env: &TestEnv, tag: u8) -> TestUser {
    let key = derive_account_key(&[tag; 64], 0).expect("key derivation");
    env.client
        .add_user(&key, 0, false)
        .await
        .expect("add_user");

    let address = Address::repeat_byte(tag);
    env.chain.fund(ASSET, address, 1_000_000_000);

    TestUser {
        signer: Arc::new(KeySigner::new(key.clone())),
        account: key.account_id(),
        key,
        address,
    }
}

/// Run one deposit end to end: proof, funding, confirmation, sign,
/// send, batch settlement, settlement await, sync.
pub async fn deposit(env: &TestEnv, user: &TestUser, value: u128, tier: SettlementTier) {
    let quote = env
        .client
        .fee_schedule()
        .quote(ASSET, TxType::Deposit)
        .await
        .expect("fee quote");
    let fee = quote.for_tier(tier);

    let mut controller = env.client.create_deposit(
        user.signer.clone(),
        user.address,
        user.account,
        AssetValue::new(ASSET, value),
        fee,
        tier,
    );

    controller.create_proof().await.expect("create_proof");
    controller
        .deposit_funds_to_contract()
        .await
        .expect("funding");
    controller
        .await_funding_confirmation()
        .await
        .expect("funding confirmation");
    controller.sign().await.expect("sign");
    controller.send().await.expect("send");

    env.rollup.settle_all();
    controller
        .await_settlement(Duration::from_secs(5))
        .await
        .expect("settlement");
    env.client.sync().await.expect("sync");
}

/// Run one transfer end to end.
pub async fn transfer(
    env: &TestEnv,
    from: &TestUser,
    to: &TestUser,
    value: u128,
    tier: SettlementTier,
) -> u128 {
    let quote = env
        .client
        .fee_schedule()
        .quote(ASSET, TxType::Transfer)
        .await
        .expect("fee quote");
    let fee = quote.for_tier(tier);

    let mut controller = env.client.create_transfer(
        from.signer.clone(),
        from.account,
        to.account,
        AssetValue::new(ASSET, value),
        fee,
        tier,
    );

    controller.create_proof().await.expect("create_proof");
    controller.sign().await.expect("sign");
    controller.send().await.expect("send");

    env.rollup.settle_all();
    controller
        .await_settlement(Duration::from_secs(5))
        .await
        .expect("settlement");
    env.client.sync().await.expect("sync");

    fee.value
}

/// Run one withdrawal end to end. Returns the fee paid.
pub async fn withdraw(env: &TestEnv, user: &TestUser, value: u128, tier: SettlementTier) -> u128 {
    let quote = env
        .client
        .fee_schedule()
        .quote(ASSET, TxType::Withdraw)
        .await
        .expect("fee quote");
    let fee = quote.for_tier(tier);

    let mut controller = env.client.create_withdraw(
        user.signer.clone(),
        user.account,
        user.address,
        AssetValue::new(ASSET, value),
        fee,
        tier,
    );

    controller.create_proof().await.expect("create_proof");
    controller.sign().await.expect("sign");
    controller.send().await.expect("send");

    env.rollup.settle_all();
    controller
        .await_settlement(Duration::from_secs(5))
        .await
        .expect("settlement");
    env.client.sync().await.expect("sync");

    fee.value
}

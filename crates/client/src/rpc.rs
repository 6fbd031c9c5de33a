//! JSON-RPC clients for the rollup operator and the base-layer node
//!
//! Both collaborators speak JSON-RPC 2.0 over HTTP. These clients are
//! thin: encode the request, surface operator errors, decode the result.

use std::time::Duration;

use alloy_primitives::{hex, Address, B256};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};

use veilup_core::{AccountId, Alias, AssetId, Signature, TxType};

use crate::chain::{ChainClient, ChainError, TxReceipt};
use crate::fees::FeeQuote;
use crate::proofs::{ProofData, TxPublicInputs};
use crate::provider::{
    ProviderError, RollupProvider, RollupStatus, SettledTx, SettlementHandle, TxStatus,
};

async fn rpc_call(
    http: &reqwest::Client,
    url: &str,
    method: &str,
    params: Value,
) -> Result<Result<Value, String>, String> {
    let request = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
    });

    let response = http
        .post(url)
        .json(&request)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let body: Value = response.json().await.map_err(|e| e.to_string())?;

    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Ok(Err(message));
    }

    let result = body
        .get("result")
        .cloned()
        .ok_or_else(|| "no result in response".to_string())?;
    Ok(Ok(result))
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// JSON-RPC client for the rollup operator endpoint.
pub struct RollupRpcClient {
    pub rollup_url: String,
    http: reqwest::Client,
}

impl RollupRpcClient {
    pub fn new(rollup_url: impl Into<String>) -> Self {
        Self {
            rollup_url: rollup_url.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        rpc_call(&self.http, &self.rollup_url, method, params)
            .await
            .map_err(ProviderError::Transport)?
            .map_err(ProviderError::Transport)
    }
}

#[async_trait]
impl RollupProvider for RollupRpcClient {
    async fn submit_proof(
        &self,
        proof: &ProofData,
        inputs: &TxPublicInputs,
        signature: &Signature,
    ) -> Result<SettlementHandle, ProviderError> {
        let params = json!([{
            "proof": format!("0x{}", hex::encode(&proof.payload)),
            "inputs": inputs,
            "signature": format!("0x{}", hex::encode(signature.as_bytes())),
        }]);

        // An RPC-level error on submission is an operator rejection, not
        // a transport failure.
        let result = rpc_call(&self.http, &self.rollup_url, "veilup_submitProof", params)
            .await
            .map_err(ProviderError::Transport)?
            .map_err(ProviderError::Rejected)?;

        let handle: B256 = decode(result).map_err(ProviderError::Transport)?;
        Ok(SettlementHandle(handle))
    }

    async fn fee_quote(
        &self,
        asset_id: AssetId,
        tx_type: TxType,
    ) -> Result<FeeQuote, ProviderError> {
        let result = self
            .call("veilup_txFees", json!([asset_id.0, tx_type.name()]))
            .await?;
        decode(result).map_err(ProviderError::Transport)
    }

    async fn latest_alias_nonce(&self, alias: &Alias) -> Result<u32, ProviderError> {
        let result = self
            .call("veilup_latestAliasNonce", json!([alias.as_str()]))
            .await?;
        // Absent alias comes back as null, meaning nonce 0
        if result.is_null() {
            return Ok(0);
        }
        decode(result).map_err(ProviderError::Transport)
    }

    async fn account_by_alias(
        &self,
        alias: &Alias,
        nonce: u32,
    ) -> Result<Option<AccountId>, ProviderError> {
        let result = self
            .call("veilup_accountByAlias", json!([alias.as_str(), nonce]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        decode(result).map(Some).map_err(ProviderError::Transport)
    }

    async fn register_alias(
        &self,
        alias: &Alias,
        account: &AccountId,
    ) -> Result<(), ProviderError> {
        self.call("veilup_registerAlias", json!([alias.as_str(), account]))
            .await?;
        Ok(())
    }

    async fn tx_status(&self, handle: &SettlementHandle) -> Result<TxStatus, ProviderError> {
        let result = self.call("veilup_txStatus", json!([handle.0])).await?;
        decode(result).map_err(ProviderError::Transport)
    }

    async fn settled_txs(&self, from_seq: u64) -> Result<Vec<SettledTx>, ProviderError> {
        let result = self.call("veilup_settledTxs", json!([from_seq])).await?;
        decode(result).map_err(ProviderError::Transport)
    }

    async fn status(&self) -> Result<RollupStatus, ProviderError> {
        let result = self.call("veilup_status", json!([])).await?;
        decode(result).map_err(ProviderError::Transport)
    }
}

/// JSON-RPC client for the base-layer node (plus the rollup deployment's
/// chain-side helper methods for balances and custody funding).
pub struct HttpChainClient {
    pub chain_url: String,
    http: reqwest::Client,
    /// Interval between receipt polls.
    poll_interval: Duration,
    /// Bound on waiting for a receipt to appear.
    receipt_timeout: Duration,
}

impl HttpChainClient {
    pub fn new(chain_url: impl Into<String>) -> Self {
        Self {
            chain_url: chain_url.into(),
            http: reqwest::Client::new(),
            poll_interval: Duration::from_millis(1000),
            receipt_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_polling(mut self, poll_interval: Duration, receipt_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.receipt_timeout = receipt_timeout;
        self
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        rpc_call(&self.http, &self.chain_url, method, params)
            .await
            .map_err(ChainError::Transport)?
            .map_err(ChainError::Transport)
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        let result = self.call("eth_chainId", json!([])).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ChainError::Transport("chain id is not a string".into()))?;
        u64::from_str_radix(raw.trim_start_matches("0x"), 16)
            .map_err(|e| ChainError::Transport(format!("invalid chain id: {e}")))
    }

    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        let result = self.call("eth_accounts", json!([])).await?;
        decode(result).map_err(ChainError::Transport)
    }

    async fn public_balance(
        &self,
        asset_id: AssetId,
        address: Address,
    ) -> Result<u128, ChainError> {
        let result = self
            .call("veilup_publicBalance", json!([asset_id.0, address]))
            .await?;
        decode(result).map_err(ChainError::Transport)
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ChainError> {
        let deadline = Instant::now() + self.receipt_timeout;

        loop {
            let result = self
                .call("veilup_transactionReceipt", json!([tx_hash]))
                .await?;
            if !result.is_null() {
                return decode(result).map_err(ChainError::Transport);
            }

            if Instant::now() + self.poll_interval > deadline {
                return Err(ChainError::ReceiptTimeout(tx_hash));
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn deposit_pending_funds(
        &self,
        asset_id: AssetId,
        total: u128,
        from: Address,
    ) -> Result<B256, ChainError> {
        let result = self
            .call(
                "veilup_depositPendingFunds",
                json!([asset_id.0, total.to_string(), from]),
            )
            .await?;
        decode(result).map_err(ChainError::Transport)
    }
}

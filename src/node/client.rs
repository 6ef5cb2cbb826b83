//! HTTP RPC client for the chain node.
//!
//! This module provides an async client for the node's user-facing RPC
//! endpoints. Every method posts a JSON body and unwraps the node's
//! `{"result": ..., "error": ...}` envelope. Not-found responses are part of
//! normal operation (a block may not exist yet, a receipt may not be visible
//! yet) and surface as `Ok(None)` rather than errors.

use super::types::{AccountState, Block, NodeError, Transaction};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Read access to the chain node, as consumed by the sync core.
///
/// All five calls may fail transiently; the sync core never retries them and
/// leaves the retry cadence to its caller.
#[async_trait::async_trait]
pub trait NodeApi: Send + Sync {
    /// Fetch a block by hash, optionally with its full transaction list.
    async fn get_block_by_hash(
        &self,
        hash: &str,
        include_txs: bool,
    ) -> Result<Option<Block>, NodeError>;

    /// Fetch a block by height, always with its full transaction list.
    async fn get_block_by_height(&self, height: u64) -> Result<Option<Block>, NodeError>;

    /// Fetch the ordered validator set active at the given height.
    async fn get_dynasty(&self, height: u64) -> Result<Vec<String>, NodeError>;

    /// Fetch the receipt of a transaction, mined or pending.
    async fn get_transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<Transaction>, NodeError>;

    /// Fetch the on-chain state of an address.
    async fn get_account_state(&self, address: &str) -> Result<Option<AccountState>, NodeError>;
}

/// Chain node RPC client
#[derive(Clone)]
pub struct HttpNodeClient {
    /// The underlying HTTP client for RPC calls.
    http_client: Client,
    /// The base URL of the node's RPC endpoint.
    node_url: String,
}

impl HttpNodeClient {
    /// Create a new node client for the given base URL.
    pub fn new(node_url: String) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            node_url,
        }
    }

    /// Fetch the latest irreversible block, with transactions. Used by the
    /// head-follow driver, not by the sync core itself.
    pub async fn latest_irreversible_block(&self) -> Result<Option<Block>, NodeError> {
        self.call("/v1/user/lib", json!({})).await
    }

    /// Execute an RPC call and unwrap the node's response envelope.
    ///
    /// HTTP 404 and "not found"-class RPC errors map to `Ok(None)`; any
    /// other error status or envelope error surfaces as `NodeError`.
    async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Option<T>, NodeError> {
        let url = format!("{}{}", self.node_url, path);
        debug!("node rpc call: {} {}", url, body);

        let response = self.http_client.post(&url).json(&body).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(NodeError::RpcError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let envelope: serde_json::Value = response.json().await?;

        if let Some(error) = envelope.get("error").and_then(|e| e.as_str()) {
            if is_not_found(error) {
                return Ok(None);
            }
            return Err(NodeError::RpcError(error.to_string()));
        }

        match envelope.get("result") {
            Some(result) if !result.is_null() => {
                let value = serde_json::from_value(result.clone())?;
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }
}

/// The node reports missing records as RPC errors rather than a dedicated
/// status; recognize the messages it uses.
fn is_not_found(error: &str) -> bool {
    let lower = error.to_ascii_lowercase();
    lower.contains("not found") || lower.contains("does not exist") || lower.contains("not exist")
}

#[async_trait::async_trait]
impl NodeApi for HttpNodeClient {
    async fn get_block_by_hash(
        &self,
        hash: &str,
        include_txs: bool,
    ) -> Result<Option<Block>, NodeError> {
        self.call(
            "/v1/user/getBlockByHash",
            json!({ "hash": hash, "full_fill_transaction": include_txs }),
        )
        .await
    }

    async fn get_block_by_height(&self, height: u64) -> Result<Option<Block>, NodeError> {
        self.call(
            "/v1/user/getBlockByHeight",
            json!({ "height": height, "full_fill_transaction": true }),
        )
        .await
    }

    async fn get_dynasty(&self, height: u64) -> Result<Vec<String>, NodeError> {
        #[derive(serde::Deserialize)]
        struct Dynasty {
            #[serde(default)]
            miners: Vec<String>,
        }

        let dynasty: Option<Dynasty> = self
            .call("/v1/user/dynasty", json!({ "height": height }))
            .await?;
        Ok(dynasty.map(|d| d.miners).unwrap_or_default())
    }

    async fn get_transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<Transaction>, NodeError> {
        self.call("/v1/user/getTransactionReceipt", json!({ "hash": hash }))
            .await
    }

    async fn get_account_state(&self, address: &str) -> Result<Option<AccountState>, NodeError> {
        self.call("/v1/user/accountstate", json!({ "address": address }))
            .await
    }
}

//! Wire types for the chain node HTTP RPC.

use serde::{Deserialize, Serialize};

/// A block as returned by the node, optionally carrying its transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// The block hash.
    pub hash: String,
    /// The block height.
    #[serde(deserialize_with = "de_u64_from_string_or_number")]
    pub height: u64,
    /// Hash of the parent block.
    pub parent_hash: String,
    /// Block timestamp in unix seconds.
    #[serde(deserialize_with = "de_i64_from_string_or_number")]
    pub timestamp: i64,
    /// Address of the block miner.
    pub miner: String,
    /// Address receiving the block reward.
    pub coinbase: String,
    /// Transactions contained in the block, in execution order.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// A transaction as returned by the node, either inside a block or as a
/// mempool receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction hash.
    pub hash: String,
    /// Sender address.
    pub from: String,
    /// Receiver address. For deployments this is the sender itself; the
    /// reported contract address carries the deployed contract.
    pub to: String,
    /// Execution status as reported by the node (0 = failed, 1 = success,
    /// 2 = pending).
    #[serde(default)]
    pub status: i32,
    /// Transferred value as a decimal string.
    pub value: String,
    /// Sender nonce.
    #[serde(deserialize_with = "de_u64_from_string_or_number")]
    pub nonce: u64,
    /// Transaction timestamp in unix seconds.
    #[serde(default, deserialize_with = "de_i64_from_string_or_number")]
    pub timestamp: i64,
    /// Declared transaction type (`binary`, `call`, `deploy`).
    #[serde(rename = "type")]
    pub tx_type: String,
    /// Raw payload as received from the node (base64 for call payloads).
    #[serde(default)]
    pub data: Option<String>,
    /// Gas price as a decimal string.
    #[serde(default)]
    pub gas_price: String,
    /// Gas limit as a decimal string.
    #[serde(default)]
    pub gas_limit: String,
    /// Gas actually used, absent for pending transactions.
    #[serde(default)]
    pub gas_used: Option<String>,
    /// Deployed contract address, absent unless this is a deployment.
    #[serde(default)]
    pub contract_address: Option<String>,
    /// Execution error text, absent on success.
    #[serde(default)]
    pub execute_error: Option<String>,
}

/// Account state (balance and nonce) for an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountState {
    /// Current balance as a decimal string. May be empty when the node has
    /// no balance to report.
    #[serde(default)]
    pub balance: String,
    /// Current nonce as a decimal string.
    #[serde(default)]
    pub nonce: String,
}

/// Error types for node RPC operations
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("RPC error: {0}")]
    RpcError(String),
}

/// Accept heights/nonces serialized either as JSON numbers or as strings,
/// since node builds differ on this.
fn de_u64_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom("expected unsigned integer")),
        serde_json::Value::String(s) => s.parse().map_err(D::Error::custom),
        other => Err(D::Error::custom(format!(
            "expected number or string, got {other}"
        ))),
    }
}

fn de_i64_from_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom("expected integer")),
        serde_json::Value::String(s) => s.parse().map_err(D::Error::custom),
        other => Err(D::Error::custom(format!(
            "expected number or string, got {other}"
        ))),
    }
}

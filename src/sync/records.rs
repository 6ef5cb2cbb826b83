//! Stored entities maintained by the sync core.
//!
//! These are the normalized records the orchestrator writes into the record
//! stores. They are the storage-boundary shape: fields the node reports as
//! absent (`contract_address`, `execute_error`, payload data) are flattened
//! to the canonical empty string here, never to null.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A synced block record.
///
/// At most one finalized record may exist per height; tentative records may
/// be superseded when the height reaches finality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Block height, the primary identity.
    pub height: u64,
    /// Block hash.
    pub hash: String,
    /// Hash of the parent block.
    pub parent_hash: String,
    /// Block timestamp.
    pub timestamp: DateTime<Utc>,
    /// Address of the block miner.
    pub miner: String,
    /// Address receiving the block reward.
    pub coinbase: String,
    /// Whether this record comes from an irreversible (library) block.
    pub finality: bool,
    /// When this record was written.
    pub created_at: DateTime<Utc>,
}

/// A synced transaction record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    /// Transaction hash, unique once finalized.
    pub hash: String,
    /// Height of the containing block.
    pub block_height: u64,
    /// Hash of the containing block.
    pub block_hash: String,
    /// 1-based position within the containing block.
    pub tx_seq: u32,
    /// Sender address.
    pub from: String,
    /// Receiver address.
    pub to: String,
    /// Execution status as reported by the node.
    pub status: i32,
    /// Transferred value as a decimal string.
    pub value: String,
    /// Sender nonce.
    pub nonce: u64,
    /// Timestamp inherited from the containing block.
    pub timestamp: DateTime<Utc>,
    /// Declared transaction type.
    pub tx_type: String,
    /// Deployed contract address, empty string when not a deployment.
    pub contract_address: String,
    /// Payload data. Stored byte-for-byte as received, except for genesis
    /// plain transfers which are decoded to text.
    pub data: String,
    /// Gas price as a decimal string.
    pub gas_price: String,
    /// Gas limit as a decimal string.
    pub gas_limit: String,
    /// Gas used as a decimal string, empty when unreported.
    pub gas_used: String,
    /// Execution error text, empty string on success.
    pub execute_error: String,
    /// When this record was written.
    pub created_at: DateTime<Utc>,
}

/// A transaction observed in the mempool before block inclusion.
///
/// Same shape as `TxRecord` minus the block-positional fields. Removed when
/// the same hash is later seen inside a synced block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTxRecord {
    /// Transaction hash.
    pub hash: String,
    /// Sender address.
    pub from: String,
    /// Receiver address.
    pub to: String,
    /// Transferred value as a decimal string.
    pub value: String,
    /// Sender nonce.
    pub nonce: u64,
    /// Timestamp reported with the receipt.
    pub timestamp: DateTime<Utc>,
    /// Declared transaction type.
    pub tx_type: String,
    /// Deployed contract address, empty string when not a deployment.
    pub contract_address: String,
    /// Raw payload as received.
    pub data: String,
    /// Gas price as a decimal string.
    pub gas_price: String,
    /// Gas limit as a decimal string.
    pub gas_limit: String,
    /// When this record was written.
    pub created_at: DateTime<Utc>,
}

/// Classification of a known address. Fixed at first discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressKind {
    /// An externally controlled account.
    Normal,
    /// A deployed contract.
    Contract,
}

/// A known address with its derived state.
///
/// The only entity with cross-block lifetime: created once, refreshed many
/// times. Balance and nonce may be stale by up to the refresh window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Address hash, the identity.
    pub hash: String,
    /// Address classification, never changed after first discovery.
    pub kind: AddressKind,
    /// Current balance as a decimal string.
    pub balance: String,
    /// Current nonce.
    pub nonce: u64,
    /// When balance and nonce were last refreshed from the node.
    pub updated_at: DateTime<Utc>,
}

/// The validator set active at a block height.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynastyRecord {
    /// Block height the set applies to.
    pub block_height: u64,
    /// Ordered validator addresses.
    pub validators: Vec<String>,
}

/// Bookkeeping marking a height as finalized and fully synced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationRecord {
    /// The confirmed block height.
    pub block_height: u64,
    /// Count of transactions that synced successfully.
    pub tx_count: u64,
    /// When the height was confirmed.
    pub confirmed_at: DateTime<Utc>,
}

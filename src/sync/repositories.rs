//! Record store boundary for the sync core.
//!
//! The orchestrator owns the write path to every store defined here; no
//! other component mutates these records. Each trait is the minimal CRUD
//! contract the sync core needs — existing-record lookups are the primary
//! read pattern, broader querying belongs to the presentation layer and is
//! out of scope.
//!
//! The in-memory implementations back the wiring driver and the tests. They
//! provide the atomicity the core relies on (replace-at-height and
//! insert-if-absent are single operations under one lock); a database-backed
//! implementation must do the same.

use super::records::{
    AddressRecord, BlockRecord, ConfirmationRecord, DynastyRecord, PendingTxRecord, TxRecord,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Errors surfaced by record store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Store for block records.
#[async_trait::async_trait]
pub trait BlockStore: Send + Sync {
    /// Insert a tentative block record. Duplicates across re-sync attempts
    /// are accepted at this stage.
    async fn add(&self, block: BlockRecord) -> Result<(), StoreError>;

    /// Replace any record at the block's height. Finalized data always wins
    /// over tentative.
    async fn replace(&self, block: BlockRecord) -> Result<(), StoreError>;

    /// Look up the stored record for a height.
    async fn get_by_height(&self, height: u64) -> Result<Option<BlockRecord>, StoreError>;
}

/// Store for mined transaction records and the pending pool.
#[async_trait::async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert a transaction record unconditionally.
    async fn add(&self, tx: TxRecord) -> Result<(), StoreError>;

    /// Delete every transaction stored at the given block height.
    async fn delete_by_block_height(&self, height: u64) -> Result<(), StoreError>;

    /// Fetch the transactions stored at the given block height.
    async fn find_by_block_height(&self, height: u64) -> Result<Vec<TxRecord>, StoreError>;

    /// Look up a pending-pool record by hash.
    async fn get_pending(&self, hash: &str) -> Result<Option<PendingTxRecord>, StoreError>;

    /// Insert a pending-pool record.
    async fn add_pending(&self, tx: PendingTxRecord) -> Result<(), StoreError>;

    /// Remove a pending-pool record, a no-op when absent.
    async fn delete_pending(&self, hash: &str) -> Result<(), StoreError>;
}

/// Directory of known addresses and their derived state.
#[async_trait::async_trait]
pub trait AddressStore: Send + Sync {
    /// Look up an address by hash.
    async fn get(&self, hash: &str) -> Result<Option<AddressRecord>, StoreError>;

    /// Insert a newly discovered address.
    async fn add(&self, address: AddressRecord) -> Result<(), StoreError>;

    /// Update balance, nonce and refresh time for a known address.
    async fn update_balance(
        &self,
        hash: &str,
        balance: String,
        nonce: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Append-only record of validator sets per height.
#[async_trait::async_trait]
pub trait DynastyStore: Send + Sync {
    /// Record the validator set active at a height.
    async fn record(&self, dynasty: DynastyRecord) -> Result<(), StoreError>;
}

/// Bookkeeping of fully synced, finalized heights.
#[async_trait::async_trait]
pub trait ConfirmationStore: Send + Sync {
    /// Mark a height as confirmed with its synced transaction count.
    async fn set_confirmed(&self, height: u64, tx_count: u64) -> Result<(), StoreError>;

    /// Look up the confirmation record for a height.
    async fn get_confirmed(
        &self,
        height: u64,
    ) -> Result<Option<ConfirmationRecord>, StoreError>;
}

/// In-memory implementation of `BlockStore`.
#[derive(Default)]
pub struct InMemoryBlockStore {
    blocks: Mutex<Vec<BlockRecord>>,
}

#[async_trait::async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn add(&self, block: BlockRecord) -> Result<(), StoreError> {
        self.blocks.lock().unwrap().push(block);
        Ok(())
    }

    async fn replace(&self, block: BlockRecord) -> Result<(), StoreError> {
        let mut blocks = self.blocks.lock().unwrap();
        blocks.retain(|b| b.height != block.height);
        blocks.push(block);
        Ok(())
    }

    async fn get_by_height(&self, height: u64) -> Result<Option<BlockRecord>, StoreError> {
        let blocks = self.blocks.lock().unwrap();
        Ok(blocks.iter().find(|b| b.height == height).cloned())
    }
}

/// In-memory implementation of `TransactionStore`.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    transactions: Mutex<Vec<TxRecord>>,
    pending: Mutex<HashMap<String, PendingTxRecord>>,
}

#[async_trait::async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn add(&self, tx: TxRecord) -> Result<(), StoreError> {
        self.transactions.lock().unwrap().push(tx);
        Ok(())
    }

    async fn delete_by_block_height(&self, height: u64) -> Result<(), StoreError> {
        self.transactions
            .lock()
            .unwrap()
            .retain(|tx| tx.block_height != height);
        Ok(())
    }

    async fn find_by_block_height(&self, height: u64) -> Result<Vec<TxRecord>, StoreError> {
        let transactions = self.transactions.lock().unwrap();
        Ok(transactions
            .iter()
            .filter(|tx| tx.block_height == height)
            .cloned()
            .collect())
    }

    async fn get_pending(&self, hash: &str) -> Result<Option<PendingTxRecord>, StoreError> {
        Ok(self.pending.lock().unwrap().get(hash).cloned())
    }

    async fn add_pending(&self, tx: PendingTxRecord) -> Result<(), StoreError> {
        self.pending.lock().unwrap().insert(tx.hash.clone(), tx);
        Ok(())
    }

    async fn delete_pending(&self, hash: &str) -> Result<(), StoreError> {
        self.pending.lock().unwrap().remove(hash);
        Ok(())
    }
}

/// In-memory implementation of `AddressStore`.
#[derive(Default)]
pub struct InMemoryAddressStore {
    addresses: Mutex<HashMap<String, AddressRecord>>,
}

#[async_trait::async_trait]
impl AddressStore for InMemoryAddressStore {
    async fn get(&self, hash: &str) -> Result<Option<AddressRecord>, StoreError> {
        Ok(self.addresses.lock().unwrap().get(hash).cloned())
    }

    async fn add(&self, address: AddressRecord) -> Result<(), StoreError> {
        // Insert-if-absent keeps the first classification under concurrent
        // discovery.
        self.addresses
            .lock()
            .unwrap()
            .entry(address.hash.clone())
            .or_insert(address);
        Ok(())
    }

    async fn update_balance(
        &self,
        hash: &str,
        balance: String,
        nonce: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(address) = self.addresses.lock().unwrap().get_mut(hash) {
            address.balance = balance;
            address.nonce = nonce;
            address.updated_at = updated_at;
        }
        Ok(())
    }
}

/// In-memory implementation of `DynastyStore`.
#[derive(Default)]
pub struct InMemoryDynastyStore {
    dynasties: Mutex<Vec<DynastyRecord>>,
}

#[async_trait::async_trait]
impl DynastyStore for InMemoryDynastyStore {
    async fn record(&self, dynasty: DynastyRecord) -> Result<(), StoreError> {
        self.dynasties.lock().unwrap().push(dynasty);
        Ok(())
    }
}

/// In-memory implementation of `ConfirmationStore`.
#[derive(Default)]
pub struct InMemoryConfirmationStore {
    confirmations: Mutex<HashMap<u64, ConfirmationRecord>>,
}

#[async_trait::async_trait]
impl ConfirmationStore for InMemoryConfirmationStore {
    async fn set_confirmed(&self, height: u64, tx_count: u64) -> Result<(), StoreError> {
        self.confirmations.lock().unwrap().insert(
            height,
            ConfirmationRecord {
                block_height: height,
                tx_count,
                confirmed_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_confirmed(
        &self,
        height: u64,
    ) -> Result<Option<ConfirmationRecord>, StoreError> {
        Ok(self.confirmations.lock().unwrap().get(&height).cloned())
    }
}

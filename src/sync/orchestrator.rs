//! Sync orchestrator and integration point for the explorer sync core.
//!
//! This module defines the `SyncOrchestrator`, which drives the whole flow of
//! pulling chain data into the record stores: fetching a block from the node,
//! discovering the addresses it touches, storing the block and its
//! transactions, recording the dynasty active at that height, and keeping the
//! confirmation bookkeeping up to date. It also handles pending-transaction
//! intake and on-demand balance refresh, which arrive independently of block
//! sync.
//!
//! The orchestrator owns the write path to every store. It carries no
//! internal retry, locking or backoff: external schedulers invoke the public
//! entry points, every upstream not-found is "nothing to do yet", and every
//! failure is logged and left for the next invocation to repair. Within a
//! block, per-transaction failures are isolated so one malformed transaction
//! cannot block its siblings or the block record itself.

use crate::node::{Block, NodeApi, Transaction};
use crate::sync::classifier::{TxKind, decode_genesis_payload, extract_transfer_recipient};
use crate::sync::records::{
    AddressKind, AddressRecord, BlockRecord, DynastyRecord, PendingTxRecord, TxRecord,
};
use crate::sync::repositories::{
    AddressStore, BlockStore, ConfirmationStore, DynastyStore, TransactionStore,
};
use crate::sync::types::SyncError;

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Height of the genesis block, whose plain-transfer payloads are stored
/// decoded.
const GENESIS_HEIGHT: u64 = 1;

/// Main sync orchestrator coordinating node reads and store writes.
///
/// All collaborators are injected at construction; the orchestrator holds
/// shared references so concurrent schedulers can drive it for different
/// blocks without in-process coordination.
pub struct SyncOrchestrator {
    node: Arc<dyn NodeApi>,
    blocks: Arc<dyn BlockStore>,
    transactions: Arc<dyn TransactionStore>,
    addresses: Arc<dyn AddressStore>,
    dynasties: Arc<dyn DynastyStore>,
    confirmations: Arc<dyn ConfirmationStore>,
}

impl SyncOrchestrator {
    /// Create a new orchestrator over the given node client and stores.
    pub fn new(
        node: Arc<dyn NodeApi>,
        blocks: Arc<dyn BlockStore>,
        transactions: Arc<dyn TransactionStore>,
        addresses: Arc<dyn AddressStore>,
        dynasties: Arc<dyn DynastyStore>,
        confirmations: Arc<dyn ConfirmationStore>,
    ) -> Self {
        Self {
            node,
            blocks,
            transactions,
            addresses,
            dynasties,
            confirmations,
        }
    }

    /// Fetch a block by hash and sync it.
    ///
    /// A block the node does not know yet is not an error; any failure is
    /// logged and swallowed, leaving retry cadence to the caller.
    pub async fn sync_block_by_hash(&self, hash: &str, is_lib: bool) {
        match self.node.get_block_by_hash(hash, true).await {
            Ok(Some(block)) => {
                info!("got block by hash {}", block.hash);
                if let Err(e) = self.sync_block(&block, is_lib).await {
                    error!("failed to sync block {}: {}", block.hash, e);
                }
            }
            Ok(None) => warn!("block with hash {} not found", hash),
            Err(e) => error!("no block with hash {} yet: {}", hash, e),
        }
    }

    /// Fetch a block by height and sync it.
    pub async fn sync_block_by_height(&self, height: u64, is_lib: bool) {
        match self.node.get_block_by_height(height).await {
            Ok(Some(block)) => {
                if let Err(e) = self.sync_block(&block, is_lib).await {
                    error!("failed to sync block at height {}: {}", height, e);
                }
            }
            Ok(None) => warn!("block with height {} not found", height),
            Err(e) => error!("no block at height {} yet: {}", height, e),
        }
    }

    /// Sync one fetched block: addresses, block record, transactions,
    /// dynasty, confirmation.
    async fn sync_block(&self, block: &Block, is_lib: bool) -> Result<(), SyncError> {
        self.sync_address(&block.miner, AddressKind::Normal).await;
        self.sync_address(&block.coinbase, AddressKind::Normal)
            .await;

        let record = BlockRecord {
            height: block.height,
            hash: block.hash.clone(),
            parent_hash: block.parent_hash.clone(),
            timestamp: chain_time(block.timestamp),
            miner: block.miner.clone(),
            coinbase: block.coinbase.clone(),
            finality: is_lib,
            created_at: Utc::now(),
        };
        if is_lib {
            // Finalized data always wins over whatever tentative record the
            // height already holds.
            self.blocks.replace(record).await?;
        } else {
            self.blocks.add(record).await?;
        }

        if is_lib {
            // Clear tentative transactions before re-syncing the finalized
            // set, so a re-run nets out to exactly one set per height.
            self.transactions
                .delete_by_block_height(block.height)
                .await?;
        }

        let mut synced: u64 = 0;
        for (i, tx) in block.transactions.iter().enumerate() {
            let seq = (i + 1) as u32;
            match self.sync_tx(tx, block, seq).await {
                Ok(()) => synced += 1,
                Err(e) => error!(
                    "failed to sync tx {} in block {}: {}",
                    tx.hash, block.height, e
                ),
            }
        }

        let validators = self.node.get_dynasty(block.height).await?;
        self.dynasties
            .record(DynastyRecord {
                block_height: block.height,
                validators,
            })
            .await?;

        // A finalized block whose transactions all synced cleanly can be
        // confirmed directly; anything less is left for a later re-run.
        let can_be_confirmed = is_lib && synced == block.transactions.len() as u64;
        if can_be_confirmed {
            self.confirmations
                .set_confirmed(block.height, synced)
                .await?;
        }

        Ok(())
    }

    /// Sync one transaction of a block at the given 1-based sequence.
    async fn sync_tx(&self, tx: &Transaction, block: &Block, seq: u32) -> Result<(), SyncError> {
        self.sync_address(&tx.from, AddressKind::Normal).await;

        let kind = TxKind::parse(&tx.tx_type);
        self.discover_counterparties(kind, tx).await;

        // The transaction graduates from the pending pool once it is seen
        // inside a block.
        if self.transactions.get_pending(&tx.hash).await?.is_some() {
            self.transactions.delete_pending(&tx.hash).await?;
        }

        let raw_data = tx.data.clone().unwrap_or_default();
        let data = if block.height == GENESIS_HEIGHT {
            decode_genesis_payload(kind, &raw_data)
        } else {
            raw_data
        };

        let record = TxRecord {
            hash: tx.hash.clone(),
            block_height: block.height,
            block_hash: block.hash.clone(),
            tx_seq: seq,
            from: tx.from.clone(),
            to: tx.to.clone(),
            status: tx.status,
            value: tx.value.clone(),
            nonce: tx.nonce,
            timestamp: chain_time(block.timestamp),
            tx_type: tx.tx_type.clone(),
            contract_address: tx.contract_address.clone().unwrap_or_default(),
            data,
            gas_price: tx.gas_price.clone(),
            gas_limit: tx.gas_limit.clone(),
            gas_used: tx.gas_used.clone().unwrap_or_default(),
            execute_error: tx.execute_error.clone().unwrap_or_default(),
            created_at: Utc::now(),
        };
        self.transactions.add(record).await?;
        Ok(())
    }

    /// Discover the addresses a transaction touches beyond its sender,
    /// according to its kind.
    async fn discover_counterparties(&self, kind: TxKind, tx: &Transaction) {
        match kind {
            TxKind::Transfer => {
                self.sync_address(&tx.to, AddressKind::Normal).await;
            }
            TxKind::Call => {
                self.sync_address(&tx.to, AddressKind::Contract).await;
                if let Some(recipient) =
                    tx.data.as_deref().and_then(extract_transfer_recipient)
                {
                    self.sync_address(&recipient, AddressKind::Normal).await;
                }
            }
            TxKind::Deploy => {
                if let Some(contract) = tx.contract_address.as_deref() {
                    self.sync_address(contract, AddressKind::Contract).await;
                }
            }
            TxKind::Unknown => {}
        }
    }

    /// Intake a transaction observed in the node's mempool.
    ///
    /// Idempotent: a hash already pending is logged and left untouched, and
    /// a receipt the node cannot produce yet is simply not ready.
    pub async fn sync_pending_tx(&self, hash: &str) {
        if hash.is_empty() {
            return;
        }
        if let Err(e) = self.try_sync_pending_tx(hash).await {
            error!("failed to sync pending tx {}: {}", hash, e);
        }
    }

    async fn try_sync_pending_tx(&self, hash: &str) -> Result<(), SyncError> {
        if self.transactions.get_pending(hash).await?.is_some() {
            warn!("duplicate pending transaction {}", hash);
            return Ok(());
        }

        let Some(tx) = self.node.get_transaction_receipt(hash).await? else {
            warn!("pending tx with hash {} not ready", hash);
            return Ok(());
        };

        self.sync_address(&tx.from, AddressKind::Normal).await;
        let kind = TxKind::parse(&tx.tx_type);
        self.discover_counterparties(kind, &tx).await;

        info!("got pending tx by hash {}", hash);
        let record = PendingTxRecord {
            hash: hash.to_string(),
            from: tx.from.clone(),
            to: tx.to.clone(),
            value: tx.value.clone(),
            nonce: tx.nonce,
            timestamp: chain_time(tx.timestamp),
            tx_type: tx.tx_type.clone(),
            contract_address: tx.contract_address.clone().unwrap_or_default(),
            data: tx.data.clone().unwrap_or_default(),
            gas_price: tx.gas_price.clone(),
            gas_limit: tx.gas_limit.clone(),
            created_at: Utc::now(),
        };
        self.transactions.add_pending(record).await?;
        Ok(())
    }

    /// Drop a pending-pool record, a no-op when absent or on empty input.
    pub async fn delete_pending_tx(&self, hash: &str) {
        if hash.is_empty() {
            return;
        }
        if let Err(e) = self.transactions.delete_pending(hash).await {
            error!("failed to delete pending tx {}: {}", hash, e);
        }
    }

    /// Discover an address, classifying it on first sight.
    ///
    /// An address already known keeps its original classification; an
    /// address the node has no state for simply does not exist yet. Failures
    /// here never propagate into block or transaction sync.
    async fn sync_address(&self, hash: &str, kind: AddressKind) {
        if hash.is_empty() {
            return;
        }
        if let Err(e) = self.try_sync_address(hash, kind).await {
            error!("failed to discover address {}: {}", hash, e);
        }
    }

    async fn try_sync_address(&self, hash: &str, kind: AddressKind) -> Result<(), SyncError> {
        if self.addresses.get(hash).await?.is_some() {
            return Ok(());
        }
        let Some(state) = self.node.get_account_state(hash).await? else {
            return Ok(());
        };

        // Stamp the record with an epoch-old refresh time so the initial
        // balance fetch flows through the one refresh path below.
        self.addresses
            .add(AddressRecord {
                hash: hash.to_string(),
                kind,
                balance: state.balance,
                nonce: state.nonce.parse().unwrap_or_default(),
                updated_at: DateTime::UNIX_EPOCH,
            })
            .await?;
        self.sync_balance(hash).await;
        Ok(())
    }

    /// Refresh balance and nonce for a known address.
    ///
    /// Rate-limited: an address refreshed within the last five minutes is
    /// not re-queried. A node response without a balance leaves the stored
    /// value untouched rather than zeroing it.
    pub async fn sync_balance(&self, hash: &str) {
        if let Err(e) = self.try_sync_balance(hash).await {
            warn!("sync account [{}] balance error: {}", hash, e);
        }
    }

    async fn try_sync_balance(&self, hash: &str) -> Result<(), SyncError> {
        let Some(address) = self.addresses.get(hash).await? else {
            return Ok(());
        };
        if address.updated_at >= Utc::now() - Duration::minutes(5) {
            return Ok(());
        }

        if let Some(state) = self.node.get_account_state(hash).await? {
            if !state.balance.is_empty() {
                self.addresses
                    .update_balance(
                        hash,
                        state.balance,
                        state.nonce.parse().unwrap_or_default(),
                        Utc::now(),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

/// Convert a chain timestamp in unix seconds to wall-clock time.
fn chain_time(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{AccountState, NodeError};
    use crate::sync::repositories::{
        InMemoryAddressStore, InMemoryBlockStore, InMemoryConfirmationStore,
        InMemoryDynastyStore, InMemoryTransactionStore, StoreError,
    };
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted node double: serves pre-registered blocks, receipts and
    /// account states, and counts upstream calls.
    #[derive(Default)]
    struct MockNode {
        blocks_by_height: HashMap<u64, Block>,
        blocks_by_hash: HashMap<String, Block>,
        receipts: HashMap<String, Transaction>,
        accounts: HashMap<String, AccountState>,
        validators: Vec<String>,
        account_state_calls: AtomicUsize,
        receipt_calls: AtomicUsize,
    }

    impl MockNode {
        fn with_block(mut self, block: Block) -> Self {
            self.blocks_by_hash.insert(block.hash.clone(), block.clone());
            self.blocks_by_height.insert(block.height, block);
            self
        }

        fn with_receipt(mut self, tx: Transaction) -> Self {
            self.receipts.insert(tx.hash.clone(), tx);
            self
        }

        fn with_account(mut self, address: &str, balance: &str, nonce: &str) -> Self {
            self.accounts.insert(
                address.to_string(),
                AccountState {
                    balance: balance.to_string(),
                    nonce: nonce.to_string(),
                },
            );
            self
        }
    }

    #[async_trait::async_trait]
    impl NodeApi for MockNode {
        async fn get_block_by_hash(
            &self,
            hash: &str,
            _include_txs: bool,
        ) -> Result<Option<Block>, NodeError> {
            Ok(self.blocks_by_hash.get(hash).cloned())
        }

        async fn get_block_by_height(&self, height: u64) -> Result<Option<Block>, NodeError> {
            Ok(self.blocks_by_height.get(&height).cloned())
        }

        async fn get_dynasty(&self, _height: u64) -> Result<Vec<String>, NodeError> {
            Ok(self.validators.clone())
        }

        async fn get_transaction_receipt(
            &self,
            hash: &str,
        ) -> Result<Option<Transaction>, NodeError> {
            self.receipt_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.receipts.get(hash).cloned())
        }

        async fn get_account_state(
            &self,
            address: &str,
        ) -> Result<Option<AccountState>, NodeError> {
            self.account_state_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.accounts.get(address).cloned())
        }
    }

    /// Transaction store that fails inserts for one poisoned hash, to
    /// exercise per-transaction failure isolation.
    #[derive(Default)]
    struct PoisonedTxStore {
        inner: InMemoryTransactionStore,
        fail_hash: String,
    }

    #[async_trait::async_trait]
    impl TransactionStore for PoisonedTxStore {
        async fn add(&self, tx: TxRecord) -> Result<(), StoreError> {
            if tx.hash == self.fail_hash {
                return Err(StoreError::Backend("insert rejected".to_string()));
            }
            self.inner.add(tx).await
        }

        async fn delete_by_block_height(&self, height: u64) -> Result<(), StoreError> {
            self.inner.delete_by_block_height(height).await
        }

        async fn find_by_block_height(&self, height: u64) -> Result<Vec<TxRecord>, StoreError> {
            self.inner.find_by_block_height(height).await
        }

        async fn get_pending(&self, hash: &str) -> Result<Option<PendingTxRecord>, StoreError> {
            self.inner.get_pending(hash).await
        }

        async fn add_pending(&self, tx: PendingTxRecord) -> Result<(), StoreError> {
            self.inner.add_pending(tx).await
        }

        async fn delete_pending(&self, hash: &str) -> Result<(), StoreError> {
            self.inner.delete_pending(hash).await
        }
    }

    struct Harness {
        orchestrator: SyncOrchestrator,
        node: Arc<MockNode>,
        blocks: Arc<InMemoryBlockStore>,
        transactions: Arc<dyn TransactionStore>,
        addresses: Arc<InMemoryAddressStore>,
        confirmations: Arc<InMemoryConfirmationStore>,
    }

    fn harness(node: MockNode) -> Harness {
        harness_with_tx_store(node, Arc::new(InMemoryTransactionStore::default()))
    }

    fn harness_with_tx_store(node: MockNode, transactions: Arc<dyn TransactionStore>) -> Harness {
        let node = Arc::new(node);
        let blocks = Arc::new(InMemoryBlockStore::default());
        let addresses = Arc::new(InMemoryAddressStore::default());
        let confirmations = Arc::new(InMemoryConfirmationStore::default());
        let orchestrator = SyncOrchestrator::new(
            node.clone(),
            blocks.clone(),
            transactions.clone(),
            addresses.clone(),
            Arc::new(InMemoryDynastyStore::default()),
            confirmations.clone(),
        );
        Harness {
            orchestrator,
            node,
            blocks,
            transactions,
            addresses,
            confirmations,
        }
    }

    fn make_tx(hash: &str, tx_type: &str, data: Option<&str>) -> Transaction {
        Transaction {
            hash: hash.to_string(),
            from: "sender".to_string(),
            to: "receiver".to_string(),
            status: 1,
            value: "1000000000000000000".to_string(),
            nonce: 7,
            timestamp: 1_521_540_000,
            tx_type: tx_type.to_string(),
            data: data.map(str::to_string),
            gas_price: "1000000".to_string(),
            gas_limit: "20000".to_string(),
            gas_used: Some("20000".to_string()),
            contract_address: None,
            execute_error: None,
        }
    }

    fn make_block(height: u64, hash: &str, transactions: Vec<Transaction>) -> Block {
        Block {
            hash: hash.to_string(),
            height,
            parent_hash: format!("parent-of-{hash}"),
            timestamp: 1_521_540_000,
            miner: "miner".to_string(),
            coinbase: "coinbase".to_string(),
            transactions,
        }
    }

    fn transfer_payload(recipient: &str) -> String {
        STANDARD.encode(format!(r#"{{"Function":"transfer","Args":["{recipient}"]}}"#))
    }

    #[tokio::test]
    async fn test_lib_resync_is_idempotent() {
        let block = make_block(
            5,
            "b5",
            vec![make_tx("t1", "binary", None), make_tx("t2", "binary", None)],
        );
        let h = harness(MockNode::default().with_block(block));

        h.orchestrator.sync_block_by_hash("b5", true).await;
        h.orchestrator.sync_block_by_hash("b5", true).await;

        let stored = h.blocks.get_by_height(5).await.unwrap().unwrap();
        assert!(stored.finality);
        // The second run's delete-then-reinsert nets out to one set.
        let txs = h.transactions.find_by_block_height(5).await.unwrap();
        assert_eq!(txs.len(), 2);
        let seqs: Vec<u32> = txs.iter().map(|tx| tx.tx_seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_lib_block_is_confirmed_when_all_txs_sync() {
        let block = make_block(
            9,
            "b9",
            vec![make_tx("t1", "binary", None), make_tx("t2", "binary", None)],
        );
        let h = harness(MockNode::default().with_block(block));

        h.orchestrator.sync_block_by_height(9, true).await;

        let confirmation = h.confirmations.get_confirmed(9).await.unwrap().unwrap();
        assert_eq!(confirmation.tx_count, 2);
    }

    #[tokio::test]
    async fn test_failed_tx_blocks_confirmation_but_not_siblings() {
        let block = make_block(
            9,
            "b9",
            vec![
                make_tx("t1", "binary", None),
                make_tx("t2", "binary", None),
                make_tx("t3", "binary", None),
            ],
        );
        let poisoned = Arc::new(PoisonedTxStore {
            inner: InMemoryTransactionStore::default(),
            fail_hash: "t2".to_string(),
        });
        let h = harness_with_tx_store(MockNode::default().with_block(block), poisoned);

        h.orchestrator.sync_block_by_height(9, true).await;

        // Siblings landed, the poisoned transaction did not, and the height
        // must not be confirmed.
        let txs = h.transactions.find_by_block_height(9).await.unwrap();
        let hashes: Vec<&str> = txs.iter().map(|tx| tx.hash.as_str()).collect();
        assert_eq!(hashes, vec!["t1", "t3"]);
        assert!(h.confirmations.get_confirmed(9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tentative_block_is_never_confirmed() {
        let block = make_block(3, "b3", vec![make_tx("t1", "binary", None)]);
        let h = harness(MockNode::default().with_block(block));

        h.orchestrator.sync_block_by_height(3, false).await;

        let stored = h.blocks.get_by_height(3).await.unwrap().unwrap();
        assert!(!stored.finality);
        assert!(h.confirmations.get_confirmed(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_block_is_not_an_error() {
        let h = harness(MockNode::default());
        h.orchestrator.sync_block_by_hash("nope", true).await;
        h.orchestrator.sync_block_by_height(42, true).await;
        assert!(h.blocks.get_by_height(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_genesis_transfer_payload_is_stored_decoded() {
        let payload = STANDARD.encode("genesis allocation");
        let genesis = make_block(1, "g", vec![make_tx("t1", "binary", Some(&payload))]);
        let later = make_block(2, "b2", vec![make_tx("t2", "binary", Some(&payload))]);
        let h = harness(MockNode::default().with_block(genesis).with_block(later));

        h.orchestrator.sync_block_by_height(1, true).await;
        h.orchestrator.sync_block_by_height(2, true).await;

        let genesis_tx = &h.transactions.find_by_block_height(1).await.unwrap()[0];
        assert_eq!(genesis_tx.data, "genesis allocation");
        let later_tx = &h.transactions.find_by_block_height(2).await.unwrap()[0];
        assert_eq!(later_tx.data, payload);
    }

    #[tokio::test]
    async fn test_call_tx_discovers_contract_and_nested_recipient() {
        let tx = make_tx("t1", "call", Some(&transfer_payload("addr123")));
        let block = make_block(4, "b4", vec![tx]);
        let node = MockNode::default()
            .with_block(block)
            .with_account("sender", "10", "1")
            .with_account("receiver", "0", "0")
            .with_account("addr123", "5", "0");
        let h = harness(node);

        h.orchestrator.sync_block_by_height(4, true).await;

        let receiver = h.addresses.get("receiver").await.unwrap().unwrap();
        assert_eq!(receiver.kind, AddressKind::Contract);
        let nested = h.addresses.get("addr123").await.unwrap().unwrap();
        assert_eq!(nested.kind, AddressKind::Normal);
        assert_eq!(nested.balance, "5");
    }

    #[tokio::test]
    async fn test_malformed_call_payload_still_syncs_tx() {
        let tx = make_tx("t1", "call", Some("%%%not-base64%%%"));
        let block = make_block(4, "b4", vec![tx]);
        let h = harness(MockNode::default().with_block(block));

        h.orchestrator.sync_block_by_height(4, true).await;

        let txs = h.transactions.find_by_block_height(4).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert!(h.confirmations.get_confirmed(4).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_deploy_tx_discovers_contract_address() {
        let mut tx = make_tx("t1", "deploy", None);
        tx.contract_address = Some("contract9".to_string());
        let block = make_block(4, "b4", vec![tx]);
        let node = MockNode::default()
            .with_block(block)
            .with_account("contract9", "0", "0");
        let h = harness(node);

        h.orchestrator.sync_block_by_height(4, true).await;

        let contract = h.addresses.get("contract9").await.unwrap().unwrap();
        assert_eq!(contract.kind, AddressKind::Contract);
        let stored = &h.transactions.find_by_block_height(4).await.unwrap()[0];
        assert_eq!(stored.contract_address, "contract9");
    }

    #[tokio::test]
    async fn test_absent_contract_address_stored_as_empty_string() {
        let block = make_block(4, "b4", vec![make_tx("t1", "binary", None)]);
        let h = harness(MockNode::default().with_block(block));

        h.orchestrator.sync_block_by_height(4, true).await;

        let stored = &h.transactions.find_by_block_height(4).await.unwrap()[0];
        assert_eq!(stored.contract_address, "");
        assert_eq!(stored.execute_error, "");
    }

    #[tokio::test]
    async fn test_known_address_is_never_reclassified() {
        let tx = make_tx("t1", "call", None);
        let block = make_block(4, "b4", vec![tx]);
        let node = MockNode::default()
            .with_block(block)
            .with_account("receiver", "0", "0");
        let h = harness(node);

        // First seen as a plain receiver, later as a call target.
        h.orchestrator
            .sync_address("receiver", AddressKind::Normal)
            .await;
        h.orchestrator.sync_block_by_height(4, true).await;

        let address = h.addresses.get("receiver").await.unwrap().unwrap();
        assert_eq!(address.kind, AddressKind::Normal);
    }

    #[tokio::test]
    async fn test_mined_tx_graduates_from_pending_pool() {
        let tx = make_tx("t1", "binary", None);
        let block = make_block(6, "b6", vec![tx.clone()]);
        let h = harness(MockNode::default().with_block(block).with_receipt(tx));

        h.orchestrator.sync_pending_tx("t1").await;
        assert!(h.transactions.get_pending("t1").await.unwrap().is_some());

        h.orchestrator.sync_block_by_height(6, true).await;
        assert!(h.transactions.get_pending("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_pending_sync_is_idempotent() {
        let tx = make_tx("t1", "binary", None);
        let h = harness(MockNode::default().with_receipt(tx));

        h.orchestrator.sync_pending_tx("t1").await;
        h.orchestrator.sync_pending_tx("t1").await;

        assert!(h.transactions.get_pending("t1").await.unwrap().is_some());
        // The duplicate observation never re-fetches the receipt.
        assert_eq!(h.node.receipt_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pending_tx_not_ready_is_a_no_op() {
        let h = harness(MockNode::default());
        h.orchestrator.sync_pending_tx("ghost").await;
        assert!(h.transactions.get_pending("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_hashes_are_no_ops() {
        let h = harness(MockNode::default());

        h.orchestrator.sync_pending_tx("").await;
        h.orchestrator.delete_pending_tx("").await;
        h.orchestrator.sync_address("", AddressKind::Normal).await;

        assert_eq!(h.node.account_state_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.node.receipt_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fresh_balance_is_not_requeried() {
        let node = MockNode::default().with_account("addr", "99", "3");
        let h = harness(node);
        h.addresses
            .add(AddressRecord {
                hash: "addr".to_string(),
                kind: AddressKind::Normal,
                balance: "50".to_string(),
                nonce: 2,
                updated_at: Utc::now() - Duration::minutes(3),
            })
            .await
            .unwrap();

        h.orchestrator.sync_balance("addr").await;

        assert_eq!(h.node.account_state_calls.load(Ordering::SeqCst), 0);
        let address = h.addresses.get("addr").await.unwrap().unwrap();
        assert_eq!(address.balance, "50");
    }

    #[tokio::test]
    async fn test_stale_balance_is_refreshed() {
        let node = MockNode::default().with_account("addr", "99", "3");
        let h = harness(node);
        h.addresses
            .add(AddressRecord {
                hash: "addr".to_string(),
                kind: AddressKind::Normal,
                balance: "50".to_string(),
                nonce: 2,
                updated_at: Utc::now() - Duration::minutes(6),
            })
            .await
            .unwrap();

        h.orchestrator.sync_balance("addr").await;

        assert_eq!(h.node.account_state_calls.load(Ordering::SeqCst), 1);
        let address = h.addresses.get("addr").await.unwrap().unwrap();
        assert_eq!(address.balance, "99");
        assert_eq!(address.nonce, 3);
    }

    #[tokio::test]
    async fn test_empty_upstream_balance_leaves_stored_value() {
        let node = MockNode::default().with_account("addr", "", "3");
        let h = harness(node);
        h.addresses
            .add(AddressRecord {
                hash: "addr".to_string(),
                kind: AddressKind::Normal,
                balance: "50".to_string(),
                nonce: 2,
                updated_at: Utc::now() - Duration::minutes(6),
            })
            .await
            .unwrap();

        h.orchestrator.sync_balance("addr").await;

        let address = h.addresses.get("addr").await.unwrap().unwrap();
        assert_eq!(address.balance, "50");
        assert_eq!(address.nonce, 2);
    }

    #[tokio::test]
    async fn test_unknown_address_upstream_is_not_recorded() {
        let h = harness(MockNode::default());
        h.orchestrator
            .sync_address("ghost", AddressKind::Normal)
            .await;
        assert!(h.addresses.get("ghost").await.unwrap().is_none());
    }
}

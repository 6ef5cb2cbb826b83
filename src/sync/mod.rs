//! Chain Synchronization Module
//!
//! This module provides the core logic for keeping a normalized, queryable
//! copy of chain state: blocks, transactions, addresses, dynasty sets,
//! pending transactions and confirmation bookkeeping. It is composed of
//! several submodules, each responsible for one aspect of the sync process:
//!
//! - `orchestrator`: The entry point and coordinator. Drives block intake,
//!   per-transaction sync, address discovery, pending intake and balance
//!   refresh.
//! - `classifier`: Pure classification of transactions and decoding of
//!   contract-call payloads.
//! - `records`: The stored entities written into the record stores.
//! - `repositories`: The record store traits and their in-memory
//!   implementations.
//!
//! The orchestrator owns the write path to all stores and treats every
//! upstream not-found as "nothing to do yet"; re-invocation by the external
//! scheduler is the sole recovery mechanism.

/// Transaction classification and payload decoding
pub mod classifier;
/// Main coordinator for the sync process
pub mod orchestrator;
/// Stored entities
pub mod records;
/// Record store traits and in-memory implementations
pub mod repositories;
/// Error types for sync operations
pub mod types;

pub use orchestrator::SyncOrchestrator;
pub use types::SyncError;

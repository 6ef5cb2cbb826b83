//! Chain node integration module.
//!
//! This module provides the client and types for talking to a chain node's
//! HTTP RPC interface. The node is the single upstream source of truth for
//! blocks, transactions, dynasty sets and account state; the sync core
//! consumes it through the `NodeApi` trait so it can be replaced in tests.

/// HTTP client and the `NodeApi` trait
mod client;
/// Wire-level data structures returned by the node
mod types;

pub use client::{HttpNodeClient, NodeApi};
pub use types::*;

use crate::node::NodeError;
use crate::sync::repositories::StoreError;

/// Error type for sync operations.
///
/// Nothing here is fatal: every public entry point catches, logs and
/// returns, and re-invocation by the caller is the sole recovery mechanism.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("node error: {0}")]
    Node(#[from] NodeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

mod node;
mod sync;

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::node::{HttpNodeClient, NodeApi};
use crate::sync::SyncOrchestrator;
use crate::sync::repositories::{
    InMemoryAddressStore, InMemoryBlockStore, InMemoryConfirmationStore, InMemoryDynastyStore,
    InMemoryTransactionStore,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let node_url =
        std::env::var("NODE_RPC_URL").unwrap_or_else(|_| "http://localhost:8685".to_string());
    let interval_secs = std::env::var("SYNC_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(15u64);

    info!("starting explorer sync service against {}", node_url);

    let client = HttpNodeClient::new(node_url);
    let orchestrator = Arc::new(SyncOrchestrator::new(
        Arc::new(client.clone()),
        Arc::new(InMemoryBlockStore::default()),
        Arc::new(InMemoryTransactionStore::default()),
        Arc::new(InMemoryAddressStore::default()),
        Arc::new(InMemoryDynastyStore::default()),
        Arc::new(InMemoryConfirmationStore::default()),
    ));

    // Head-follow driver: track the chain's irreversible head and replay
    // every height up to it as finalized. Retry cadence lives here, never in
    // the sync core.
    let mut next_height: u64 = 1;
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;

        let lib = match client.latest_irreversible_block().await {
            Ok(Some(block)) => block,
            Ok(None) => {
                warn!("node reported no irreversible block yet");
                continue;
            }
            Err(e) => {
                error!("failed to fetch irreversible head: {}", e);
                continue;
            }
        };

        if lib.height < next_height {
            continue;
        }
        info!(
            "syncing heights {}..={} up to irreversible head {}",
            next_height, lib.height, lib.hash
        );

        for height in next_height..=lib.height {
            orchestrator.sync_block_by_height(height, true).await;
        }
        next_height = lib.height + 1;

        // The head itself may already have a successor forming; pick up the
        // tentative head as well so the copy stays close to the chain tip.
        match client.get_block_by_height(next_height).await {
            Ok(Some(block)) => {
                orchestrator.sync_block_by_hash(&block.hash, false).await;
            }
            Ok(None) => {}
            Err(e) => warn!("failed to peek tentative head: {}", e),
        }
    }
}

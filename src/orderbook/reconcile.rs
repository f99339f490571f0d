//! Snapshot reconciliation: fetch scheduling, generations, and backoff.
//!
//! A reconciliation is one `begin_reconciliation` on a book plus the
//! snapshot fetches issued under its generation. Fetch tasks run off
//! the core task and post their completion back onto the core queue;
//! the generation lets the manager discard completions that a reset or
//! restart has superseded.

use crate::feed::error::FeedError;
use crate::orderbook::manager::CoreInput;
use crate::orderbook::snapshot::BookSnapshot;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Deadline for one snapshot fetch.
pub const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reconciliation failures (fetch errors or drain gaps) tolerated
/// before a book is parked `Failed`.
pub const MAX_RECONCILE_ATTEMPTS: u32 = 5;

const BACKOFF_BASE: Duration = Duration::from_millis(500);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Collaborator that produces level-3 snapshots. Implemented by the
/// REST client; tests substitute scripted sources.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the full per-order book for one product.
    async fn level3_snapshot(&self, product_id: &str) -> Result<BookSnapshot, FeedError>;
}

/// Exponential delay before retry `attempt`. Attempt zero fetches
/// immediately; later attempts double from the base up to the cap.
pub fn backoff_delay(attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    BACKOFF_BASE
        .saturating_mul(1u32 << (attempt - 1).min(16))
        .min(BACKOFF_CAP)
}

/// Spawn a snapshot fetch for one reconciliation generation. The
/// completion (success, failure, or timeout) is posted onto the core
/// queue; the manager discards it if the generation has moved on.
pub fn spawn_snapshot_fetch(
    source: Arc<dyn SnapshotSource>,
    product_id: String,
    generation: u64,
    attempt: u32,
    core_tx: UnboundedSender<CoreInput>,
) {
    tokio::spawn(async move {
        let delay = backoff_delay(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        debug!(
            product_id = %product_id,
            generation,
            attempt,
            "requesting level-3 snapshot"
        );
        let result =
            match tokio::time::timeout(SNAPSHOT_TIMEOUT, source.level3_snapshot(&product_id)).await
            {
                Ok(result) => result,
                Err(_) => Err(FeedError::Timeout {
                    seconds: SNAPSHOT_TIMEOUT.as_secs(),
                }),
            };
        let _ = core_tx.send(CoreInput::Snapshot {
            product_id,
            generation,
            result,
        });
    });
}

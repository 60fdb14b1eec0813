//! Realtime listener: subscribes to the backend change feed and reruns the
//! synchronizers whenever queue, user or match rows change, so that every
//! mutation, including ones made by other processes, converges into the
//! published snapshots.

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::{
    dao::models::Table,
    services::{match_sync, queue_sync},
    state::SharedState,
};

/// Listener loop. Re-subscribes whenever the backend is swapped out.
pub async fn run(state: SharedState) {
    let mut degraded = state.degraded_watcher();

    loop {
        let Some(backend) = state.backend().await else {
            if degraded.changed().await.is_err() {
                return;
            }
            continue;
        };

        let mut queue_rx = backend.changes(Table::QueueEntries);
        let mut user_rx = backend.changes(Table::Users);
        let mut match_rx = backend.changes(Table::Matches);
        info!("realtime listener attached to backend change feed");

        // Initial convergence after (re)attachment.
        refresh_queue(&state).await;
        refresh_matches(&state).await;

        loop {
            tokio::select! {
                result = queue_rx.recv() => {
                    if !handle(result, "queue_entries") {
                        break;
                    }
                    refresh_queue(&state).await;
                }
                result = user_rx.recv() => {
                    // Profile edits reshuffle VIP ordering and names.
                    if !handle(result, "users") {
                        break;
                    }
                    refresh_queue(&state).await;
                }
                result = match_rx.recv() => {
                    if !handle(result, "matches") {
                        break;
                    }
                    refresh_matches(&state).await;
                }
                changed = degraded.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if *degraded.borrow() {
                        info!("backend degraded; realtime listener detaching");
                        break;
                    }
                }
            }
        }
    }
}

/// Returns false when the feed is gone and the listener must re-attach.
fn handle(result: Result<(), RecvError>, table: &str) -> bool {
    match result {
        Ok(()) => {
            debug!(table, "change notification received");
            true
        }
        Err(RecvError::Lagged(skipped)) => {
            // A refresh rebuilds from scratch, so losing notifications is harmless.
            debug!(table, skipped, "change feed lagged");
            true
        }
        Err(RecvError::Closed) => false,
    }
}

async fn refresh_queue(state: &SharedState) {
    if let Err(err) = queue_sync::refresh(state).await {
        warn!(error = %err, "queue refresh failed");
    }
}

async fn refresh_matches(state: &SharedState) {
    if let Err(err) = match_sync::refresh(state).await {
        warn!(error = %err, "match refresh failed");
    }
}

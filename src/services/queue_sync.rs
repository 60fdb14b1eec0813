//! Queue synchronizer: rebuilds the in-memory queue snapshot from backend
//! rows. The snapshot is replaced wholesale on every refresh; it is never
//! patched incrementally.

use std::collections::HashMap;
use std::time::SystemTime;

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::UserEntity,
    error::ServiceError,
    services::{blocks, sse_events},
    state::{SharedState, model::QueueSnapshot},
};

/// Fetch queue rows and user profiles, join them, order the queue and
/// assemble blocks, then publish the new snapshot and notify subscribers.
///
/// Queue rows whose user profile is missing are dropped from the snapshot.
/// On any backend error the previous snapshot stays in place.
pub async fn refresh(state: &SharedState) -> Result<(), ServiceError> {
    let backend = state.require_backend().await?;
    let entries = backend.list_queue_entries().await?;
    let users = backend.list_users().await?;

    let profiles: HashMap<Uuid, UserEntity> =
        users.into_iter().map(|user| (user.id, user)).collect();

    let now = SystemTime::now();
    let mut players: Vec<_> = entries
        .into_iter()
        .filter_map(|entry| {
            let user = profiles.get(&entry.user_id).cloned()?;
            Some((entry, user).into())
        })
        .collect();

    blocks::priority_sort(&mut players, now);
    let assembled = blocks::assemble(&players, state.config().block_size);
    debug!(
        players = players.len(),
        blocks = assembled.len(),
        "queue snapshot rebuilt"
    );

    state.publish_queue(QueueSnapshot {
        players,
        blocks: assembled,
    });
    sse_events::broadcast_queue_changed(state);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dao::memory::MemoryBackend;
    use crate::state::AppState;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn orphan_queue_rows_are_dropped() {
        let state = AppState::new(AppConfig::default());
        let backend = MemoryBackend::new();
        let known = backend.seed_player("known");
        backend.enqueue(known, SystemTime::UNIX_EPOCH);
        backend.enqueue(Uuid::new_v4(), SystemTime::UNIX_EPOCH);
        state.install_backend(Arc::new(backend)).await;

        refresh(&state).await.unwrap();

        let snapshot = state.queue_snapshot();
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].id, known);
    }

    #[tokio::test]
    async fn refresh_orders_vips_first_and_assembles_blocks() {
        let state = AppState::new(AppConfig::default());
        let backend = MemoryBackend::new();
        for n in 0..6u64 {
            let id = backend.seed_player(&format!("u{n}"));
            backend.enqueue(id, SystemTime::UNIX_EPOCH + Duration::from_secs(n));
        }
        let vip = backend.seed_player("vip");
        backend.update_user(vip, |user| {
            user.is_vip = true;
            user.vip_expires_at = Some(SystemTime::now() + Duration::from_secs(3600));
        });
        backend.enqueue(vip, SystemTime::UNIX_EPOCH + Duration::from_secs(100));
        state.install_backend(Arc::new(backend)).await;

        refresh(&state).await.unwrap();

        let snapshot = state.queue_snapshot();
        assert_eq!(snapshot.players[0].id, vip);
        assert_eq!(snapshot.blocks.len(), 2);
        assert!(snapshot.blocks[0].is_complete);
        assert!(!snapshot.blocks[1].is_complete);
    }
}

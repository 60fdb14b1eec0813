//! Match synchronizer: rebuilds the in-memory match list from backend rows
//! and keeps the countdown clock running while active matches exist.

use std::time::SystemTime;

use tracing::debug;

use crate::{
    error::ServiceError,
    services::{clock, sse_events},
    state::{SharedState, model::MatchState},
};

/// Fetch match rows, normalize them and publish the new list, then notify
/// subscribers and reconcile the clock task against the active set.
pub async fn refresh(state: &SharedState) -> Result<(), ServiceError> {
    let backend = state.require_backend().await?;
    let rows = backend.list_matches().await?;

    let now = SystemTime::now();
    let duration = state.config().match_duration_secs;
    let mut matches: Vec<MatchState> = rows
        .into_iter()
        .map(|row| MatchState::from_entity(row, now, duration))
        .collect();
    matches.sort_by_key(|m| m.start_time);
    debug!(
        total = matches.len(),
        active = matches.iter().filter(|m| m.is_active).count(),
        "match list rebuilt"
    );

    state.publish_matches(matches);
    sse_events::broadcast_matches_changed(state);
    clock::reconcile(state).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dao::backend::DataBackend;
    use crate::dao::memory::MemoryBackend;
    use crate::dao::models::{MatchEntity, RemainingTimeRaw};
    use crate::state::AppState;
    use std::sync::Arc;
    use uuid::Uuid;

    fn row(remaining: Option<RemainingTimeRaw>, is_active: bool) -> MatchEntity {
        MatchEntity {
            id: Uuid::new_v4(),
            team1_block_id: 1,
            team2_block_id: 2,
            start_time: None,
            end_time: None,
            remaining_time: remaining,
            is_active,
            team1_won: None,
        }
    }

    #[tokio::test]
    async fn refresh_normalizes_loose_rows() {
        let state = AppState::new(AppConfig::default());
        let backend = MemoryBackend::new();
        backend
            .insert_match(row(Some(RemainingTimeRaw::Text("250".into())), false))
            .await
            .unwrap();
        backend.insert_match(row(None, false)).await.unwrap();
        state.install_backend(Arc::new(backend)).await;

        refresh(&state).await.unwrap();

        let matches = state.matches_snapshot();
        let mut remaining: Vec<i64> = matches.iter().map(|m| m.remaining_time).collect();
        remaining.sort();
        assert_eq!(remaining, vec![250, 3600]);
    }

    #[tokio::test]
    async fn refresh_without_backend_fails_degraded() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            refresh(&state).await,
            Err(ServiceError::Degraded)
        ));
    }
}

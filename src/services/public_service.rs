//! Read-only projections served to dashboards.

use uuid::Uuid;

use crate::{
    dto::{
        leaderboard::{LeaderboardEntry, LeaderboardResponse},
        matches::MatchSummary,
        queue::{MembershipResponse, QueueView},
    },
    error::ServiceError,
    services::{lifecycle, membership},
    state::SharedState,
};

/// Current queue view with blocks and counters.
pub fn queue_view(state: &SharedState) -> QueueView {
    let queue = state.queue_snapshot();
    let matches = state.matches_snapshot();
    QueueView::from_snapshot(&queue, membership::totals(&queue, &matches))
}

/// Current match list.
pub fn match_list(state: &SharedState) -> Vec<MatchSummary> {
    state
        .matches_snapshot()
        .iter()
        .map(MatchSummary::from)
        .collect()
}

/// The caller's standing, including any open punishment window.
pub async fn membership_of(
    state: &SharedState,
    user_id: Uuid,
) -> Result<MembershipResponse, ServiceError> {
    let user = lifecycle::require_user(state, user_id).await?;
    let queue = state.queue_snapshot();
    let matches = state.matches_snapshot();
    let standing = membership::resolve(user_id, &queue, &matches);

    let now = std::time::SystemTime::now();
    let punishment = user.banned_until.filter(|until| *until > now);
    Ok(MembershipResponse::new(standing, punishment))
}

/// All registered users ordered by total points, ties broken by name.
pub async fn leaderboard(state: &SharedState) -> Result<LeaderboardResponse, ServiceError> {
    let backend = state.require_backend().await?;
    let mut users = backend.list_users().await?;
    users.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    Ok(LeaderboardResponse {
        entries: users.iter().map(LeaderboardEntry::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dao::memory::MemoryBackend;
    use crate::state::AppState;
    use std::sync::Arc;

    #[tokio::test]
    async fn leaderboard_orders_by_points_then_name() {
        let state = AppState::new(AppConfig::default());
        let backend = MemoryBackend::new();
        let low = backend.seed_player("zed");
        backend.update_user(low, |u| u.total_points = 5);
        let tied_a = backend.seed_player("alice");
        backend.update_user(tied_a, |u| u.total_points = 50);
        let tied_b = backend.seed_player("bob");
        backend.update_user(tied_b, |u| u.total_points = 50);
        state.install_backend(Arc::new(backend)).await;

        let board = leaderboard(&state).await.unwrap();
        let names: Vec<_> = board
            .entries
            .iter()
            .map(|e| e.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["alice", "bob", "zed"]);
    }
}

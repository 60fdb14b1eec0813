//! Queue and match lifecycle commands. Every command validates against the
//! published snapshots, writes through the backend, then triggers the
//! relevant synchronizer so the snapshots converge.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{MatchEntity, QueueEntryEntity, RemainingTimeRaw, StatsDelta, UserEntity},
    dto::format_system_time,
    error::ServiceError,
    services::{match_sync, membership, queue_sync},
    state::{SharedState, model::MatchState},
};

/// Result of a successful queue join.
#[derive(Debug, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Whether the caller entered with active VIP priority.
    pub vip_priority: bool,
}

/// Load a user row or fail with not-found.
pub async fn require_user(state: &SharedState, user_id: Uuid) -> Result<UserEntity, ServiceError> {
    let backend = state.require_backend().await?;
    backend
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("user is not registered".into()))
}

/// Load a user row and fail unless it carries the admin flag.
pub async fn require_admin(state: &SharedState, user_id: Uuid) -> Result<UserEntity, ServiceError> {
    let user = require_user(state, user_id).await?;
    if !user.is_admin {
        return Err(ServiceError::Unauthorized(
            "this operation requires an admin account".into(),
        ));
    }
    Ok(user)
}

/// Enter the queue. Rejected while already queued, while in an active match,
/// or while a punishment window is open.
pub async fn join_queue(
    state: &SharedState,
    user_id: Uuid,
) -> Result<JoinOutcome, ServiceError> {
    let backend = state.require_backend().await?;
    let user = require_user(state, user_id).await?;
    let now = SystemTime::now();

    let queue = state.queue_snapshot();
    let matches = state.matches_snapshot();
    let standing = membership::resolve(user_id, &queue, &matches);
    if standing.in_queue {
        return Err(ServiceError::InvalidState("already in the queue".into()));
    }
    if standing.in_match {
        return Err(ServiceError::InvalidState(
            "cannot join the queue during an active match".into(),
        ));
    }
    if let Some(until) = user.banned_until.filter(|until| *until > now) {
        return Err(ServiceError::InvalidState(format!(
            "punished until {}",
            format_system_time(until)
        )));
    }

    backend
        .insert_queue_entry(QueueEntryEntity {
            user_id,
            joined_at: now,
            match_id: None,
        })
        .await?;
    queue_sync::refresh(state).await?;

    info!(%user_id, vip = user.vip_active(now), "player joined the queue");
    Ok(JoinOutcome {
        vip_priority: user.vip_active(now),
    })
}

/// Leave the queue. Rejected while not queued or while in an active match.
/// The snapshot converges through the change feed rather than an inline
/// refresh.
pub async fn leave_queue(state: &SharedState, user_id: Uuid) -> Result<(), ServiceError> {
    let backend = state.require_backend().await?;

    let queue = state.queue_snapshot();
    let matches = state.matches_snapshot();
    let standing = membership::resolve(user_id, &queue, &matches);
    if !standing.in_queue {
        return Err(ServiceError::InvalidState("not in the queue".into()));
    }
    if standing.in_match {
        return Err(ServiceError::InvalidState(
            "cannot leave the queue during an active match".into(),
        ));
    }

    backend.delete_queue_entries(vec![user_id]).await?;
    info!(%user_id, "player left the queue");
    Ok(())
}

/// Pair two complete blocks into a new match: persist the row, pin the ten
/// participants to it and bump their played counters.
pub async fn create_match(
    state: &SharedState,
    block1_id: u32,
    block2_id: u32,
) -> Result<Uuid, ServiceError> {
    let backend = state.require_backend().await?;
    if block1_id == block2_id {
        return Err(ServiceError::InvalidInput(
            "a match needs two different blocks".into(),
        ));
    }

    let queue = state.queue_snapshot();
    let matches = state.matches_snapshot();
    let block_size = state.config().block_size;

    let mut participants = Vec::with_capacity(block_size * 2);
    for block_id in [block1_id, block2_id] {
        let block = queue.block(block_id).ok_or_else(|| {
            ServiceError::InvalidInput(format!("block {block_id} does not exist"))
        })?;
        if !block.is_complete {
            return Err(ServiceError::InvalidState(format!(
                "block {block_id} does not have {block_size} players"
            )));
        }
        participants.extend(block.players.iter().map(|p| p.id));
    }

    for user_id in &participants {
        let busy = matches
            .iter()
            .filter(|m| m.is_active)
            .any(|m| membership::match_contains(&queue, m, *user_id));
        if busy {
            return Err(ServiceError::InvalidState(
                "a selected player is already in an active match".into(),
            ));
        }
    }

    let now = SystemTime::now();
    let match_id = Uuid::new_v4();
    backend
        .insert_match(MatchEntity {
            id: match_id,
            team1_block_id: block1_id,
            team2_block_id: block2_id,
            start_time: Some(now),
            end_time: None,
            remaining_time: Some(RemainingTimeRaw::Seconds(state.config().match_duration_secs)),
            is_active: true,
            team1_won: None,
        })
        .await?;
    backend.assign_match(participants.clone(), match_id).await?;
    for user_id in &participants {
        backend
            .adjust_user_stats(*user_id, StatsDelta::match_started())
            .await?;
    }

    queue_sync::refresh(state).await?;
    match_sync::refresh(state).await?;

    info!(%match_id, block1_id, block2_id, "match created");
    Ok(match_id)
}

/// Terminate a match: persist the end, punish every resolvable participant
/// and drop their queue rows. Returns the number of punished players.
pub async fn end_match(state: &SharedState, match_id: Uuid) -> Result<usize, ServiceError> {
    let backend = state.require_backend().await?;
    let matches = state.matches_snapshot();
    let target = matches
        .iter()
        .find(|m| m.id == match_id)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound("match not found".into()))?;

    let now = SystemTime::now();
    let participants = resolve_participants(state, match_id, &target).await?;
    backend.finish_match(match_id, now).await?;

    if participants.is_empty() {
        warn!(%match_id, "participants could not be resolved; skipping punishment");
    } else {
        let until = now + state.config().end_punishment();
        for user_id in &participants {
            // Best effort: a failed ban must not leave the rest unpunished.
            if let Err(err) = backend.set_ban_until(*user_id, until).await {
                warn!(%match_id, user = %user_id, error = %err, "failed to punish participant");
            }
        }
        backend.delete_queue_entries(participants.clone()).await?;
    }

    queue_sync::refresh(state).await?;
    match_sync::refresh(state).await?;

    info!(%match_id, punished = participants.len(), "match ended");
    Ok(participants.len())
}

/// Adjust an active match's countdown by a signed number of minutes,
/// clamping at the configured floor. Returns the new countdown.
pub async fn extend_match_time(
    state: &SharedState,
    match_id: Uuid,
    minutes: i64,
) -> Result<i64, ServiceError> {
    let backend = state.require_backend().await?;
    let matches = state.matches_snapshot();
    let target = matches
        .iter()
        .find(|m| m.id == match_id && m.is_active)
        .ok_or_else(|| ServiceError::NotFound("active match not found".into()))?;

    let remaining = (target.remaining_time + minutes * 60).max(state.config().min_remaining_secs);
    backend.update_match_remaining(match_id, remaining).await?;
    // Optimistic local update so the countdown moves before the refresh lands.
    state.modify_matches(|matches| {
        if let Some(m) = matches.iter_mut().find(|m| m.id == match_id && m.is_active) {
            m.remaining_time = remaining;
        }
    });
    match_sync::refresh(state).await?;

    info!(%match_id, minutes, remaining, "match time adjusted");
    Ok(remaining)
}

/// Punish an away player for the given number of minutes and drop their
/// queue row. Matches are left untouched.
pub async fn mark_player_away(
    state: &SharedState,
    user_id: Uuid,
    minutes: u64,
) -> Result<SystemTime, ServiceError> {
    let backend = state.require_backend().await?;
    require_user(state, user_id).await?;

    let until = SystemTime::now() + std::time::Duration::from_secs(minutes * 60);
    backend.set_ban_until(user_id, until).await?;
    backend.delete_queue_entries(vec![user_id]).await?;
    queue_sync::refresh(state).await?;

    info!(%user_id, minutes, "player marked away");
    Ok(until)
}

/// Emergency reset: deactivate every active match and wipe the queue.
/// Returns `(matches deactivated, queue rows removed)`.
pub async fn clear_all_queue(state: &SharedState) -> Result<(u64, u64), ServiceError> {
    let backend = state.require_backend().await?;
    let now = SystemTime::now();

    let deactivated = backend.deactivate_active_matches(now).await?;
    let removed = backend.clear_queue().await?;

    queue_sync::refresh(state).await?;
    match_sync::refresh(state).await?;

    warn!(deactivated, removed, "queue cleared by admin");
    Ok((deactivated, removed))
}

/// Manual point adjustment for a single user. Totals never drop below zero.
pub async fn adjust_points(
    state: &SharedState,
    user_id: Uuid,
    points: i64,
) -> Result<(), ServiceError> {
    let backend = state.require_backend().await?;
    require_user(state, user_id).await?;
    backend
        .adjust_user_stats(user_id, StatsDelta::points(points))
        .await?;
    info!(%user_id, points, "points adjusted manually");
    Ok(())
}

/// Resolve a match's participants. The pinned queue rows fetched fresh from
/// the backend are authoritative; without any pins the block numbers
/// recorded at creation are recomputed against the live queue, but only
/// while the match is still active. Once a match has ended its pins are
/// gone and the live blocks belong to whoever queued up afterwards.
async fn resolve_participants(
    state: &SharedState,
    match_id: Uuid,
    target: &MatchState,
) -> Result<Vec<Uuid>, ServiceError> {
    let backend = state.require_backend().await?;
    let pinned: Vec<Uuid> = backend
        .list_queue_entries()
        .await?
        .into_iter()
        .filter(|entry| entry.match_id == Some(match_id))
        .map(|entry| entry.user_id)
        .collect();
    if !pinned.is_empty() {
        return Ok(pinned);
    }
    if !target.is_active {
        return Ok(Vec::new());
    }

    let queue = state.queue_snapshot();
    let mut fallback = Vec::new();
    for block_id in [target.team1_block_id, target.team2_block_id] {
        if let Some(block) = queue.block(block_id) {
            fallback.extend(block.players.iter().map(|p| p.id));
        }
    }
    Ok(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dao::{backend::DataBackend, memory::MemoryBackend};
    use crate::state::AppState;
    use std::sync::Arc;
    use std::time::Duration;

    async fn harness() -> (crate::state::SharedState, MemoryBackend) {
        let state = AppState::new(AppConfig::default());
        let backend = MemoryBackend::new();
        state.install_backend(Arc::new(backend.clone())).await;
        (state, backend)
    }

    async fn seed_queue(backend: &MemoryBackend, count: usize) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for n in 0..count {
            let id = backend.seed_player(&format!("p{n}"));
            backend.enqueue(id, SystemTime::UNIX_EPOCH + Duration::from_secs(n as u64));
            ids.push(id);
        }
        ids
    }

    #[tokio::test]
    async fn join_is_rejected_while_queued_matched_or_punished() {
        let (state, backend) = harness().await;
        let queued = backend.seed_player("queued");
        backend.enqueue(queued, SystemTime::UNIX_EPOCH);
        queue_sync::refresh(&state).await.unwrap();

        assert!(matches!(
            join_queue(&state, queued).await,
            Err(ServiceError::InvalidState(_))
        ));

        let punished = backend.seed_player("punished");
        backend.update_user(punished, |user| {
            user.banned_until = Some(SystemTime::now() + Duration::from_secs(600));
        });
        assert!(matches!(
            join_queue(&state, punished).await,
            Err(ServiceError::InvalidState(_))
        ));

        assert!(matches!(
            join_queue(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn expired_punishment_no_longer_blocks_joining() {
        let (state, backend) = harness().await;
        let id = backend.seed_player("reformed");
        backend.update_user(id, |user| {
            user.banned_until = Some(SystemTime::now() - Duration::from_secs(1));
        });

        let outcome = join_queue(&state, id).await.unwrap();
        assert!(!outcome.vip_priority);
        assert!(state.queue_snapshot().contains(id));
    }

    #[tokio::test]
    async fn create_match_requires_two_distinct_complete_blocks() {
        let (state, backend) = harness().await;
        seed_queue(&backend, 7).await;
        queue_sync::refresh(&state).await.unwrap();

        assert!(matches!(
            create_match(&state, 1, 1).await,
            Err(ServiceError::InvalidInput(_))
        ));
        // Block 2 only has two players.
        assert!(matches!(
            create_match(&state, 1, 2).await,
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            create_match(&state, 1, 9).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn create_match_pins_participants_and_counts_matches() {
        let (state, backend) = harness().await;
        let ids = seed_queue(&backend, 10).await;
        queue_sync::refresh(&state).await.unwrap();

        let match_id = create_match(&state, 1, 2).await.unwrap();

        for id in &ids {
            let row = backend.user(*id).unwrap();
            assert_eq!(row.matches_played, 1);
        }
        let snapshot = state.queue_snapshot();
        assert!(
            snapshot
                .players
                .iter()
                .all(|p| p.match_id == Some(match_id))
        );
        let matches = state.matches_snapshot();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].is_active);
        assert_eq!(matches[0].remaining_time, 3600);

        // Participants of an active match cannot be paired again.
        assert!(matches!(
            create_match(&state, 1, 2).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn end_match_punishes_and_dequeues_participants() {
        let (state, backend) = harness().await;
        let ids = seed_queue(&backend, 10).await;
        let outsider = backend.seed_player("outsider");
        backend.enqueue(outsider, SystemTime::UNIX_EPOCH + Duration::from_secs(99));
        queue_sync::refresh(&state).await.unwrap();

        let match_id = create_match(&state, 1, 2).await.unwrap();
        let punished = end_match(&state, match_id).await.unwrap();
        assert_eq!(punished, 10);

        let now = SystemTime::now();
        for id in &ids {
            let row = backend.user(*id).unwrap();
            assert!(row.is_banned(now));
        }
        assert!(!backend.user(outsider).unwrap().is_banned(now));

        let snapshot = state.queue_snapshot();
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].id, outsider);
        assert!(!state.matches_snapshot()[0].is_active);
    }

    #[tokio::test]
    async fn end_match_without_resolvable_participants_skips_punishment() {
        let (state, backend) = harness().await;
        backend
            .insert_match(MatchEntity {
                id: Uuid::new_v4(),
                team1_block_id: 7,
                team2_block_id: 8,
                start_time: None,
                end_time: None,
                remaining_time: Some(RemainingTimeRaw::Seconds(100)),
                is_active: true,
                team1_won: None,
            })
            .await
            .unwrap();
        match_sync::refresh(&state).await.unwrap();
        let match_id = state.matches_snapshot()[0].id;

        let punished = end_match(&state, match_id).await.unwrap();
        assert_eq!(punished, 0);
        assert!(!backend.match_row(match_id).unwrap().is_active);
    }

    #[tokio::test]
    async fn reending_a_finished_match_leaves_later_players_untouched() {
        let (state, backend) = harness().await;
        seed_queue(&backend, 10).await;
        queue_sync::refresh(&state).await.unwrap();
        let match_id = create_match(&state, 1, 2).await.unwrap();
        assert_eq!(end_match(&state, match_id).await.unwrap(), 10);

        // Fresh players now occupy the block numbers the match recorded.
        let newcomers = seed_queue(&backend, 5).await;
        queue_sync::refresh(&state).await.unwrap();

        let punished = end_match(&state, match_id).await.unwrap();
        assert_eq!(punished, 0);

        let now = SystemTime::now();
        let snapshot = state.queue_snapshot();
        for id in &newcomers {
            assert!(!backend.user(*id).unwrap().is_banned(now));
            assert!(snapshot.contains(*id));
        }
    }

    #[tokio::test]
    async fn extend_match_time_clamps_at_the_floor() {
        let (state, backend) = harness().await;
        seed_queue(&backend, 10).await;
        queue_sync::refresh(&state).await.unwrap();
        let match_id = create_match(&state, 1, 2).await.unwrap();

        let remaining = extend_match_time(&state, match_id, 10).await.unwrap();
        assert_eq!(remaining, 3600 + 600);

        let remaining = extend_match_time(&state, match_id, -120).await.unwrap();
        assert_eq!(remaining, 300);

        assert!(matches!(
            extend_match_time(&state, Uuid::new_v4(), 5).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn clear_all_queue_resets_everything() {
        let (state, backend) = harness().await;
        seed_queue(&backend, 10).await;
        queue_sync::refresh(&state).await.unwrap();
        create_match(&state, 1, 2).await.unwrap();

        let (deactivated, removed) = clear_all_queue(&state).await.unwrap();
        assert_eq!(deactivated, 1);
        assert_eq!(removed, 10);
        assert!(state.queue_snapshot().players.is_empty());
        assert!(state.matches_snapshot().iter().all(|m| !m.is_active));
    }

    #[tokio::test]
    async fn mark_player_away_bans_and_dequeues() {
        let (state, backend) = harness().await;
        let id = backend.seed_player("away");
        backend.enqueue(id, SystemTime::UNIX_EPOCH);
        queue_sync::refresh(&state).await.unwrap();

        let until = mark_player_away(&state, id, 30).await.unwrap();
        assert!(until > SystemTime::now());
        assert!(backend.user(id).unwrap().is_banned(SystemTime::now()));
        assert!(!state.queue_snapshot().contains(id));
    }
}

//! Outcome settlement: applies winner/loser points and MVP awards in one
//! pass, records the winner on the match row, then terminates the match
//! through the standard path so the usual punishment applies.

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::StatsDelta,
    error::ServiceError,
    services::lifecycle,
    state::SharedState,
};

/// Points awarded to each player on the winning team.
pub const WIN_POINTS: i64 = 25;
/// Points deducted from each player on the losing team.
pub const LOSS_POINTS: i64 = -25;
/// Bonus for the core MVP award.
pub const MVP_CORE_POINTS: i64 = 4;
/// Bonus for the support MVP award.
pub const MVP_SUP_POINTS: i64 = 3;

/// Settle a match outcome.
///
/// The winning block must be one of the two recorded on the match, and the
/// two MVP awards must go to different participants. MVP bonuses stack on
/// top of the win or loss delta; deductions never push a total below zero.
pub async fn submit_result(
    state: &SharedState,
    match_id: Uuid,
    winning_block_id: u32,
    mvp_core_user_id: Option<Uuid>,
    mvp_sup_user_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let backend = state.require_backend().await?;
    if mvp_core_user_id.is_some() && mvp_core_user_id == mvp_sup_user_id {
        return Err(ServiceError::InvalidInput(
            "a player cannot hold both MVP awards".into(),
        ));
    }

    let matches = state.matches_snapshot();
    let target = matches
        .iter()
        .find(|m| m.id == match_id)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound("match not found".into()))?;

    let team1_won = if winning_block_id == target.team1_block_id {
        true
    } else if winning_block_id == target.team2_block_id {
        false
    } else {
        return Err(ServiceError::InvalidInput(
            "winning block is not part of this match".into(),
        ));
    };

    let queue = state.queue_snapshot();
    let roster = |block_id: u32| -> Result<Vec<Uuid>, ServiceError> {
        let block = queue.block(block_id).ok_or_else(|| {
            ServiceError::InvalidState(format!("block {block_id} can no longer be resolved"))
        })?;
        Ok(block.players.iter().map(|p| p.id).collect())
    };
    let team1 = roster(target.team1_block_id)?;
    let team2 = roster(target.team2_block_id)?;
    let (winners, losers) = if team1_won {
        (&team1, &team2)
    } else {
        (&team2, &team1)
    };

    for mvp in [mvp_core_user_id, mvp_sup_user_id].into_iter().flatten() {
        if !team1.contains(&mvp) && !team2.contains(&mvp) {
            return Err(ServiceError::InvalidInput(
                "MVP award must go to a match participant".into(),
            ));
        }
    }

    for user_id in winners {
        backend
            .adjust_user_stats(*user_id, StatsDelta::win(WIN_POINTS))
            .await?;
    }
    for user_id in losers {
        backend
            .adjust_user_stats(*user_id, StatsDelta::loss(LOSS_POINTS))
            .await?;
    }
    if let Some(user_id) = mvp_core_user_id {
        backend
            .adjust_user_stats(user_id, StatsDelta::mvp_core(MVP_CORE_POINTS))
            .await?;
    }
    if let Some(user_id) = mvp_sup_user_id {
        backend
            .adjust_user_stats(user_id, StatsDelta::mvp_sup(MVP_SUP_POINTS))
            .await?;
    }

    backend.set_match_winner(match_id, team1_won).await?;
    info!(%match_id, winning_block_id, "match outcome recorded");

    lifecycle::end_match(state, match_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dao::memory::MemoryBackend;
    use crate::services::{lifecycle::create_match, queue_sync};
    use crate::state::AppState;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    async fn matched_harness() -> (crate::state::SharedState, MemoryBackend, Uuid, Vec<Uuid>) {
        let state = AppState::new(AppConfig::default());
        let backend = MemoryBackend::new();
        state.install_backend(Arc::new(backend.clone())).await;

        let mut ids = Vec::new();
        for n in 0..10u64 {
            let id = backend.seed_player(&format!("p{n}"));
            backend.enqueue(id, SystemTime::UNIX_EPOCH + Duration::from_secs(n));
            ids.push(id);
        }
        queue_sync::refresh(&state).await.unwrap();
        let match_id = create_match(&state, 1, 2).await.unwrap();
        (state, backend, match_id, ids)
    }

    #[tokio::test]
    async fn settlement_awards_points_and_mvps_then_ends_the_match() {
        let (state, backend, match_id, ids) = matched_harness().await;
        // Queue order matches seed order, so ids[0..5] is block 1.
        let (team1, team2) = ids.split_at(5);
        backend.update_user(team2[0], |user| user.total_points = 10);

        submit_result(&state, match_id, 1, Some(team1[2]), Some(team2[0]))
            .await
            .unwrap();

        for id in team1 {
            let row = backend.user(*id).unwrap();
            assert_eq!(row.matches_won, 1);
            let expected = if *id == team1[2] {
                WIN_POINTS + MVP_CORE_POINTS
            } else {
                WIN_POINTS
            };
            assert_eq!(row.total_points, expected);
        }
        for id in team2 {
            let row = backend.user(*id).unwrap();
            assert_eq!(row.matches_lost, 1);
        }
        // Loss floored at zero, then the support bonus lands on top.
        let sup = backend.user(team2[0]).unwrap();
        assert_eq!(sup.total_points, MVP_SUP_POINTS);
        assert_eq!(sup.mvp_sup_count, 1);
        assert_eq!(backend.user(team1[2]).unwrap().mvp_core_count, 1);

        let row = backend.match_row(match_id).unwrap();
        assert_eq!(row.team1_won, Some(true));
        assert!(!row.is_active);
        // Standard termination punishment applies after settlement.
        let now = SystemTime::now();
        assert!(ids.iter().all(|id| backend.user(*id).unwrap().is_banned(now)));
    }

    #[tokio::test]
    async fn settlement_rejects_bad_blocks_and_duplicate_mvp() {
        let (state, _backend, match_id, ids) = matched_harness().await;

        assert!(matches!(
            submit_result(&state, match_id, 9, None, None).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            submit_result(&state, match_id, 1, Some(ids[0]), Some(ids[0])).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            submit_result(&state, match_id, 1, Some(Uuid::new_v4()), None).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            submit_result(&state, Uuid::new_v4(), 1, None, None).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn losing_team_two_wins_are_recorded_symmetrically() {
        let (state, backend, match_id, ids) = matched_harness().await;
        let (team1, team2) = ids.split_at(5);

        submit_result(&state, match_id, 2, None, None).await.unwrap();

        assert_eq!(backend.match_row(match_id).unwrap().team1_won, Some(false));
        for id in team2 {
            assert_eq!(backend.user(*id).unwrap().total_points, WIN_POINTS);
        }
        for id in team1 {
            assert_eq!(backend.user(*id).unwrap().total_points, 0);
        }
    }
}

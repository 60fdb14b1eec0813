//! Single cooperative countdown clock. One task ticks every second while at
//! least one active match exists; it decrements all active countdowns in
//! memory, checkpoints remaining time to the backend every thirty seconds,
//! and terminates matches whose clock reaches zero.

use std::time::{Duration, SystemTime};

use futures::future::BoxFuture;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    services::{lifecycle, sse_events},
    state::{SharedState, model::MatchState},
};

/// Effects produced by one clock tick, executed after the snapshot update.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Matches whose countdown reached zero on this tick.
    pub expired: Vec<Uuid>,
    /// Countdown checkpoints due for persistence, as `(match, remaining)`.
    pub checkpoints: Vec<(Uuid, i64)>,
}

/// Advance every active countdown by one second.
///
/// Countdowns are decremented first; a checkpoint fires when the decremented
/// value is positive and lands on a multiple of `checkpoint_interval`. A
/// countdown reaching zero flips the match inactive locally and schedules
/// its termination.
pub fn advance_one_second(
    matches: &mut [MatchState],
    now: SystemTime,
    checkpoint_interval: i64,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    for m in matches.iter_mut().filter(|m| m.is_active) {
        m.remaining_time = (m.remaining_time - 1).max(0);

        if m.remaining_time == 0 {
            m.is_active = false;
            m.end_time = Some(now);
            outcome.expired.push(m.id);
        } else if m.remaining_time % checkpoint_interval == 0 {
            outcome.checkpoints.push((m.id, m.remaining_time));
        }
    }

    outcome
}

/// Start or let die the clock task so that exactly one runs while active
/// matches exist, and none runs otherwise.
pub async fn reconcile(state: &SharedState) {
    let has_active = state.matches_snapshot().iter().any(|m| m.is_active);
    let mut slot = state.clock_task().lock().await;

    match (has_active, slot.as_ref()) {
        (true, None) => {
            let clock_state = state.clone();
            info!("starting match clock");
            *slot = Some(tokio::spawn(run(clock_state)));
        }
        (true, Some(handle)) if handle.is_finished() => {
            let clock_state = state.clone();
            info!("restarting match clock");
            *slot = Some(tokio::spawn(run(clock_state)));
        }
        _ => {}
    }
}

/// Clock loop. Exits on its own once no active match remains.
///
/// Boxed: expiring a match triggers a refresh that may spawn this loop
/// again, so the future type must not be self-referential.
fn run(state: SharedState) -> BoxFuture<'static, ()> {
    Box::pin(run_inner(state))
}

async fn run_inner(state: SharedState) {
    let checkpoint_interval = state.config().checkpoint_interval_secs;
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // First tick of a Tokio interval completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;

        let now = SystemTime::now();
        let mut outcome = TickOutcome::default();
        state.modify_matches(|matches| {
            outcome = advance_one_second(matches, now, checkpoint_interval);
        });
        sse_events::broadcast_matches_changed(&state);

        // Checkpoints and terminations never block the tick.
        if !outcome.checkpoints.is_empty()
            && let Some(backend) = state.backend().await
        {
            for (match_id, remaining) in outcome.checkpoints {
                let backend = backend.clone();
                tokio::spawn(async move {
                    if let Err(err) = backend.update_match_remaining(match_id, remaining).await {
                        warn!(%match_id, error = %err, "countdown checkpoint failed");
                    }
                });
            }
        }

        for match_id in outcome.expired {
            let state = state.clone();
            tokio::spawn(async move {
                info!(%match_id, "match clock expired; ending match");
                if let Err(err) = lifecycle::end_match(&state, match_id).await {
                    warn!(%match_id, error = %err, "failed to end expired match");
                }
            });
        }

        if !state.matches_snapshot().iter().any(|m| m.is_active) {
            // Re-check under the slot lock so a match created in the gap
            // cannot be left without a running clock.
            let mut slot = state.clock_task().lock().await;
            if state.matches_snapshot().iter().any(|m| m.is_active) {
                continue;
            }
            slot.take();
            info!("match clock stopped; no active matches remain");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(remaining: i64) -> MatchState {
        MatchState {
            id: Uuid::new_v4(),
            team1_block_id: 1,
            team2_block_id: 2,
            start_time: SystemTime::UNIX_EPOCH,
            end_time: None,
            remaining_time: remaining,
            is_active: true,
            team1_won: None,
        }
    }

    #[test]
    fn decrements_only_active_matches() {
        let mut inactive = active(500);
        inactive.is_active = false;
        let mut matches = vec![active(100), inactive];

        let outcome = advance_one_second(&mut matches, SystemTime::now(), 30);

        assert_eq!(matches[0].remaining_time, 99);
        assert_eq!(matches[1].remaining_time, 500);
        assert_eq!(outcome, TickOutcome::default());
    }

    #[test]
    fn checkpoint_fires_on_interval_multiples_after_decrement() {
        // 91 decrements to 90, which is a multiple of 30.
        let mut matches = vec![active(91)];
        let outcome = advance_one_second(&mut matches, SystemTime::now(), 30);
        assert_eq!(outcome.checkpoints, vec![(matches[0].id, 90)]);

        // 90 decrements to 89: no checkpoint.
        let outcome = advance_one_second(&mut matches, SystemTime::now(), 30);
        assert!(outcome.checkpoints.is_empty());
    }

    #[test]
    fn expiry_flips_inactive_and_never_checkpoints_zero() {
        let now = SystemTime::now();
        let mut matches = vec![active(1)];

        let outcome = advance_one_second(&mut matches, now, 30);

        assert_eq!(outcome.expired, vec![matches[0].id]);
        assert!(outcome.checkpoints.is_empty());
        assert!(!matches[0].is_active);
        assert_eq!(matches[0].remaining_time, 0);
        assert_eq!(matches[0].end_time, Some(now));
    }

    #[test]
    fn tick_handles_many_matches_independently() {
        let mut matches = vec![active(61), active(1), active(10)];
        let outcome = advance_one_second(&mut matches, SystemTime::now(), 30);

        assert_eq!(outcome.checkpoints, vec![(matches[0].id, 60)]);
        assert_eq!(outcome.expired, vec![matches[1].id]);
        assert_eq!(matches[2].remaining_time, 9);
    }
}

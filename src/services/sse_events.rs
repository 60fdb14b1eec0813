//! Construction and broadcast of the realtime events pushed to dashboards.

use tracing::warn;

use crate::{
    dto::{
        matches::MatchSummary,
        queue::QueueView,
        sse::{MatchesChangedEvent, QueueChangedEvent, ServerEvent, SystemStatus},
    },
    services::membership,
    state::SharedState,
};

/// Event name carried on queue updates.
pub const QUEUE_EVENT: &str = "queue_changed";
/// Event name carried on match list updates.
pub const MATCHES_EVENT: &str = "matches_changed";
/// Event name carried on degraded mode transitions.
pub const STATUS_EVENT: &str = "system_status";

/// Push the current queue view to all SSE subscribers.
pub fn broadcast_queue_changed(state: &SharedState) {
    let queue = state.queue_snapshot();
    let matches = state.matches_snapshot();
    let view = QueueView::from_snapshot(&queue, membership::totals(&queue, &matches));

    match ServerEvent::json(QUEUE_EVENT.to_string(), &QueueChangedEvent(view)) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(error = %err, "failed to serialise queue event"),
    }
}

/// Push the current match list to all SSE subscribers.
pub fn broadcast_matches_changed(state: &SharedState) {
    let matches = state.matches_snapshot();
    let payload = MatchesChangedEvent {
        matches: matches.iter().map(MatchSummary::from).collect(),
    };

    match ServerEvent::json(MATCHES_EVENT.to_string(), &payload) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(error = %err, "failed to serialise matches event"),
    }
}

/// Announce a degraded mode transition.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    match ServerEvent::json(STATUS_EVENT.to_string(), &SystemStatus { degraded }) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(error = %err, "failed to serialise status event"),
    }
}

use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod extract;
pub mod health;
pub mod leaderboard;
pub mod matches;
pub mod queue;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(queue::router())
        .merge(matches::router())
        .merge(leaderboard::router())
        .merge(admin::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

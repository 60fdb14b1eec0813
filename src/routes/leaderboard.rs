use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::leaderboard::LeaderboardResponse, error::AppError, services::public_service,
    state::SharedState,
};

/// Point standings across all registered players.
pub fn router() -> Router<SharedState> {
    Router::new().route("/leaderboard", get(get_leaderboard))
}

/// Return every registered player ordered by total points.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "leaderboard",
    responses((status = 200, description = "Current standings", body = LeaderboardResponse))
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(public_service::leaderboard(&state).await?))
}

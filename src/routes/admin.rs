use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::{
        admin::{ActionResponse, AdjustPointsRequest, MarkAwayRequest},
        format_system_time,
    },
    error::AppError,
    routes::extract::CurrentUser,
    services::lifecycle,
    state::SharedState,
};

/// Administrative interventions outside the normal match flow.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/away", post(mark_player_away))
        .route("/admin/clear", post(clear_queue))
        .route("/admin/points", post(adjust_points))
}

/// Punish an away player and remove them from the queue.
#[utoipa::path(
    post,
    path = "/admin/away",
    tag = "admin",
    params(("x-user-id" = String, Header, description = "Admin account identifier")),
    request_body = MarkAwayRequest,
    responses((status = 200, description = "Player punished", body = ActionResponse))
)]
pub async fn mark_player_away(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Valid(Json(payload)): Valid<Json<MarkAwayRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    lifecycle::require_admin(&state, actor).await?;
    let until = lifecycle::mark_player_away(&state, payload.user_id, payload.minutes).await?;
    Ok(Json(ActionResponse::new(format!(
        "player punished until {}",
        format_system_time(until)
    ))))
}

/// Emergency reset: deactivate every active match and wipe the queue.
#[utoipa::path(
    post,
    path = "/admin/clear",
    tag = "admin",
    params(("x-user-id" = String, Header, description = "Admin account identifier")),
    responses((status = 200, description = "Queue cleared", body = ActionResponse))
)]
pub async fn clear_queue(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<ActionResponse>, AppError> {
    lifecycle::require_admin(&state, actor).await?;
    let (deactivated, removed) = lifecycle::clear_all_queue(&state).await?;
    Ok(Json(ActionResponse::new(format!(
        "queue cleared: {removed} entries removed, {deactivated} matches deactivated"
    ))))
}

/// Manually adjust a user's point total.
#[utoipa::path(
    post,
    path = "/admin/points",
    tag = "admin",
    params(("x-user-id" = String, Header, description = "Admin account identifier")),
    request_body = AdjustPointsRequest,
    responses((status = 200, description = "Points adjusted", body = ActionResponse))
)]
pub async fn adjust_points(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Valid(Json(payload)): Valid<Json<AdjustPointsRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    lifecycle::require_admin(&state, actor).await?;
    lifecycle::adjust_points(&state, payload.user_id, payload.points).await?;
    Ok(Json(ActionResponse::new("points adjusted")))
}

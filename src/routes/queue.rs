use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{
        admin::ActionResponse,
        queue::{JoinQueueResponse, MembershipResponse, QueueView},
    },
    error::AppError,
    routes::extract::CurrentUser,
    services::{lifecycle, public_service},
    state::SharedState,
};

/// Queue views and self-service membership operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/queue", get(get_queue))
        .route("/queue/membership", get(get_membership))
        .route("/queue/join", post(join_queue))
        .route("/queue/leave", post(leave_queue))
}

/// Return the ordered queue with its blocks and counters.
#[utoipa::path(
    get,
    path = "/queue",
    tag = "queue",
    responses((status = 200, description = "Current queue view", body = QueueView))
)]
pub async fn get_queue(State(state): State<SharedState>) -> Json<QueueView> {
    Json(public_service::queue_view(&state))
}

/// Return the caller's standing in the queue and matches.
#[utoipa::path(
    get,
    path = "/queue/membership",
    tag = "queue",
    params(("x-user-id" = String, Header, description = "Caller's account identifier")),
    responses((status = 200, description = "Caller's standing", body = MembershipResponse))
)]
pub async fn get_membership(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<MembershipResponse>, AppError> {
    Ok(Json(public_service::membership_of(&state, user_id).await?))
}

/// Enter the matchmaking queue.
#[utoipa::path(
    post,
    path = "/queue/join",
    tag = "queue",
    params(("x-user-id" = String, Header, description = "Caller's account identifier")),
    responses(
        (status = 200, description = "Joined the queue", body = JoinQueueResponse),
        (status = 409, description = "Already queued, in a match or punished")
    )
)]
pub async fn join_queue(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<JoinQueueResponse>, AppError> {
    let outcome = lifecycle::join_queue(&state, user_id).await?;
    let message = if outcome.vip_priority {
        "joined the queue with VIP priority".to_string()
    } else {
        "joined the queue".to_string()
    };
    Ok(Json(JoinQueueResponse {
        message,
        vip_priority: outcome.vip_priority,
    }))
}

/// Leave the matchmaking queue.
#[utoipa::path(
    post,
    path = "/queue/leave",
    tag = "queue",
    params(("x-user-id" = String, Header, description = "Caller's account identifier")),
    responses(
        (status = 200, description = "Left the queue", body = ActionResponse),
        (status = 409, description = "Not queued or currently in a match")
    )
)]
pub async fn leave_queue(
    State(state): State<SharedState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ActionResponse>, AppError> {
    lifecycle::leave_queue(&state, user_id).await?;
    Ok(Json(ActionResponse::new("left the queue")))
}

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        admin::ActionResponse,
        matches::{
            CreateMatchRequest, CreateMatchResponse, ExtendTimeRequest, ExtendTimeResponse,
            MatchSummary, SubmitResultRequest,
        },
    },
    error::AppError,
    routes::extract::CurrentUser,
    services::{lifecycle, public_service, settlement},
    state::SharedState,
};

/// Match listing and admin-driven lifecycle operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches).post(create_match))
        .route("/matches/{id}/end", post(end_match))
        .route("/matches/{id}/extend", post(extend_match_time))
        .route("/matches/{id}/result", post(submit_result))
}

/// Return every known match, active first by start time.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    responses((status = 200, description = "All matches", body = [MatchSummary]))
)]
pub async fn list_matches(State(state): State<SharedState>) -> Json<Vec<MatchSummary>> {
    Json(public_service::match_list(&state))
}

/// Pair two complete blocks into a new match.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    params(("x-user-id" = String, Header, description = "Admin account identifier")),
    request_body = CreateMatchRequest,
    responses(
        (status = 200, description = "Match created", body = CreateMatchResponse),
        (status = 409, description = "Blocks incomplete or players already matched")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Valid(Json(payload)): Valid<Json<CreateMatchRequest>>,
) -> Result<Json<CreateMatchResponse>, AppError> {
    lifecycle::require_admin(&state, actor).await?;
    let match_id = lifecycle::create_match(&state, payload.block1_id, payload.block2_id).await?;
    Ok(Json(CreateMatchResponse {
        match_id,
        message: format!(
            "match created between blocks {} and {}",
            payload.block1_id, payload.block2_id
        ),
    }))
}

/// Terminate a match, punishing its participants.
#[utoipa::path(
    post,
    path = "/matches/{id}/end",
    tag = "matches",
    params(
        ("x-user-id" = String, Header, description = "Admin account identifier"),
        ("id" = String, Path, description = "Identifier of the match to end")
    ),
    responses((status = 200, description = "Match ended", body = ActionResponse))
)]
pub async fn end_match(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    lifecycle::require_admin(&state, actor).await?;
    let punished = lifecycle::end_match(&state, id).await?;
    Ok(Json(ActionResponse::new(format!(
        "match ended; {punished} players punished"
    ))))
}

/// Adjust an active match's countdown by a signed number of minutes.
#[utoipa::path(
    post,
    path = "/matches/{id}/extend",
    tag = "matches",
    params(
        ("x-user-id" = String, Header, description = "Admin account identifier"),
        ("id" = String, Path, description = "Identifier of the match to adjust")
    ),
    request_body = ExtendTimeRequest,
    responses((status = 200, description = "Countdown adjusted", body = ExtendTimeResponse))
)]
pub async fn extend_match_time(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ExtendTimeRequest>>,
) -> Result<Json<ExtendTimeResponse>, AppError> {
    lifecycle::require_admin(&state, actor).await?;
    let remaining_time = lifecycle::extend_match_time(&state, id, payload.minutes).await?;
    Ok(Json(ExtendTimeResponse { remaining_time }))
}

/// Settle the outcome of a match with points and MVP awards.
#[utoipa::path(
    post,
    path = "/matches/{id}/result",
    tag = "matches",
    params(
        ("x-user-id" = String, Header, description = "Admin account identifier"),
        ("id" = String, Path, description = "Identifier of the match to settle")
    ),
    request_body = SubmitResultRequest,
    responses((status = 200, description = "Outcome settled", body = ActionResponse))
)]
pub async fn submit_result(
    State(state): State<SharedState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SubmitResultRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    lifecycle::require_admin(&state, actor).await?;
    settlement::submit_result(
        &state,
        id,
        payload.winning_block_id,
        payload.mvp_core_user_id,
        payload.mvp_sup_user_id,
    )
    .await?;
    Ok(Json(ActionResponse::new("match outcome recorded")))
}

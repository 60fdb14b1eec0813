use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Rinha queue backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::event_stream,
        crate::routes::queue::get_queue,
        crate::routes::queue::get_membership,
        crate::routes::queue::join_queue,
        crate::routes::queue::leave_queue,
        crate::routes::matches::list_matches,
        crate::routes::matches::create_match,
        crate::routes::matches::end_match,
        crate::routes::matches::extend_match_time,
        crate::routes::matches::submit_result,
        crate::routes::leaderboard::get_leaderboard,
        crate::routes::admin::mark_player_away,
        crate::routes::admin::clear_queue,
        crate::routes::admin::adjust_points,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::queue::QueueView,
            crate::dto::queue::MembershipResponse,
            crate::dto::queue::JoinQueueResponse,
            crate::dto::matches::MatchSummary,
            crate::dto::matches::CreateMatchRequest,
            crate::dto::matches::CreateMatchResponse,
            crate::dto::matches::ExtendTimeRequest,
            crate::dto::matches::ExtendTimeResponse,
            crate::dto::matches::SubmitResultRequest,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::admin::ActionResponse,
            crate::dto::admin::MarkAwayRequest,
            crate::dto::admin::AdjustPointsRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "queue", description = "Queue membership and block views"),
        (name = "matches", description = "Match lifecycle and settlement"),
        (name = "leaderboard", description = "Point standings"),
        (name = "admin", description = "Administrative interventions"),
        (name = "sse", description = "Server-sent events stream"),
    )
)]
pub struct ApiDoc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dto::format_system_time, state::model::MatchState};

/// Match row as shown on the dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    pub id: Uuid,
    pub team1_block_id: u32,
    pub team2_block_id: u32,
    /// RFC 3339 start timestamp.
    pub start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Remaining seconds on the countdown clock.
    pub remaining_time: i64,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team1_won: Option<bool>,
}

impl From<&MatchState> for MatchSummary {
    fn from(state: &MatchState) -> Self {
        Self {
            id: state.id,
            team1_block_id: state.team1_block_id,
            team2_block_id: state.team2_block_id,
            start_time: format_system_time(state.start_time),
            end_time: state.end_time.map(format_system_time),
            remaining_time: state.remaining_time,
            is_active: state.is_active,
            team1_won: state.team1_won,
        }
    }
}

/// Payload pairing two complete blocks into a match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMatchRequest {
    #[validate(range(min = 1))]
    pub block1_id: u32,
    #[validate(range(min = 1))]
    pub block2_id: u32,
}

/// Response returned after a match has been created.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateMatchResponse {
    pub match_id: Uuid,
    pub message: String,
}

/// Payload adjusting the countdown of an active match, in minutes.
/// Negative values shorten the match; the clock never drops below the
/// configured floor.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ExtendTimeRequest {
    #[validate(range(min = -1440, max = 1440))]
    pub minutes: i64,
}

/// Response carrying the countdown after an adjustment.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExtendTimeResponse {
    pub remaining_time: i64,
}

/// Payload settling the outcome of a match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitResultRequest {
    /// Block number of the winning team, as recorded on the match.
    #[validate(range(min = 1))]
    pub winning_block_id: u32,
    /// Optional core MVP award.
    #[serde(default)]
    pub mvp_core_user_id: Option<Uuid>,
    /// Optional support MVP award. Must differ from the core MVP.
    #[serde(default)]
    pub mvp_sup_user_id: Option<Uuid>,
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Generic acknowledgement for administrative actions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Payload punishing an away player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct MarkAwayRequest {
    pub user_id: Uuid,
    /// Punishment length in minutes.
    #[validate(range(min = 1, max = 10080))]
    pub minutes: u64,
}

/// Payload for a manual point adjustment.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AdjustPointsRequest {
    pub user_id: Uuid,
    /// Signed point delta. Totals never drop below zero.
    #[validate(range(min = -10000, max = 10000))]
    pub points: i64,
}

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::UserEntity;

/// Single leaderboard row, ordered by total points.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub id: Uuid,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    pub total_points: i64,
    pub matches_played: u32,
    pub matches_won: u32,
    pub matches_lost: u32,
    pub mvp_core_count: u32,
    pub mvp_sup_count: u32,
}

impl From<&UserEntity> for LeaderboardEntry {
    fn from(user: &UserEntity) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            rank: user.rank.clone(),
            total_points: user.total_points,
            matches_played: user.matches_played,
            matches_won: user.matches_won,
            matches_lost: user.matches_lost,
            mvp_core_count: user.mvp_core_count,
            mvp_sup_count: user.mvp_sup_count,
        }
    }
}

/// Leaderboard response payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

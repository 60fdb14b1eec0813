use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    services::membership::{Membership, QueueTotals},
    state::model::{Block, Player, QueueSnapshot},
};

/// Queued player as shown on the dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub display_name: String,
    /// RFC 3339 timestamp of when the player entered the queue.
    pub joined_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banned_until: Option<String>,
    pub is_vip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    pub matches_played: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            display_name: player.display_name.clone(),
            joined_at: format_system_time(player.joined_at),
            banned_until: player.banned_until.map(format_system_time),
            is_vip: player.is_vip,
            vip_expires_at: player.vip_expires_at.map(format_system_time),
            rank: player.rank.clone(),
            quote: player.quote.clone(),
            matches_played: player.matches_played,
            match_id: player.match_id,
        }
    }
}

/// Block of queued players.
#[derive(Debug, Serialize, ToSchema)]
pub struct BlockSummary {
    /// 1-based positional block number.
    pub id: u32,
    pub is_complete: bool,
    pub players: Vec<PlayerSummary>,
}

impl From<&Block> for BlockSummary {
    fn from(block: &Block) -> Self {
        Self {
            id: block.id,
            is_complete: block.is_complete,
            players: block.players.iter().map(PlayerSummary::from).collect(),
        }
    }
}

/// Aggregate queue counters.
#[derive(Debug, Serialize, ToSchema)]
pub struct QueueStats {
    pub total_players: u32,
    pub players_in_blocks: u32,
    pub players_in_matches: u32,
}

impl From<QueueTotals> for QueueStats {
    fn from(totals: QueueTotals) -> Self {
        Self {
            total_players: totals.total_players,
            players_in_blocks: totals.players_in_blocks,
            players_in_matches: totals.players_in_matches,
        }
    }
}

/// Full queue view: ordered players, assembled blocks and counters.
#[derive(Debug, Serialize, ToSchema)]
pub struct QueueView {
    pub players: Vec<PlayerSummary>,
    pub blocks: Vec<BlockSummary>,
    pub stats: QueueStats,
}

impl QueueView {
    /// Project the snapshot into its wire form.
    pub fn from_snapshot(queue: &QueueSnapshot, totals: QueueTotals) -> Self {
        Self {
            players: queue.players.iter().map(PlayerSummary::from).collect(),
            blocks: queue.blocks.iter().map(BlockSummary::from).collect(),
            stats: totals.into(),
        }
    }
}

/// Response describing the caller's standing in the queue.
#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipResponse {
    pub in_queue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_block_id: Option<u32>,
    pub in_match: bool,
    /// Whether a punishment window is currently open.
    pub punished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punishment_ends_at: Option<String>,
}

impl MembershipResponse {
    pub fn new(membership: Membership, punishment_ends_at: Option<std::time::SystemTime>) -> Self {
        Self {
            in_queue: membership.in_queue,
            current_block_id: membership.current_block_id,
            in_match: membership.in_match,
            punished: punishment_ends_at.is_some(),
            punishment_ends_at: punishment_ends_at.map(format_system_time),
        }
    }
}

/// Acknowledgement returned by the join endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinQueueResponse {
    pub message: String,
    /// True when the caller entered with active VIP priority.
    pub vip_priority: bool,
}

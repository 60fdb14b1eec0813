use std::time::SystemTime;

use uuid::Uuid;

use crate::dao::models::{MatchEntity, QueueEntryEntity, UserEntity};

/// Queued player: the join of a queue row with its user profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// User identifier.
    pub id: Uuid,
    /// Display name shown on the dashboard.
    pub display_name: String,
    /// When the player entered the queue.
    pub joined_at: SystemTime,
    /// Open punishment window, if any.
    pub banned_until: Option<SystemTime>,
    /// VIP flag as stored; priority additionally requires a future expiry.
    pub is_vip: bool,
    /// When VIP priority lapses.
    pub vip_expires_at: Option<SystemTime>,
    /// Rank label.
    pub rank: Option<String>,
    /// Profile quote.
    pub quote: Option<String>,
    /// Lifetime matches played.
    pub matches_played: u32,
    /// Match this queue row is pinned to, once paired.
    pub match_id: Option<Uuid>,
}

impl Player {
    /// Whether the player sorts ahead of non-VIP players at `now`.
    pub fn has_priority(&self, now: SystemTime) -> bool {
        self.is_vip && self.vip_expires_at.is_some_and(|expiry| expiry > now)
    }
}

impl From<(QueueEntryEntity, UserEntity)> for Player {
    fn from((entry, user): (QueueEntryEntity, UserEntity)) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            joined_at: entry.joined_at,
            banned_until: user.banned_until,
            is_vip: user.is_vip,
            vip_expires_at: user.vip_expires_at,
            rank: user.rank,
            quote: user.quote,
            matches_played: user.matches_played,
            match_id: entry.match_id,
        }
    }
}

/// Group of up to `block_size` queued players, recomputed wholesale from the
/// ordered queue. Block numbers are positional, not stable identities.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// 1-based sequence number assigned by queue position.
    pub id: u32,
    /// Players in queue order.
    pub players: Vec<Player>,
    /// True iff the block holds exactly `block_size` players.
    pub is_complete: bool,
}

/// Authoritative in-memory queue snapshot owned by the queue synchronizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    /// Priority-ordered queue.
    pub players: Vec<Player>,
    /// Blocks assembled from `players`.
    pub blocks: Vec<Block>,
}

impl QueueSnapshot {
    /// Look up a block by its positional number.
    pub fn block(&self, id: u32) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    /// Whether the given user currently sits in the queue.
    pub fn contains(&self, user_id: Uuid) -> bool {
        self.players.iter().any(|player| player.id == user_id)
    }
}

/// Normalized runtime view of a match row.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    /// Backend-assigned identifier.
    pub id: Uuid,
    /// Block number of team 1 at creation time.
    pub team1_block_id: u32,
    /// Block number of team 2 at creation time.
    pub team2_block_id: u32,
    /// Start timestamp.
    pub start_time: SystemTime,
    /// End timestamp once inactive.
    pub end_time: Option<SystemTime>,
    /// Remaining seconds; frozen at 0 once inactive.
    pub remaining_time: i64,
    /// Whether the countdown is running.
    pub is_active: bool,
    /// Winner flag, `None` while undecided.
    pub team1_won: Option<bool>,
}

impl MatchState {
    /// Normalize a backend row: countdowns may arrive as strings or be
    /// missing entirely, and old rows may lack a start time.
    pub fn from_entity(entity: MatchEntity, now: SystemTime, default_duration: i64) -> Self {
        let remaining_time = entity
            .remaining_time
            .map(|raw| raw.normalize(default_duration))
            .unwrap_or(default_duration);

        Self {
            id: entity.id,
            team1_block_id: entity.team1_block_id,
            team2_block_id: entity.team2_block_id,
            start_time: entity.start_time.unwrap_or(now),
            end_time: entity.end_time,
            remaining_time,
            is_active: entity.is_active,
            team1_won: entity.team1_won,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::RemainingTimeRaw;

    fn entity(remaining: Option<RemainingTimeRaw>) -> MatchEntity {
        MatchEntity {
            id: Uuid::new_v4(),
            team1_block_id: 1,
            team2_block_id: 2,
            start_time: None,
            end_time: None,
            remaining_time: remaining,
            is_active: true,
            team1_won: None,
        }
    }

    #[test]
    fn missing_remaining_time_defaults_to_duration() {
        let now = SystemTime::now();
        let state = MatchState::from_entity(entity(None), now, 3600);
        assert_eq!(state.remaining_time, 3600);
        assert_eq!(state.start_time, now);
    }

    #[test]
    fn string_remaining_time_is_coerced() {
        let now = SystemTime::now();
        let state =
            MatchState::from_entity(entity(Some(RemainingTimeRaw::Text("120".into()))), now, 3600);
        assert_eq!(state.remaining_time, 120);
    }
}

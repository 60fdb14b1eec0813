use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Profile row persisted for every registered player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Stable identifier for the user.
    pub id: Uuid,
    /// Display name shown on the dashboard.
    pub display_name: String,
    /// Whether the user may invoke admin operations.
    pub is_admin: bool,
    /// Whether the user purchased VIP priority.
    pub is_vip: bool,
    /// When the VIP priority lapses; `None` means never granted.
    pub vip_expires_at: Option<SystemTime>,
    /// Punishment window: the user may not rejoin the queue before this.
    pub banned_until: Option<SystemTime>,
    /// Rank label assigned by admins.
    pub rank: Option<String>,
    /// Profile quote shown on the player card.
    pub quote: Option<String>,
    /// Lifetime point total, never negative.
    pub total_points: i64,
    /// Number of matches the user participated in.
    pub matches_played: u32,
    /// Number of matches won.
    pub matches_won: u32,
    /// Number of matches lost.
    pub matches_lost: u32,
    /// Times awarded MVP-core.
    pub mvp_core_count: u32,
    /// Times awarded MVP-support.
    pub mvp_sup_count: u32,
}

impl UserEntity {
    /// VIP priority counts only while the expiry lies in the future.
    pub fn vip_active(&self, now: SystemTime) -> bool {
        self.is_vip && self.vip_expires_at.is_some_and(|expiry| expiry > now)
    }

    /// Whether a punishment window is still open at `now`.
    pub fn is_banned(&self, now: SystemTime) -> bool {
        self.banned_until.is_some_and(|until| until > now)
    }
}

/// Queue row tying a user to their join time and, once matched, to a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueEntryEntity {
    /// User this entry belongs to; one entry per user.
    pub user_id: Uuid,
    /// When the user entered the queue.
    pub joined_at: SystemTime,
    /// Match the entry was pinned to at pairing time, if any.
    pub match_id: Option<Uuid>,
}

/// Countdown value as the backend hands it back. Kept loose because the
/// hosted store has been observed returning both numbers and strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RemainingTimeRaw {
    /// Countdown in seconds.
    Seconds(i64),
    /// Stringly-typed countdown, parsed on normalization.
    Text(String),
}

impl RemainingTimeRaw {
    /// Coerce to seconds, substituting `fallback` for unparseable text.
    pub fn normalize(&self, fallback: i64) -> i64 {
        match self {
            RemainingTimeRaw::Seconds(value) => *value,
            RemainingTimeRaw::Text(text) => text.trim().parse().unwrap_or(fallback),
        }
    }
}

/// Match row pairing two blocks, with countdown and outcome fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    /// Stable identifier assigned at creation.
    pub id: Uuid,
    /// Block number of team 1 as it existed at creation time.
    pub team1_block_id: u32,
    /// Block number of team 2 as it existed at creation time.
    pub team2_block_id: u32,
    /// When the match started; missing rows default to "now" on sync.
    pub start_time: Option<SystemTime>,
    /// When the match ended, once inactive.
    pub end_time: Option<SystemTime>,
    /// Remaining seconds; missing rows default to the configured duration.
    pub remaining_time: Option<RemainingTimeRaw>,
    /// Whether the countdown is still running.
    pub is_active: bool,
    /// Winner flag: `Some(true)` team 1 won, `Some(false)` team 2 won,
    /// `None` undecided.
    pub team1_won: Option<bool>,
}

/// Atomic adjustment applied to a user's scoring counters in one backend
/// round trip. The backend floors `total_points` at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    /// Signed point delta.
    pub points: i64,
    /// Increment for matches played.
    pub matches_played: u32,
    /// Increment for matches won.
    pub matches_won: u32,
    /// Increment for matches lost.
    pub matches_lost: u32,
    /// Increment for MVP-core awards.
    pub mvp_core: u32,
    /// Increment for MVP-support awards.
    pub mvp_sup: u32,
}

impl StatsDelta {
    /// Raw point adjustment with no counter changes.
    pub fn points(points: i64) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Delta recorded when a player's match begins.
    pub fn match_started() -> Self {
        Self {
            matches_played: 1,
            ..Self::default()
        }
    }

    /// Delta for a player on the winning team.
    pub fn win(points: i64) -> Self {
        Self {
            points,
            matches_won: 1,
            ..Self::default()
        }
    }

    /// Delta for a player on the losing team.
    pub fn loss(points: i64) -> Self {
        Self {
            points,
            matches_lost: 1,
            ..Self::default()
        }
    }

    /// Delta for the MVP-core award.
    pub fn mvp_core(points: i64) -> Self {
        Self {
            points,
            mvp_core: 1,
            ..Self::default()
        }
    }

    /// Delta for the MVP-support award.
    pub fn mvp_sup(points: i64) -> Self {
        Self {
            points,
            mvp_sup: 1,
            ..Self::default()
        }
    }

    /// Apply the delta to an in-memory user row, flooring points at zero.
    pub fn apply(&self, user: &mut UserEntity) {
        user.total_points = (user.total_points + self.points).max(0);
        user.matches_played += self.matches_played;
        user.matches_won += self.matches_won;
        user.matches_lost += self.matches_lost;
        user.mvp_core_count += self.mvp_core;
        user.mvp_sup_count += self.mvp_sup;
    }
}

/// Logical tables exposed by the data backend's change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// User profiles and scoring counters.
    Users,
    /// Queue membership rows.
    QueueEntries,
    /// Match rows.
    Matches,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn user(points: i64) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            display_name: "tester".into(),
            is_admin: false,
            is_vip: false,
            vip_expires_at: None,
            banned_until: None,
            rank: None,
            quote: None,
            total_points: points,
            matches_played: 0,
            matches_won: 0,
            matches_lost: 0,
            mvp_core_count: 0,
            mvp_sup_count: 0,
        }
    }

    #[test]
    fn remaining_time_normalizes_strings_and_numbers() {
        assert_eq!(RemainingTimeRaw::Seconds(1200).normalize(3600), 1200);
        assert_eq!(RemainingTimeRaw::Text("450".into()).normalize(3600), 450);
        assert_eq!(RemainingTimeRaw::Text(" 90 ".into()).normalize(3600), 90);
        assert_eq!(RemainingTimeRaw::Text("junk".into()).normalize(3600), 3600);
    }

    #[test]
    fn stats_delta_floors_points_at_zero() {
        let mut row = user(10);
        StatsDelta::loss(-25).apply(&mut row);
        assert_eq!(row.total_points, 0);
        assert_eq!(row.matches_lost, 1);
    }

    #[test]
    fn vip_priority_requires_future_expiry() {
        let now = SystemTime::now();
        let mut row = user(0);
        row.is_vip = true;
        assert!(!row.vip_active(now));
        row.vip_expires_at = Some(now + Duration::from_secs(60));
        assert!(row.vip_active(now));
        row.vip_expires_at = Some(now - Duration::from_secs(60));
        assert!(!row.vip_active(now));
    }
}

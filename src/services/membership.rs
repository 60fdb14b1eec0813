//! Membership resolution against the published snapshots. Pure functions so
//! the join/leave preconditions can be tested without a backend.

use uuid::Uuid;

use crate::state::model::{MatchState, QueueSnapshot};

/// Where a user currently stands relative to the queue and active matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    /// User holds a queue row.
    pub in_queue: bool,
    /// Number of the block the user sits in, if any.
    pub current_block_id: Option<u32>,
    /// User participates in an active match.
    pub in_match: bool,
}

/// Aggregate counters shown on the dashboard header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueTotals {
    /// Everyone holding a queue row.
    pub total_players: u32,
    /// Players sitting in complete blocks.
    pub players_in_blocks: u32,
    /// Players participating in active matches.
    pub players_in_matches: u32,
}

/// Resolve a user's standing from the current snapshots.
pub fn resolve(user_id: Uuid, queue: &QueueSnapshot, matches: &[MatchState]) -> Membership {
    let current_block_id = queue
        .blocks
        .iter()
        .find(|block| block.players.iter().any(|p| p.id == user_id))
        .map(|block| block.id);

    let in_match = matches
        .iter()
        .filter(|m| m.is_active)
        .any(|m| match_contains(queue, m, user_id));

    Membership {
        in_queue: queue.contains(user_id),
        current_block_id,
        in_match,
    }
}

/// Whether `user_id` participates in the given match.
///
/// The pinned roster on the queue rows is authoritative. Only when no row is
/// pinned to the match at all do we fall back to the block numbers recorded
/// at creation time, which drift as the queue reshuffles.
pub fn match_contains(queue: &QueueSnapshot, m: &MatchState, user_id: Uuid) -> bool {
    let mut pinned_any = false;
    for player in &queue.players {
        if player.match_id == Some(m.id) {
            if player.id == user_id {
                return true;
            }
            pinned_any = true;
        }
    }
    if pinned_any {
        return false;
    }

    [m.team1_block_id, m.team2_block_id].iter().any(|block_id| {
        queue
            .block(*block_id)
            .is_some_and(|block| block.players.iter().any(|p| p.id == user_id))
    })
}

/// Compute the dashboard counters from the current snapshots.
pub fn totals(queue: &QueueSnapshot, matches: &[MatchState]) -> QueueTotals {
    let players_in_blocks = queue
        .blocks
        .iter()
        .filter(|block| block.is_complete)
        .map(|block| block.players.len() as u32)
        .sum();

    let players_in_matches = queue
        .players
        .iter()
        .filter(|player| {
            matches
                .iter()
                .filter(|m| m.is_active)
                .any(|m| match_contains(queue, m, player.id))
        })
        .count() as u32;

    QueueTotals {
        total_players: queue.players.len() as u32,
        players_in_blocks,
        players_in_matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::blocks;
    use crate::state::model::Player;
    use std::time::SystemTime;

    fn player(id: Uuid, match_id: Option<Uuid>) -> Player {
        Player {
            id,
            display_name: "p".into(),
            joined_at: SystemTime::UNIX_EPOCH,
            banned_until: None,
            is_vip: false,
            vip_expires_at: None,
            rank: None,
            quote: None,
            matches_played: 0,
            match_id,
        }
    }

    fn snapshot(players: Vec<Player>) -> QueueSnapshot {
        let blocks = blocks::assemble(&players, 5);
        QueueSnapshot { players, blocks }
    }

    fn active_match(id: Uuid, team1: u32, team2: u32) -> MatchState {
        MatchState {
            id,
            team1_block_id: team1,
            team2_block_id: team2,
            start_time: SystemTime::UNIX_EPOCH,
            end_time: None,
            remaining_time: 3600,
            is_active: true,
            team1_won: None,
        }
    }

    #[test]
    fn pinned_roster_wins_over_block_numbers() {
        let match_id = Uuid::new_v4();
        let pinned = Uuid::new_v4();
        let bystander = Uuid::new_v4();
        // The bystander sits in block 1, which the match still names, but the
        // roster is pinned to someone else.
        let queue = snapshot(vec![player(bystander, None), player(pinned, Some(match_id))]);
        let m = active_match(match_id, 1, 2);

        assert!(match_contains(&queue, &m, pinned));
        assert!(!match_contains(&queue, &m, bystander));
    }

    #[test]
    fn block_fallback_applies_only_without_pins() {
        let match_id = Uuid::new_v4();
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let queue = snapshot(ids.iter().map(|id| player(*id, None)).collect());
        let m = active_match(match_id, 1, 2);

        for id in &ids {
            assert!(match_contains(&queue, &m, *id));
        }
        assert!(!match_contains(&queue, &m, Uuid::new_v4()));
    }

    #[test]
    fn membership_reports_queue_block_and_match() {
        let match_id = Uuid::new_v4();
        let in_match = Uuid::new_v4();
        let queued = Uuid::new_v4();
        let queue = snapshot(vec![player(in_match, Some(match_id)), player(queued, None)]);
        let matches = vec![active_match(match_id, 1, 2)];

        let a = resolve(in_match, &queue, &matches);
        assert!(a.in_queue && a.in_match);
        assert_eq!(a.current_block_id, Some(1));

        let b = resolve(queued, &queue, &matches);
        assert!(b.in_queue && !b.in_match);

        let c = resolve(Uuid::new_v4(), &queue, &matches);
        assert_eq!(c, Membership::default());
    }

    #[test]
    fn inactive_matches_never_count() {
        let match_id = Uuid::new_v4();
        let id = Uuid::new_v4();
        let queue = snapshot(vec![player(id, Some(match_id))]);
        let mut m = active_match(match_id, 1, 2);
        m.is_active = false;

        assert!(!resolve(id, &queue, &[m]).in_match);
    }

    #[test]
    fn totals_count_complete_blocks_and_pinned_players() {
        let match_id = Uuid::new_v4();
        let mut players: Vec<Player> = (0..5)
            .map(|_| player(Uuid::new_v4(), Some(match_id)))
            .collect();
        players.push(player(Uuid::new_v4(), None));
        let queue = snapshot(players);
        let matches = vec![active_match(match_id, 1, 2)];

        let t = totals(&queue, &matches);
        assert_eq!(t.total_players, 6);
        assert_eq!(t.players_in_blocks, 5);
        assert_eq!(t.players_in_matches, 5);
    }
}

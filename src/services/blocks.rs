//! Pure queue ordering and block assembly. No side effects, no backend
//! calls; the queue synchronizer feeds this with fetched rows.

use std::cmp::Ordering;
use std::time::SystemTime;

use crate::state::model::{Block, Player};

/// Sort the queue in priority order: players with active VIP status come
/// first, ties broken by ascending join time. An expired VIP flag earns no
/// priority.
pub fn priority_sort(players: &mut [Player], now: SystemTime) {
    players.sort_by(|a, b| match (a.has_priority(now), b.has_priority(now)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.joined_at.cmp(&b.joined_at),
    });
}

/// Partition the ordered queue into consecutive blocks of `block_size`.
///
/// Numbering restarts at 1 on every call; blocks have no identity across
/// queue changes. An empty queue yields an empty block list.
pub fn assemble(players: &[Player], block_size: usize) -> Vec<Block> {
    players
        .chunks(block_size)
        .enumerate()
        .map(|(index, chunk)| Block {
            id: index as u32 + 1,
            players: chunk.to_vec(),
            is_complete: chunk.len() == block_size,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    fn player(joined_offset_secs: u64) -> Player {
        Player {
            id: Uuid::new_v4(),
            display_name: format!("player-{joined_offset_secs}"),
            joined_at: SystemTime::UNIX_EPOCH + Duration::from_secs(joined_offset_secs),
            banned_until: None,
            is_vip: false,
            vip_expires_at: None,
            rank: None,
            quote: None,
            matches_played: 0,
            match_id: None,
        }
    }

    fn vip(joined_offset_secs: u64, expires_offset_secs: u64) -> Player {
        let mut p = player(joined_offset_secs);
        p.is_vip = true;
        p.vip_expires_at = Some(SystemTime::UNIX_EPOCH + Duration::from_secs(expires_offset_secs));
        p
    }

    #[test]
    fn empty_queue_yields_no_blocks() {
        assert!(assemble(&[], 5).is_empty());
    }

    #[test]
    fn blocks_partition_the_queue_contiguously() {
        for len in 0..23usize {
            let players: Vec<_> = (0..len as u64).map(player).collect();
            let blocks = assemble(&players, 5);

            assert_eq!(blocks.len(), len.div_ceil(5));
            for (index, block) in blocks.iter().enumerate() {
                assert_eq!(block.id, index as u32 + 1);
                let expected = if index < len / 5 { 5 } else { len % 5 };
                assert_eq!(block.players.len(), expected);
                assert_eq!(block.is_complete, expected == 5);
                // Block k holds queue positions [(k-1)*5, k*5).
                assert_eq!(block.players[0], players[index * 5]);
            }
        }
    }

    #[test]
    fn active_vips_sort_before_everyone_else() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(50);
        // Joined T=1 (VIP until 100), T=2 (non-VIP), T=3 (VIP expired at 10).
        let active_vip = vip(1, 100);
        let regular = player(2);
        let expired_vip = vip(3, 10);

        let mut queue = vec![expired_vip.clone(), regular.clone(), active_vip.clone()];
        priority_sort(&mut queue, now);

        assert_eq!(queue, vec![active_vip, regular, expired_vip]);
    }

    #[test]
    fn join_time_orders_within_each_priority_group() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(50);
        let mut queue = vec![vip(8, 100), player(6), vip(4, 100), player(2)];
        priority_sort(&mut queue, now);

        let joined: Vec<_> = queue.iter().map(|p| p.joined_at).collect();
        assert_eq!(
            joined,
            vec![
                SystemTime::UNIX_EPOCH + Duration::from_secs(4),
                SystemTime::UNIX_EPOCH + Duration::from_secs(8),
                SystemTime::UNIX_EPOCH + Duration::from_secs(2),
                SystemTime::UNIX_EPOCH + Duration::from_secs(6),
            ]
        );
    }
}

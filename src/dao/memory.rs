use std::{sync::Arc, time::SystemTime};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dao::{
    backend::{ChangeFeed, DataBackend},
    models::{MatchEntity, QueueEntryEntity, StatsDelta, Table, UserEntity},
    storage::StorageResult,
};

/// In-memory [`DataBackend`] used by the test suite and by feature-less
/// builds. Mutations notify the change feed exactly like the hosted store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: DashMap<Uuid, UserEntity>,
    queue_entries: DashMap<Uuid, QueueEntryEntity>,
    matches: DashMap<Uuid, MatchEntity>,
    feed: ChangeFeed,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user row directly; registration itself is owned by the
    /// external account store, so it is not part of the backend trait.
    pub fn seed_user(&self, user: UserEntity) {
        self.inner.users.insert(user.id, user);
        self.inner.feed.notify(Table::Users);
    }

    /// Seed a minimal user row and return its identifier.
    pub fn seed_player(&self, display_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.seed_user(UserEntity {
            id,
            display_name: display_name.to_string(),
            is_admin: false,
            is_vip: false,
            vip_expires_at: None,
            banned_until: None,
            rank: None,
            quote: None,
            total_points: 0,
            matches_played: 0,
            matches_won: 0,
            matches_lost: 0,
            mvp_core_count: 0,
            mvp_sup_count: 0,
        });
        id
    }

    /// Edit a seeded user row in place.
    pub fn update_user(&self, id: Uuid, edit: impl FnOnce(&mut UserEntity)) {
        if let Some(mut row) = self.inner.users.get_mut(&id) {
            edit(&mut row);
        }
        self.inner.feed.notify(Table::Users);
    }

    /// Insert a queue row directly, bypassing the service preconditions.
    pub fn enqueue(&self, user_id: Uuid, joined_at: SystemTime) {
        self.inner.queue_entries.insert(
            user_id,
            QueueEntryEntity {
                user_id,
                joined_at,
                match_id: None,
            },
        );
        self.inner.feed.notify(Table::QueueEntries);
    }

    /// Snapshot a user row without going through the trait, for assertions.
    pub fn user(&self, id: Uuid) -> Option<UserEntity> {
        self.inner.users.get(&id).map(|row| row.clone())
    }

    /// Snapshot a match row without going through the trait, for assertions.
    pub fn match_row(&self, id: Uuid) -> Option<MatchEntity> {
        self.inner.matches.get(&id).map(|row| row.clone())
    }
}

impl DataBackend for MemoryBackend {
    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner.users.iter().map(|entry| entry.value().clone()).collect())
        })
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.users.get(&id).map(|row| row.clone())) })
    }

    fn adjust_user_stats(
        &self,
        id: Uuid,
        delta: StatsDelta,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            if let Some(mut row) = inner.users.get_mut(&id) {
                delta.apply(&mut row);
            }
            inner.feed.notify(Table::Users);
            Ok(())
        })
    }

    fn set_ban_until(
        &self,
        id: Uuid,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            if let Some(mut row) = inner.users.get_mut(&id) {
                row.banned_until = Some(until);
            }
            inner.feed.notify(Table::Users);
            Ok(())
        })
    }

    fn list_queue_entries(&self) -> BoxFuture<'static, StorageResult<Vec<QueueEntryEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .queue_entries
                .iter()
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn insert_queue_entry(
        &self,
        entry: QueueEntryEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.queue_entries.insert(entry.user_id, entry);
            inner.feed.notify(Table::QueueEntries);
            Ok(())
        })
    }

    fn delete_queue_entries(
        &self,
        user_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut removed = 0;
            for user_id in user_ids {
                if inner.queue_entries.remove(&user_id).is_some() {
                    removed += 1;
                }
            }
            inner.feed.notify(Table::QueueEntries);
            Ok(removed)
        })
    }

    fn clear_queue(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let removed = inner.queue_entries.len() as u64;
            inner.queue_entries.clear();
            inner.feed.notify(Table::QueueEntries);
            Ok(removed)
        })
    }

    fn assign_match(
        &self,
        user_ids: Vec<Uuid>,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            for user_id in user_ids {
                if let Some(mut entry) = inner.queue_entries.get_mut(&user_id) {
                    entry.match_id = Some(match_id);
                }
            }
            inner.feed.notify(Table::QueueEntries);
            Ok(())
        })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .matches
                .iter()
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn insert_match(&self, entry: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.matches.insert(entry.id, entry);
            inner.feed.notify(Table::Matches);
            Ok(())
        })
    }

    fn update_match_remaining(
        &self,
        id: Uuid,
        remaining: i64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            if let Some(mut row) = inner.matches.get_mut(&id) {
                row.remaining_time = Some(crate::dao::models::RemainingTimeRaw::Seconds(remaining));
            }
            inner.feed.notify(Table::Matches);
            Ok(())
        })
    }

    fn finish_match(
        &self,
        id: Uuid,
        ended_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            if let Some(mut row) = inner.matches.get_mut(&id) {
                row.is_active = false;
                row.end_time = Some(ended_at);
                row.remaining_time = Some(crate::dao::models::RemainingTimeRaw::Seconds(0));
            }
            inner.feed.notify(Table::Matches);
            Ok(())
        })
    }

    fn set_match_winner(
        &self,
        id: Uuid,
        team1_won: bool,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            if let Some(mut row) = inner.matches.get_mut(&id) {
                row.team1_won = Some(team1_won);
            }
            inner.feed.notify(Table::Matches);
            Ok(())
        })
    }

    fn deactivate_active_matches(
        &self,
        ended_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut flipped = 0;
            for mut row in inner.matches.iter_mut() {
                if row.is_active {
                    row.is_active = false;
                    row.end_time = Some(ended_at);
                    row.remaining_time =
                        Some(crate::dao::models::RemainingTimeRaw::Seconds(0));
                    flipped += 1;
                }
            }
            inner.feed.notify(Table::Matches);
            Ok(flipped)
        })
    }

    fn changes(&self, table: Table) -> broadcast::Receiver<()> {
        self.inner.feed.subscribe(table)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

use std::time::SystemTime;

use futures::future::BoxFuture;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dao::{
    models::{MatchEntity, QueueEntryEntity, StatsDelta, Table, UserEntity},
    storage::StorageResult,
};

/// Abstraction over the hosted relational backend: row CRUD on the three
/// core tables plus a per-table "something changed, re-fetch" feed.
///
/// All business rules live in the service layer; implementations only move
/// rows. Mutating methods must emit a change notification for the touched
/// table so synchronizers converge without manual refreshes.
pub trait DataBackend: Send + Sync {
    /// Fetch every user profile row.
    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;
    /// Look up a single user by id.
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Atomically adjust one user's points and counters. Points are floored
    /// at zero backend-side so concurrent admin actions cannot drive a total
    /// negative or lose an update.
    fn adjust_user_stats(
        &self,
        id: Uuid,
        delta: StatsDelta,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Set the punishment window on a user.
    fn set_ban_until(
        &self,
        id: Uuid,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Fetch every queue row, matched and unmatched alike.
    fn list_queue_entries(&self) -> BoxFuture<'static, StorageResult<Vec<QueueEntryEntity>>>;
    /// Insert a queue row; replaces any stale row for the same user.
    fn insert_queue_entry(
        &self,
        entry: QueueEntryEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete the queue rows of the given users, returning how many existed.
    /// Deleting an already-absent row is not an error.
    fn delete_queue_entries(&self, user_ids: Vec<Uuid>)
    -> BoxFuture<'static, StorageResult<u64>>;
    /// Delete every queue row unconditionally.
    fn clear_queue(&self) -> BoxFuture<'static, StorageResult<u64>>;
    /// Pin the given users' queue rows to a match.
    fn assign_match(
        &self,
        user_ids: Vec<Uuid>,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Fetch every match row, active and historical.
    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
    /// Insert a freshly created match row.
    fn insert_match(&self, entry: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Checkpoint the countdown of one match.
    fn update_match_remaining(
        &self,
        id: Uuid,
        remaining: i64,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Mark one match inactive with `end_time = ended_at` and zero remaining
    /// time. Idempotent: finishing an already-inactive match succeeds.
    fn finish_match(
        &self,
        id: Uuid,
        ended_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Record which team won.
    fn set_match_winner(
        &self,
        id: Uuid,
        team1_won: bool,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Mark every active match inactive, returning how many were flipped.
    fn deactivate_active_matches(
        &self,
        ended_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>>;

    /// Subscribe to the change feed of one table.
    fn changes(&self, table: Table) -> broadcast::Receiver<()>;
    /// Probe connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a dropped connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Per-table broadcast senders backing [`DataBackend::changes`].
///
/// Notifications carry no payload; subscribers re-fetch whatever they own.
#[derive(Debug)]
pub struct ChangeFeed {
    users: broadcast::Sender<()>,
    queue_entries: broadcast::Sender<()>,
    matches: broadcast::Sender<()>,
}

impl ChangeFeed {
    /// Create a feed with the given per-table channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (users, _) = broadcast::channel(capacity);
        let (queue_entries, _) = broadcast::channel(capacity);
        let (matches, _) = broadcast::channel(capacity);
        Self {
            users,
            queue_entries,
            matches,
        }
    }

    /// Signal that rows in `table` changed, ignoring missing subscribers.
    pub fn notify(&self, table: Table) {
        let _ = self.sender(table).send(());
    }

    /// Register a subscriber for `table`.
    pub fn subscribe(&self, table: Table) -> broadcast::Receiver<()> {
        self.sender(table).subscribe()
    }

    fn sender(&self, table: Table) -> &broadcast::Sender<()> {
        match table {
            Table::Users => &self.users,
            Table::QueueEntries => &self.queue_entries,
            Table::Matches => &self.matches,
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(16)
    }
}

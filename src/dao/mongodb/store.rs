use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoMatchDocument, MongoQueueEntryDocument, MongoUserDocument, doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    backend::{ChangeFeed, DataBackend},
    models::{MatchEntity, QueueEntryEntity, StatsDelta, Table, UserEntity},
    storage::StorageResult,
};

const USER_COLLECTION_NAME: &str = "users";
const QUEUE_COLLECTION_NAME: &str = "queue_entries";
const MATCH_COLLECTION_NAME: &str = "matches";

/// MongoDB-backed [`DataBackend`].
///
/// Change notifications are emitted locally after each mutation; the hosted
/// realtime feed is approximated rather than tailed (change streams need a
/// replica set).
#[derive(Clone)]
pub struct MongoBackend {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
    feed: ChangeFeed,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoBackend {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
            feed: ChangeFeed::default(),
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let queue = database.collection::<MongoQueueEntryDocument>(QUEUE_COLLECTION_NAME);
        let queue_index = mongodb::IndexModel::builder()
            .keys(doc! {"match_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("queue_match_idx".to_owned()))
                    .build(),
            )
            .build();
        queue
            .create_index(queue_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUEUE_COLLECTION_NAME,
                index: "match_id",
                source,
            })?;

        let matches = database.collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME);
        let active_index = mongodb::IndexModel::builder()
            .keys(doc! {"is_active": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("match_active_idx".to_owned()))
                    .build(),
            )
            .build();
        matches
            .create_index(active_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: MATCH_COLLECTION_NAME,
                index: "is_active",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn user_collection(&self) -> Collection<MongoUserDocument> {
        self.database()
            .await
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    async fn queue_collection(&self) -> Collection<MongoQueueEntryDocument> {
        self.database()
            .await
            .collection::<MongoQueueEntryDocument>(QUEUE_COLLECTION_NAME)
    }

    async fn match_collection(&self) -> Collection<MongoMatchDocument> {
        self.database()
            .await
            .collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
    }

    async fn list_users(&self) -> MongoResult<Vec<UserEntity>> {
        let documents: Vec<MongoUserDocument> = self
            .user_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListRows {
                collection: USER_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListRows {
                collection: USER_COLLECTION_NAME,
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_user(&self, id: Uuid) -> MongoResult<Option<UserEntity>> {
        let document = self
            .user_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadUser { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn adjust_user_stats(&self, id: Uuid, delta: StatsDelta) -> MongoResult<()> {
        // Aggregation-pipeline update: clamp and increment server-side so
        // concurrent adjustments cannot lose each other.
        let update = vec![doc! {"$set": {
            "total_points": {"$max": [0i64, {"$add": [{"$ifNull": ["$total_points", 0i64]}, delta.points]}]},
            "matches_played": {"$add": [{"$ifNull": ["$matches_played", 0i64]}, delta.matches_played as i64]},
            "matches_won": {"$add": [{"$ifNull": ["$matches_won", 0i64]}, delta.matches_won as i64]},
            "matches_lost": {"$add": [{"$ifNull": ["$matches_lost", 0i64]}, delta.matches_lost as i64]},
            "mvp_core_count": {"$add": [{"$ifNull": ["$mvp_core_count", 0i64]}, delta.mvp_core as i64]},
            "mvp_sup_count": {"$add": [{"$ifNull": ["$mvp_sup_count", 0i64]}, delta.mvp_sup as i64]},
        }}];

        self.user_collection()
            .await
            .update_one(doc_id(id), update)
            .await
            .map_err(|source| MongoDaoError::UpdateUser { id, source })?;

        self.inner.feed.notify(Table::Users);
        Ok(())
    }

    async fn set_ban_until(&self, id: Uuid, until: SystemTime) -> MongoResult<()> {
        self.user_collection()
            .await
            .update_one(
                doc_id(id),
                doc! {"$set": {"banned_until": DateTime::from_system_time(until)}},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateUser { id, source })?;

        self.inner.feed.notify(Table::Users);
        Ok(())
    }

    async fn list_queue_entries(&self) -> MongoResult<Vec<QueueEntryEntity>> {
        let documents: Vec<MongoQueueEntryDocument> = self
            .queue_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListRows {
                collection: QUEUE_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListRows {
                collection: QUEUE_COLLECTION_NAME,
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn insert_queue_entry(&self, entry: QueueEntryEntity) -> MongoResult<()> {
        let user_id = entry.user_id;
        let document: MongoQueueEntryDocument = entry.into();
        self.queue_collection()
            .await
            .replace_one(doc_id(user_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::WriteQueue { source })?;

        self.inner.feed.notify(Table::QueueEntries);
        Ok(())
    }

    async fn delete_queue_entries(&self, user_ids: Vec<Uuid>) -> MongoResult<u64> {
        let ids: Vec<_> = user_ids.into_iter().map(uuid_as_binary).collect();
        let result = self
            .queue_collection()
            .await
            .delete_many(doc! {"_id": {"$in": ids}})
            .await
            .map_err(|source| MongoDaoError::WriteQueue { source })?;

        self.inner.feed.notify(Table::QueueEntries);
        Ok(result.deleted_count)
    }

    async fn clear_queue(&self) -> MongoResult<u64> {
        let result = self
            .queue_collection()
            .await
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::WriteQueue { source })?;

        self.inner.feed.notify(Table::QueueEntries);
        Ok(result.deleted_count)
    }

    async fn assign_match(&self, user_ids: Vec<Uuid>, match_id: Uuid) -> MongoResult<()> {
        let ids: Vec<_> = user_ids.into_iter().map(uuid_as_binary).collect();
        self.queue_collection()
            .await
            .update_many(
                doc! {"_id": {"$in": ids}},
                doc! {"$set": {"match_id": uuid_as_binary(match_id)}},
            )
            .await
            .map_err(|source| MongoDaoError::WriteQueue { source })?;

        self.inner.feed.notify(Table::QueueEntries);
        Ok(())
    }

    async fn list_matches(&self) -> MongoResult<Vec<MatchEntity>> {
        let documents: Vec<MongoMatchDocument> = self
            .match_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListRows {
                collection: MATCH_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListRows {
                collection: MATCH_COLLECTION_NAME,
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn insert_match(&self, entry: MatchEntity) -> MongoResult<()> {
        let id = entry.id;
        let document: MongoMatchDocument = entry.into();
        self.match_collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::WriteMatch { id, source })?;

        self.inner.feed.notify(Table::Matches);
        Ok(())
    }

    async fn update_match_remaining(&self, id: Uuid, remaining: i64) -> MongoResult<()> {
        self.match_collection()
            .await
            .update_one(doc_id(id), doc! {"$set": {"remaining_time": remaining}})
            .await
            .map_err(|source| MongoDaoError::WriteMatch { id, source })?;

        self.inner.feed.notify(Table::Matches);
        Ok(())
    }

    async fn finish_match(&self, id: Uuid, ended_at: SystemTime) -> MongoResult<()> {
        self.match_collection()
            .await
            .update_one(
                doc_id(id),
                doc! {"$set": {
                    "is_active": false,
                    "end_time": DateTime::from_system_time(ended_at),
                    "remaining_time": 0i64,
                }},
            )
            .await
            .map_err(|source| MongoDaoError::WriteMatch { id, source })?;

        self.inner.feed.notify(Table::Matches);
        Ok(())
    }

    async fn set_match_winner(&self, id: Uuid, team1_won: bool) -> MongoResult<()> {
        self.match_collection()
            .await
            .update_one(doc_id(id), doc! {"$set": {"team1_won": team1_won}})
            .await
            .map_err(|source| MongoDaoError::WriteMatch { id, source })?;

        self.inner.feed.notify(Table::Matches);
        Ok(())
    }

    async fn deactivate_active_matches(&self, ended_at: SystemTime) -> MongoResult<u64> {
        let result = self
            .match_collection()
            .await
            .update_many(
                doc! {"is_active": true},
                doc! {"$set": {
                    "is_active": false,
                    "end_time": DateTime::from_system_time(ended_at),
                    "remaining_time": 0i64,
                }},
            )
            .await
            .map_err(|source| MongoDaoError::DeactivateMatches { source })?;

        self.inner.feed.notify(Table::Matches);
        Ok(result.modified_count)
    }
}

impl DataBackend for MongoBackend {
    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_users().await.map_err(Into::into) })
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user(id).await.map_err(Into::into) })
    }

    fn adjust_user_stats(
        &self,
        id: Uuid,
        delta: StatsDelta,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.adjust_user_stats(id, delta).await.map_err(Into::into) })
    }

    fn set_ban_until(&self, id: Uuid, until: SystemTime) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.set_ban_until(id, until).await.map_err(Into::into) })
    }

    fn list_queue_entries(&self) -> BoxFuture<'static, StorageResult<Vec<QueueEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_queue_entries().await.map_err(Into::into) })
    }

    fn insert_queue_entry(&self, entry: QueueEntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_queue_entry(entry).await.map_err(Into::into) })
    }

    fn delete_queue_entries(&self, user_ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_queue_entries(user_ids)
                .await
                .map_err(Into::into)
        })
    }

    fn clear_queue(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.clear_queue().await.map_err(Into::into) })
    }

    fn assign_match(
        &self,
        user_ids: Vec<Uuid>,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .assign_match(user_ids, match_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches().await.map_err(Into::into) })
    }

    fn insert_match(&self, entry: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_match(entry).await.map_err(Into::into) })
    }

    fn update_match_remaining(
        &self,
        id: Uuid,
        remaining: i64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_match_remaining(id, remaining)
                .await
                .map_err(Into::into)
        })
    }

    fn finish_match(&self, id: Uuid, ended_at: SystemTime) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.finish_match(id, ended_at).await.map_err(Into::into) })
    }

    fn set_match_winner(&self, id: Uuid, team1_won: bool) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .set_match_winner(id, team1_won)
                .await
                .map_err(Into::into)
        })
    }

    fn deactivate_active_matches(
        &self,
        ended_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .deactivate_active_matches(ended_at)
                .await
                .map_err(Into::into)
        })
    }

    fn changes(&self, table: Table) -> broadcast::Receiver<()> {
        self.inner.feed.subscribe(table)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

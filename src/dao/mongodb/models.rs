use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{MatchEntity, QueueEntryEntity, RemainingTimeRaw, UserEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    display_name: String,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    is_vip: bool,
    vip_expires_at: Option<DateTime>,
    banned_until: Option<DateTime>,
    rank: Option<String>,
    quote: Option<String>,
    #[serde(default)]
    total_points: i64,
    #[serde(default)]
    matches_played: i64,
    #[serde(default)]
    matches_won: i64,
    #[serde(default)]
    matches_lost: i64,
    #[serde(default)]
    mvp_core_count: i64,
    #[serde(default)]
    mvp_sup_count: i64,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name,
            is_admin: value.is_admin,
            is_vip: value.is_vip,
            vip_expires_at: value.vip_expires_at.map(DateTime::from_system_time),
            banned_until: value.banned_until.map(DateTime::from_system_time),
            rank: value.rank,
            quote: value.quote,
            total_points: value.total_points,
            matches_played: value.matches_played.into(),
            matches_won: value.matches_won.into(),
            matches_lost: value.matches_lost.into(),
            mvp_core_count: value.mvp_core_count.into(),
            mvp_sup_count: value.mvp_sup_count.into(),
        }
    }
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name,
            is_admin: value.is_admin,
            is_vip: value.is_vip,
            vip_expires_at: value.vip_expires_at.map(|ts| ts.to_system_time()),
            banned_until: value.banned_until.map(|ts| ts.to_system_time()),
            rank: value.rank,
            quote: value.quote,
            total_points: value.total_points,
            matches_played: clamp_counter(value.matches_played),
            matches_won: clamp_counter(value.matches_won),
            matches_lost: clamp_counter(value.matches_lost),
            mvp_core_count: clamp_counter(value.mvp_core_count),
            mvp_sup_count: clamp_counter(value.mvp_sup_count),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQueueEntryDocument {
    #[serde(rename = "_id")]
    user_id: Uuid,
    joined_at: DateTime,
    #[serde(default)]
    match_id: Option<Uuid>,
}

impl From<QueueEntryEntity> for MongoQueueEntryDocument {
    fn from(value: QueueEntryEntity) -> Self {
        Self {
            user_id: value.user_id,
            joined_at: DateTime::from_system_time(value.joined_at),
            match_id: value.match_id,
        }
    }
}

impl From<MongoQueueEntryDocument> for QueueEntryEntity {
    fn from(value: MongoQueueEntryDocument) -> Self {
        Self {
            user_id: value.user_id,
            joined_at: value.joined_at.to_system_time(),
            match_id: value.match_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    team1_block_id: u32,
    team2_block_id: u32,
    start_time: Option<DateTime>,
    end_time: Option<DateTime>,
    /// Left loose on purpose: older rows carry the countdown as a string.
    #[serde(default)]
    remaining_time: Option<RemainingTimeRaw>,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    team1_won: Option<bool>,
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id,
            team1_block_id: value.team1_block_id,
            team2_block_id: value.team2_block_id,
            start_time: value.start_time.map(DateTime::from_system_time),
            end_time: value.end_time.map(DateTime::from_system_time),
            remaining_time: value.remaining_time,
            is_active: value.is_active,
            team1_won: value.team1_won,
        }
    }
}

impl From<MongoMatchDocument> for MatchEntity {
    fn from(value: MongoMatchDocument) -> Self {
        Self {
            id: value.id,
            team1_block_id: value.team1_block_id,
            team2_block_id: value.team2_block_id,
            start_time: value.start_time.map(|ts| ts.to_system_time()),
            end_time: value.end_time.map(|ts| ts.to_system_time()),
            remaining_time: value.remaining_time,
            is_active: value.is_active,
            team1_won: value.team1_won,
        }
    }
}

fn clamp_counter(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

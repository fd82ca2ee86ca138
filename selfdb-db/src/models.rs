//! Row models for the metadata database (§3 Data Model).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{buckets, files, origin_policy_entries, refresh_tokens, users};

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub active: bool,
    pub superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn email(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub active: bool,
    pub superuser: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = refresh_tokens)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: Vec<u8>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = buckets)]
pub struct Bucket {
    pub id: Uuid,
    pub display_name: String,
    pub storage_name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = buckets)]
pub struct NewBucket<'a> {
    pub id: Uuid,
    pub display_name: &'a str,
    pub storage_name: &'a str,
    pub description: Option<&'a str>,
    pub is_public: bool,
    pub owner_id: Uuid,
}

/// A bucket with the aggregated stats §4.6 "Read/List" requires.
#[derive(Debug, Clone, Serialize)]
pub struct BucketWithStats {
    #[serde(flatten)]
    pub bucket: Bucket,
    pub file_count: i64,
    pub total_size: i64,
}

/// Lifecycle of a `File` row (§4.7): `pending-upload` rows have no backing
/// object yet and are excluded from the "every file has bytes" invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileStatus {
    PendingUpload,
    Live,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::PendingUpload => "pending-upload",
            FileStatus::Live => "live",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "pending-upload" => FileStatus::PendingUpload,
            _ => FileStatus::Live,
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = files)]
pub struct File {
    pub id: Uuid,
    pub filename: String,
    pub object_key: String,
    pub bucket_id: Uuid,
    pub content_type: Option<String>,
    pub size: i64,
    pub owner_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl File {
    pub fn file_status(&self) -> FileStatus {
        FileStatus::from_str(&self.status)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = files)]
pub struct NewFile<'a> {
    pub id: Uuid,
    pub filename: &'a str,
    pub object_key: &'a str,
    pub bucket_id: Uuid,
    pub content_type: Option<&'a str>,
    pub size: i64,
    pub owner_id: Uuid,
    pub status: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = origin_policy_entries)]
pub struct OriginPolicyEntry {
    pub id: Uuid,
    pub origin: String,
    pub is_active: bool,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = origin_policy_entries)]
pub struct NewOriginPolicyEntry<'a> {
    pub id: Uuid,
    pub origin: &'a str,
    pub creator_id: Uuid,
}

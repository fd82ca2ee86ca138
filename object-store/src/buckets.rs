//! Bucket endpoints (§4.8, §6.2).

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::ApiKeyGuard;
use crate::error::StoreError;
use crate::metadata::{self, BucketMetadata};
use crate::path_safety;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateBucketBody {
    pub name: String,
    pub is_public: bool,
    pub owner_id: Uuid,
}

pub async fn create_bucket(
    _auth: ApiKeyGuard,
    state: web::Data<AppState>,
    body: web::Json<CreateBucketBody>,
) -> Result<HttpResponse, StoreError> {
    let dir = path_safety::bucket_dir(&state.root, &body.name)?;
    if dir.exists() {
        return Err(StoreError::BucketExists);
    }
    tokio::fs::create_dir_all(&dir).await?;
    let meta = BucketMetadata {
        name: body.name.clone(),
        is_public: body.is_public,
        owner_id: body.owner_id,
        created_at: Utc::now(),
    };
    metadata::write(&dir, &meta).await?;
    info!("bucket created"; "bucket" => &body.name);
    Ok(HttpResponse::Created().json(meta))
}

#[derive(Serialize)]
struct BucketList {
    buckets: Vec<BucketMetadata>,
}

pub async fn list_buckets(_auth: ApiKeyGuard, state: web::Data<AppState>) -> Result<HttpResponse, StoreError> {
    let mut buckets = Vec::new();
    let mut entries = tokio::fs::read_dir(&state.root).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        if let Ok(meta) = metadata::read(&entry.path()).await {
            buckets.push(meta);
        }
    }
    Ok(HttpResponse::Ok().json(BucketList { buckets }))
}

pub async fn get_bucket(
    _auth: ApiKeyGuard,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, StoreError> {
    let dir = path_safety::bucket_dir(&state.root, &path)?;
    let meta = metadata::read(&dir).await?;
    Ok(HttpResponse::Ok().json(meta))
}

#[derive(Serialize)]
struct ExistsBody {
    exists: bool,
}

/// §C supplemental.
pub async fn bucket_exists(
    _auth: ApiKeyGuard,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, StoreError> {
    let dir = path_safety::bucket_dir(&state.root, &path)?;
    let exists = dir.join(metadata::METADATA_FILENAME).exists();
    Ok(HttpResponse::Ok().json(ExistsBody { exists }))
}

#[derive(Deserialize)]
pub struct UpdateBucketBody {
    pub is_public: bool,
}

pub async fn update_bucket(
    _auth: ApiKeyGuard,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateBucketBody>,
) -> Result<HttpResponse, StoreError> {
    let dir = path_safety::bucket_dir(&state.root, &path)?;
    let mut meta = metadata::read(&dir).await?;
    meta.is_public = body.is_public;
    metadata::write(&dir, &meta).await?;
    Ok(HttpResponse::Ok().json(meta))
}

/// Recursive: the Bucket Coordinator (§4.6) has already authorized the
/// delete and expects the whole subtree to go with it.
pub async fn delete_bucket(
    _auth: ApiKeyGuard,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, StoreError> {
    let dir = path_safety::bucket_dir(&state.root, &path)?;
    if !dir.exists() {
        return Err(StoreError::NotFound);
    }
    tokio::fs::remove_dir_all(&dir).await?;
    info!("bucket deleted"; "bucket" => path.as_str());
    Ok(HttpResponse::NoContent().finish())
}

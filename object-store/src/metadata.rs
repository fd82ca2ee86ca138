//! Per-bucket sidecar metadata (§4.8): `<root>/<bucket>/.metadata.json`.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

pub const METADATA_FILENAME: &str = ".metadata.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketMetadata {
    pub name: String,
    pub is_public: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

pub async fn read(bucket_dir: &Path) -> Result<BucketMetadata, StoreError> {
    let path = bucket_dir.join(METADATA_FILENAME);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound
        } else {
            StoreError::Io(e)
        }
    })?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Internal(e.to_string()))
}

pub async fn write(bucket_dir: &Path, metadata: &BucketMetadata) -> Result<(), StoreError> {
    let path = bucket_dir.join(METADATA_FILENAME);
    let bytes = serde_json::to_vec_pretty(metadata).map_err(|e| StoreError::Internal(e.to_string()))?;
    tokio::fs::write(&path, bytes).await?;
    Ok(())
}

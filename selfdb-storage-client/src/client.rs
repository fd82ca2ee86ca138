//! HTTP client for the Object Store service (§6.2). The two services
//! authenticate each other with a shared `X-API-Key` header rather than a
//! user ticket; the calling backend has already done its own Auth Gate
//! check before reaching for this client.

use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::error::StorageClientError;

#[derive(Debug, Clone, Deserialize)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub method: String,
}

#[derive(Clone)]
pub struct StorageServiceClient {
    http: reqwest::Client,
    /// Internal base URL this process talks to directly.
    base_url: Url,
    /// External base URL embedded in URLs handed back to browser clients.
    external_url: Url,
    api_key: String,
}

impl StorageServiceClient {
    pub fn new(base_url: Url, external_url: Url, api_key: String) -> Self {
        StorageServiceClient {
            http: reqwest::Client::new(),
            base_url,
            external_url,
            api_key,
        }
    }

    fn internal(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageClientError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        if status == 404 {
            return Err(StorageClientError::NotFound);
        }
        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(StorageClientError::Remote { status, detail })
    }

    pub async fn create_bucket(
        &self,
        storage_name: &str,
        is_public: bool,
        owner_id: uuid::Uuid,
    ) -> Result<(), StorageClientError> {
        let response = self
            .http
            .post(self.internal("/buckets"))
            .header("X-API-Key", &self.api_key)
            .json(&json!({ "name": storage_name, "is_public": is_public, "owner_id": owner_id }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// §C supplemental: a cheap existence probe used by the Bucket
    /// Coordinator's delete algorithm (§4.6) to decide between "already
    /// gone" and "needs deletion".
    pub async fn bucket_exists(&self, storage_name: &str) -> Result<bool, StorageClientError> {
        let response = self
            .http
            .get(self.internal(&format!("/buckets/{storage_name}/exists")))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(false);
        }
        let response = Self::check(response).await?;
        #[derive(Deserialize)]
        struct ExistsBody {
            exists: bool,
        }
        let body: ExistsBody = response.json().await?;
        Ok(body.exists)
    }

    pub async fn update_bucket(&self, storage_name: &str, is_public: bool) -> Result<(), StorageClientError> {
        let response = self
            .http
            .put(self.internal(&format!("/buckets/{storage_name}")))
            .header("X-API-Key", &self.api_key)
            .json(&json!({ "is_public": is_public }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Idempotent: a 404 from the store is treated as already-deleted
    /// (§4.6 "a subsequent delete request treats a missing store-bucket as
    /// already gone").
    pub async fn delete_bucket(&self, storage_name: &str) -> Result<(), StorageClientError> {
        let response = self
            .http
            .delete(self.internal(&format!("/buckets/{storage_name}")))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        match Self::check(response).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn presigned_upload_url(
        &self,
        storage_name: &str,
        object_key: &str,
        content_type: Option<&str>,
        ttl_secs: u64,
    ) -> Result<PresignedUpload, StorageClientError> {
        let response = self
            .http
            .post(self.internal(&format!("/files/presigned-url/upload/{storage_name}/{object_key}")))
            .header("X-API-Key", &self.api_key)
            .json(&json!({ "content_type": content_type, "ttl_secs": ttl_secs }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// Idempotent for the same reason as `delete_bucket`.
    pub async fn delete_file(&self, storage_name: &str, object_key: &str) -> Result<(), StorageClientError> {
        let response = self
            .http
            .delete(self.internal(&format!("/files/{storage_name}/{object_key}")))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        match Self::check(response).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// §C supplemental purge-all, mirroring the object-key-prefix cleanup
    /// the original system performs when a bucket is emptied without being
    /// deleted outright.
    pub async fn purge_bucket_objects(&self, storage_name: &str) -> Result<(), StorageClientError> {
        let response = self
            .http
            .delete(self.internal(&format!("/files/{storage_name}/objects")))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Direct download URL against the external base (§4.7); not an HTTP
    /// call, just the URL the File Coordinator hands back to the client.
    pub fn download_url(&self, storage_name: &str, object_key: &str) -> String {
        format!(
            "{}/files/download/{storage_name}/{object_key}",
            self.external_url.as_str().trim_end_matches('/')
        )
    }

    pub fn view_url(&self, storage_name: &str, object_key: &str, content_type: Option<&str>) -> String {
        let base = format!(
            "{}/files/view/{storage_name}/{object_key}",
            self.external_url.as_str().trim_end_matches('/')
        );
        match content_type {
            Some(ct) => format!("{base}?content_type={}", urlencoding::encode(ct)),
            None => base,
        }
    }
}

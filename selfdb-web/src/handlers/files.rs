//! The File Coordinator (§4.7): issues presigned upload URLs and resolves
//! stored objects back to download/view URLs.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::RequestContext;
use crate::handlers::{authorize_bucket_read, authorize_bucket_write};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_files(
    ctx: RequestContext,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let user = ctx.require_user()?;
    let rows = selfdb_db::queries::files::list_owned(&state.db, user.user_id, query.limit.unwrap_or(100), query.offset.unwrap_or(0))
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Debug, Deserialize, Validate)]
pub struct InitiateUploadBody {
    #[validate(length(min = 1))]
    pub filename: String,
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: i64,
    pub bucket_id: Uuid,
}

#[derive(Serialize)]
pub struct InitiateUploadResponse {
    pub file: selfdb_db::models::File,
    pub presigned_upload_info: selfdb_storage_client::PresignedUpload,
}

/// Object keys are random so a guessed filename never collides with, or
/// overwrites, another file's bytes; the original extension is kept so the
/// store and any browser preview can still infer content type from it.
fn generate_object_key(filename: &str) -> String {
    match std::path::Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

pub async fn initiate_upload(
    ctx: RequestContext,
    state: web::Data<AppState>,
    body: web::Json<InitiateUploadBody>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    let owner_id = ctx.require_user()?.user_id;
    let bucket = selfdb_db::queries::buckets::get_bucket(&state.db, body.bucket_id)
        .await?
        .ok_or(ApiError::NotFound("bucket"))?;
    authorize_bucket_write(&ctx, &bucket)?;

    let object_key = generate_object_key(&body.filename);
    let file = selfdb_db::queries::files::insert_file(
        &state.db,
        &body.filename,
        &object_key,
        bucket.id,
        body.content_type.as_deref(),
        body.size,
        owner_id,
        selfdb_db::models::FileStatus::PendingUpload.as_str(),
    )
    .await?;

    let presigned = match state
        .storage
        .presigned_upload_url(&bucket.storage_name, &object_key, body.content_type.as_deref(), state.settings.upload_url_ttl_secs)
        .await
    {
        Ok(p) => p,
        Err(e) => {
            if let Err(cleanup_err) = selfdb_db::queries::files::delete_file_row(&state.db, file.id).await {
                error!("failed to compensate file initiate"; "file_id" => %file.id, "error" => %cleanup_err);
            }
            return Err(ApiError::StorageUnavailable(e.to_string()));
        }
    };

    // §4.7 "implicit finalize": there is no confirmation callback from the
    // object store, so the row is considered live as soon as a caller holds
    // a valid upload URL for it; bytes and size are trusted, not verified.
    selfdb_db::queries::files::mark_live(&state.db, file.id).await?;

    Ok(HttpResponse::Ok().json(InitiateUploadResponse { file, presigned_upload_info: presigned }))
}

#[derive(Serialize)]
pub struct FileUrlResponse {
    pub file: selfdb_db::models::File,
    pub url: String,
}

async fn load_file_and_bucket(
    state: &AppState,
    file_id: Uuid,
) -> Result<(selfdb_db::models::File, selfdb_db::models::Bucket), ApiError> {
    let file = selfdb_db::queries::files::get_file(&state.db, file_id)
        .await?
        .ok_or(ApiError::NotFound("file"))?;
    let bucket = selfdb_db::queries::buckets::get_bucket(&state.db, file.bucket_id)
        .await?
        .ok_or(ApiError::NotFound("bucket"))?;
    Ok((file, bucket))
}

/// If the stored content type is missing or generic, infer it from the
/// filename's extension instead (§4.7 view-info).
fn resolve_view_content_type(file: &selfdb_db::models::File) -> Option<String> {
    match &file.content_type {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => Some(ct.clone()),
        _ => Some(mime_guess::from_path(&file.filename).first_or_octet_stream().essence_str().to_string()),
    }
}

pub async fn download_info(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let (file, bucket) = load_file_and_bucket(&state, path.into_inner()).await?;
    authorize_bucket_read(&ctx, &bucket)?;
    let url = state.storage.download_url(&bucket.storage_name, &file.object_key);
    Ok(HttpResponse::Ok().json(FileUrlResponse { file, url }))
}

pub async fn view_info(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let (file, bucket) = load_file_and_bucket(&state, path.into_inner()).await?;
    authorize_bucket_read(&ctx, &bucket)?;
    let content_type = resolve_view_content_type(&file);
    let url = state.storage.view_url(&bucket.storage_name, &file.object_key, content_type.as_deref());
    Ok(HttpResponse::Ok().json(FileUrlResponse { file, url }))
}

/// Public variants still pass through the Auth Gate (an `apikey` is
/// required) but drop the ownership check in favor of a plain
/// `bucket.is_public` test (§4.7 "Public variants").
pub async fn public_download_info(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    ctx.require_anon_or_user()?;
    let (file, bucket) = load_file_and_bucket(&state, path.into_inner()).await?;
    if !bucket.is_public {
        return Err(ApiError::Forbidden);
    }
    let url = state.storage.download_url(&bucket.storage_name, &file.object_key);
    Ok(HttpResponse::Ok().json(FileUrlResponse { file, url }))
}

pub async fn public_view_info(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    ctx.require_anon_or_user()?;
    let (file, bucket) = load_file_and_bucket(&state, path.into_inner()).await?;
    if !bucket.is_public {
        return Err(ApiError::Forbidden);
    }
    let content_type = resolve_view_content_type(&file);
    let url = state.storage.view_url(&bucket.storage_name, &file.object_key, content_type.as_deref());
    Ok(HttpResponse::Ok().json(FileUrlResponse { file, url }))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use selfdb_db::models::File;
    use uuid::Uuid;

    use super::{generate_object_key, resolve_view_content_type};

    fn file_with(filename: &str, content_type: Option<&str>) -> File {
        File {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            object_key: "irrelevant".to_string(),
            bucket_id: Uuid::new_v4(),
            content_type: content_type.map(str::to_string),
            size: 0,
            owner_id: Uuid::new_v4(),
            status: "live".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn object_key_keeps_extension() {
        let key = generate_object_key("report.PDF");
        assert!(key.ends_with(".PDF"));
        assert_ne!(key, "report.PDF");
    }

    #[test]
    fn object_key_without_extension_has_no_dot() {
        let key = generate_object_key("README");
        assert!(!key.contains('.'));
    }

    #[test]
    fn view_content_type_prefers_stored_value() {
        let file = file_with("a.png", Some("image/png"));
        assert_eq!(resolve_view_content_type(&file).as_deref(), Some("image/png"));
    }

    #[test]
    fn view_content_type_falls_back_to_extension_when_generic() {
        let file = file_with("a.png", Some("application/octet-stream"));
        assert_eq!(resolve_view_content_type(&file).as_deref(), Some("image/png"));
    }

    #[test]
    fn view_content_type_falls_back_to_extension_when_missing() {
        let file = file_with("notes.txt", None);
        assert_eq!(resolve_view_content_type(&file).as_deref(), Some("text/plain"));
    }
}

pub async fn delete_file(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let (file, bucket) = load_file_and_bucket(&state, path.into_inner()).await?;
    authorize_bucket_write(&ctx, &bucket)?;
    state.storage.delete_file(&bucket.storage_name, &file.object_key).await?;
    selfdb_db::queries::files::delete_file_row(&state.db, file.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

//! The Bucket Coordinator (§4.6): keeps a Postgres row and an Object Store
//! bucket in lockstep, compensating on either side when the two diverge.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::RequestContext;
use crate::handlers::{authorize_bucket_read, authorize_bucket_write};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBucketBody {
    #[validate(length(min = 1, max = 200))]
    pub display_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

pub async fn create_bucket(
    ctx: RequestContext,
    state: web::Data<AppState>,
    body: web::Json<CreateBucketBody>,
) -> Result<HttpResponse, ApiError> {
    let user = ctx.require_user()?;
    body.validate()?;

    if selfdb_db::queries::buckets::display_name_taken(&state.db, &body.display_name).await? {
        return Err(ApiError::Conflict("bucket display name already taken".to_string()));
    }
    let storage_name = selfdb_db::slug::slugify(&body.display_name);

    let bucket = selfdb_db::queries::buckets::insert_bucket(
        &state.db,
        &body.display_name,
        &storage_name,
        body.description.as_deref(),
        body.is_public,
        user.user_id,
    )
    .await?;

    if let Err(e) = state.storage.create_bucket(&storage_name, body.is_public, user.user_id).await {
        // Compensating action (§4.6 Create): the store call failed, so the
        // DB row must not outlive it.
        if let Err(cleanup_err) = selfdb_db::queries::buckets::delete_bucket_row(&state.db, bucket.id).await {
            error!("failed to compensate bucket creation"; "bucket_id" => %bucket.id, "error" => %cleanup_err);
        }
        return Err(ApiError::internal(format!("storage bucket creation failed: {e}")));
    }

    Ok(HttpResponse::Created().json(bucket))
}

pub async fn list_buckets(ctx: RequestContext, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = ctx.require_user()?;
    let rows = selfdb_db::queries::buckets::list_owned(&state.db, user.user_id).await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn list_public(ctx: RequestContext, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    ctx.require_anon_or_user()?;
    let rows = selfdb_db::queries::buckets::list_public(&state.db, ctx.user_id()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn get_bucket(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let with_stats = selfdb_db::queries::buckets::get_bucket_with_stats(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("bucket"))?;
    authorize_bucket_read(&ctx, &with_stats.bucket)?;
    Ok(HttpResponse::Ok().json(with_stats))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBucketBody {
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

pub async fn update_bucket(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateBucketBody>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let bucket = selfdb_db::queries::buckets::get_bucket(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("bucket"))?;
    authorize_bucket_write(&ctx, &bucket)?;

    let updated = selfdb_db::queries::buckets::update_bucket(&state.db, id, body.description.clone(), body.is_public).await?;

    if let Some(is_public) = body.is_public {
        // Best-effort mirror (§4.6 Update): the DB row is the source of
        // truth, so a storage-side failure here is logged, not surfaced.
        if let Err(e) = state.storage.update_bucket(&updated.storage_name, is_public).await {
            warn!("failed to mirror bucket visibility to storage"; "bucket_id" => %id, "error" => %e);
        }
    }

    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_bucket(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let bucket = selfdb_db::queries::buckets::get_bucket(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("bucket"))?;
    authorize_bucket_write(&ctx, &bucket)?;

    // §4.6 Delete: probe first so a DB-only bucket left over from a failed
    // create compensation is handled the same as a normal one.
    if state.storage.bucket_exists(&bucket.storage_name).await? {
        state.storage.delete_bucket(&bucket.storage_name).await?;
    }
    selfdb_db::queries::buckets::delete_bucket_row(&state.db, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_bucket_files(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let bucket = selfdb_db::queries::buckets::get_bucket(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("bucket"))?;
    authorize_bucket_read(&ctx, &bucket)?;
    let rows =
        selfdb_db::queries::files::list_in_bucket(&state.db, id, query.limit.unwrap_or(100), query.offset.unwrap_or(0)).await?;
    Ok(HttpResponse::Ok().json(rows))
}

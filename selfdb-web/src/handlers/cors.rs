//! Superuser-only origin-policy administration (§4.1 Policy Cache, §6.1
//! `/cors/*`). Every mutation invalidates the in-process cache so the next
//! request sees it within the bounded-staleness window immediately rather
//! than waiting out the TTL.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extractors::RequestContext;
use crate::state::AppState;

pub async fn list_origins(ctx: RequestContext, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    ctx.require_superuser()?;
    let rows = selfdb_db::queries::origins::list_all(&state.db).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Deserialize)]
pub struct CreateOriginBody {
    pub origin: String,
}

pub async fn create_origin(
    ctx: RequestContext,
    state: web::Data<AppState>,
    body: web::Json<CreateOriginBody>,
) -> Result<HttpResponse, ApiError> {
    let user = ctx.require_superuser()?;
    validate_origin(&body.origin)?;
    let row = selfdb_db::queries::origins::insert(&state.db, &body.origin, user.user_id).await?;
    state.origins.invalidate().await;
    Ok(HttpResponse::Created().json(row))
}

pub async fn get_origin(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    ctx.require_superuser()?;
    let row = selfdb_db::queries::origins::get(&state.db, path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("origin policy entry"))?;
    Ok(HttpResponse::Ok().json(row))
}

#[derive(Deserialize)]
pub struct UpdateOriginBody {
    pub is_active: bool,
}

pub async fn update_origin(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOriginBody>,
) -> Result<HttpResponse, ApiError> {
    ctx.require_superuser()?;
    let id = path.into_inner();
    selfdb_db::queries::origins::set_active(&state.db, id, body.is_active).await?;
    state.origins.invalidate().await;
    let row = selfdb_db::queries::origins::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("origin policy entry"))?;
    Ok(HttpResponse::Ok().json(row))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub hard_delete: bool,
}

pub async fn delete_origin(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<DeleteQuery>,
) -> Result<HttpResponse, ApiError> {
    ctx.require_superuser()?;
    let id = path.into_inner();
    if query.hard_delete {
        selfdb_db::queries::origins::hard_delete(&state.db, id).await?;
    } else {
        selfdb_db::queries::origins::soft_delete(&state.db, id).await?;
    }
    state.origins.invalidate().await;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize)]
pub struct ValidateBody {
    pub origin: String,
}

pub async fn validate(ctx: RequestContext, body: web::Json<ValidateBody>) -> Result<HttpResponse, ApiError> {
    ctx.require_superuser()?;
    validate_origin(&body.origin)?;
    Ok(HttpResponse::Ok().json(json!({ "valid": true })))
}

fn validate_origin(origin: &str) -> Result<(), ApiError> {
    let url = Url::parse(origin).map_err(|_| ApiError::Validation("origin must be a valid URL".to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ApiError::Validation("origin scheme must be http or https".to_string()));
    }
    if url.host_str().is_none() {
        return Err(ApiError::Validation("origin must have a host".to_string()));
    }
    Ok(())
}

pub async fn refresh_cache(ctx: RequestContext, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    ctx.require_superuser()?;
    state.origins.refresh().await;
    Ok(HttpResponse::NoContent().finish())
}

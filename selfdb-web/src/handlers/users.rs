//! `/users/me` self-service plus the superuser-only `/users` collection
//! (§6.1).

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::RequestContext;
use crate::state::AppState;

/// `selfdb_db::models::User` skips `email` on `Serialize` (it's only
/// exposed through an accessor, to keep accidental logging safe); this is
/// the wire shape handlers actually return.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub active: bool,
    pub superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<selfdb_db::models::User> for UserResponse {
    fn from(u: selfdb_db::models::User) -> Self {
        UserResponse {
            id: u.id,
            email: u.email,
            active: u.active,
            superuser: u.superuser,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

pub async fn me(ctx: RequestContext, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = ctx.require_user()?;
    let row = selfdb_db::queries::users::get_user_by_id(&state.db, user.user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(row)))
}

#[derive(Deserialize, Validate)]
pub struct UpdateMeBody {
    #[validate(email)]
    pub email: Option<String>,
}

pub async fn update_me(
    ctx: RequestContext,
    state: web::Data<AppState>,
    body: web::Json<UpdateMeBody>,
) -> Result<HttpResponse, ApiError> {
    let user = ctx.require_user()?;
    body.validate()?;
    if let Some(email) = &body.email {
        selfdb_db::queries::users::update_email(&state.db, user.user_id, email).await?;
    }
    let row = selfdb_db::queries::users::get_user_by_id(&state.db, user.user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(row)))
}

#[derive(Deserialize, Validate)]
pub struct UpdatePasswordBody {
    #[validate(length(min = 8))]
    pub password: String,
}

pub async fn update_password(
    ctx: RequestContext,
    state: web::Data<AppState>,
    body: web::Json<UpdatePasswordBody>,
) -> Result<HttpResponse, ApiError> {
    let user = ctx.require_user()?;
    body.validate()?;
    let hash = selfdb_auth::hash_password(&body.password)?;
    selfdb_db::queries::users::update_password(&state.db, user.user_id, &hash).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_me(ctx: RequestContext, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = ctx.require_user()?;
    selfdb_db::queries::refresh_tokens::revoke_all_for_user(&state.db, user.user_id).await?;
    selfdb_db::queries::users::delete_user(&state.db, user.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn anon_key(ctx: RequestContext, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    ctx.require_user()?;
    Ok(HttpResponse::Ok().json(json!({ "anon_key": state.settings.anon_key })))
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_users(
    ctx: RequestContext,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    ctx.require_superuser()?;
    let rows = selfdb_db::queries::users::list_users(&state.db, query.limit.unwrap_or(50), query.offset.unwrap_or(0)).await?;
    let rows: Vec<UserResponse> = rows.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Deserialize, Validate)]
pub struct CreateUserBody {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

pub async fn create_user(
    ctx: RequestContext,
    state: web::Data<AppState>,
    body: web::Json<CreateUserBody>,
) -> Result<HttpResponse, ApiError> {
    ctx.require_superuser()?;
    body.validate()?;
    if selfdb_db::queries::users::get_user_by_email(&state.db, &body.email).await?.is_some() {
        return Err(ApiError::Conflict("email already registered".to_string()));
    }
    let hash = selfdb_auth::hash_password(&body.password)?;
    let row = selfdb_db::queries::users::create_user(&state.db, &body.email, &hash).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(row)))
}

pub async fn get_user(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let requester = ctx.require_user()?;
    let target_id = path.into_inner();
    if requester.user_id != target_id && !requester.is_superuser {
        return Err(ApiError::Forbidden);
    }
    let row = selfdb_db::queries::users::get_user_by_id(&state.db, target_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(row)))
}

#[derive(Deserialize)]
pub struct UpdateUserBody {
    pub active: Option<bool>,
}

pub async fn update_user(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserBody>,
) -> Result<HttpResponse, ApiError> {
    ctx.require_superuser()?;
    let target_id = path.into_inner();
    if let Some(active) = body.active {
        selfdb_db::queries::users::set_active(&state.db, target_id, active).await?;
    }
    let row = selfdb_db::queries::users::get_user_by_id(&state.db, target_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(row)))
}

pub async fn delete_user(
    ctx: RequestContext,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    ctx.require_superuser()?;
    let target_id = path.into_inner();
    selfdb_db::queries::refresh_tokens::revoke_all_for_user(&state.db, target_id).await?;
    selfdb_db::queries::users::delete_user(&state.db, target_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Unlike `list_users`, this is an existence check any anon-key or
/// authenticated caller can make, not a superuser-only listing (§6.1).
pub async fn count_users(ctx: RequestContext, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    ctx.require_anon_or_user()?;
    let count = selfdb_db::queries::users::count_users(&state.db).await?;
    Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

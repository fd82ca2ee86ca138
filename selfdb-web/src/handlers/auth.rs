//! Registration, login, and refresh (§3 Ticket, §3 Refresh Tokens).
//!
//! All three endpoints sit behind the Auth Gate's `apikey` requirement like
//! any other route; none of them require an existing ticket.

use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::RequestContext;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterBody {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub refresh_token: String,
    pub is_superuser: bool,
    pub email: String,
    pub user_id: Uuid,
}

pub async fn register(
    _ctx: RequestContext,
    state: web::Data<AppState>,
    body: web::Json<RegisterBody>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;
    if selfdb_db::queries::users::get_user_by_email(&state.db, &body.email).await?.is_some() {
        return Err(ApiError::Conflict("email already registered".to_string()));
    }
    let password_hash = selfdb_auth::hash_password(&body.password)?;
    let user = selfdb_db::queries::users::create_user(&state.db, &body.email, &password_hash).await?;
    Ok(HttpResponse::Created().json(issue_tokens(&state, &user).await?))
}

pub async fn login(
    _ctx: RequestContext,
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, ApiError> {
    let user = selfdb_db::queries::users::get_user_by_email(&state.db, &form.username)
        .await?
        .filter(|u| u.active)
        .ok_or(ApiError::InvalidTicket)?;
    if !selfdb_auth::verify_password(&form.password, &user.password_hash) {
        return Err(ApiError::InvalidTicket);
    }
    Ok(HttpResponse::Ok().json(issue_tokens(&state, &user).await?))
}

pub async fn refresh(
    _ctx: RequestContext,
    state: web::Data<AppState>,
    body: web::Json<RefreshBody>,
) -> Result<HttpResponse, ApiError> {
    let hash = selfdb_auth::hash_refresh_token(&body.refresh_token);
    let stored = selfdb_db::queries::refresh_tokens::get_active_by_hash(&state.db, &hash)
        .await?
        .ok_or(ApiError::InvalidTicket)?;
    let user = selfdb_db::queries::users::get_user_by_id(&state.db, stored.user_id)
        .await?
        .filter(|u| u.active)
        .ok_or(ApiError::InvalidTicket)?;
    // Rotate: the presented token is spent whether or not the new pair is
    // ever picked up by the client.
    selfdb_db::queries::refresh_tokens::revoke(&state.db, stored.id).await?;
    Ok(HttpResponse::Ok().json(issue_tokens(&state, &user).await?))
}

async fn issue_tokens(state: &AppState, user: &selfdb_db::models::User) -> Result<TokenResponse, ApiError> {
    let access_token = selfdb_auth::sign_ticket(
        &state.settings.secret_key.signing_secret,
        user.id,
        user.superuser,
        state.settings.access_token_expire_minutes,
    )?;
    let issued = selfdb_auth::generate_refresh_token();
    let expires_at = Utc::now() + Duration::days(state.settings.refresh_token_expire_days);
    selfdb_db::queries::refresh_tokens::create_refresh_token(&state.db, user.id, issued.hash, expires_at).await?;
    Ok(TokenResponse {
        access_token,
        token_type: "bearer",
        refresh_token: issued.plaintext,
        is_superuser: user.superuser,
        email: user.email().to_string(),
        user_id: user.id,
    })
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{NewRefreshToken, RefreshToken};
use crate::pool::DbPool;
use crate::schema::refresh_tokens;

/// Stores a refresh token's SHA-256 hash, never the plaintext (§3 Refresh
/// Tokens: revocable, TTL ~30 days).
pub async fn create_refresh_token(
    pool: &DbPool,
    user_id: Uuid,
    token_hash: Vec<u8>,
    expires_at: DateTime<Utc>,
) -> DbResult<RefreshToken> {
    let mut conn = pool.get().await?;
    let new_token = NewRefreshToken {
        id: Uuid::new_v4(),
        user_id,
        token_hash,
        expires_at,
    };
    diesel::insert_into(refresh_tokens::table)
        .values(&new_token)
        .get_result(&mut conn)
        .await
        .map_err(Into::into)
}

pub async fn get_active_by_hash(pool: &DbPool, token_hash: &[u8]) -> DbResult<Option<RefreshToken>> {
    let mut conn = pool.get().await?;
    refresh_tokens::table
        .filter(refresh_tokens::token_hash.eq(token_hash))
        .filter(refresh_tokens::revoked_at.is_null())
        .filter(refresh_tokens::expires_at.gt(Utc::now()))
        .first(&mut conn)
        .await
        .optional()
        .map_err(Into::into)
}

pub async fn revoke(pool: &DbPool, id: Uuid) -> DbResult<()> {
    let mut conn = pool.get().await?;
    diesel::update(refresh_tokens::table.find(id))
        .set(refresh_tokens::revoked_at.eq(Some(Utc::now())))
        .execute(&mut conn)
        .await?;
    Ok(())
}

/// Revokes every refresh token for a user, called on user deletion (§3
/// ownership: "Refresh Tokens are owned by their user and revoked on user
/// deletion").
pub async fn revoke_all_for_user(pool: &DbPool, user_id: Uuid) -> DbResult<()> {
    let mut conn = pool.get().await?;
    diesel::update(
        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(user_id))
            .filter(refresh_tokens::revoked_at.is_null()),
    )
    .set(refresh_tokens::revoked_at.eq(Some(Utc::now())))
    .execute(&mut conn)
    .await?;
    Ok(())
}

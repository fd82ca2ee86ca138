use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{NewUser, User};
use crate::pool::DbPool;
use crate::schema::users;

pub async fn create_user(
    pool: &DbPool,
    email: &str,
    password_hash: &str,
) -> DbResult<User> {
    let mut conn = pool.get().await?;
    let new_user = NewUser {
        id: Uuid::new_v4(),
        email,
        password_hash,
        active: true,
        superuser: false,
    };
    diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(&mut conn)
        .await
        .map_err(Into::into)
}

pub async fn get_user_by_email(pool: &DbPool, email: &str) -> DbResult<Option<User>> {
    let mut conn = pool.get().await?;
    users::table
        .filter(users::email.eq(email))
        .first(&mut conn)
        .await
        .optional()
        .map_err(Into::into)
}

pub async fn get_user_by_id(pool: &DbPool, id: Uuid) -> DbResult<Option<User>> {
    let mut conn = pool.get().await?;
    users::table
        .find(id)
        .first(&mut conn)
        .await
        .optional()
        .map_err(Into::into)
}

/// Looks a user up by email or by id-as-text, matching the ticket's `sub`
/// claim which may carry either (§3 Ticket).
pub async fn get_user_by_sub(pool: &DbPool, sub: &str) -> DbResult<Option<User>> {
    if let Ok(id) = Uuid::parse_str(sub) {
        if let Some(user) = get_user_by_id(pool, id).await? {
            return Ok(Some(user));
        }
    }
    get_user_by_email(pool, sub).await
}

pub async fn count_users(pool: &DbPool) -> DbResult<i64> {
    let mut conn = pool.get().await?;
    users::table.count().get_result(&mut conn).await.map_err(Into::into)
}

pub async fn list_users(pool: &DbPool, limit: i64, offset: i64) -> DbResult<Vec<User>> {
    let mut conn = pool.get().await?;
    users::table
        .order(users::created_at.asc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .await
        .map_err(Into::into)
}

pub async fn update_email(pool: &DbPool, user_id: Uuid, email: &str) -> DbResult<()> {
    let mut conn = pool.get().await?;
    diesel::update(users::table.find(user_id))
        .set((users::email.eq(email), users::updated_at.eq(Utc::now())))
        .execute(&mut conn)
        .await?;
    Ok(())
}

pub async fn update_password(pool: &DbPool, user_id: Uuid, password_hash: &str) -> DbResult<()> {
    let mut conn = pool.get().await?;
    diesel::update(users::table.find(user_id))
        .set((users::password_hash.eq(password_hash), users::updated_at.eq(Utc::now())))
        .execute(&mut conn)
        .await?;
    Ok(())
}

pub async fn set_active(pool: &DbPool, user_id: Uuid, active: bool) -> DbResult<()> {
    let mut conn = pool.get().await?;
    diesel::update(users::table.find(user_id))
        .set((users::active.eq(active), users::updated_at.eq(Utc::now())))
        .execute(&mut conn)
        .await?;
    Ok(())
}

pub async fn delete_user(pool: &DbPool, user_id: Uuid) -> DbResult<()> {
    let mut conn = pool.get().await?;
    let affected = diesel::delete(users::table.find(user_id))
        .execute(&mut conn)
        .await?;
    if affected == 0 {
        return Err(DbError::not_found("user"));
    }
    Ok(())
}

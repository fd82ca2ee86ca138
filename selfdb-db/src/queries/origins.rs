use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{NewOriginPolicyEntry, OriginPolicyEntry};
use crate::pool::DbPool;
use crate::schema::origin_policy_entries;

/// The DB-backed portion of the effective allow-set (§3 Origin Policy
/// Entry, §4.1 Policy Cache).
pub async fn active_origins(pool: &DbPool) -> DbResult<Vec<String>> {
    let mut conn = pool.get().await?;
    origin_policy_entries::table
        .filter(origin_policy_entries::is_active.eq(true))
        .select(origin_policy_entries::origin)
        .load(&mut conn)
        .await
        .map_err(Into::into)
}

pub async fn list_all(pool: &DbPool) -> DbResult<Vec<OriginPolicyEntry>> {
    let mut conn = pool.get().await?;
    origin_policy_entries::table
        .order(origin_policy_entries::created_at.desc())
        .load(&mut conn)
        .await
        .map_err(Into::into)
}

pub async fn get(pool: &DbPool, id: Uuid) -> DbResult<Option<OriginPolicyEntry>> {
    let mut conn = pool.get().await?;
    origin_policy_entries::table
        .find(id)
        .first(&mut conn)
        .await
        .optional()
        .map_err(Into::into)
}

pub async fn insert(pool: &DbPool, origin: &str, creator_id: Uuid) -> DbResult<OriginPolicyEntry> {
    let mut conn = pool.get().await?;
    let new_entry = NewOriginPolicyEntry {
        id: Uuid::new_v4(),
        origin,
        creator_id,
    };
    diesel::insert_into(origin_policy_entries::table)
        .values(&new_entry)
        .get_result(&mut conn)
        .await
        .map_err(Into::into)
}

pub async fn set_active(pool: &DbPool, id: Uuid, is_active: bool) -> DbResult<()> {
    let mut conn = pool.get().await?;
    let affected = diesel::update(origin_policy_entries::table.find(id))
        .set((
            origin_policy_entries::is_active.eq(is_active),
            origin_policy_entries::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await?;
    if affected == 0 {
        return Err(DbError::not_found("origin policy entry"));
    }
    Ok(())
}

/// Soft delete: clears `is_active` (§3 "Soft-delete by clearing is_active").
pub async fn soft_delete(pool: &DbPool, id: Uuid) -> DbResult<()> {
    set_active(pool, id, false).await
}

/// Hard delete: removes the row entirely (§6.1 `?hard_delete=true`).
pub async fn hard_delete(pool: &DbPool, id: Uuid) -> DbResult<()> {
    let mut conn = pool.get().await?;
    let affected = diesel::delete(origin_policy_entries::table.find(id))
        .execute(&mut conn)
        .await?;
    if affected == 0 {
        return Err(DbError::not_found("origin policy entry"));
    }
    Ok(())
}

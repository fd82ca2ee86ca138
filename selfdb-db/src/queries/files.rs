use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{File, NewFile};
use crate::pool::DbPool;
use crate::schema::files;

#[allow(clippy::too_many_arguments)]
pub async fn insert_file(
    pool: &DbPool,
    filename: &str,
    object_key: &str,
    bucket_id: Uuid,
    content_type: Option<&str>,
    size: i64,
    owner_id: Uuid,
    status: &str,
) -> DbResult<File> {
    let mut conn = pool.get().await?;
    let new_file = NewFile {
        id: Uuid::new_v4(),
        filename,
        object_key,
        bucket_id,
        content_type,
        size,
        owner_id,
        status,
    };
    diesel::insert_into(files::table)
        .values(&new_file)
        .get_result(&mut conn)
        .await
        .map_err(Into::into)
}

pub async fn get_file(pool: &DbPool, id: Uuid) -> DbResult<Option<File>> {
    let mut conn = pool.get().await?;
    files::table.find(id).first(&mut conn).await.optional().map_err(Into::into)
}

pub async fn object_key_taken(pool: &DbPool, bucket_id: Uuid, object_key: &str) -> DbResult<bool> {
    let mut conn = pool.get().await?;
    let count: i64 = files::table
        .filter(files::bucket_id.eq(bucket_id))
        .filter(files::object_key.eq(object_key))
        .count()
        .get_result(&mut conn)
        .await?;
    Ok(count > 0)
}

pub async fn list_in_bucket(pool: &DbPool, bucket_id: Uuid, limit: i64, offset: i64) -> DbResult<Vec<File>> {
    let mut conn = pool.get().await?;
    files::table
        .filter(files::bucket_id.eq(bucket_id))
        .order(files::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .await
        .map_err(Into::into)
}

pub async fn list_owned(pool: &DbPool, owner_id: Uuid, limit: i64, offset: i64) -> DbResult<Vec<File>> {
    let mut conn = pool.get().await?;
    files::table
        .filter(files::owner_id.eq(owner_id))
        .order(files::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .await
        .map_err(Into::into)
}

pub async fn mark_live(pool: &DbPool, id: Uuid) -> DbResult<()> {
    let mut conn = pool.get().await?;
    diesel::update(files::table.find(id))
        .set((files::status.eq("live"), files::updated_at.eq(Utc::now())))
        .execute(&mut conn)
        .await?;
    Ok(())
}

pub async fn delete_file_row(pool: &DbPool, id: Uuid) -> DbResult<()> {
    let mut conn = pool.get().await?;
    let affected = diesel::delete(files::table.find(id)).execute(&mut conn).await?;
    if affected == 0 {
        return Err(DbError::not_found("file"));
    }
    Ok(())
}

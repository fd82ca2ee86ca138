use chrono::Utc;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{Bucket, BucketWithStats, NewBucket};
use crate::pool::DbPool;
use crate::schema::{buckets, files};

pub async fn insert_bucket(
    pool: &DbPool,
    display_name: &str,
    storage_name: &str,
    description: Option<&str>,
    is_public: bool,
    owner_id: Uuid,
) -> DbResult<Bucket> {
    let mut conn = pool.get().await?;
    let new_bucket = NewBucket {
        id: Uuid::new_v4(),
        display_name,
        storage_name,
        description,
        is_public,
        owner_id,
    };
    diesel::insert_into(buckets::table)
        .values(&new_bucket)
        .get_result(&mut conn)
        .await
        .map_err(Into::into)
}

pub async fn display_name_taken(pool: &DbPool, display_name: &str) -> DbResult<bool> {
    let mut conn = pool.get().await?;
    let count: i64 = buckets::table
        .filter(buckets::display_name.eq(display_name))
        .count()
        .get_result(&mut conn)
        .await?;
    Ok(count > 0)
}

pub async fn get_bucket(pool: &DbPool, id: Uuid) -> DbResult<Option<Bucket>> {
    let mut conn = pool.get().await?;
    buckets::table
        .find(id)
        .first(&mut conn)
        .await
        .optional()
        .map_err(Into::into)
}

pub async fn get_bucket_with_stats(pool: &DbPool, id: Uuid) -> DbResult<Option<BucketWithStats>> {
    let bucket = match get_bucket(pool, id).await? {
        Some(b) => b,
        None => return Ok(None),
    };
    let stats = file_stats(pool, id).await?;
    Ok(Some(BucketWithStats {
        bucket,
        file_count: stats.0,
        total_size: stats.1,
    }))
}

async fn file_stats(pool: &DbPool, bucket_id: Uuid) -> DbResult<(i64, i64)> {
    let mut conn = pool.get().await?;
    let (count, total): (i64, Option<i64>) = files::table
        .filter(files::bucket_id.eq(bucket_id))
        .select((
            diesel::dsl::count(files::id),
            sql::<Nullable<BigInt>>("COALESCE(SUM(files.size), 0)"),
        ))
        .first(&mut conn)
        .await?;
    Ok((count, total.unwrap_or(0)))
}

pub async fn list_owned(pool: &DbPool, owner_id: Uuid) -> DbResult<Vec<BucketWithStats>> {
    let mut conn = pool.get().await?;
    let rows: Vec<Bucket> = buckets::table
        .filter(buckets::owner_id.eq(owner_id))
        .order(buckets::created_at.desc())
        .load(&mut conn)
        .await?;
    drop(conn);
    with_stats(pool, rows).await
}

pub async fn list_public(pool: &DbPool, exclude_owner: Option<Uuid>) -> DbResult<Vec<BucketWithStats>> {
    let mut conn = pool.get().await?;
    let mut query = buckets::table.filter(buckets::is_public.eq(true)).into_boxed();
    if let Some(owner) = exclude_owner {
        query = query.filter(buckets::owner_id.ne(owner));
    }
    let rows: Vec<Bucket> = query.order(buckets::created_at.desc()).load(&mut conn).await?;
    drop(conn);
    with_stats(pool, rows).await
}

async fn with_stats(pool: &DbPool, rows: Vec<Bucket>) -> DbResult<Vec<BucketWithStats>> {
    let mut out = Vec::with_capacity(rows.len());
    for bucket in rows {
        let (file_count, total_size) = file_stats(pool, bucket.id).await?;
        out.push(BucketWithStats {
            bucket,
            file_count,
            total_size,
        });
    }
    Ok(out)
}

pub async fn update_bucket(
    pool: &DbPool,
    id: Uuid,
    description: Option<String>,
    is_public: Option<bool>,
) -> DbResult<Bucket> {
    let mut conn = pool.get().await?;
    let target = buckets::table.find(id);
    let bucket: Bucket = match (description, is_public) {
        (Some(d), Some(p)) => {
            diesel::update(target)
                .set((
                    buckets::description.eq(Some(d)),
                    buckets::is_public.eq(p),
                    buckets::updated_at.eq(Utc::now()),
                ))
                .get_result(&mut conn)
                .await?
        }
        (Some(d), None) => {
            diesel::update(target)
                .set((buckets::description.eq(Some(d)), buckets::updated_at.eq(Utc::now())))
                .get_result(&mut conn)
                .await?
        }
        (None, Some(p)) => {
            diesel::update(target)
                .set((buckets::is_public.eq(p), buckets::updated_at.eq(Utc::now())))
                .get_result(&mut conn)
                .await?
        }
        (None, None) => target.first(&mut conn).await?,
    };
    Ok(bucket)
}

pub async fn delete_bucket_row(pool: &DbPool, id: Uuid) -> DbResult<()> {
    let mut conn = pool.get().await?;
    let affected = diesel::delete(buckets::table.find(id)).execute(&mut conn).await?;
    if affected == 0 {
        return Err(DbError::not_found("bucket"));
    }
    Ok(())
}

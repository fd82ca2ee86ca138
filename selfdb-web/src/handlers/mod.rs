pub mod auth;
pub mod buckets;
pub mod cors;
pub mod files;
pub mod health;
pub mod realtime;
pub mod users;

use selfdb_db::models::Bucket;

use crate::error::ApiError;
use crate::extractors::{Principal, RequestContext};

/// Shared by the Bucket and File Coordinators: a bucket's own visibility is
/// the read boundary, ownership (or superuser) is the write boundary (§4.6,
/// §4.7).
pub(crate) fn authorize_bucket_read(ctx: &RequestContext, bucket: &Bucket) -> Result<(), ApiError> {
    if bucket.is_public {
        return ctx.require_anon_or_user();
    }
    // A valid anon key is a recognized, just under-privileged principal for
    // a private bucket: 403, not the 401 `require_user` would raise for a
    // missing/invalid ticket.
    if matches!(ctx.principal, Principal::Anonymous) {
        return Err(ApiError::Forbidden);
    }
    let user = ctx.require_user()?;
    if user.user_id != bucket.owner_id && !user.is_superuser {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

pub(crate) fn authorize_bucket_write(ctx: &RequestContext, bucket: &Bucket) -> Result<(), ApiError> {
    let user = ctx.require_user()?;
    if user.user_id != bucket.owner_id && !user.is_superuser {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

//! File-bytes endpoints (§4.7, §4.8): presigned upload, direct upload,
//! download/view with Range support and adaptive chunking, delete, purge.

use std::path::Path;

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::auth::{ApiKeyGuard, FileAccessGuard};
use crate::chunked;
use crate::error::StoreError;
use crate::metadata;
use crate::path_safety;
use crate::AppState;

#[derive(Deserialize)]
pub struct PresignBody {
    pub content_type: Option<String>,
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

fn default_ttl() -> u64 {
    3600
}

#[derive(Serialize)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub method: &'static str,
}

/// Simplified scheme (§4.8): the URL is not cryptographically bound to
/// ttl/content-type, it just points at the direct-PUT endpoint; whoever
/// holds it still needs a valid ticket (or the service API key) to use it.
pub async fn presigned_upload_url(
    _auth: ApiKeyGuard,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    _body: web::Json<PresignBody>,
) -> Result<HttpResponse, StoreError> {
    let (bucket, key) = path.into_inner();
    path_safety::bucket_dir(&state.root, &bucket)?;
    Ok(HttpResponse::Ok().json(PresignedUpload {
        upload_url: format!("/files/upload-direct/{bucket}/{key}"),
        method: "PUT",
    }))
}

pub async fn upload_direct(
    guard: FileAccessGuard,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, StoreError> {
    let (bucket, key) = path.into_inner();
    let dest = path_safety::object_path(&state.root, &bucket, &key)?;
    let bucket_dir = path_safety::bucket_dir(&state.root, &bucket)?;
    let meta = metadata::read(&bucket_dir).await?;
    if !guard.0.may_write(meta.owner_id) {
        return Err(StoreError::Unauthorized);
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let result = if content_type.starts_with("multipart/") {
        let mut multipart = Multipart::new(req.headers(), payload);
        match multipart.try_next().await.map_err(|e| StoreError::Internal(e.to_string()))? {
            Some(field) => {
                let stream = field.map_err(|e| StoreError::Internal(e.to_string()));
                write_stream_to_disk(stream, &dest, &content_type).await
            }
            None => Err(StoreError::Internal("multipart body had no fields".to_string())),
        }
    } else {
        let stream = payload.map_err(|e| StoreError::Internal(e.to_string()));
        write_stream_to_disk(stream, &dest, &content_type).await
    };

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&dest).await;
        return Err(e);
    }

    info!("object uploaded"; "bucket" => bucket.as_str(), "key" => key.as_str());
    Ok(HttpResponse::Ok().finish())
}

async fn write_stream_to_disk(
    mut stream: impl futures::Stream<Item = Result<web::Bytes, StoreError>> + Unpin,
    dest: &Path,
    content_type: &str,
) -> Result<(), StoreError> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut head: Vec<u8> = Vec::with_capacity(16);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if head.len() < 16 {
            head.extend(chunk.iter().take(16 - head.len()));
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    chunked::check_signature(content_type, &head);
    Ok(())
}

pub async fn download(
    guard: FileAccessGuard,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> Result<HttpResponse, StoreError> {
    serve_object(&state, path.into_inner(), guard, &req, None).await
}

pub async fn view(
    guard: FileAccessGuard,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<ViewQuery>,
    req: HttpRequest,
) -> Result<HttpResponse, StoreError> {
    serve_object(&state, path.into_inner(), guard, &req, query.content_type.clone()).await
}

#[derive(Deserialize)]
pub struct ViewQuery {
    pub content_type: Option<String>,
}

async fn serve_object(
    state: &AppState,
    (bucket, key): (String, String),
    guard: FileAccessGuard,
    req: &HttpRequest,
    content_type_override: Option<String>,
) -> Result<HttpResponse, StoreError> {
    let bucket_dir = path_safety::bucket_dir(&state.root, &bucket)?;
    let meta = metadata::read(&bucket_dir).await?;
    if !guard.0.may_read(meta.owner_id, meta.is_public) {
        return Err(StoreError::Unauthorized);
    }

    let object_path = path_safety::object_path(&state.root, &bucket, &key)?;
    let file_meta = tokio::fs::metadata(&object_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound
        } else {
            StoreError::Io(e)
        }
    })?;
    let size = file_meta.len();

    let content_type = content_type_override
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
        .unwrap_or_else(|| {
            mime_guess::from_path(&key)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

    if let Some(range) = req.headers().get(header::RANGE).and_then(|v| v.to_str().ok()) {
        if let Some((start, end)) = parse_range(range, size) {
            let len = end - start + 1;
            let mut file = tokio::fs::File::open(&object_path).await?;
            file.seek(std::io::SeekFrom::Start(start)).await?;
            let mut buf = vec![0u8; len as usize];
            file.read_exact(&mut buf).await?;
            return Ok(HttpResponse::PartialContent()
                .content_type(content_type)
                .insert_header((header::CONTENT_RANGE, format!("bytes {start}-{end}/{size}")))
                .insert_header((header::ACCEPT_RANGES, "bytes"))
                .body(buf));
        }
    }

    if size < chunked::SMALL_FILE_THRESHOLD {
        let bytes = tokio::fs::read(&object_path).await?;
        return Ok(HttpResponse::Ok()
            .content_type(content_type)
            .insert_header((header::ACCEPT_RANGES, "bytes"))
            .body(bytes));
    }

    let file = tokio::fs::File::open(&object_path).await?;
    let stream = adaptive_stream(file, size);
    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((header::ACCEPT_RANGES, "bytes"))
        .streaming(stream))
}

/// First chunk goes out at `INITIAL_CHUNK` size so a cold client sees bytes
/// fast, then settles into whatever steady-state size fits the file (§4.8).
fn adaptive_stream(
    file: tokio::fs::File,
    size: u64,
) -> impl futures::Stream<Item = std::io::Result<web::Bytes>> {
    let steady = chunked::steady_state_chunk_size(size);
    futures::stream::unfold((file, true), move |(mut file, first)| async move {
        let cap = if first { chunked::INITIAL_CHUNK } else { steady };
        let mut buf = vec![0u8; cap];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(web::Bytes::from(buf)), (file, false)))
            }
            Err(e) => Some((Err(e), (file, false))),
        }
    })
}

/// Single-range `bytes=start-end` only; anything else falls back to a full
/// 200 response.
fn parse_range(header_value: &str, size: u64) -> Option<(u64, u64)> {
    let spec = header_value.strip_prefix("bytes=")?;
    let (start_str, end_str) = spec.split_once('-')?;
    if start_str.is_empty() {
        let suffix_len: u64 = end_str.parse().ok()?;
        let start = size.saturating_sub(suffix_len);
        return Some((start, size - 1));
    }
    let start: u64 = start_str.parse().ok()?;
    let end = if end_str.is_empty() {
        size - 1
    } else {
        end_str.parse::<u64>().ok()?.min(size - 1)
    };
    if start > end || start >= size {
        return None;
    }
    Some((start, end))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_simple_range() {
        assert_eq!(parse_range("bytes=0-99", 1000), Some((0, 99)));
    }

    #[test]
    fn test_parse_open_ended_range() {
        assert_eq!(parse_range("bytes=500-", 1000), Some((500, 999)));
    }

    #[test]
    fn test_parse_suffix_range() {
        assert_eq!(parse_range("bytes=-100", 1000), Some((900, 999)));
    }

    #[test]
    fn test_parse_out_of_bounds_range_rejected() {
        assert_eq!(parse_range("bytes=2000-3000", 1000), None);
    }
}

pub async fn delete_file(
    guard: FileAccessGuard,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, StoreError> {
    let (bucket, key) = path.into_inner();
    let bucket_dir = path_safety::bucket_dir(&state.root, &bucket)?;
    let meta = metadata::read(&bucket_dir).await?;
    if !guard.0.may_write(meta.owner_id) {
        return Err(StoreError::Unauthorized);
    }

    let object_path = path_safety::object_path(&state.root, &bucket, &key)?;
    match tokio::fs::remove_file(&object_path).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Err(StoreError::Io(e)),
    }
}

/// §C supplemental: wipe every object in a bucket without deleting the
/// bucket itself (used when a bucket is emptied rather than removed).
pub async fn purge_bucket_objects(
    _auth: ApiKeyGuard,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, StoreError> {
    let bucket_dir = path_safety::bucket_dir(&state.root, &path)?;
    metadata::read(&bucket_dir).await?;

    let mut entries = tokio::fs::read_dir(&bucket_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name() == metadata::METADATA_FILENAME {
            continue;
        }
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(entry.path()).await?;
        } else {
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(HttpResponse::NoContent().finish())
}

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bucket or object not found")]
    NotFound,
    #[error("bucket already exists")]
    BucketExists,
    #[error("bucket is not empty")]
    BucketNotEmpty,
    #[error("path escapes bucket root")]
    PathEscape,
    #[error("unauthorized")]
    Unauthorized,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for StoreError {
    fn error_response(&self) -> HttpResponse {
        match self {
            StoreError::NotFound => HttpResponse::NotFound().json(body(self)),
            StoreError::BucketExists => HttpResponse::Conflict().json(body(self)),
            StoreError::BucketNotEmpty => HttpResponse::Conflict().json(body(self)),
            StoreError::PathEscape => HttpResponse::BadRequest().json(body(self)),
            StoreError::Unauthorized => HttpResponse::Unauthorized().json(body(self)),
            StoreError::Io(_) | StoreError::Internal(_) => {
                error!("object store internal error"; "error" => %self);
                HttpResponse::InternalServerError().json(body(self))
            }
        }
    }
}

fn body(error: &StoreError) -> serde_json::Value {
    serde_json::json!({ "detail": error.to_string() })
}

//! Top-level request error (§7 Error Handling Design): every handler
//! returns `Result<_, ApiError>` and this is the single place that maps a
//! failure kind to a wire status and a `{"detail": ...}` body.

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid api key")]
    MissingAnonKey,
    #[error("missing or invalid ticket")]
    InvalidTicket,
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage service unavailable: {0}")]
    StorageUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingAnonKey | ApiError::InvalidTicket => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self, ApiError::Internal(_) | ApiError::StorageUnavailable(_)) {
            error!("request failed"; "error" => %self);
        }
        let mut builder = HttpResponse::build(self.status_code());
        if matches!(self, ApiError::InvalidTicket) {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(json!({ "detail": self.to_string() }))
    }
}

impl From<selfdb_db::DbError> for ApiError {
    fn from(e: selfdb_db::DbError) -> Self {
        match e.status {
            StatusCode::NOT_FOUND => ApiError::NotFound("resource"),
            StatusCode::CONFLICT => ApiError::Conflict(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<selfdb_auth::AuthError> for ApiError {
    fn from(e: selfdb_auth::AuthError) -> Self {
        use selfdb_auth::AuthError;
        match e {
            AuthError::InvalidTicket
            | AuthError::TicketExpired
            | AuthError::UserInactive
            | AuthError::InvalidRefreshToken => ApiError::InvalidTicket,
            AuthError::Hash(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<selfdb_storage_client::StorageClientError> for ApiError {
    fn from(e: selfdb_storage_client::StorageClientError) -> Self {
        if e.is_not_found() {
            ApiError::NotFound("object")
        } else {
            ApiError::StorageUnavailable(e.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::body::MessageBody;
    use actix_web::ResponseError;

    use super::ApiError;

    #[test]
    fn status_codes_match_error_table() {
        assert_eq!(ApiError::MissingAnonKey.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidTicket.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("file").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("dup".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Validation("bad".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::StorageUnavailable("down".into()).status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::Internal("oops".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn body_is_a_flat_detail_field() {
        let resp = ApiError::Forbidden.error_response();
        let body = resp.into_body().try_into_bytes().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "detail": "forbidden" }));
    }

    #[test]
    fn invalid_ticket_carries_www_authenticate() {
        let resp = ApiError::InvalidTicket.error_response();
        assert_eq!(resp.headers().get(actix_web::http::header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }
}

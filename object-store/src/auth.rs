//! Shared-secret auth between the backend and the object store (§6.2):
//! every request must carry `X-API-Key` matching the configured secret.

use std::collections::HashMap;
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use uuid::Uuid;

use crate::error::StoreError;
use crate::AppState;

pub struct ApiKeyGuard;

impl FromRequest for ApiKeyGuard {
    type Error = StoreError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().expect("AppState missing");
        let presented = req
            .headers()
            .get("X-API-Key")
            .and_then(|v| v.to_str().ok());
        let matches = presented
            .map(|p| selfdb_common::constant_time_eq_bytes(p.as_bytes(), state.settings.api_key.as_bytes()))
            .unwrap_or(false);
        if matches {
            ready(Ok(ApiKeyGuard))
        } else {
            ready(Err(StoreError::Unauthorized))
        }
    }
}

/// Who is asking for a file. Bucket/object endpoints that are only ever
/// reached service-to-service use `ApiKeyGuard`; the file-bytes endpoints
/// (`upload-direct`, `download`, `view`) are also reached directly by
/// browsers holding a ticket (or nothing at all, for a public bucket), so
/// they accept a wider range of credentials and leave the
/// owner/superuser/public decision to the handler.
#[derive(Debug, Clone, Copy)]
pub enum AccessPrincipal {
    /// The backend itself, presenting the shared `X-API-Key`.
    Service,
    User { user_id: Uuid, is_superuser: bool },
    Anonymous,
}

impl AccessPrincipal {
    pub fn may_read(&self, owner_id: Uuid, is_public: bool) -> bool {
        match self {
            AccessPrincipal::Service => true,
            AccessPrincipal::User { user_id, is_superuser } => {
                *is_superuser || *user_id == owner_id || is_public
            }
            AccessPrincipal::Anonymous => is_public,
        }
    }

    pub fn may_write(&self, owner_id: Uuid) -> bool {
        match self {
            AccessPrincipal::Service => true,
            AccessPrincipal::User { user_id, is_superuser } => *is_superuser || *user_id == owner_id,
            AccessPrincipal::Anonymous => false,
        }
    }
}

pub struct FileAccessGuard(pub AccessPrincipal);

impl FromRequest for FileAccessGuard {
    type Error = StoreError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().expect("AppState missing");

        if let Some(presented) = req.headers().get("X-API-Key").and_then(|v| v.to_str().ok()) {
            if selfdb_common::constant_time_eq_bytes(presented.as_bytes(), state.settings.api_key.as_bytes()) {
                return ready(Ok(FileAccessGuard(AccessPrincipal::Service)));
            }
        }

        let bearer = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);

        let query_ticket = web::Query::<HashMap<String, String>>::from_query(req.query_string())
            .ok()
            .and_then(|q| q.get("ticket").cloned());

        let token = match bearer.or(query_ticket) {
            Some(t) => t,
            None => return ready(Ok(FileAccessGuard(AccessPrincipal::Anonymous))),
        };

        let secret = state.settings.signing_secret_bytes();
        match selfdb_auth::verify_ticket(&secret, &token) {
            Ok(claims) => match claims.sub.parse::<Uuid>() {
                Ok(user_id) => ready(Ok(FileAccessGuard(AccessPrincipal::User {
                    user_id,
                    is_superuser: claims.is_superuser,
                }))),
                Err(_) => ready(Ok(FileAccessGuard(AccessPrincipal::Anonymous))),
            },
            Err(_) => ready(Ok(FileAccessGuard(AccessPrincipal::Anonymous))),
        }
    }
}

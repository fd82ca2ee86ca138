//! HTTP/WebSocket surface (§6 API Surface). `routes` wires every handler
//! into an `actix_web::web::ServiceConfig`; `selfdb-server` owns the
//! `HttpServer` and mounts this crate under `/api/v1`.

#[macro_use]
extern crate slog_scope;

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

use actix_web::web;

pub use error::ApiError;
pub use extractors::{Principal, RequestContext, UserPrincipal};
pub use middleware::CorsArbiter;
pub use state::AppState;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health::health))
        .route("/health/db", web::get().to(handlers::health::health_db))
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(handlers::auth::register))
                .route("/login", web::post().to(handlers::auth::login))
                .route("/refresh", web::post().to(handlers::auth::refresh)),
        )
        .service(
            web::scope("/users")
                .route("/me", web::get().to(handlers::users::me))
                .route("/me", web::put().to(handlers::users::update_me))
                .route("/me/password", web::put().to(handlers::users::update_password))
                .route("/me", web::delete().to(handlers::users::delete_me))
                .route("/me/anon-key", web::get().to(handlers::users::anon_key))
                .route("/count", web::get().to(handlers::users::count_users))
                .route("", web::get().to(handlers::users::list_users))
                .route("", web::post().to(handlers::users::create_user))
                .route("/{id}", web::get().to(handlers::users::get_user))
                .route("/{id}", web::put().to(handlers::users::update_user))
                .route("/{id}", web::delete().to(handlers::users::delete_user)),
        )
        .service(
            web::scope("/buckets")
                .route("/public", web::get().to(handlers::buckets::list_public))
                .route("", web::get().to(handlers::buckets::list_buckets))
                .route("", web::post().to(handlers::buckets::create_bucket))
                .route("/{id}/files", web::get().to(handlers::buckets::list_bucket_files))
                .route("/{id}", web::get().to(handlers::buckets::get_bucket))
                .route("/{id}", web::put().to(handlers::buckets::update_bucket))
                .route("/{id}", web::delete().to(handlers::buckets::delete_bucket)),
        )
        .service(
            web::scope("/files")
                .route("", web::get().to(handlers::files::list_files))
                .route("/initiate-upload", web::post().to(handlers::files::initiate_upload))
                .route("/public/{id}/download-info", web::get().to(handlers::files::public_download_info))
                .route("/public/{id}/view-info", web::get().to(handlers::files::public_view_info))
                .route("/{id}/download-info", web::get().to(handlers::files::download_info))
                .route("/{id}/view-info", web::get().to(handlers::files::view_info))
                .route("/{id}", web::delete().to(handlers::files::delete_file)),
        )
        .service(
            web::scope("/cors")
                .route("/origins", web::get().to(handlers::cors::list_origins))
                .route("/origins", web::post().to(handlers::cors::create_origin))
                .route("/origins/{id}", web::get().to(handlers::cors::get_origin))
                .route("/origins/{id}", web::put().to(handlers::cors::update_origin))
                .route("/origins/{id}", web::delete().to(handlers::cors::delete_origin))
                .route("/validate", web::post().to(handlers::cors::validate))
                .route("/refresh-cache", web::post().to(handlers::cors::refresh_cache)),
        )
        .route("/realtime/ws", web::get().to(handlers::realtime::websocket));
}

//! Standalone object-storage service (§4.8): filesystem-backed bucket and
//! file operations behind a shared-secret API, plus a handful of
//! directly-browser-reachable file-bytes endpoints.

#[macro_use]
extern crate slog_scope;

mod auth;
mod buckets;
mod chunked;
mod error;
mod files;
mod metadata;
mod path_safety;
mod settings;

use std::path::PathBuf;

use actix_web::{web, App, HttpServer};

use settings::Settings;

pub struct AppState {
    pub settings: Settings,
    pub root: PathBuf,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config_file = std::env::var("OBJECT_STORE_CONFIG").ok();
    let settings = Settings::with_env_and_config_file(config_file.as_deref())
        .expect("failed to load object-store settings");

    selfdb_common::logging::init_logging(!settings.human_logs, "object-store")
        .expect("failed to initialize logging");

    let _sentry_guard = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    info!("starting object store"; "addr" => settings.banner());

    let root = PathBuf::from(&settings.storage_root);
    std::fs::create_dir_all(&root).expect("failed to create storage root");

    let bind_addr = (settings.host.clone(), settings.port);
    let state = web::Data::new(AppState {
        settings,
        root,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(256 * 1024 * 1024))
            .route("/buckets", web::post().to(buckets::create_bucket))
            .route("/buckets", web::get().to(buckets::list_buckets))
            .route("/buckets/{bucket}", web::get().to(buckets::get_bucket))
            .route("/buckets/{bucket}", web::put().to(buckets::update_bucket))
            .route("/buckets/{bucket}", web::delete().to(buckets::delete_bucket))
            .route("/buckets/{bucket}/exists", web::get().to(buckets::bucket_exists))
            .route(
                "/files/presigned-url/upload/{bucket}/{key:.*}",
                web::post().to(files::presigned_upload_url),
            )
            .route("/files/upload-direct/{bucket}/{key:.*}", web::put().to(files::upload_direct))
            .route("/files/download/{bucket}/{key:.*}", web::get().to(files::download))
            .route("/files/view/{bucket}/{key:.*}", web::get().to(files::view))
            .route("/files/{bucket}/objects", web::delete().to(files::purge_bucket_objects))
            .route("/files/{bucket}/{key:.*}", web::delete().to(files::delete_file))
    })
    .bind(bind_addr)?
    .run()
    .await
}

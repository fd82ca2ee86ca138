//! The SelfDB backend binary: wires the metadata database, the Object
//! Store client, the Policy Cache, and the Notification Bridge into a
//! single `actix_web::HttpServer` serving `selfdb-web`'s routes under
//! `/api/v1`.

#[macro_use]
extern crate slog_scope;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use url::Url;

use selfdb_common::Metrics;
use selfdb_db::DbPool;
use selfdb_policy::OriginPolicy;
use selfdb_realtime::{ChangeEvent, SessionRegistry};
use selfdb_settings::Settings;
use selfdb_storage_client::StorageServiceClient;
use selfdb_web::{AppState, CorsArbiter};

/// Capacity of the broadcast channel feeding every realtime session (§4.4,
/// §4.5). A slow consumer only loses its own backlog past this depth; it
/// never blocks the Notification Bridge or other sessions.
const CHANGE_EVENT_CHANNEL_CAPACITY: usize = 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config_file = std::env::var("SELFDB_CONFIG").ok();
    let settings = Settings::with_env_and_config_file(config_file.as_deref()).expect("failed to load settings");

    selfdb_common::logging::init_logging(!settings.human_logs, "selfdb-server").expect("failed to initialize logging");

    let _sentry_guard = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let metrics_client = selfdb_common::metrics_from_opts("selfdb", settings.statsd_host.as_deref(), settings.statsd_port)
        .expect("failed to initialize metrics");
    let metrics = Metrics::from(&metrics_client);

    info!("starting selfdb-server"; "addr" => settings.banner());

    let db = Arc::new(DbPool::new(&settings.postgres, &metrics).expect("failed to build db pool"));
    selfdb_db::trigger::provision_all(&db).await;

    let storage = StorageServiceClient::new(
        Url::parse(&settings.storage_service_url).expect("invalid storage_service_url"),
        Url::parse(&settings.storage_service_external_url).expect("invalid storage_service_external_url"),
        settings.storage_service_api_key.clone(),
    );

    let origins = Arc::new(OriginPolicy::new(db.clone(), settings.cors_allowed_origins.clone().unwrap_or_default()));

    let (realtime_events, _) = tokio::sync::broadcast::channel::<ChangeEvent>(CHANGE_EVENT_CHANNEL_CAPACITY);
    selfdb_realtime::spawn_bridge(settings.postgres.database_url(), realtime_events.clone());
    let realtime_registry = Arc::new(SessionRegistry::new());

    let settings = Arc::new(settings);
    let bind_addr = (settings.host.clone(), settings.port);

    let state = web::Data::new(AppState {
        db,
        storage,
        origins: origins.clone(),
        settings,
        metrics,
        realtime_events,
        realtime_registry,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(CorsArbiter::new(origins.clone()))
            .service(web::scope("/api/v1").configure(selfdb_web::routes))
    })
    .bind(bind_addr)?
    .run()
    .await
}

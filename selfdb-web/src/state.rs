//! Per-process shared state (§9 "dependency-injected request context" —
//! this is the process-wide half; `extractors::RequestContext` is the
//! per-request half built from it).

use std::sync::Arc;

use selfdb_common::Metrics;
use selfdb_db::DbPool;
use selfdb_policy::OriginPolicy;
use selfdb_realtime::{ChangeEvent, SessionRegistry};
use selfdb_settings::Settings;
use selfdb_storage_client::StorageServiceClient;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub storage: StorageServiceClient,
    pub origins: Arc<OriginPolicy>,
    pub settings: Arc<Settings>,
    pub metrics: Metrics,
    /// Feeds every `RealtimeSession`; each new WebSocket connection calls
    /// `subscribe()` on this to get its own receiver (§4.5).
    pub realtime_events: tokio::sync::broadcast::Sender<ChangeEvent>,
    pub realtime_registry: Arc<SessionRegistry>,
}

//! WebSocket session registry (§5 "WebSocket session registry": map from
//! principal-id to set of sessions; all mutations guarded).

use actix::Addr;
use dashmap::DashMap;
use uuid::Uuid;

use crate::session::RealtimeSession;

/// Tracks which sessions belong to which authenticated principal. Not
/// currently read by anything other than metrics/diagnostics; subscription
/// delivery is driven by the broadcast channel each session subscribes to
/// directly, not by a registry lookup.
#[derive(Default)]
pub struct SessionRegistry {
    by_principal: DashMap<Uuid, Vec<Addr<RealtimeSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    pub fn insert(&self, principal_id: Uuid, addr: Addr<RealtimeSession>) {
        self.by_principal.entry(principal_id).or_default().push(addr);
    }

    pub fn remove(&self, principal_id: Uuid, addr: &Addr<RealtimeSession>) {
        if let Some(mut sessions) = self.by_principal.get_mut(&principal_id) {
            sessions.retain(|a| a != addr);
            if sessions.is_empty() {
                drop(sessions);
                self.by_principal.remove(&principal_id);
            }
        }
    }

    pub fn session_count(&self, principal_id: Uuid) -> usize {
        self.by_principal
            .get(&principal_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }

    pub fn total_sessions(&self) -> usize {
        self.by_principal.iter().map(|e| e.value().len()).sum()
    }
}

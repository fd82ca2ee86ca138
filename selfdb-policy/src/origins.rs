//! The origin allow-set used by the CORS Arbiter (§4.3): env-configured
//! origins and a small fixed default set are always present; the
//! DB-registered origins are the bounded-staleness part.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use selfdb_db::DbPool;

use crate::cache::PolicyCache;

const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

fn default_origins() -> HashSet<String> {
    ["http://localhost", "http://localhost:3000"]
        .into_iter()
        .map(String::from)
        .collect()
}

type DbOriginsFuture = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<String>, selfdb_db::DbError>> + Send>>;

/// Combines env/default origins with the DB-backed, cached allow-set.
pub struct OriginPolicy {
    env_origins: HashSet<String>,
    db_cache: PolicyCache<Vec<String>, Box<dyn Fn() -> DbOriginsFuture + Send + Sync>, DbOriginsFuture, selfdb_db::DbError>,
}

impl OriginPolicy {
    pub fn new(pool: Arc<DbPool>, env_origins: impl IntoIterator<Item = String>) -> Self {
        let refresh: Box<dyn Fn() -> DbOriginsFuture + Send + Sync> = Box::new(move || {
            let pool = pool.clone();
            Box::pin(async move { selfdb_db::queries::origins::active_origins(&pool).await })
        });
        OriginPolicy {
            env_origins: env_origins.into_iter().collect(),
            db_cache: PolicyCache::new(CACHE_TTL, refresh),
        }
    }

    /// Union of env origins, default origins, and the cached DB-active set.
    pub async fn get_all_origins(&self) -> HashSet<String> {
        let mut all = default_origins();
        all.extend(self.env_origins.iter().cloned());
        all.extend(self.db_cache.get().await);
        all
    }

    pub async fn is_allowed(&self, origin: &str) -> bool {
        if self.env_origins.iter().any(|o| o == "*") {
            return true;
        }
        self.get_all_origins().await.contains(origin)
    }

    /// Forces the next lookup to refresh the DB-backed portion.
    pub async fn invalidate(&self) {
        self.db_cache.invalidate().await;
    }

    /// Synchronously refreshes the DB-backed portion now.
    pub async fn refresh(&self) {
        self.db_cache.refresh().await;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_origins_present() {
        let defaults = default_origins();
        assert!(defaults.contains("http://localhost:3000"));
    }
}

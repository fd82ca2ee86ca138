//! Generic bounded-staleness, single-flight cache (§4.1 Policy Cache).
//!
//! Not specific to origins: any value that's expensive to recompute and
//! tolerates a few minutes of staleness can use this. The origin allow-set
//! is the one instance SelfDB needs today.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

struct Entry<T> {
    value: Option<T>,
    last_refresh: Option<Instant>,
}

/// Caches the result of `refresh` for up to `ttl`. Concurrent callers during
/// a refresh observe the previous value (read-through, single-flight); a
/// failed refresh keeps serving the previous value and logs the error.
pub struct PolicyCache<T, F, Fut, E>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    E: std::fmt::Display,
{
    entry: RwLock<Entry<T>>,
    refreshing: Mutex<bool>,
    ttl: Duration,
    refresh: F,
}

impl<T, F, Fut, E> PolicyCache<T, F, Fut, E>
where
    T: Clone + Default + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    E: std::fmt::Display,
{
    pub fn new(ttl: Duration, refresh: F) -> Self {
        PolicyCache {
            entry: RwLock::new(Entry {
                value: None,
                last_refresh: None,
            }),
            refreshing: Mutex::new(false),
            ttl,
            refresh,
        }
    }

    /// Returns the cached value, refreshing it first if stale and no other
    /// caller is already refreshing.
    pub async fn get(&self) -> T {
        if let Some(fresh) = self.fresh_value().await {
            return fresh;
        }

        {
            let mut refreshing = self.refreshing.lock().await;
            if *refreshing {
                debug!("policy cache refresh already in progress, using cached value");
                drop(refreshing);
                return self.entry.read().await.value.clone().unwrap_or_default();
            }
            *refreshing = true;
        }

        let result = (self.refresh)().await;
        {
            let mut entry = self.entry.write().await;
            match result {
                Ok(value) => {
                    entry.value = Some(value);
                    entry.last_refresh = Some(Instant::now());
                }
                Err(e) => {
                    error!("policy cache refresh failed, retaining stale value"; "error" => %e);
                }
            }
        }
        *self.refreshing.lock().await = false;

        self.entry.read().await.value.clone().unwrap_or_default()
    }

    /// Forces the next `get()` to refresh, regardless of TTL.
    pub async fn invalidate(&self) {
        self.entry.write().await.last_refresh = None;
    }

    /// Synchronously refreshes now, bypassing the TTL check (but still
    /// single-flighted against a concurrent `get()`).
    pub async fn refresh(&self) {
        self.invalidate().await;
        self.get().await;
    }

    async fn fresh_value(&self) -> Option<T> {
        let entry = self.entry.read().await;
        match (&entry.value, entry.last_refresh) {
            (Some(value), Some(at)) if at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_caches_within_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let cache: PolicyCache<u32, _, _, String> = PolicyCache::new(Duration::from_secs(60), move || {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, String>(42)
            }
        });

        assert_eq!(cache.get().await, 42);
        assert_eq!(cache.get().await, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let cache: PolicyCache<u32, _, _, String> = PolicyCache::new(Duration::from_secs(60), move || {
            let calls = calls2.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) as u32;
                Ok::<u32, String>(n)
            }
        });

        let first = cache.get().await;
        cache.invalidate().await;
        let second = cache.get().await;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_failed_refresh_retains_stale_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let cache: PolicyCache<u32, _, _, String> = PolicyCache::new(Duration::from_millis(0), move || {
            let calls = calls2.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Ok::<u32, String>(7)
                } else {
                    Err("db unreachable".to_string())
                }
            }
        });

        assert_eq!(cache.get().await, 7);
        cache.invalidate().await;
        assert_eq!(cache.get().await, 7);
    }
}

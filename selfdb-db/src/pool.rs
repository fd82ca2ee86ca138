use std::time::Duration;

use diesel_async::{
    pooled_connection::{
        deadpool::{Object, Pool},
        AsyncDieselConnectionManager,
    },
    AsyncPgConnection,
};
use selfdb_common::Metrics;
use selfdb_settings::PostgresSettings;

use crate::error::DbResult;

pub(crate) type Conn = Object<AsyncPgConnection>;

/// The metadata database connection pool (§5 "Database connection pool":
/// every handler acquires one, uses it, releases it).
#[derive(Clone)]
pub struct DbPool {
    pool: Pool<AsyncPgConnection>,
    metrics: Metrics,
}

impl DbPool {
    pub fn new(settings: &PostgresSettings, metrics: &Metrics) -> DbResult<Self> {
        let manager =
            AsyncDieselConnectionManager::<AsyncPgConnection>::new(settings.database_url());

        let timeouts = deadpool::managed::Timeouts {
            wait: Some(Duration::from_secs(
                settings.pool_connection_timeout_secs as u64,
            )),
            ..Default::default()
        };
        let config = deadpool::managed::PoolConfig {
            max_size: settings.pool_max_size as usize,
            timeouts,
            ..Default::default()
        };

        let pool = Pool::builder(manager)
            .config(config)
            .runtime(deadpool::Runtime::Tokio1)
            .build()
            .map_err(|e| crate::error::DbError::internal(format!("building pool: {e}")))?;

        Ok(Self {
            pool,
            metrics: metrics.clone(),
        })
    }

    pub async fn get(&self) -> DbResult<Conn> {
        self.pool.get().await.map_err(|e| {
            self.metrics.incr("storage.pool.error");
            e.into()
        })
    }
}

use std::fmt;

use backtrace::Backtrace;
use deadpool::managed::PoolError;
use http::StatusCode;
use selfdb_common::{impl_fmt_display, InternalError, ReportableError};
use thiserror::Error;

/// Errors from the metadata database tier: connection pool exhaustion,
/// query failures, and row-consistency violations the Bucket/File
/// Coordinators surface as `INTERNAL` or `CONFLICT` per spec §7.
#[derive(Debug)]
pub struct DbError {
    kind: DbErrorKind,
    pub status: StatusCode,
    pub backtrace: Box<Backtrace>,
}

impl DbError {
    pub fn internal(msg: String) -> Self {
        DbErrorKind::Internal(msg).into()
    }

    pub fn not_found(what: &'static str) -> Self {
        let mut e: Self = DbErrorKind::NotFound(what).into();
        e.status = StatusCode::NOT_FOUND;
        e
    }

    pub fn conflict(what: &'static str) -> Self {
        let mut e: Self = DbErrorKind::Conflict(what).into();
        e.status = StatusCode::CONFLICT;
        e
    }

    pub fn pool_timeout(timeout_type: deadpool::managed::TimeoutType) -> Self {
        DbErrorKind::PoolTimeout(timeout_type).into()
    }
}

#[derive(Debug, Error)]
enum DbErrorKind {
    #[error("{0}")]
    Sql(#[from] diesel::result::Error),

    #[error("{0}")]
    Connection(#[from] diesel::result::ConnectionError),

    #[error("unexpected error: {0}")]
    Internal(String),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error("database pool timeout, type: {0:?}")]
    PoolTimeout(deadpool::managed::TimeoutType),
}

impl From<DbErrorKind> for DbError {
    fn from(kind: DbErrorKind) -> Self {
        let status = match &kind {
            DbErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            DbErrorKind::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            kind,
            status,
            backtrace: Box::new(Backtrace::new()),
        }
    }
}

impl From<diesel::result::Error> for DbError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => DbError::not_found("row"),
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => DbError::conflict("unique constraint"),
            other => DbErrorKind::Sql(other).into(),
        }
    }
}

impl From<diesel::result::ConnectionError> for DbError {
    fn from(e: diesel::result::ConnectionError) -> Self {
        DbErrorKind::Connection(e).into()
    }
}

impl From<PoolError<diesel_async::pooled_connection::PoolError>> for DbError {
    fn from(pe: PoolError<diesel_async::pooled_connection::PoolError>) -> DbError {
        match pe {
            PoolError::Backend(be) => match be {
                diesel_async::pooled_connection::PoolError::ConnectionError(ce) => ce.into(),
                diesel_async::pooled_connection::PoolError::QueryError(dbe) => dbe.into(),
            },
            PoolError::Timeout(timeout_type) => DbError::pool_timeout(timeout_type),
            _ => DbError::internal(format!("deadpool PoolError: {pe}")),
        }
    }
}

impl InternalError for DbError {
    fn internal_error(message: String) -> Self {
        DbErrorKind::Internal(message).into()
    }
}

impl ReportableError for DbError {
    fn is_sentry_event(&self) -> bool {
        !matches!(self.kind, DbErrorKind::NotFound(_) | DbErrorKind::PoolTimeout(_))
    }

    fn metric_label(&self) -> Option<&str> {
        match &self.kind {
            DbErrorKind::PoolTimeout(_) => Some("storage.pool.timeout"),
            DbErrorKind::Conflict(_) => Some("storage.conflict"),
            _ => None,
        }
    }

    fn backtrace(&self) -> Option<&backtrace::Backtrace> {
        Some(&self.backtrace)
    }
}

impl_fmt_display!(DbError, DbErrorKind);

pub type DbResult<T> = Result<T, DbError>;

#![warn(rust_2018_idioms)]

#[macro_use]
extern crate slog_scope;

pub mod error;
pub mod models;
mod pool;
pub mod queries;
pub mod schema;
pub mod slug;
pub mod trigger;

pub use error::{DbError, DbResult};
pub use pool::DbPool;

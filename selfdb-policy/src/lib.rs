//! Bounded-staleness caching for dynamic policy data (§4.1 Policy Cache).

#[macro_use]
extern crate slog_scope;

pub mod cache;
pub mod origins;

pub use cache::PolicyCache;
pub use origins::OriginPolicy;

//! Notification Bridge, Subscription Router, and WebSocket session handling
//! (§4.4, §4.5).

#[macro_use]
extern crate slog_scope;

pub mod bridge;
pub mod event;
pub mod registry;
pub mod session;
pub mod subscription;

pub use bridge::spawn as spawn_bridge;
pub use event::{ChangeEvent, Operation};
pub use registry::SessionRegistry;
pub use session::RealtimeSession;
pub use subscription::Subscription;

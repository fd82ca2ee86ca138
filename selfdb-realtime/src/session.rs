//! WebSocket session actor (§4.5 Subscription Router, `opened` →
//! `authenticated` → `closed` state machine).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web_actors::ws;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt as _;
use uuid::Uuid;

use selfdb_auth::ticket;
use selfdb_db::DbPool;

use crate::event::ChangeEvent;
use crate::registry::SessionRegistry;
use crate::subscription::Subscription;

/// 10 s to authenticate after `opened` (§4.5 state table).
const AUTH_TIMEOUT: Duration = Duration::from_secs(10);
/// Ping cadence once authenticated, and the window in which a pong must
/// arrive or the session is considered dead.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Authenticate {
        token: String,
    },
    Subscribe {
        subscription_id: String,
        #[serde(default)]
        data: Option<SubscribeData>,
    },
    Unsubscribe {
        subscription_id: String,
    },
}

#[derive(Debug, Deserialize)]
struct SubscribeData {
    #[serde(default)]
    table: Option<String>,
}

#[derive(Serialize)]
struct DatabaseChangeFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    subscription_id: &'a str,
    data: &'a ChangeEvent,
}

#[derive(Clone, Copy)]
struct AuthenticatedPrincipal {
    user_id: Uuid,
    #[allow(dead_code)]
    is_superuser: bool,
}

enum SessionState {
    Opened,
    Authenticated(AuthenticatedPrincipal),
}

pub struct RealtimeSession {
    state: SessionState,
    subscriptions: HashMap<String, Subscription>,
    signing_secret: [u8; 32],
    db_pool: Arc<DbPool>,
    registry: Arc<SessionRegistry>,
    events: Option<tokio::sync::broadcast::Receiver<ChangeEvent>>,
    last_pong: Instant,
}

impl RealtimeSession {
    pub fn new(
        signing_secret: [u8; 32],
        db_pool: Arc<DbPool>,
        registry: Arc<SessionRegistry>,
        events: tokio::sync::broadcast::Receiver<ChangeEvent>,
    ) -> Self {
        RealtimeSession {
            state: SessionState::Opened,
            subscriptions: HashMap::new(),
            signing_secret,
            db_pool,
            registry,
            events: Some(events),
            last_pong: Instant::now(),
        }
    }

    fn start_auth_deadline(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_later(AUTH_TIMEOUT, |act, ctx| {
            if matches!(act.state, SessionState::Opened) {
                debug!("realtime session did not authenticate in time, closing");
                ctx.stop();
            }
        });
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if act.last_pong.elapsed() > CLIENT_TIMEOUT {
                debug!("realtime session missed heartbeat, closing");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn start_event_forwarding(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(receiver) = self.events.take() {
            ctx.add_stream(BroadcastStream::new(receiver));
        }
    }

    fn handle_authenticate(&mut self, token: String, ctx: &mut ws::WebsocketContext<Self>) {
        let claims = match ticket::verify_ticket(&self.signing_secret, &token) {
            Ok(c) => c,
            Err(_) => {
                send_error(ctx, "invalid or expired token");
                ctx.stop();
                return;
            }
        };
        let user_id = match Uuid::parse_str(&claims.sub) {
            Ok(id) => id,
            Err(_) => {
                send_error(ctx, "invalid or expired token");
                ctx.stop();
                return;
            }
        };

        let pool = self.db_pool.clone();
        let registry = self.registry.clone();
        let is_superuser = claims.is_superuser;
        let fut = async move { selfdb_db::queries::users::get_user_by_id(&pool, user_id).await }
            .into_actor(self)
            .map(move |result, act, ctx| match result {
                Ok(Some(user)) if user.active => {
                    act.state = SessionState::Authenticated(AuthenticatedPrincipal {
                        user_id,
                        is_superuser,
                    });
                    registry.insert(user_id, ctx.address());
                    ctx.text(r#"{"type":"authenticated"}"#);
                }
                Ok(_) => {
                    send_error(ctx, "user is not active");
                    ctx.stop();
                }
                Err(e) => {
                    error!("failed to load user during realtime auth"; "error" => %e);
                    send_error(ctx, "internal error");
                    ctx.stop();
                }
            });
        ctx.spawn(fut);
    }

    fn handle_subscribe(&mut self, subscription_id: String, data: Option<SubscribeData>) {
        if !matches!(self.state, SessionState::Authenticated(_)) {
            return;
        }
        let table = data.and_then(|d| d.table);
        self.subscriptions
            .insert(subscription_id.clone(), Subscription { id: subscription_id, table });
    }

    fn handle_unsubscribe(&mut self, subscription_id: &str) {
        self.subscriptions.remove(subscription_id);
    }
}

fn send_error(ctx: &mut ws::WebsocketContext<RealtimeSession>, message: &str) {
    let frame = serde_json::json!({ "type": "error", "message": message });
    if let Ok(text) = serde_json::to_string(&frame) {
        ctx.text(text);
    }
}

impl Actor for RealtimeSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.start_auth_deadline(ctx);
        self.start_heartbeat(ctx);
        self.start_event_forwarding(ctx);
    }

    fn stopped(&mut self, ctx: &mut Self::Context) {
        if let SessionState::Authenticated(principal) = &self.state {
            self.registry.remove(principal.user_id, &ctx.address());
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for RealtimeSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(_) => {
                ctx.stop();
                return;
            }
        };
        match msg {
            ws::Message::Ping(bytes) => ctx.pong(&bytes),
            ws::Message::Pong(_) => self.last_pong = Instant::now(),
            ws::Message::Text(text) => {
                let frame: ClientFrame = match serde_json::from_str(&text) {
                    Ok(f) => f,
                    Err(_) => {
                        send_error(ctx, "malformed frame");
                        return;
                    }
                };
                match frame {
                    ClientFrame::Authenticate { token } => self.handle_authenticate(token, ctx),
                    ClientFrame::Subscribe { subscription_id, data } => {
                        self.handle_subscribe(subscription_id, data)
                    }
                    ClientFrame::Unsubscribe { subscription_id } => {
                        self.handle_unsubscribe(&subscription_id)
                    }
                }
            }
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => {}
        }
    }
}

/// Fan-out from the Notification Bridge's broadcast channel. A `Lagged`
/// error means this session's receiver fell behind — the broadcast
/// channel's own backpressure signal doubles as the "slow client" write
/// timeout in §5 ("a slow client may only delay its own session").
impl StreamHandler<Result<ChangeEvent, BroadcastStreamRecvError>> for RealtimeSession {
    fn handle(&mut self, item: Result<ChangeEvent, BroadcastStreamRecvError>, ctx: &mut Self::Context) {
        let event = match item {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("realtime session fell behind, closing"; "skipped" => skipped);
                ctx.stop();
                return;
            }
        };
        for subscription in self.subscriptions.values() {
            if subscription.matches(&event) {
                let frame = DatabaseChangeFrame {
                    kind: "database_change",
                    subscription_id: &subscription.id,
                    data: &event,
                };
                if let Ok(text) = serde_json::to_string(&frame) {
                    ctx.text(text);
                }
            }
        }
    }
}

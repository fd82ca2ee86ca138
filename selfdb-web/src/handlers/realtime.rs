//! `WEBSOCKET /realtime/ws?apikey=...` (§6.1, §4.5). The `apikey` gate is
//! enforced the same way as any other route, through the `RequestContext`
//! extractor; per-connection ticket authentication happens inside the
//! session actor's own `authenticate` frame.

use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;

use selfdb_realtime::RealtimeSession;

use crate::extractors::RequestContext;
use crate::state::AppState;

pub async fn websocket(
    _ctx: RequestContext,
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = RealtimeSession::new(
        state.settings.secret_key.signing_secret,
        state.db.clone(),
        state.realtime_registry.clone(),
        state.realtime_events.subscribe(),
    );
    ws::start(session, &req, stream)
}

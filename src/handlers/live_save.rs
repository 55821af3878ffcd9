use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;

use crate::{errors::ServerError, live_save::LiveSaveSession, AppState};

/// A note at the content limit, four bytes per character, plus the envelope.
const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Upgrades to a live-save channel for one note. An invalid filename fails the
/// handshake.
pub async fn connect(
    req: HttpRequest,
    stream: web::Payload,
    filename: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let session = LiveSaveSession::new(
        filename.into_inner(),
        state.store.clone(),
        state.sessions.clone(),
    )
    .map_err(|e: ServerError| {
        log::warn!("refused live-save handshake: {e}");
        e
    })?;

    ws::WsResponseBuilder::new(session, &req, stream)
        .frame_size(MAX_FRAME_BYTES)
        .start()
}

use std::sync::Arc;

use actix::prelude::*;
use actix_web::web;
use actix_web_actors::ws;
use nanoid::nanoid;
use serde_json::Value;

use super::{
    protocol::{self, Inbound, Outbound, MSG_EMPTY_DELETED, MSG_NOTHING_TO_DELETE, MSG_SAVED},
    registry::{Deliver, SessionRegistry},
};
use crate::{errors::ServerError, models::filename::NoteKey, store::NoteStore};

/// One websocket channel streaming edits of a single note.
pub struct LiveSaveSession {
    id: String,
    name: String,
    key: NoteKey,
    store: NoteStore,
    registry: Arc<SessionRegistry>,
}

impl LiveSaveSession {
    /// Fails when `name` is not a valid note filename.
    pub fn new(
        name: String,
        store: NoteStore,
        registry: Arc<SessionRegistry>,
    ) -> Result<Self, ServerError> {
        Ok(LiveSaveSession {
            id: nanoid!(10),
            key: NoteKey::canonicalize(&name)?,
            name,
            store,
            registry,
        })
    }

    fn on_text(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let (content, timestamp) = match protocol::parse(text) {
            Ok(Inbound::Save { content, timestamp }) => (content, timestamp),
            Ok(Inbound::InvalidSave { reason, timestamp }) => {
                self.registry
                    .send(&self.key, &Outbound::save_failed(reason, timestamp));
                return;
            }
            Ok(Inbound::Unknown) => {
                log::debug!("[{}] ignoring frame for {}", self.id, self.key);
                return;
            }
            Err(e) => return self.fail(e.to_string(), ctx),
        };

        let store = self.store.clone();
        let name = self.name.clone();
        let echo = timestamp.clone();
        let save = web::block(move || apply_save(&store, &name, content.as_deref(), timestamp));

        // saves from one channel are applied in arrival order
        ctx.wait(save.into_actor(self).map(move |res, act, _| {
            let ack = res.unwrap_or_else(|e| Outbound::save_failed(e.to_string(), echo));
            act.registry.send(&act.key, &ack);
        }));
    }

    /// Best-effort terminal notice on this channel, then shut it down.
    fn fail(&mut self, cause: String, ctx: &mut ws::WebsocketContext<Self>) {
        log::warn!("[{}] closing live-save channel for {}: {}", self.id, self.key, cause);
        if let Ok(text) = serde_json::to_string(&Outbound::Error { message: cause }) {
            ctx.text(text);
        }
        ctx.close(Some(ws::CloseCode::Error.into()));
        ctx.stop();
    }
}

/// Applies one save frame to the store and builds its acknowledgement.
/// Blank content deletes the note.
pub fn apply_save(
    store: &NoteStore,
    name: &str,
    content: Option<&str>,
    timestamp: Value,
) -> Outbound {
    let content = content.unwrap_or_default();

    let result = if content.trim().is_empty() {
        if store.exists(name) {
            store.delete(name).map(|_| MSG_EMPTY_DELETED)
        } else {
            Ok(MSG_NOTHING_TO_DELETE)
        }
    } else {
        store.write(name, content).map(|_| MSG_SAVED)
    };

    match result {
        Ok(message) => Outbound::saved(message, timestamp),
        Err(e) => {
            log::warn!("live-save of {name} failed: {e}");
            Outbound::save_failed(e.to_string(), timestamp)
        }
    }
}

impl Actor for LiveSaveSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let displaced = self
            .registry
            .register(self.key.clone(), self.id.clone(), ctx.address().recipient());
        match displaced {
            Some(previous) => log::info!(
                "[{}] live-save opened for {}, replacing {}",
                self.id,
                self.key,
                previous
            ),
            None => log::info!(
                "[{}] live-save opened for {} ({} active)",
                self.id,
                self.key,
                self.registry.len()
            ),
        }
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        self.registry.unregister(&self.key, &self.id);
        log::info!("[{}] live-save closed for {}", self.id, self.key);
    }
}

impl Handler<Deliver> for LiveSaveSession {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for LiveSaveSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => self.on_text(&text, ctx),
            Ok(ws::Message::Ping(bytes)) => ctx.pong(&bytes),
            Ok(ws::Message::Pong(_)) | Ok(ws::Message::Nop) => {}
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Binary(_)) | Ok(ws::Message::Continuation(_)) => {
                self.fail("expected a JSON text frame".to_string(), ctx)
            }
            Err(e) => self.fail(e.to_string(), ctx),
        }
    }
}

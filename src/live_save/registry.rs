use actix::prelude::*;
use dashmap::DashMap;

use super::protocol::Outbound;
use crate::models::filename::NoteKey;

/// Serialized frame for a live-save channel.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Deliver(pub String);

struct Registration {
    session_id: String,
    recipient: Recipient<Deliver>,
}

/// Maps each note to the newest live-save channel opened for it.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<NoteKey, Registration>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` to the session, replacing any earlier binding. The displaced
    /// channel stays open. Returns the displaced session id.
    pub fn register(
        &self,
        key: NoteKey,
        session_id: String,
        recipient: Recipient<Deliver>,
    ) -> Option<String> {
        self.sessions
            .insert(
                key,
                Registration {
                    session_id,
                    recipient,
                },
            )
            .map(|previous| previous.session_id)
    }

    /// Removes the binding only while it still belongs to `session_id`.
    pub fn unregister(&self, key: &NoteKey, session_id: &str) -> bool {
        self.sessions
            .remove_if(key, |_, registration| registration.session_id == session_id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Delivers to the channel registered for `key`, if any. A channel that can
    /// no longer receive is dropped from the registry.
    pub fn send(&self, key: &NoteKey, message: &Outbound) {
        let (session_id, recipient) = match self.sessions.get(key) {
            Some(registration) => (
                registration.session_id.clone(),
                registration.recipient.clone(),
            ),
            None => return,
        };

        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                log::error!("could not encode live-save message for {key}: {e}");
                return;
            }
        };

        match recipient.try_send(Deliver(text)) {
            Ok(()) => {}
            Err(SendError::Full(msg)) => recipient.do_send(msg),
            Err(SendError::Closed(_)) => {
                log::info!("live-save channel {session_id} for {key} is gone");
                self.unregister(key, &session_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::{sync::Arc, time::Duration};

    #[derive(Message)]
    #[rtype(result = "()")]
    struct Flush;

    #[derive(Message)]
    #[rtype(result = "()")]
    struct Shutdown;

    struct Collector {
        received: Arc<Mutex<Vec<String>>>,
    }

    impl Actor for Collector {
        type Context = Context<Self>;
    }

    impl Handler<Deliver> for Collector {
        type Result = ();

        fn handle(&mut self, msg: Deliver, _: &mut Self::Context) {
            self.received.lock().push(msg.0);
        }
    }

    impl Handler<Flush> for Collector {
        type Result = ();

        fn handle(&mut self, _: Flush, _: &mut Self::Context) {}
    }

    impl Handler<Shutdown> for Collector {
        type Result = ();

        fn handle(&mut self, _: Shutdown, ctx: &mut Self::Context) {
            ctx.stop();
        }
    }

    fn collector() -> (Addr<Collector>, Arc<Mutex<Vec<String>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let addr = Collector {
            received: received.clone(),
        }
        .start();
        (addr, received)
    }

    fn active_session(registry: &SessionRegistry, key: &NoteKey) -> Option<String> {
        registry.sessions.get(key).map(|r| r.session_id.clone())
    }

    fn key(name: &str) -> NoteKey {
        NoteKey::canonicalize(name).unwrap()
    }

    #[actix_web::test]
    async fn send_without_registration_is_noop() {
        let registry = SessionRegistry::new();
        registry.send(&key("nobody"), &Outbound::saved("saved", json!(null)));
        assert_eq!(registry.len(), 0);
    }

    #[actix_web::test]
    async fn newest_registration_receives_messages() {
        let registry = SessionRegistry::new();
        let (first, first_inbox) = collector();
        let (second, second_inbox) = collector();

        assert_eq!(
            registry.register(key("note"), "one".into(), first.clone().recipient()),
            None
        );
        assert_eq!(
            registry.register(key("note"), "two".into(), second.clone().recipient()),
            Some("one".to_string())
        );
        assert_eq!(registry.len(), 1);

        registry.send(&key("note.txt"), &Outbound::saved("saved", json!("t1")));
        first.send(Flush).await.unwrap();
        second.send(Flush).await.unwrap();

        assert!(first_inbox.lock().is_empty());
        let delivered = second_inbox.lock();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].contains("\"timestamp\":\"t1\""));
    }

    #[actix_web::test]
    async fn displaced_session_cannot_unregister_successor() {
        let registry = SessionRegistry::new();
        let (first, _) = collector();
        let (second, _) = collector();

        registry.register(key("note"), "one".into(), first.recipient());
        registry.register(key("note"), "two".into(), second.recipient());

        assert!(!registry.unregister(&key("note"), "one"));
        assert_eq!(active_session(&registry, &key("note")).as_deref(), Some("two"));
        assert!(registry.unregister(&key("note"), "two"));
        assert_eq!(registry.len(), 0);
    }

    #[actix_web::test]
    async fn failed_delivery_drops_registration() {
        let registry = SessionRegistry::new();
        let (addr, _) = collector();
        registry.register(key("note"), "one".into(), addr.clone().recipient());

        addr.send(Shutdown).await.unwrap();
        actix_web::rt::time::sleep(Duration::from_millis(50)).await;

        registry.send(&key("note"), &Outbound::saved("saved", json!(null)));
        assert_eq!(active_session(&registry, &key("note")), None);
    }
}

//! Live-save channels: a client streams note content over a websocket and
//! gets a `save_response` frame back for every save.

pub mod protocol;
pub mod registry;
pub mod session;

pub use registry::SessionRegistry;
pub use session::LiveSaveSession;

use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ServerError;

pub const MSG_SAVED: &str = "saved";
pub const MSG_EMPTY_DELETED: &str = "empty note deleted";
pub const MSG_NOTHING_TO_DELETE: &str = "nothing to delete";

/// Wire form of client frames. Any `type` other than `save` lands on `Unknown`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Envelope {
    Save {
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        timestamp: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, PartialEq)]
pub enum Inbound {
    Save {
        content: Option<String>,
        timestamp: Value,
    },
    /// A `save` whose fields had the wrong shape; answered with an error ack.
    InvalidSave { reason: String, timestamp: Value },
    /// Silently ignored.
    Unknown,
}

/// Parses one text frame. Only frames that are not a JSON object are an error,
/// and that error ends the session.
pub fn parse(text: &str) -> Result<Inbound, ServerError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ServerError::ValidationError(format!("malformed message: {e}")))?;
    if !value.is_object() {
        return Err(ServerError::ValidationError(
            "malformed message: expected a JSON object".to_string(),
        ));
    }

    let is_save = value.get("type").and_then(Value::as_str) == Some("save");
    let timestamp = value.get("timestamp").cloned().unwrap_or(Value::Null);

    match serde_json::from_value::<Envelope>(value) {
        Ok(Envelope::Save { content, timestamp }) => Ok(Inbound::Save { content, timestamp }),
        Ok(Envelope::Unknown) => Ok(Inbound::Unknown),
        Err(e) if is_save => Ok(Inbound::InvalidSave {
            reason: e.to_string(),
            timestamp,
        }),
        // no `type`, or a `type` that is not a string
        Err(_) => Ok(Inbound::Unknown),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    SaveResponse {
        status: Status,
        message: String,
        timestamp: Value,
    },
    Error {
        message: String,
    },
}

impl Outbound {
    pub fn saved(message: &str, timestamp: Value) -> Self {
        Outbound::SaveResponse {
            status: Status::Success,
            message: message.to_string(),
            timestamp,
        }
    }

    pub fn save_failed(message: String, timestamp: Value) -> Self {
        Outbound::SaveResponse {
            status: Status::Error,
            message,
            timestamp,
        }
    }
}

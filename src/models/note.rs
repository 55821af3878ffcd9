use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};

use super::filename::NoteKey;

pub const PREVIEW_SCAN_CHARS: usize = 100;
pub const PREVIEW_CHARS: usize = 50;
pub const NON_TEXT_PREVIEW: &str = "[non-text file]";

#[derive(Clone, Debug, Serialize)]
pub struct Note {
    #[serde(rename = "filename")]
    pub key: NoteKey,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Length of `content` in characters.
    pub size: usize,
}

impl Note {
    /// Placeholder returned for a note that has not been written yet.
    pub fn empty(key: NoteKey) -> Self {
        let now = Utc::now();
        Note {
            key,
            content: String::new(),
            created_at: now,
            updated_at: now,
            size: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NoteListItem {
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Size on disk in bytes.
    pub size: u64,
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<NoteListItem>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SaveRequest {
    pub content: String,
}

/// Builds the listing preview from the leading characters of a note.
pub fn preview(leading: &str) -> String {
    let collapsed: String = leading
        .chars()
        .take(PREVIEW_SCAN_CHARS)
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    let trimmed = collapsed.trim();

    if trimmed.chars().count() > PREVIEW_CHARS {
        let mut short: String = trimmed.chars().take(PREVIEW_CHARS).collect();
        short.push_str("...");
        short
    } else {
        trimmed.to_string()
    }
}

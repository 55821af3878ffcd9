use serde_derive::Serialize;

use crate::{config::MAX_FILENAME_CHARS, errors::ServerError};

const EXTENSION: &str = ".txt";

/// A validated note filename, always ending in `.txt`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NoteKey(String);

impl NoteKey {
    pub fn canonicalize(raw: &str) -> Result<Self, ServerError> {
        if !is_valid(raw) {
            return Err(ServerError::ValidationError(format!("Invalid filename: {raw}")));
        }

        if has_txt_extension(raw) {
            Ok(NoteKey(raw.to_string()))
        } else {
            Ok(NoteKey(format!("{raw}{EXTENSION}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NoteKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Checks a requested name as given, before any `.txt` is appended.
pub fn is_valid(raw: &str) -> bool {
    let len = raw.chars().count();
    if len == 0 || len > MAX_FILENAME_CHARS {
        return false;
    }

    if raw.starts_with(['_', '.', '-', '/']) || raw.contains("..") {
        return false;
    }

    raw.chars().all(is_allowed_char)
}

pub fn has_txt_extension(name: &str) -> bool {
    name.len() >= EXTENSION.len()
        && name
            .get(name.len() - EXTENSION.len()..)
            .map(|ext| ext.eq_ignore_ascii_case(EXTENSION))
            .unwrap_or(false)
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '.' | '-')
        // CJK unified ideographs, extension A, compatibility ideographs
        || ('\u{4e00}'..='\u{9fff}').contains(&c)
        || ('\u{3400}'..='\u{4dbf}').contains(&c)
        || ('\u{f900}'..='\u{faff}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_extension_when_missing() {
        assert_eq!(NoteKey::canonicalize("note1").unwrap().as_str(), "note1.txt");
        assert_eq!(NoteKey::canonicalize("todo.md").unwrap().as_str(), "todo.md.txt");
    }

    #[test]
    fn keeps_existing_extension_in_any_case() {
        assert_eq!(NoteKey::canonicalize("note1.txt").unwrap().as_str(), "note1.txt");
        assert_eq!(NoteKey::canonicalize("Draft.TXT").unwrap().as_str(), "Draft.TXT");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let near_limit = "a".repeat(MAX_FILENAME_CHARS - EXTENSION.len());
        for raw in ["note1", "a.b-c_d", "日记", "㐀笔记.txt", "x.TxT", "9", near_limit.as_str()] {
            let once = NoteKey::canonicalize(raw).unwrap();
            let twice = NoteKey::canonicalize(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn accepts_cjk_ideographs() {
        assert!(is_valid("会议记录"));
        assert!(is_valid("\u{f900}"));
        assert!(is_valid("notes-2024_第一版.v2"));
    }

    #[test]
    fn rejects_bad_names() {
        let too_long = "a".repeat(MAX_FILENAME_CHARS + 1);
        let rejected = [
            "",
            too_long.as_str(),
            ".hidden",
            "_private",
            "-dash",
            "a..b",
            "/etc",
            "dir/file",
            "with space",
            "emoji😀",
            "tab\tname",
            "ハロー",
        ];
        for raw in rejected {
            assert!(!is_valid(raw), "{raw:?} should be rejected");
            assert!(matches!(
                NoteKey::canonicalize(raw),
                Err(ServerError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn length_limit_counts_characters() {
        assert!(is_valid(&"a".repeat(MAX_FILENAME_CHARS)));
        assert!(is_valid(&"字".repeat(MAX_FILENAME_CHARS)));
        assert!(!is_valid(&"字".repeat(MAX_FILENAME_CHARS + 1)));
    }

    #[test]
    fn length_limit_includes_extension() {
        let at_limit = format!("{}.txt", "a".repeat(MAX_FILENAME_CHARS - EXTENSION.len()));
        assert!(is_valid(&at_limit));
        assert!(!is_valid(&format!("{}.txt", "a".repeat(MAX_FILENAME_CHARS))));
        assert!(NoteKey::canonicalize(&format!("{}.TXT", "b".repeat(MAX_FILENAME_CHARS))).is_err());
    }
}

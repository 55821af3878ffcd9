//! Flat-directory note storage.
//!
//! Every note is one regular file named by its [`NoteKey`] inside a single
//! directory. Metadata is never stored separately: timestamps and sizes come
//! from `stat` at access time.
//!
//! Same-key operations are serialized through a per-key mutex, so a read never
//! observes a half-written file produced by another request in this process.

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{
    config::{Config, MAX_CONTENT_CHARS},
    errors::ServerError,
    models::{
        filename::{has_txt_extension, NoteKey},
        note::{preview, Note, NoteListItem, NON_TEXT_PREVIEW, PREVIEW_SCAN_CHARS},
    },
};

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Clone)]
pub struct NoteStore {
    inner: Arc<Inner>,
}

struct Inner {
    dir: PathBuf,
    locks: DashMap<NoteKey, Arc<Mutex<()>>>,
}

impl NoteStore {
    /// Opens the store, creating the notes directory if needed.
    pub fn open(config: &Config) -> Result<Self, ServerError> {
        let dir = config.notes_dir.clone();
        fs::create_dir_all(&dir)
            .map_err(|e| ServerError::io("creating directory for", dir.display().to_string(), e))?;
        log::info!("notes are stored in {}", dir.display());

        Ok(NoteStore {
            inner: Arc::new(Inner {
                dir,
                locks: DashMap::new(),
            }),
        })
    }

    pub fn exists(&self, name: &str) -> bool {
        match NoteKey::canonicalize(name) {
            Ok(key) => self.path_of(&key).is_file(),
            Err(_) => false,
        }
    }

    pub fn read(&self, name: &str) -> Result<Note, ServerError> {
        let key = NoteKey::canonicalize(name)?;
        self.with_lock(&key, || {
            let path = self.path_of(&key);
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(ServerError::NotFound(key.to_string()))
                }
                Err(e) => return Err(ServerError::io("reading", key.as_str(), e)),
            };
            let content = String::from_utf8(bytes)
                .map_err(|_| ServerError::InvalidEncoding(key.to_string()))?;
            let metadata =
                fs::metadata(&path).map_err(|e| ServerError::io("reading", key.as_str(), e))?;

            Ok(note_from(key.clone(), content, &metadata))
        })
    }

    /// Overwrites the note unconditionally; the last writer wins.
    pub fn write(&self, name: &str, content: &str) -> Result<Note, ServerError> {
        let key = NoteKey::canonicalize(name)?;
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(ServerError::ValidationError(
                "File content too large (max 100,000 characters)".to_string(),
            ));
        }

        self.with_lock(&key, || {
            let path = self.path_of(&key);
            fs::write(&path, content).map_err(|e| ServerError::io("writing", key.as_str(), e))?;
            let metadata =
                fs::metadata(&path).map_err(|e| ServerError::io("writing", key.as_str(), e))?;
            log::debug!("wrote {} ({} bytes)", key, metadata.len());

            Ok(note_from(key.clone(), content.to_string(), &metadata))
        })
    }

    /// Deleting a note that does not exist succeeds.
    pub fn delete(&self, name: &str) -> Result<(), ServerError> {
        let key = NoteKey::canonicalize(name)?;
        self.with_lock(&key, || match fs::remove_file(self.path_of(&key)) {
            Ok(()) => {
                log::info!("deleted {key}");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServerError::io("deleting", key.as_str(), e)),
        })
    }

    /// Moves `old_name` to `new_name`. A missing source is treated as already
    /// renamed; an existing destination is a conflict and nothing is touched.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<(), ServerError> {
        let from = NoteKey::canonicalize(old_name)?;
        let to = NoteKey::canonicalize(new_name)?;

        // both keys are always locked in the same order
        let (first, second) = if from <= to { (&from, &to) } else { (&to, &from) };
        self.with_lock(first, || {
            if first == second {
                self.move_note(&from, &to)
            } else {
                self.with_lock(second, || self.move_note(&from, &to))
            }
        })
    }

    fn move_note(&self, from: &NoteKey, to: &NoteKey) -> Result<(), ServerError> {
        let from_path = self.path_of(from);
        let to_path = self.path_of(to);

        if !from_path.exists() {
            return Ok(());
        }
        if to_path.exists() {
            return Err(ServerError::Conflict(to.to_string()));
        }

        fs::rename(&from_path, &to_path).map_err(|e| ServerError::io("renaming", from.as_str(), e))?;
        log::info!("renamed {from} to {to}");
        Ok(())
    }

    /// One page of notes, newest first. Pages past the end are empty.
    pub fn list(&self, page: i64, limit: i64) -> Result<Vec<NoteListItem>, ServerError> {
        let (page, limit) = paging(Some(page), Some(limit));

        let mut items = Vec::new();
        for (name, path) in self.note_files().map_err(|e| ServerError::io("listing", "*.txt", e))? {
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                // removed between the directory scan and the stat
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(ServerError::io("listing", name, e)),
            };
            let (created_at, updated_at) = timestamps(&metadata);
            let preview = if metadata.len() > 0 {
                read_preview(&path)
            } else {
                String::new()
            };

            items.push(NoteListItem {
                filename: name,
                created_at,
                updated_at,
                size: metadata.len(),
                preview,
            });
        }

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let start = (page - 1).saturating_mul(limit);
        Ok(items.into_iter().skip(start).take(limit).collect())
    }

    /// Number of note files. A failed scan counts as zero.
    pub fn count(&self) -> usize {
        match self.note_files() {
            Ok(files) => files.len(),
            Err(e) => {
                log::warn!("counting notes failed: {e}");
                0
            }
        }
    }

    fn path_of(&self, key: &NoteKey) -> PathBuf {
        self.inner.dir.join(key.as_str())
    }

    /// Runs `op` while holding the key's mutex. The mutex is dropped from the
    /// map again once no other operation holds or waits on it.
    fn with_lock<T>(&self, key: &NoteKey, op: impl FnOnce() -> T) -> T {
        let lock = self.inner.locks.entry(key.clone()).or_default().value().clone();
        let result = {
            let _guard = lock.lock();
            op()
        };

        drop(lock);
        self.inner
            .locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    fn note_files(&self) -> io::Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.inner.dir)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if name.starts_with('.') || !has_txt_extension(&name) {
                continue;
            }
            let path = entry.path();
            if path.is_file() {
                files.push((name, path));
            }
        }
        Ok(files)
    }
}

/// Clamps listing parameters: page at least 1, limit within 1..=100 or the
/// default of 50.
pub fn paging(page: Option<i64>, limit: Option<i64>) -> (usize, usize) {
    let page = page.filter(|p| *p >= 1).unwrap_or(1) as usize;
    let limit = match limit {
        Some(l) if (1..=MAX_PAGE_LIMIT as i64).contains(&l) => l as usize,
        _ => DEFAULT_PAGE_LIMIT,
    };
    (page, limit)
}

fn note_from(key: NoteKey, content: String, metadata: &fs::Metadata) -> Note {
    let (created_at, updated_at) = timestamps(metadata);
    Note {
        key,
        size: content.chars().count(),
        content,
        created_at,
        updated_at,
    }
}

/// Birth time where the filesystem reports one, otherwise the modification time.
fn timestamps(metadata: &fs::Metadata) -> (DateTime<Utc>, DateTime<Utc>) {
    let updated_at = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    let created_at = metadata
        .created()
        .map(DateTime::<Utc>::from)
        .unwrap_or(updated_at);
    (created_at, updated_at)
}

fn read_preview(path: &Path) -> String {
    // a char is at most four bytes in UTF-8
    let mut buf = Vec::with_capacity(PREVIEW_SCAN_CHARS * 4);
    let read = fs::File::open(path)
        .and_then(|file| file.take((PREVIEW_SCAN_CHARS * 4) as u64).read_to_end(&mut buf));
    if let Err(e) = read {
        log::warn!("could not read preview of {}: {e}", path.display());
        return String::new();
    }

    match std::str::from_utf8(&buf) {
        Ok(text) => preview(text),
        // the read cut a multi-byte character in half
        Err(e) if e.error_len().is_none() => match std::str::from_utf8(&buf[..e.valid_up_to()]) {
            Ok(text) => preview(text),
            Err(_) => NON_TEXT_PREVIEW.to_string(),
        },
        Err(_) => NON_TEXT_PREVIEW.to_string(),
    }
}

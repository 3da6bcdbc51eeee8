//! One-JSON-file-per-note store.
//!
//! # Responsibility
//! - Map note ids to `<id>.json` files inside one notes directory.
//! - Publish every write with write-then-rename (`atomic_file`).
//! - Tolerate corrupt files during listing, surface them on direct loads.
//!
//! # Invariants
//! - File name is a pure function of the id (`note_file_name`), and only
//!   that exact name is read back as a note.
//! - A file whose embedded id differs from its file name is corrupt.
//! - No locking: one process owns the directory at a time.

use crate::config::CoreConfig;
use crate::model::note::{derive_title, Note, NoteId, UNTITLED_TITLE};
use crate::repo::atomic_file::{is_staged_temp_file, write_atomic};
use crate::repo::note_store::{sort_for_listing, NoteStore, StoreError, StoreResult};
use chrono::Utc;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

const NOTE_FILE_EXTENSION: &str = "json";
const NEW_NOTE_MAX_ATTEMPTS: usize = 4;

/// Returns the file name used to persist the note with `id`.
pub fn note_file_name(id: NoteId) -> String {
    format!("{}.{NOTE_FILE_EXTENSION}", id.as_hyphenated())
}

/// Filesystem-backed note store.
///
/// Cheap to clone; clones address the same directory.
#[derive(Debug, Clone)]
pub struct JsonNoteStore {
    notes_dir: PathBuf,
}

impl JsonNoteStore {
    /// Opens a store rooted at `notes_dir`, creating the directory if absent.
    ///
    /// Staged files left behind by an interrupted write are removed.
    pub fn open(notes_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self {
            notes_dir: notes_dir.into(),
        };
        store.ensure_dir()?;
        let swept = store.sweep_staged_files();
        info!(
            "event=store_open module=store status=ok dir={} stale_temp_removed={}",
            store.notes_dir.display(),
            swept
        );
        Ok(store)
    }

    /// Opens the store configured by `config.notes_dir`.
    pub fn from_config(config: &CoreConfig) -> StoreResult<Self> {
        Self::open(config.notes_dir.clone())
    }

    /// Directory holding the note files.
    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Full path of the file backing `id`.
    pub fn note_path(&self, id: NoteId) -> PathBuf {
        self.notes_dir.join(note_file_name(id))
    }

    fn ensure_dir(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.notes_dir).map_err(|err| StoreError::io(&self.notes_dir, err))
    }

    fn sweep_staged_files(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.notes_dir) else {
            return 0;
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if is_staged_temp_file(&path) && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Lists `(id, path)` for every published note file.
    fn note_files(&self) -> StoreResult<Vec<(NoteId, PathBuf)>> {
        let entries = match fs::read_dir(&self.notes_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.notes_dir, err)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(&self.notes_dir, err))?;
            let path = entry.path();
            if let Some(id) = note_id_from_path(&path) {
                files.push((id, path));
            }
        }
        Ok(files)
    }

    fn read_note_file(&self, id: NoteId, path: &Path) -> StoreResult<Note> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id));
            }
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                return Err(StoreError::CorruptData {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
            }
            Err(err) => return Err(StoreError::io(path, err)),
        };

        let note = Note::from_json(&raw).map_err(|err| StoreError::CorruptData {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        if note.id != id {
            return Err(StoreError::CorruptData {
                path: path.to_path_buf(),
                message: format!("record id {} does not match file name", note.id),
            });
        }
        Ok(note)
    }

    fn write_note_file(&self, note: &Note) -> StoreResult<()> {
        let path = self.note_path(note.id);
        let encoded = note.to_json().map_err(|err| StoreError::CorruptData {
            path: path.clone(),
            message: format!("failed to encode note: {err}"),
        })?;
        self.ensure_dir()?;
        write_atomic(&path, encoded.as_bytes()).map_err(|err| StoreError::io(&path, err))
    }
}

impl NoteStore for JsonNoteStore {
    fn list_notes(&self) -> StoreResult<Vec<Note>> {
        let started_at = Instant::now();
        let mut notes = Vec::new();
        let mut skipped = 0usize;

        for (id, path) in self.note_files()? {
            match self.read_note_file(id, &path) {
                Ok(note) => notes.push(note),
                // Deleted between the directory scan and the read.
                Err(StoreError::NotFound(_)) => {}
                Err(err) => {
                    skipped += 1;
                    warn!(
                        "event=note_list_skip module=store status=skip note_id={} error_code={} error={}",
                        id,
                        err.code(),
                        err
                    );
                }
            }
        }

        sort_for_listing(&mut notes);
        debug!(
            "event=note_list module=store status=ok count={} skipped={} duration_ms={}",
            notes.len(),
            skipped,
            started_at.elapsed().as_millis()
        );
        Ok(notes)
    }

    fn load_note(&self, id: NoteId) -> StoreResult<Note> {
        self.read_note_file(id, &self.note_path(id))
    }

    fn save_note(&self, note: &Note) -> StoreResult<Note> {
        let path = self.note_path(note.id);
        let previous = match self.read_note_file(note.id, &path) {
            Ok(previous) => Some(previous),
            Err(StoreError::NotFound(_)) => None,
            Err(err @ StoreError::CorruptData { .. }) => {
                warn!(
                    "event=note_save module=store status=overwrite_corrupt note_id={} error={}",
                    note.id, err
                );
                None
            }
            Err(err) => return Err(err),
        };

        let mut stored = note.clone();
        if let Some(previous) = previous.as_ref() {
            stored.created_at = previous.created_at;
        }
        if should_rederive_title(note, previous.as_ref()) {
            stored.title = derive_title(&stored.content);
        }

        let floor = [
            Some(stored.created_at),
            Some(note.modified_at),
            previous.as_ref().map(|prev| prev.modified_at),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(stored.created_at);
        stored.modified_at = Utc::now().max(floor);

        stored
            .validate()
            .map_err(|err| StoreError::CorruptData {
                path: path.clone(),
                message: err.to_string(),
            })?;
        self.write_note_file(&stored)?;

        debug!(
            "event=note_save module=store status=ok note_id={} created={}",
            stored.id,
            previous.is_none()
        );
        Ok(stored)
    }

    fn delete_note(&self, id: NoteId) -> StoreResult<()> {
        let path = self.note_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("event=note_delete module=store status=ok note_id={id}");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("event=note_delete module=store status=error note_id={id} error_code=note_not_found");
                Err(StoreError::NotFound(id))
            }
            Err(err) => Err(StoreError::io(path, err)),
        }
    }

    fn new_note(&self) -> StoreResult<Note> {
        self.ensure_dir()?;
        for _ in 0..NEW_NOTE_MAX_ATTEMPTS {
            let note = Note::with_id(Uuid::new_v4(), Utc::now());
            if self.note_path(note.id).exists() {
                continue;
            }
            let stored = self.save_note(&note)?;
            info!("event=note_create module=store status=ok note_id={}", stored.id);
            return Ok(stored);
        }

        Err(StoreError::io(
            &self.notes_dir,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                "could not allocate an unused note id",
            ),
        ))
    }

    fn note_count(&self) -> StoreResult<usize> {
        Ok(self.note_files()?.len())
    }
}

/// Title is re-derived when content changed since the last save, when it is
/// blank, or when a never-saved note still carries the placeholder.
fn should_rederive_title(note: &Note, previous: Option<&Note>) -> bool {
    if note.title.trim().is_empty() {
        return true;
    }
    match previous {
        Some(previous) => previous.content != note.content,
        None => note.title == UNTITLED_TITLE,
    }
}

/// Inverse of `note_file_name`: only the exact canonical name maps to an id.
fn note_id_from_path(path: &Path) -> Option<NoteId> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(NOTE_FILE_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let id = Uuid::parse_str(stem).ok()?;
    let file_name = path.file_name()?.to_str()?;
    (file_name == note_file_name(id)).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::{note_file_name, note_id_from_path, should_rederive_title};
    use crate::model::note::Note;
    use std::path::Path;
    use uuid::Uuid;

    #[test]
    fn file_name_is_stable_function_of_id() {
        let id = Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap();
        assert_eq!(
            note_file_name(id),
            "00000000-0000-4000-8000-000000000001.json"
        );
        assert_eq!(note_file_name(id), note_file_name(id));
    }

    #[test]
    fn only_uuid_json_files_are_notes() {
        let id = Uuid::new_v4();
        let path = format!("/notes/{}", note_file_name(id));
        assert_eq!(note_id_from_path(Path::new(&path)), Some(id));
        assert_eq!(note_id_from_path(Path::new("/notes/readme.json")), None);
        assert_eq!(note_id_from_path(Path::new("/notes/.abc.tmp")), None);
    }

    #[test]
    fn non_canonical_uuid_spellings_are_not_notes() {
        let id = Uuid::parse_str("2ca2d31d-0000-4000-8000-00000000000a").unwrap();
        for name in [
            format!("{}.json", id.simple()),
            format!("{}.json", id.hyphenated().to_string().to_uppercase()),
            format!("{}.json", id.braced()),
            format!("{}.json", id.urn()),
        ] {
            let path = format!("/notes/{name}");
            assert_eq!(note_id_from_path(Path::new(&path)), None, "{name}");
        }
    }

    #[test]
    fn explicit_title_survives_unchanged_content() {
        let mut previous = Note::new();
        previous.update_content("body");
        let mut edited = previous.clone();
        edited.title = "Pinned name".to_string();
        assert!(!should_rederive_title(&edited, Some(&previous)));

        edited.content = "new body".to_string();
        assert!(should_rederive_title(&edited, Some(&previous)));
    }

    #[test]
    fn unsaved_note_rederives_only_placeholder_title() {
        let mut note = Note::new();
        note.content = "Draft".to_string();
        assert!(should_rederive_title(&note, None));

        note.title = "Chosen".to_string();
        assert!(!should_rederive_title(&note, None));
    }
}

//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note list/edit/delete/search use-cases to Dart via FRB.
//! - Drive the editor auto-save session from the UI event loop.
//! - Translate core errors into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures carry a stable `error_code` next to a human-readable message.
//! - Ids cross the boundary as hyphenated UUID strings; timestamps as RFC 3339.
//! - Editor calls run on the UI thread; the session is thread-local.

use crate::session::EditorSession;
use log::warn;
use smoothwrite_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CoreConfig, JsonNoteStore, Note, NoteId, NoteService, NoteServiceError, NoteSummary,
    StoreError, DEFAULT_AUTO_SAVE_DELAY_MS,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use uuid::Uuid;

const NOTES_DIR_ENV: &str = "SMOOTHWRITE_NOTES_DIR";
const DEFAULT_NOTES_DIR_NAME: &str = "smoothwrite_notes";
const NOT_FOUND_CODE: &str = "note_not_found";
static NOTES_DIR: OnceLock<PathBuf> = OnceLock::new();

thread_local! {
    static EDITOR: RefCell<Option<EditorSession>> = const { RefCell::new(None) };
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the notes directory for this process.
///
/// Must run before the first note call; afterwards only the same directory
/// is accepted. Without it, `SMOOTHWRITE_NOTES_DIR` or a temp-dir default is
/// used.
///
/// # FFI contract
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_notes_dir(notes_dir: String) -> String {
    let trimmed = notes_dir.trim();
    if trimmed.is_empty() {
        return "notes_dir cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = NOTES_DIR.get_or_init(|| requested.clone());
    check_notes_dir(active, &requested)
}

/// Note payload for the editor pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    /// Stored markup, passed through unchanged.
    pub content: String,
    pub created_at: String,
    pub modified_at: String,
    pub is_favorite: bool,
}

/// One row of the note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    /// Plain-text excerpt of the content; `None` for empty notes.
    pub preview: Option<String>,
    pub modified_at: String,
    pub is_favorite: bool,
}

/// List/search response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResponse {
    pub ok: bool,
    /// Notes in `modified_at DESC` order.
    pub items: Vec<NoteListItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// Single-note response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteResponse {
    pub ok: bool,
    pub note: Option<NoteItem>,
    pub message: String,
    pub error_code: Option<String>,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
    pub error_code: Option<String>,
}

/// Result of one editor event-loop tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorTickResponse {
    pub ok: bool,
    /// Whether a save ran during this tick.
    pub saved: bool,
    /// Milliseconds until the pending save is due; `None` when idle.
    pub next_due_ms: Option<u64>,
    /// Whether edits are waiting to be saved.
    pub unsaved: bool,
    /// Fresh note state after a save.
    pub note: Option<NoteItem>,
    pub message: String,
    pub error_code: Option<String>,
}

impl NotesListResponse {
    fn success(items: Vec<NoteListItem>) -> Self {
        let message = if items.is_empty() {
            "No notes.".to_string()
        } else {
            format!("Found {} note(s).", items.len())
        };
        Self {
            ok: true,
            items,
            message,
            error_code: None,
        }
    }

    fn failure(op: &str, err: ApiError) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            message: format!("{op} failed: {}", err.message),
            error_code: Some(err.code.to_string()),
        }
    }
}

impl NoteResponse {
    fn success(message: impl Into<String>, note: &Note) -> Self {
        Self {
            ok: true,
            note: Some(to_note_item(note)),
            message: message.into(),
            error_code: None,
        }
    }

    fn failure(op: &str, err: ApiError) -> Self {
        Self {
            ok: false,
            note: None,
            message: format!("{op} failed: {}", err.message),
            error_code: Some(err.code.to_string()),
        }
    }
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            error_code: None,
        }
    }

    fn failure(op: &str, err: ApiError) -> Self {
        Self {
            ok: false,
            message: format!("{op} failed: {}", err.message),
            error_code: Some(err.code.to_string()),
        }
    }
}

/// Lists all notes, seeding the welcome note into an empty store first.
///
/// # FFI contract
/// - Sync call, file-backed execution.
/// - Corrupt note files are skipped, never fatal.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list() -> NotesListResponse {
    let result = with_note_service(|service| {
        service.ensure_welcome_note()?;
        service.list_summaries()
    });
    match result {
        Ok(summaries) => NotesListResponse::success(summaries.iter().map(to_list_item).collect()),
        Err(err) => NotesListResponse::failure("notes_list", err),
    }
}

/// Filters notes by case-insensitive match on title or plain text.
///
/// A blank query returns the full list.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_search(query: String) -> NotesListResponse {
    match with_note_service(|service| service.search_notes(&query)) {
        Ok(notes) => NotesListResponse::success(
            notes
                .iter()
                .map(|note| to_list_item(&NoteSummary::from(note)))
                .collect(),
        ),
        Err(err) => NotesListResponse::failure("notes_search", err),
    }
}

/// Creates and persists an empty note.
#[flutter_rust_bridge::frb(sync)]
pub fn note_create() -> NoteResponse {
    match with_note_service(|service| service.create_note()) {
        Ok(note) => NoteResponse::success("Note created.", &note),
        Err(err) => NoteResponse::failure("note_create", err),
    }
}

/// Loads one note by id.
#[flutter_rust_bridge::frb(sync)]
pub fn note_get(note_id: String) -> NoteResponse {
    let result = parse_note_id(&note_id)
        .and_then(|id| with_note_service(|service| service.load_note(id)));
    match result {
        Ok(note) => NoteResponse::success("Note loaded.", &note),
        Err(err) => NoteResponse::failure("note_get", err),
    }
}

/// Replaces a note's content and saves it immediately.
///
/// The title is re-derived from the new content.
#[flutter_rust_bridge::frb(sync)]
pub fn note_save(note_id: String, content: String) -> NoteResponse {
    let result = parse_note_id(&note_id).and_then(|id| {
        with_note_service(|service| {
            let mut note = service.load_note(id)?;
            note.update_content(content);
            service.save_note(&note)
        })
    });
    match result {
        Ok(note) => NoteResponse::success("Note saved.", &note),
        Err(err) => NoteResponse::failure("note_save", err),
    }
}

/// Deletes a note. When the editor holds that note, its session is dropped
/// once the file is gone; a failed delete keeps the session and its edits.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(note_id: String) -> ActionResponse {
    let id = match parse_note_id(&note_id) {
        Ok(id) => id,
        Err(err) => return ActionResponse::failure("note_delete", err),
    };
    let result = with_note_service(|service| service.delete_note(id));
    let file_gone = match &result {
        Ok(()) => true,
        Err(err) => err.code == NOT_FOUND_CODE,
    };
    if file_gone {
        discard_editor_for(id);
    }
    match result {
        Ok(()) => ActionResponse::success("Note deleted."),
        Err(err) => ActionResponse::failure("note_delete", err),
    }
}

/// Number of stored notes; 0 when the notes directory is unreadable.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_count() -> u32 {
    match with_note_service(|service| service.note_count()) {
        Ok(count) => u32::try_from(count).unwrap_or(u32::MAX),
        Err(err) => {
            warn!(
                "event=notes_count module=ffi status=error error_code={} error={}",
                err.code, err.message
            );
            0
        }
    }
}

/// Opens `note_id` in the editor session.
///
/// A previously open note is flushed first; if that flush fails the old
/// session stays open and the error is returned.
///
/// Input semantics:
/// - `auto_save_delay_ms`: quiet period; `None` uses the default.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_open(note_id: String, auto_save_delay_ms: Option<u64>) -> NoteResponse {
    match open_editor(&note_id, auto_save_delay_ms) {
        Ok(note) => NoteResponse::success("Editor opened.", &note),
        Err(err) => NoteResponse::failure("editor_open", err),
    }
}

/// Pushes the editor's current content and restarts the quiet period.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_update(content: String) -> ActionResponse {
    let result = with_editor(|session| {
        session.update_content(content);
        Ok(())
    });
    match result {
        Ok(()) => ActionResponse::success("Change recorded."),
        Err(err) => ActionResponse::failure("editor_update", err),
    }
}

/// Event-loop tick: runs the pending save when its quiet period elapsed.
///
/// # FFI contract
/// - Cheap when idle; call from a UI timer.
/// - A failed save is reported once and not retried until the next change.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_tick() -> EditorTickResponse {
    let result = with_editor(|session| {
        let saved = session.tick().map_err(ApiError::from)?;
        let next_due_ms = session
            .time_until_due()
            .map(|left| u64::try_from(left.as_millis()).unwrap_or(u64::MAX));
        let note = saved.then(|| session.note());
        Ok((saved, next_due_ms, session.has_unsaved_changes(), note))
    });
    match result {
        Ok((saved, next_due_ms, unsaved, note)) => EditorTickResponse {
            ok: true,
            saved,
            next_due_ms,
            unsaved,
            note: note.as_ref().map(to_note_item),
            message: if saved { "Saved." } else { "Idle." }.to_string(),
            error_code: None,
        },
        Err(err) => EditorTickResponse {
            ok: false,
            saved: false,
            next_due_ms: None,
            unsaved: false,
            note: None,
            message: format!("editor_tick failed: {}", err.message),
            error_code: Some(err.code.to_string()),
        },
    }
}

/// Saves pending editor changes now (manual save).
///
/// Returns the current note state whether or not a save was needed.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_flush() -> NoteResponse {
    let result = with_editor(|session| {
        let saved = session.flush().map_err(ApiError::from)?;
        Ok((saved, session.note()))
    });
    match result {
        Ok((true, note)) => NoteResponse::success("Saved.", &note),
        Ok((false, note)) => NoteResponse::success("Nothing to save.", &note),
        Err(err) => NoteResponse::failure("editor_flush", err),
    }
}

/// Closes the editor session, flushing unless `discard` is set.
///
/// Closing with no open session succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_close(discard: bool) -> ActionResponse {
    let result = EDITOR.with(|cell| -> Result<(), ApiError> {
        let mut slot = cell.borrow_mut();
        let Some(mut session) = slot.take() else {
            return Ok(());
        };
        if !discard {
            if let Err(err) = session.flush() {
                // Keep the session so the shell can retry or discard.
                *slot = Some(session);
                return Err(ApiError::from(err));
            }
        }
        session.close(true).map_err(ApiError::from)
    });
    match result {
        Ok(()) => ActionResponse::success("Editor closed."),
        Err(err) => ActionResponse::failure("editor_close", err),
    }
}

struct ApiError {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<NoteServiceError> for ApiError {
    fn from(value: NoteServiceError) -> Self {
        let code = match &value {
            NoteServiceError::NoteNotFound(_) => NOT_FOUND_CODE,
            NoteServiceError::Store(err) => err.code(),
        };
        Self::new(code, value.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

fn open_editor(note_id: &str, auto_save_delay_ms: Option<u64>) -> Result<Note, ApiError> {
    let id = parse_note_id(note_id)?;
    let delay_ms = auto_save_delay_ms.unwrap_or(DEFAULT_AUTO_SAVE_DELAY_MS);
    let config = CoreConfig::new(resolve_notes_dir(), delay_ms)
        .map_err(|err| ApiError::new("invalid_config", err.to_string()))?;

    EDITOR.with(|cell| {
        let mut slot = cell.borrow_mut();
        if let Some(current) = slot.as_mut() {
            current.flush().map_err(ApiError::from)?;
        }
        let store = JsonNoteStore::from_config(&config).map_err(ApiError::from)?;
        let session = EditorSession::open(store, id, config.auto_save_delay_ms)
            .map_err(ApiError::from)?;
        let note = session.note();
        *slot = Some(session);
        Ok(note)
    })
}

/// Drops the session for `id` without saving; a flush would resurrect the file.
fn discard_editor_for(id: NoteId) {
    EDITOR.with(|cell| {
        let mut slot = cell.borrow_mut();
        if !slot.as_ref().is_some_and(|session| session.note_id() == id) {
            return;
        }
        if let Some(session) = slot.take() {
            if let Err(err) = session.close(true) {
                warn!(
                    "event=editor_close module=ffi status=error note_id={id} error_code={}",
                    err.code()
                );
            }
        }
    });
}

fn with_editor<T>(
    f: impl FnOnce(&mut EditorSession) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    EDITOR.with(|cell| {
        let mut slot = cell.borrow_mut();
        match slot.as_mut() {
            Some(session) => f(session),
            None => Err(ApiError::new("no_open_note", "no note is open in the editor")),
        }
    })
}

fn with_note_service<T>(
    f: impl FnOnce(&NoteService<JsonNoteStore>) -> Result<T, NoteServiceError>,
) -> Result<T, ApiError> {
    let store = JsonNoteStore::open(resolve_notes_dir()).map_err(ApiError::from)?;
    let service = NoteService::new(store);
    f(&service).map_err(ApiError::from)
}

fn parse_note_id(raw: &str) -> Result<NoteId, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|err| ApiError::new("invalid_note_id", format!("invalid note id `{raw}`: {err}")))
}

fn resolve_notes_dir() -> PathBuf {
    NOTES_DIR
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(NOTES_DIR_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DEFAULT_NOTES_DIR_NAME)
        })
        .clone()
}

fn check_notes_dir(active: &Path, requested: &Path) -> String {
    if active == requested {
        String::new()
    } else {
        format!(
            "notes_dir already set to `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        content: note.content.clone(),
        created_at: note.created_at.to_rfc3339(),
        modified_at: note.modified_at.to_rfc3339(),
        is_favorite: note.is_favorite,
    }
}

fn to_list_item(summary: &NoteSummary) -> NoteListItem {
    NoteListItem {
        id: summary.id.to_string(),
        title: summary.title.clone(),
        preview: summary.preview.clone(),
        modified_at: summary.modified_at.to_rfc3339(),
        is_favorite: summary.is_favorite,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        check_notes_dir, configure_notes_dir, core_version, editor_close, editor_flush,
        editor_open, editor_tick, editor_update, init_logging, note_create, note_delete, note_get,
        note_save, notes_count, notes_list, notes_search, parse_note_id, ping, resolve_notes_dir,
    };
    use smoothwrite_core::note_file_name;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEST_NOTES_DIR: OnceLock<PathBuf> = OnceLock::new();

    /// Pins the process-wide notes dir to one directory per test run.
    ///
    /// Tests still share it with each other, so assertions only look at
    /// notes each test created itself.
    fn use_test_notes_dir() {
        let dir = TEST_NOTES_DIR.get_or_init(|| {
            std::env::temp_dir().join(unique_token(&format!(
                "smoothwrite-ffi-tests-{}-",
                std::process::id()
            )))
        });
        let error = configure_notes_dir(dir.to_string_lossy().into_owned());
        assert!(error.is_empty(), "{error}");
        assert_eq!(&resolve_notes_dir(), dir);
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn notes_dir_cannot_be_switched() {
        let active = PathBuf::from("/data/notes");
        assert!(check_notes_dir(&active, &PathBuf::from("/data/notes")).is_empty());
        assert!(check_notes_dir(&active, &PathBuf::from("/other")).contains("refusing"));
    }

    #[test]
    fn malformed_id_is_reported_with_code() {
        use_test_notes_dir();
        assert!(parse_note_id("not-a-uuid").is_err());
        let response = note_get("not-a-uuid".to_string());
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("invalid_note_id"));
    }

    #[test]
    fn create_save_get_delete_round_trip() {
        use_test_notes_dir();
        let token = unique_token("crud");
        let created = note_create();
        assert!(created.ok, "{}", created.message);
        let id = created.note.expect("created note").id;

        let saved = note_save(id.clone(), format!("<p>{token}</p>"));
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(saved.note.as_ref().map(|n| n.title.as_str()), Some(token.as_str()));

        let listed = notes_list();
        assert!(listed.ok, "{}", listed.message);
        assert!(listed.items.iter().any(|item| item.id == id));
        assert!(notes_count() >= 1);

        let found = notes_search(token.to_uppercase());
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].preview.as_deref(), Some(token.as_str()));

        assert!(note_delete(id.clone()).ok);
        let missing = note_get(id.clone());
        assert_eq!(missing.error_code.as_deref(), Some("note_not_found"));
        let again = note_delete(id);
        assert_eq!(again.error_code.as_deref(), Some("note_not_found"));
    }

    #[test]
    fn editor_session_flushes_on_demand_and_on_switch() {
        use_test_notes_dir();
        let first = note_create().note.expect("first note").id;
        let second = note_create().note.expect("second note").id;

        let opened = editor_open(first.clone(), Some(60_000));
        assert!(opened.ok, "{}", opened.message);
        assert!(editor_update("Groceries\nmilk".to_string()).ok);

        let tick = editor_tick();
        assert!(tick.ok);
        assert!(!tick.saved);
        assert!(tick.unsaved);
        assert!(tick.next_due_ms.is_some());

        let flushed = editor_flush();
        assert!(flushed.ok, "{}", flushed.message);
        assert_eq!(flushed.note.expect("flushed note").title, "Groceries");

        assert!(editor_update("Groceries\nmilk\neggs".to_string()).ok);
        assert!(editor_open(second.clone(), Some(60_000)).ok);
        let persisted = note_get(first.clone()).note.expect("first note persisted");
        assert_eq!(persisted.content, "Groceries\nmilk\neggs");

        assert!(editor_close(false).ok);
        assert!(editor_close(false).ok);
        assert_eq!(
            editor_update("late".to_string()).error_code.as_deref(),
            Some("no_open_note")
        );

        note_delete(first);
        note_delete(second);
    }

    #[test]
    fn deleting_open_note_discards_session() {
        use_test_notes_dir();
        let id = note_create().note.expect("note").id;
        assert!(editor_open(id.clone(), None).ok);
        assert!(editor_update("pending".to_string()).ok);

        assert!(note_delete(id.clone()).ok);
        assert_eq!(
            editor_flush().error_code.as_deref(),
            Some("no_open_note")
        );
        assert!(!note_get(id).ok);
    }

    #[test]
    fn failed_delete_keeps_open_session_and_edits() {
        use_test_notes_dir();
        let id = note_create().note.expect("note").id;
        assert!(editor_open(id.clone(), Some(60_000)).ok);
        assert!(editor_update("unsaved draft".to_string()).ok);

        // A directory squatting on the note's file name makes removal fail.
        let note_id = parse_note_id(&id).ok().expect("valid id");
        let path = resolve_notes_dir().join(note_file_name(note_id));
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let response = note_delete(id.clone());
        assert_eq!(response.error_code.as_deref(), Some("io_error"));
        assert!(editor_tick().unsaved);

        fs::remove_dir(&path).unwrap();
        let flushed = editor_flush();
        assert!(flushed.ok, "{}", flushed.message);
        let restored = note_get(id.clone()).note.expect("note restored by flush");
        assert_eq!(restored.content, "unsaved draft");
        assert!(note_delete(id).ok);
    }

    #[test]
    fn editor_open_rejects_invalid_delay() {
        use_test_notes_dir();
        let id = note_create().note.expect("note").id;
        let response = editor_open(id.clone(), Some(0));
        assert_eq!(response.error_code.as_deref(), Some("invalid_config"));
        note_delete(id);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}{nanos}")
    }
}

//! Editor session: one open note plus its auto-save scheduler.
//!
//! # Responsibility
//! - Hold the shell's working copy of the open note.
//! - Turn editor content pushes into debounced saves through the store.
//!
//! # Invariants
//! - Lives on the GUI thread only (`Rc`-based, not `Send`).
//! - After a successful save the working copy equals the persisted note.
//! - Switching or closing flushes a pending save unless discarding.

use log::info;
use smoothwrite_core::{
    AutoSaveManager, Clock, JsonNoteStore, Note, NoteId, NoteStore, StoreError, StoreResult,
    SystemClock,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub struct EditorSession<C: Clock = SystemClock> {
    buffer: Rc<RefCell<Note>>,
    autosave: AutoSaveManager<StoreError, C>,
}

impl EditorSession<SystemClock> {
    /// Loads `id` and starts a session driven by the system clock.
    pub fn open(store: JsonNoteStore, id: NoteId, delay_ms: u64) -> StoreResult<Self> {
        Self::open_with_clock(store, id, delay_ms, SystemClock)
    }
}

impl<C: Clock> EditorSession<C> {
    pub fn open_with_clock(
        store: JsonNoteStore,
        id: NoteId,
        delay_ms: u64,
        clock: C,
    ) -> StoreResult<Self> {
        let note = store.load_note(id)?;
        let buffer = Rc::new(RefCell::new(note));
        let save_buffer = Rc::clone(&buffer);
        let autosave = AutoSaveManager::with_clock(
            move || -> StoreResult<()> {
                let saved = store.save_note(&save_buffer.borrow())?;
                *save_buffer.borrow_mut() = saved;
                Ok(())
            },
            delay_ms,
            clock,
        );
        info!("event=editor_open module=ffi status=ok note_id={id}");
        Ok(Self { buffer, autosave })
    }

    pub fn note_id(&self) -> NoteId {
        self.buffer.borrow().id
    }

    /// Snapshot of the working copy.
    pub fn note(&self) -> Note {
        self.buffer.borrow().clone()
    }

    /// Replaces the working content; identical content does not arm a save.
    pub fn update_content(&mut self, content: String) {
        {
            let mut note = self.buffer.borrow_mut();
            if note.content == content {
                return;
            }
            note.content = content;
        }
        self.autosave.notify_change();
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Fires the pending save if due. Returns whether a save ran.
    pub fn tick(&mut self) -> StoreResult<bool> {
        self.autosave.poll()
    }

    pub fn time_until_due(&self) -> Option<Duration> {
        self.autosave.time_until_due()
    }

    /// Saves now if anything is pending. Returns whether a save ran.
    pub fn flush(&mut self) -> StoreResult<bool> {
        self.autosave.force_save_now()
    }

    /// Ends the session, flushing unless `discard` is set.
    pub fn close(mut self, discard: bool) -> StoreResult<()> {
        let id = self.note_id();
        if discard {
            self.autosave.cancel();
        } else {
            self.flush()?;
        }
        info!("event=editor_close module=ffi status=ok note_id={id} discard={discard}");
        Ok(())
    }
}

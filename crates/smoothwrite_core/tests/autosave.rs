use smoothwrite_core::{
    AutoSaveManager, AutoSaveState, Clock, JsonNoteStore, ManualClock, Note, NoteStore,
    StoreError,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct Harness {
    manager: AutoSaveManager<String, ManualClock>,
    clock: ManualClock,
    calls: Rc<RefCell<Vec<Instant>>>,
}

fn harness(delay_ms: u64) -> Harness {
    let clock = ManualClock::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&calls);
    let callback_clock = clock.clone();
    let manager = AutoSaveManager::with_clock(
        move || {
            recorder.borrow_mut().push(callback_clock.now());
            Ok::<(), String>(())
        },
        delay_ms,
        clock.clone(),
    );
    Harness {
        manager,
        clock,
        calls,
    }
}

/// Advances in 10 ms steps, polling like an event loop would.
fn run_loop_for(h: &mut Harness, total_ms: u64) {
    for _ in 0..(total_ms / 10) {
        h.clock.advance_ms(10);
        h.manager.poll().unwrap();
    }
}

#[test]
fn burst_of_changes_fires_once_after_last_change() {
    let mut h = harness(1000);
    let start = h.clock.now();

    h.manager.notify_change();
    run_loop_for(&mut h, 300);
    h.manager.notify_change();
    run_loop_for(&mut h, 400);
    h.manager.notify_change();
    let last_change = start + Duration::from_millis(700);

    run_loop_for(&mut h, 3000);

    let calls = h.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0] - last_change, Duration::from_millis(1000));
    assert_eq!(h.manager.state(), AutoSaveState::Idle);
}

#[test]
fn nothing_fires_before_quiet_period_ends() {
    let mut h = harness(1000);
    h.manager.notify_change();
    h.clock.advance_ms(999);
    assert!(!h.manager.poll().unwrap());
    assert!(h.manager.is_pending());

    h.clock.advance_ms(1);
    assert!(h.manager.poll().unwrap());
    assert!(!h.manager.is_pending());
    assert_eq!(h.calls.borrow().len(), 1);
}

#[test]
fn separate_quiet_periods_fire_separately() {
    let mut h = harness(200);
    h.manager.notify_change();
    run_loop_for(&mut h, 500);
    h.manager.notify_change();
    run_loop_for(&mut h, 500);

    assert_eq!(h.calls.borrow().len(), 2);
}

#[test]
fn force_save_while_pending_runs_once_synchronously() {
    let mut h = harness(1000);
    h.manager.notify_change();
    h.clock.advance_ms(100);

    assert!(h.manager.force_save_now().unwrap());
    assert_eq!(h.calls.borrow().len(), 1);
    assert_eq!(h.manager.state(), AutoSaveState::Idle);

    run_loop_for(&mut h, 2000);
    assert_eq!(h.calls.borrow().len(), 1);
}

#[test]
fn force_save_while_idle_is_noop() {
    let mut h = harness(1000);
    assert!(!h.manager.force_save_now().unwrap());
    assert!(h.calls.borrow().is_empty());
}

#[test]
fn cancel_discards_pending_save() {
    let mut h = harness(1000);
    h.manager.notify_change();
    assert!(h.manager.cancel());
    assert!(!h.manager.cancel());

    run_loop_for(&mut h, 2000);
    assert!(h.calls.borrow().is_empty());
}

#[test]
fn callback_error_is_surfaced_and_not_retried() {
    let clock = ManualClock::new();
    let attempts = Rc::new(Cell::new(0));
    let counter = Rc::clone(&attempts);
    let mut manager = AutoSaveManager::with_clock(
        move || {
            counter.set(counter.get() + 1);
            Err("disk full".to_string())
        },
        100,
        clock.clone(),
    );

    manager.notify_change();
    clock.advance_ms(100);
    assert_eq!(manager.poll().unwrap_err(), "disk full");
    assert_eq!(manager.state(), AutoSaveState::Idle);

    clock.advance_ms(1000);
    assert!(!manager.poll().unwrap());
    assert_eq!(attempts.get(), 1);

    manager.notify_change();
    assert_eq!(manager.force_save_now().unwrap_err(), "disk full");
    assert_eq!(attempts.get(), 2);
}

#[test]
fn system_clock_scheduler_fires_after_real_delay() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let mut manager = AutoSaveManager::new(
        move || {
            counter.set(counter.get() + 1);
            Ok::<(), String>(())
        },
        20,
    );

    manager.notify_change();
    assert!(!manager.poll().unwrap());
    std::thread::sleep(Duration::from_millis(40));
    assert!(manager.poll().unwrap());
    assert_eq!(calls.get(), 1);
}

#[test]
fn autosave_persists_latest_editor_content_through_store() {
    let dir = TempDir::new().unwrap();
    let store = JsonNoteStore::open(dir.path()).unwrap();
    let note = store.new_note().unwrap();
    let note_id = note.id;

    let buffer: Rc<RefCell<Note>> = Rc::new(RefCell::new(note));
    let clock = ManualClock::new();
    let save_store = store.clone();
    let save_buffer = Rc::clone(&buffer);
    let mut manager = AutoSaveManager::with_clock(
        move || -> Result<(), StoreError> {
            let saved = save_store.save_note(&save_buffer.borrow())?;
            *save_buffer.borrow_mut() = saved;
            Ok(())
        },
        1000,
        clock.clone(),
    );

    for text in ["H", "He", "Hello", "Hello\nworld"] {
        buffer.borrow_mut().content = text.to_string();
        manager.notify_change();
        clock.advance_ms(50);
        manager.poll().unwrap();
    }
    assert!(store.load_note(note_id).unwrap().content.is_empty());

    clock.advance_ms(1000);
    assert!(manager.poll().unwrap());

    let persisted = store.load_note(note_id).unwrap();
    assert_eq!(persisted.content, "Hello\nworld");
    assert_eq!(persisted.title, "Hello");
    assert_eq!(*buffer.borrow(), persisted);
}

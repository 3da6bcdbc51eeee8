use smoothwrite_core::{JsonNoteStore, NoteService, NoteServiceError, NoteStore};
use tempfile::TempDir;
use uuid::Uuid;

fn setup() -> (TempDir, NoteService<JsonNoteStore>) {
    let dir = TempDir::new().unwrap();
    let store = JsonNoteStore::open(dir.path()).unwrap();
    (dir, NoteService::new(store))
}

#[test]
fn welcome_note_is_seeded_only_into_empty_store() {
    let (_dir, service) = setup();

    let welcome = service
        .ensure_welcome_note()
        .unwrap()
        .expect("empty store should get a welcome note");
    assert!(welcome.title.starts_with("Welcome"));
    assert_eq!(service.note_count().unwrap(), 1);

    assert!(service.ensure_welcome_note().unwrap().is_none());
    assert_eq!(service.note_count().unwrap(), 1);
}

#[test]
fn create_with_content_persists_title_and_body() {
    let (_dir, service) = setup();
    let created = service
        .create_note_with_content("<p>Standup</p><p>notes</p>")
        .unwrap();

    let loaded = service.load_note(created.id).unwrap();
    assert_eq!(loaded.title, "Standup");
    assert_eq!(loaded.content, "<p>Standup</p><p>notes</p>");
}

#[test]
fn search_matches_title_and_text_case_insensitively() {
    let (_dir, service) = setup();
    let budget = service
        .create_note_with_content("<p>Budget 2025</p><p>rent, <i>groceries</i></p>")
        .unwrap();
    let trip = service
        .create_note_with_content("Trip ideas\nLisbon, Porto")
        .unwrap();

    let by_title = service.search_notes("BUDGET").unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].id, budget.id);

    let by_body = service.search_notes("porto").unwrap();
    assert_eq!(by_body.len(), 1);
    assert_eq!(by_body[0].id, trip.id);

    assert!(service.search_notes("<i>").unwrap().is_empty());
    assert_eq!(service.search_notes("   ").unwrap().len(), 2);
}

#[test]
fn search_keeps_listing_order() {
    let (_dir, service) = setup();
    let older = service.create_note_with_content("shared older").unwrap();
    let mut newer = service.create_note_with_content("shared newer").unwrap();
    newer.content = "shared newer, edited".to_string();
    let newer = service.save_note(&newer).unwrap();
    assert!(newer.modified_at >= older.modified_at);

    let hits = service.search_notes("shared").unwrap();
    let listed = service.list_notes().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits, listed);
}

#[test]
fn summaries_follow_listing_order() {
    let (_dir, service) = setup();
    service.create_note_with_content("one").unwrap();
    service.create_note_with_content("<p>two</p>").unwrap();

    let notes = service.list_notes().unwrap();
    let summaries = service.list_summaries().unwrap();
    assert_eq!(summaries.len(), 2);
    for (note, summary) in notes.iter().zip(&summaries) {
        assert_eq!(note.id, summary.id);
        assert_eq!(note.title, summary.title);
    }
}

#[test]
fn missing_note_maps_to_service_not_found() {
    let (_dir, service) = setup();
    let id = Uuid::new_v4();

    assert!(matches!(
        service.load_note(id),
        Err(NoteServiceError::NoteNotFound(missing)) if missing == id
    ));
    assert!(matches!(
        service.delete_note(id),
        Err(NoteServiceError::NoteNotFound(_))
    ));
}

#[test]
fn delete_through_service_removes_from_store() {
    let (_dir, service) = setup();
    let note = service.create_note().unwrap();
    service.delete_note(note.id).unwrap();

    assert_eq!(service.store().note_count().unwrap(), 0);
    assert!(service.list_notes().unwrap().is_empty());
}

//! Subcommand implementations.
//!
//! Every command writes to a caller-supplied sink so tests can capture it.

use chrono::Local;
use log::info;
use smoothwrite_core::model::markup;
use smoothwrite_core::{
    AutoSaveManager, Clock, Note, NoteId, NoteService, NoteStore, NoteSummary, StoreResult,
    SystemClock,
};
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use uuid::Uuid;

pub type CliResult<T> = Result<T, Box<dyn Error>>;

const SHORT_ID_CHARS: usize = 8;

pub fn list<S: NoteStore>(
    service: &NoteService<S>,
    limit: Option<usize>,
    out: &mut impl Write,
) -> CliResult<()> {
    service.ensure_welcome_note()?;
    let summaries = service.list_summaries()?;
    let shown = limit.unwrap_or(summaries.len());
    for summary in summaries.iter().take(shown) {
        print_row(summary, out)?;
    }
    Ok(())
}

pub fn create<S: NoteStore>(
    service: &NoteService<S>,
    content: Option<String>,
    out: &mut impl Write,
) -> CliResult<()> {
    let note = match content {
        Some(content) => service.create_note_with_content(content)?,
        None => service.create_note()?,
    };
    writeln!(out, "{}", note.id)?;
    Ok(())
}

pub fn show<S: NoteStore>(
    service: &NoteService<S>,
    raw_id: &str,
    plain: bool,
    out: &mut impl Write,
) -> CliResult<()> {
    let note = service.load_note(resolve_id(service, raw_id)?)?;
    writeln!(out, "# {}", note.title)?;
    writeln!(
        out,
        "id: {}  created: {}  modified: {}",
        note.id,
        local_time(&note.created_at),
        local_time(&note.modified_at)
    )?;
    writeln!(out)?;
    if plain {
        writeln!(out, "{}", markup::to_plain_text(&note.content))?;
    } else {
        writeln!(out, "{}", note.content)?;
    }
    Ok(())
}

pub fn write<S: NoteStore>(
    service: &NoteService<S>,
    raw_id: &str,
    content: String,
    out: &mut impl Write,
) -> CliResult<()> {
    let mut note = service.load_note(resolve_id(service, raw_id)?)?;
    note.update_content(content);
    let saved = service.save_note(&note)?;
    writeln!(out, "saved {} \"{}\"", saved.id, saved.title)?;
    Ok(())
}

/// Replaces a note's content with lines read from `reader`, saving through
/// the auto-save scheduler.
pub fn write_streamed<S: NoteStore + Clone + 'static>(
    service: &NoteService<S>,
    raw_id: &str,
    reader: impl BufRead,
    delay_ms: u64,
    out: &mut impl Write,
) -> CliResult<()> {
    write_lines(service, raw_id, reader.lines(), delay_ms, SystemClock, out)
}

/// Reads block, so the scheduler is polled as each line arrives: a quiet
/// period that elapsed while waiting saves the text typed before it.
/// End of input flushes whatever is still pending.
fn write_lines<S: NoteStore + Clone + 'static, C: Clock>(
    service: &NoteService<S>,
    raw_id: &str,
    lines: impl IntoIterator<Item = io::Result<String>>,
    delay_ms: u64,
    clock: C,
    out: &mut impl Write,
) -> CliResult<()> {
    let mut note = service.load_note(resolve_id(service, raw_id)?)?;
    note.content.clear();
    let note_id = note.id;

    let buffer = Rc::new(RefCell::new(note));
    let saves = Rc::new(Cell::new(0usize));
    let store = service.store().clone();
    let save_buffer = Rc::clone(&buffer);
    let save_count = Rc::clone(&saves);
    let mut autosave = AutoSaveManager::with_clock(
        move || -> StoreResult<()> {
            let saved = store.save_note(&save_buffer.borrow())?;
            *save_buffer.borrow_mut() = saved;
            save_count.set(save_count.get() + 1);
            Ok(())
        },
        delay_ms,
        clock,
    );
    autosave.notify_change();

    for line in lines {
        let line = line?;
        autosave.poll()?;
        {
            let mut note = buffer.borrow_mut();
            if !note.content.is_empty() {
                note.content.push('\n');
            }
            note.content.push_str(&line);
        }
        autosave.notify_change();
    }
    autosave.force_save_now()?;

    let saved: Note = buffer.borrow().clone();
    info!(
        "event=cli_write_streamed module=cli status=ok note_id={note_id} saves={}",
        saves.get()
    );
    writeln!(
        out,
        "saved {} \"{}\" ({} save(s))",
        saved.id,
        saved.title,
        saves.get()
    )?;
    Ok(())
}

pub fn delete<S: NoteStore>(
    service: &NoteService<S>,
    raw_ids: &[String],
    out: &mut impl Write,
) -> CliResult<()> {
    // Resolve all first so a typo deletes nothing.
    let ids = raw_ids
        .iter()
        .map(|raw| resolve_id(service, raw))
        .collect::<CliResult<Vec<_>>>()?;
    for id in ids {
        service.delete_note(id)?;
        writeln!(out, "deleted {id}")?;
    }
    Ok(())
}

pub fn search<S: NoteStore>(
    service: &NoteService<S>,
    query: &str,
    out: &mut impl Write,
) -> CliResult<()> {
    for note in service.search_notes(query)? {
        print_row(&NoteSummary::from(&note), out)?;
    }
    Ok(())
}

pub fn count<S: NoteStore>(service: &NoteService<S>, out: &mut impl Write) -> CliResult<()> {
    writeln!(out, "{}", service.note_count()?)?;
    Ok(())
}

/// Accepts a full id or a prefix matching exactly one stored note.
fn resolve_id<S: NoteStore>(service: &NoteService<S>, raw: &str) -> CliResult<NoteId> {
    let raw = raw.trim().to_ascii_lowercase();
    if let Ok(id) = Uuid::parse_str(&raw) {
        return Ok(id);
    }
    if raw.is_empty() {
        return Err("note id cannot be empty".into());
    }
    let matches: Vec<NoteId> = service
        .list_notes()?
        .into_iter()
        .map(|note| note.id)
        .filter(|id| id.to_string().starts_with(&raw))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(format!("no note matches `{raw}`").into()),
        _ => Err(format!("`{raw}` matches {} notes; use a longer prefix", matches.len()).into()),
    }
}

fn print_row(summary: &NoteSummary, out: &mut impl Write) -> io::Result<()> {
    let short_id: String = summary.id.to_string().chars().take(SHORT_ID_CHARS).collect();
    let star = if summary.is_favorite { "*" } else { " " };
    writeln!(
        out,
        "{short_id} {star} {}  {}",
        local_time(&summary.modified_at),
        summary.title
    )
}

fn local_time(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

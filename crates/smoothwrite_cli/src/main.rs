//! Command-line shell over `smoothwrite_core`.
//!
//! # Responsibility
//! - Parse arguments, resolve configuration, start logging.
//! - Map each subcommand onto one note use-case.
//!
//! # Invariants
//! - Exit code is 0 on success and 1 on any failure.
//! - Failures go to stderr; note data goes to stdout.

mod args;
mod commands;

use args::{Cli, Commands};
use clap::Parser;
use log::error;
use smoothwrite_core::{default_log_level, init_logging, CoreConfig, JsonNoteStore, NoteService};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("smoothwrite: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> commands::CliResult<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let config = resolve_config(&cli)?;
    let store = JsonNoteStore::from_config(&config)?;
    let service = NoteService::new(store);
    let mut out = std::io::stdout().lock();

    match cli.command.unwrap_or(Commands::List { limit: None }) {
        Commands::List { limit } => commands::list(&service, limit, &mut out),
        Commands::New { content } => commands::create(&service, content, &mut out),
        Commands::Show { id, plain } => commands::show(&service, &id, plain, &mut out),
        Commands::Write { id, content: Some(content) } => {
            commands::write(&service, &id, content, &mut out)
        }
        Commands::Write { id, content: None } => {
            let stdin = std::io::stdin().lock();
            commands::write_streamed(&service, &id, stdin, config.auto_save_delay_ms, &mut out)
        }
        Commands::Del { id } => commands::delete(&service, &id, &mut out),
        Commands::Search { query } => commands::search(&service, &query, &mut out),
        Commands::Count => commands::count(&service, &mut out),
    }
}

fn resolve_config(cli: &Cli) -> commands::CliResult<CoreConfig> {
    let mut config = match cli.config.as_ref() {
        Some(path) => CoreConfig::load_from_file(path)?,
        None => CoreConfig::default(),
    };
    if let Some(notes_dir) = cli.notes_dir.clone() {
        config.notes_dir = notes_dir;
        config.validate()?;
    }
    Ok(config)
}

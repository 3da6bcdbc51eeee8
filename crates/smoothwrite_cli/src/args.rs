use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "smoothwrite")]
#[command(version)]
#[command(about = "auto-saving note store, from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Notes directory (overrides the config file)
    #[arg(long, env = "SMOOTHWRITE_NOTES_DIR")]
    pub notes_dir: Option<PathBuf>,

    /// JSON settings file
    #[arg(short, long, env = "SMOOTHWRITE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off without it
    #[arg(long, env = "SMOOTHWRITE_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List notes, most recently modified first (default if no command)
    List {
        /// Limit results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Create a note
    New {
        /// Initial content; empty when omitted
        content: Option<String>,
    },

    /// Print a note
    Show {
        /// Note id or unique id prefix
        id: String,

        /// Print markup as plain text
        #[arg(short, long)]
        plain: bool,
    },

    /// Replace a note's content
    Write {
        /// Note id or unique id prefix
        id: String,

        /// New content; read line by line from stdin with auto-save when omitted
        content: Option<String>,
    },

    /// Delete notes
    Del {
        /// Note id(s) or unique id prefix(es)
        #[arg(required = true)]
        id: Vec<String>,
    },

    /// Search titles and text, case-insensitive
    Search {
        /// Text to look for
        query: String,
    },

    /// Print the number of notes
    Count,
}

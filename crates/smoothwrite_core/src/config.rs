//! Core configuration.
//!
//! # Responsibility
//! - Carry the values core components need at construction time: the notes
//!   directory and the auto-save delay.
//! - Load them from an optional JSON settings file with per-field defaults.
//!
//! # Invariants
//! - Core never reads environment variables; callers inject configuration.
//! - A loaded config is always validated before it is returned.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default quiet period before an auto-save fires.
pub const DEFAULT_AUTO_SAVE_DELAY_MS: u64 = 1000;
/// Upper bound accepted for the auto-save delay.
pub const MAX_AUTO_SAVE_DELAY_MS: u64 = 60_000;
const DEFAULT_NOTES_DIR: &str = "notes";

/// Configuration load/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    InvalidDelay(u64),
    EmptyNotesDir,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::InvalidDelay(value) => write!(
                f,
                "auto_save_delay_ms must be within 1..={MAX_AUTO_SAVE_DELAY_MS}, got {value}"
            ),
            Self::EmptyNotesDir => write!(f, "notes_dir cannot be empty"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidDelay(_) | Self::EmptyNotesDir => None,
        }
    }
}

/// Values injected into the store and the auto-save scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Directory holding one file per note. Relative paths resolve against
    /// the process working directory.
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,
    /// Quiet period in milliseconds before a pending auto-save fires.
    #[serde(default = "default_auto_save_delay_ms")]
    pub auto_save_delay_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            notes_dir: default_notes_dir(),
            auto_save_delay_ms: default_auto_save_delay_ms(),
        }
    }
}

impl CoreConfig {
    /// Builds a validated config from explicit values.
    pub fn new(notes_dir: impl Into<PathBuf>, auto_save_delay_ms: u64) -> Result<Self, ConfigError> {
        let config = Self {
            notes_dir: notes_dir.into(),
            auto_save_delay_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON settings file.
    ///
    /// A missing file yields defaults; missing fields take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notes_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyNotesDir);
        }
        if self.auto_save_delay_ms == 0 || self.auto_save_delay_ms > MAX_AUTO_SAVE_DELAY_MS {
            return Err(ConfigError::InvalidDelay(self.auto_save_delay_ms));
        }
        Ok(())
    }

    /// Auto-save delay as a `Duration`.
    pub fn auto_save_delay(&self) -> Duration {
        Duration::from_millis(self.auto_save_delay_ms)
    }
}

fn default_notes_dir() -> PathBuf {
    PathBuf::from(DEFAULT_NOTES_DIR)
}

fn default_auto_save_delay_ms() -> u64 {
    DEFAULT_AUTO_SAVE_DELAY_MS
}

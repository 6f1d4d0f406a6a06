//! Core configuration loading.
//!
//! # Responsibility
//! - Resolve the store path, content limit and logging settings.
//! - Read an optional `config.toml` and fill unset keys with defaults.
//!
//! # Invariants
//! - A missing config file yields defaults; an unreadable one is an error.
//! - Unknown keys are ignored so newer files work with older binaries.
//! - `max_content_chars` is never zero.

use crate::logging::default_log_level;
use crate::service::lifecycle::{LifecycleManager, LifecycleResult, DEFAULT_MAX_CONTENT_CHARS};
use crate::store::json_store::JsonFileStore;
use directories::ProjectDirs;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const APP_ID: &str = "textsift";
const STORE_FILE_NAME: &str = "textsift.json";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    data_file: Option<PathBuf>,
    max_content_chars: Option<usize>,
    logging: RawLogging,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLogging {
    level: Option<String>,
    dir: Option<PathBuf>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// JSON store document.
    pub data_file: PathBuf,
    pub max_content_chars: usize,
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            data_file: data_dir.join(STORE_FILE_NAME),
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
            log_level: default_log_level().to_string(),
            log_dir: data_dir.join(LOG_DIR_NAME),
        }
    }
}

impl CoreConfig {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text, path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!(
                    "event=config_load module=config status=ok mode=defaults path={}",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parses TOML text. `origin` is used for error messages and to resolve
    /// relative paths against the config file's directory.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        let base = origin.parent().unwrap_or_else(|| Path::new("."));
        let defaults = Self::default();
        let config = Self {
            data_file: raw
                .data_file
                .map(|path| resolve_relative(base, path))
                .unwrap_or(defaults.data_file),
            max_content_chars: raw.max_content_chars.unwrap_or(defaults.max_content_chars),
            log_level: raw.logging.level.unwrap_or(defaults.log_level),
            log_dir: raw
                .logging
                .dir
                .map(|path| resolve_relative(base, path))
                .unwrap_or(defaults.log_dir),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_content_chars == 0 {
            return Err(ConfigError::Invalid(
                "max_content_chars must be greater than zero".to_string(),
            ));
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_file cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Opens a lifecycle manager over the configured JSON store.
    pub fn open_manager(&self) -> LifecycleResult<LifecycleManager<JsonFileStore>> {
        Ok(LifecycleManager::open(JsonFileStore::new(&self.data_file))?
            .with_max_content_chars(self.max_content_chars))
    }
}

/// Default location of `config.toml`.
pub fn default_config_path() -> PathBuf {
    match ProjectDirs::from("", "", APP_ID) {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

fn default_data_dir() -> PathBuf {
    match ProjectDirs::from("", "", APP_ID) {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn resolve_relative(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

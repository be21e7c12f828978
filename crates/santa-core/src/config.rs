//! Configuration loading and management
//!
//! # Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config: ~/.config/santa/config.toml
//! 3. Project config: .santa/config.toml (or the file passed with `--config`)
//! 4. Environment variables: `SANTA_*`
//! 5. CLI flags (applied by the binary)
//!
//! # Example Config
//!
//! ```toml
//! data_dir = ".santa/data"
//! backend = "json"
//! admins = ["luca", "merlo"]
//! assignment_date = "2 December"
//! open_on_init = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{participant::ParticipantId, Error, Result};

const DEFAULT_CONFIRMATION_PHRASE: &str = "i am sure i want to run the assignment";
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576; // 1 MB

/// Persistence backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageBackend {
    Memory,
    #[default]
    Json,
    Sqlite,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the JSON store or the `SQLite` file
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    /// Users allowed to run admin commands
    pub admins: Vec<ParticipantId>,
    /// Seed for the assignment RNG; entropy when unset
    pub seed: Option<u64>,
    /// Shown in waiting messages, e.g. "2 December"
    pub assignment_date: Option<String>,
    /// Registration flag for a brand new store
    pub open_on_init: bool,
    /// Exact text an admin sends to confirm the draw
    pub confirmation_phrase: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".santa/data"),
            backend: StorageBackend::default(),
            admins: Vec::new(),
            seed: None,
            assignment_date: None,
            open_on_init: true,
            confirmation_phrase: DEFAULT_CONFIRMATION_PHRASE.to_string(),
        }
    }
}

/// Config file contents; only keys present in the file override
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub data_dir: Option<PathBuf>,
    pub backend: Option<StorageBackend>,
    pub admins: Option<Vec<ParticipantId>>,
    pub seed: Option<u64>,
    pub assignment_date: Option<String>,
    pub open_on_init: Option<bool>,
    pub confirmation_phrase: Option<String>,
}

impl Config {
    /// Whether `id` may run admin commands
    #[must_use]
    pub fn is_admin(&self, id: &ParticipantId) -> bool {
        self.admins.contains(id)
    }

    /// Overlay keys present in `partial`
    pub fn merge_partial(&mut self, partial: PartialConfig) {
        if let Some(data_dir) = partial.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(backend) = partial.backend {
            self.backend = backend;
        }
        if let Some(admins) = partial.admins {
            self.admins = admins;
        }
        if partial.seed.is_some() {
            self.seed = partial.seed;
        }
        if partial.assignment_date.is_some() {
            self.assignment_date = partial.assignment_date;
        }
        if let Some(open) = partial.open_on_init {
            self.open_on_init = open;
        }
        if let Some(phrase) = partial.confirmation_phrase {
            self.confirmation_phrase = phrase;
        }
    }

    /// Apply `SANTA_*` overrides read through `lookup`
    ///
    /// # Errors
    ///
    /// Returns error if an override value is invalid
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SANTA_DATA_DIR") {
            self.data_dir = PathBuf::from(value);
        }

        if let Some(value) = lookup("SANTA_BACKEND") {
            self.backend = value
                .parse()
                .map_err(|_| Error::Config(format!("SANTA_BACKEND: unknown backend '{value}'")))?;
        }

        if let Some(value) = lookup("SANTA_ADMINS") {
            self.admins = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ParticipantId::parse)
                .collect::<Result<_>>()
                .map_err(|e| Error::Config(format!("SANTA_ADMINS: {e}")))?;
        }

        if let Some(value) = lookup("SANTA_SEED") {
            self.seed = Some(
                value
                    .parse()
                    .map_err(|e| Error::Config(format!("SANTA_SEED: {e}")))?,
            );
        }

        if let Some(value) = lookup("SANTA_ASSIGNMENT_DATE") {
            self.assignment_date = Some(value);
        }

        if let Some(value) = lookup("SANTA_OPEN_ON_INIT") {
            self.open_on_init = value
                .parse()
                .map_err(|e| Error::Config(format!("SANTA_OPEN_ON_INIT: {e}")))?;
        }

        Ok(())
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns error if the confirmation phrase is blank
    pub fn validate(&self) -> Result<()> {
        if self.confirmation_phrase.trim().is_empty() {
            return Err(Error::Config("confirmation_phrase cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Load configuration from defaults, files and the process environment.
///
/// `explicit` replaces the project config path and must exist.
///
/// # Errors
///
/// Returns error if:
/// - A config file is malformed TOML or has unknown keys
/// - The explicit config file cannot be read
/// - Environment overrides are invalid
pub async fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path() {
        if let Some(global) = load_optional(&global_path).await? {
            config.merge_partial(global);
        }
    }

    match explicit {
        Some(path) => config.merge_partial(load_partial_toml_file(path).await?),
        None => {
            if let Some(project) = load_optional(Path::new(".santa/config.toml")).await? {
                config.merge_partial(project);
            }
        }
    }

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Get path to global config file
fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "santa")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

async fn load_optional(path: &Path) -> Result<Option<PartialConfig>> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => load_partial_toml_file(path).await.map(Some),
        _ => Ok(None),
    }
}

/// Load a TOML file into a `PartialConfig`
///
/// # Errors
///
/// Returns error if the file cannot be read, is too large, or is malformed
pub async fn load_partial_toml_file(path: &Path) -> Result<PartialConfig> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(Error::Config(format!(
            "Config file {} exceeds maximum size of {MAX_CONFIG_FILE_SIZE} bytes",
            path.display()
        )));
    }

    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))
}

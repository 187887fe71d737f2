//! Configuration file handling for ~/.config/sift/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! It carries the active session user and an optional database path, and is
//! rewritten in place whenever the session user changes.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the user session commands act as. Set by `login`/`register`.
    pub current_user: Option<String>,

    /// SQLite database location. Defaults to `sift.db` in the config dir.
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as a warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to avoid slurping a corrupted or
        // runaway file into memory.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["current_user", "database_path"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

// ============================================================================
// Config Store
// ============================================================================

/// A loaded configuration together with the path it came from, so session
/// changes can be written back to disk.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let config = Config::load(&path)?;
        Ok(Self { path, config })
    }

    /// The session user name, if one has been set.
    pub fn current_user(&self) -> Option<&str> {
        self.config.current_user.as_deref()
    }

    /// Records `name` as the session user and persists immediately, so the
    /// session survives across process invocations.
    pub fn set_current_user(&mut self, name: &str) -> Result<(), ConfigError> {
        self.config.current_user = Some(name.to_string());
        self.save()
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.config.database_path.as_deref()
    }

    /// Write to a temp file in the target directory, then rename over the
    /// destination. A crash mid-write never leaves a half-written config.
    fn save(&self) -> Result<(), ConfigError> {
        let serialized = toml::to_string_pretty(&self.config)?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        {
            use std::io::Write;
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(serialized.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Resolve the configuration directory: `$XDG_CONFIG_HOME/sift` when set,
/// otherwise `~/.config/sift`.
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg).join("sift"));
        }
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHomeDir)?;
    Ok(PathBuf::from(home).join(".config").join("sift"))
}

// ============================================================================
// Tests
// ============================================================================

//! Bitsmith Configuration Module
//!
//! Persistent settings for the CLI host.
//! Config is stored in `~/.config/bitsmith/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`BITSMITH_BLACK_HOLE`)
//! 2. Config file (`~/.config/bitsmith/config.toml`)
//! 3. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BitsError, Result};
use crate::field::FieldValue;

/// Environment variable overriding `torrent.black_hole`
pub const BLACK_HOLE_ENV: &str = "BITSMITH_BLACK_HOLE";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BitsConfig {
    /// Torrent handling
    #[serde(default)]
    pub torrent: TorrentConfig,

    /// Where finalized images are published
    #[serde(default)]
    pub images: ImagesConfig,

    /// Default kind and collaborator limits
    #[serde(default)]
    pub defaults: Defaults,
}

/// Torrent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TorrentConfig {
    /// Watch directory finalized torrent files are copied into
    pub black_hole: Option<PathBuf>,
}

/// Image publishing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImagesConfig {
    /// Directory cover art and screenshots are copied into on finalization
    pub dir: Option<PathBuf>,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Defaults {
    /// Kind used when `-c` is not given (base, video, tv, movie)
    pub kind: Option<String>,

    /// Screenshots taken per submission
    pub num_screenshots: u32,

    /// Cast members turned into tags
    pub num_cast: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            kind: None,
            num_screenshots: 2,
            num_cast: 5,
        }
    }
}

impl BitsConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/bitsmith/` on Unix, `%APPDATA%/bitsmith/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bitsmith")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default path
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path` (defaults if absent)
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| BitsError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| BitsError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| BitsError::ConfigError {
                    reason: format!("Failed to create config directory: {}", e),
                })?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| BitsError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| BitsError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    pub fn with_env(mut self) -> Self {
        if let Ok(dir) = std::env::var(BLACK_HOLE_ENV) {
            if !dir.is_empty() {
                self.torrent.black_hole = Some(PathBuf::from(dir));
            }
        }
        self
    }

    pub fn black_hole(&self) -> Option<&Path> {
        self.torrent.black_hole.as_deref()
    }

    pub fn image_dir(&self) -> Option<&Path> {
        self.images.dir.as_deref()
    }

    pub fn default_kind(&self) -> Option<&str> {
        self.defaults.kind.as_deref()
    }

    /// Literal fields seeded into every submission
    pub fn field_literals(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            (
                "black_hole",
                self.torrent
                    .black_hole
                    .clone()
                    .map_or(FieldValue::Null, FieldValue::Path),
            ),
            (
                "image_dir",
                self.images.dir.clone().map_or(FieldValue::Null, FieldValue::Path),
            ),
            (
                "num_screenshots",
                FieldValue::Int(i64::from(self.defaults.num_screenshots)),
            ),
            ("num_cast", FieldValue::Int(i64::from(self.defaults.num_cast))),
        ]
    }
}

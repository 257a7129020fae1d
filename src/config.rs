//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\downmixer\config.toml
//! - macOS: ~/Library/Application Support/downmixer/config.toml
//! - Linux: ~/.config/downmixer/config.toml
//!
//! The config file is human-readable and editable. Command-line flags
//! override whatever it holds.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::downloader::{CancelMode, OverwritePolicy};
use crate::file_tools::AudioFormat;
use crate::providers::{AUDIO_PROVIDERS, LYRICS_PROVIDERS};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How tracks are downloaded and converted
    pub download: DownloadConfig,

    /// Where run artifacts go
    pub paths: PathsConfig,

    /// Which backends are used, in priority order
    pub providers: ProvidersConfig,

    /// API credentials
    pub credentials: Credentials,
}

/// Download pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Tracks allowed in fetch/convert at the same time
    pub threads: usize,

    /// Output container
    pub format: AudioFormat,

    /// Explicit encoder bitrate such as "320k" (default: source bitrate)
    pub bitrate: Option<String>,

    /// Let the encoder choose, ignoring both override and source bitrate
    pub preserve_original_audio: bool,

    /// What to do when the output file already exists
    pub overwrite: OverwritePolicy,

    /// How in-flight tracks react to cancellation
    pub cancel_mode: CancelMode,

    /// Look up and embed lyrics
    pub fetch_lyrics: bool,

    /// Download and embed album cover art
    pub embed_cover: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            format: AudioFormat::Mp3,
            bitrate: None,
            preserve_original_audio: false,
            overwrite: OverwritePolicy::Skip,
            cancel_mode: CancelMode::FinishStage,
            fetch_lyrics: true,
            embed_cover: true,
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Conversion failure reports (default: <data dir>/downmixer/errors)
    pub errors_dir: Option<PathBuf>,

    /// Parent of the per-run temp directory (default: system temp dir)
    pub temp_root: Option<PathBuf>,
}

impl PathsConfig {
    /// Configured errors directory, or the per-user default.
    pub fn errors_dir(&self) -> PathBuf {
        self.errors_dir.clone().unwrap_or_else(default_errors_dir)
    }
}

/// Provider selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Audio providers, tried in order
    pub audio: Vec<String>,

    /// Lyrics providers, tried in order
    pub lyrics: Vec<String>,

    /// Candidates requested from each audio search
    pub search_results: usize,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            audio: AUDIO_PROVIDERS.iter().map(|s| s.to_string()).collect(),
            lyrics: LYRICS_PROVIDERS.iter().map(|s| s.to_string()).collect(),
            search_results: 5,
        }
    }
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

impl Credentials {
    /// Both Spotify values, if both are set and non-empty.
    pub fn spotify(&self) -> Option<(&str, &str)> {
        let id = self.spotify_client_id.as_deref().filter(|s| !s.is_empty())?;
        let secret = self
            .spotify_client_secret
            .as_deref()
            .filter(|s| !s.is_empty())?;
        Some((id, secret))
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("downmixer"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

fn default_errors_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("downmixer")
        .join("errors")
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to the standard config file
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)?;
    Ok(path)
}

/// Save configuration to `path`, creating its parent directory.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

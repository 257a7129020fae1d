//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while the CLI
//! uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: run-level failures that stop a run before any track starts
//! - [`DownloadError`]: per-track failures, attached to that track's outcome
//!   and never fatal to a batch
//! - Subsystem errors ([`ProviderError`], [`SpotifyError`], [`TranscodeError`],
//!   [`TagError`]) are wrapped by whichever of the two they surface in

use std::path::PathBuf;

use crate::providers::ProviderError;
use crate::spotify::SpotifyError;
use crate::tagging::TagError;
use crate::transcode::TranscodeError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required external executable is not installed
    #[error("Required tool not found: {0}")]
    MissingTool(String),

    /// Metadata source failure (lookup, auth, bad identifier)
    #[error(transparent)]
    Spotify(#[from] SpotifyError),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a missing tool error.
    pub fn missing_tool(name: impl Into<String>) -> Self {
        Self::MissingTool(name.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

/// Why a single track did not reach its destination.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Every provider came back empty
    #[error("No match found")]
    NotFound,

    /// Every provider failed; holds the last failure
    #[error("Provider '{provider}' failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    /// The transcoder failed; `report` is the diagnostic file, if one could
    /// be written
    #[error("Conversion failed: {source}")]
    Conversion {
        #[source]
        source: TranscodeError,
        report: Option<PathBuf>,
    },

    /// Tags could not be written; the converted file is left at `kept_file`
    #[error("Tagging failed (untagged file kept at {kept_file:?}): {source}")]
    Tagging {
        #[source]
        source: TagError,
        kept_file: PathBuf,
    },

    #[error("Filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A temp file survived cleanup and may alias a later download
    #[error("Could not remove temporary file {path:?}, possible duplicate: {source}")]
    PossibleDuplicate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pipeline task itself died
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl DownloadError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Diagnostic report written for this failure, if any.
    pub fn report(&self) -> Option<&std::path::Path> {
        match self {
            Self::Conversion { report, .. } => report.as_deref(),
            _ => None,
        }
    }
}

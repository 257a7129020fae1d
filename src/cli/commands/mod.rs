//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `download`: resolve a Spotify reference and run the download pipeline
//! - `tools`: external tool and credential checks
//! - `init`: write a default config file

mod download;
mod init;
mod tools;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::downloader::{CancelMode, OverwritePolicy};
use crate::file_tools::AudioFormat;

pub use download::cmd_download;
pub use init::cmd_init_config;
pub use tools::{cmd_check_tools, ensure_tools};

/// Downmixer CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Download a Spotify track, album or playlist
    Download(DownloadArgs),
    /// Check that ffmpeg, yt-dlp and Spotify credentials are available
    CheckTools,
    /// Write a config file with the default settings
    InitConfig {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Flags for `download`. Anything left unset falls back to the config file.
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Spotify URL (open.spotify.com/...), URI (spotify:track:...) or track ID
    pub id: String,

    /// Directory the finished files are placed in
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Tracks downloaded and converted at the same time
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<AudioFormat>,

    /// Encoder bitrate, e.g. 320k (default: source bitrate)
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// Let the encoder pick the bitrate
    #[arg(long)]
    pub preserve_original_audio: bool,

    /// What to do when an output file already exists
    #[arg(long, value_enum)]
    pub overwrite: Option<OverwritePolicy>,

    /// How running tracks react to Ctrl-C
    #[arg(long, value_enum)]
    pub cancel_mode: Option<CancelMode>,

    /// Don't look up lyrics
    #[arg(long)]
    pub no_lyrics: bool,

    /// Don't embed cover art
    #[arg(long)]
    pub no_cover: bool,

    /// Spotify API client ID (or set SPOTIFY_CLIENT_ID env var)
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Spotify API client secret (or set SPOTIFY_CLIENT_SECRET env var)
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
}

impl DownloadArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut Config) {
        let download = &mut config.download;
        if let Some(threads) = self.threads {
            download.threads = threads;
        }
        if let Some(format) = self.format {
            download.format = format;
        }
        if let Some(bitrate) = &self.bitrate {
            download.bitrate = Some(bitrate.clone());
        }
        if self.preserve_original_audio {
            download.preserve_original_audio = true;
        }
        if let Some(overwrite) = self.overwrite {
            download.overwrite = overwrite;
        }
        if let Some(cancel_mode) = self.cancel_mode {
            download.cancel_mode = cancel_mode;
        }
        if self.no_lyrics {
            download.fetch_lyrics = false;
        }
        if self.no_cover {
            download.embed_cover = false;
        }

        if let Some(id) = &self.client_id {
            config.credentials.spotify_client_id = Some(id.clone());
        }
        if let Some(secret) = &self.client_secret {
            config.credentials.spotify_client_secret = Some(secret.clone());
        }
    }
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Commands::Download(args) => {
            let rt = Runtime::new()?;
            cmd_download(&rt, args)
        }
        Commands::CheckTools => {
            cmd_check_tools()?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::InitConfig { force } => {
            cmd_init_config(*force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

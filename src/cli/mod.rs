//! Command-line interface for downmixer.
//!
//! `download` turns a Spotify track, album or playlist reference into
//! tagged audio files; `check-tools` reports what the download pipeline
//! needs and whether it is installed; `init-config` writes a starter config.

mod commands;

pub use commands::{Cli, Commands, DownloadArgs, run_command};

//! Downmixer - download Spotify tracks, albums and playlists as tagged audio.
//!
//! Canonical metadata comes from Spotify; audio comes from whichever
//! configured provider returns the best-matching result. Each track is
//! fetched, converted with ffmpeg, tagged and placed under the output
//! directory by a bounded worker pool.

pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod file_tools;
pub mod library;
pub mod matching;
pub mod providers;
pub mod spotify;
pub mod tagging;
#[cfg(test)]
pub mod test_utils;
pub mod transcode;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<ExitCode> {
    let args = cli::Cli::parse();

    // Initialize logging
    let level = if args.verbose { "downmixer=debug" } else { "downmixer=info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    cli::run_command(&args)
}

//! External tool checks.

use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::providers::audio::YtDlpProvider;
use crate::providers::audio::ytdlp::{get_ytdlp_version, is_ytdlp_available};
use crate::transcode::{get_ffmpeg_version, is_ffmpeg_available};

/// Fail early when a tool the configured pipeline shells out to is missing.
pub fn ensure_tools(config: &Config) -> Result<()> {
    if !is_ffmpeg_available() {
        print_ffmpeg_install_instructions();
        return Err(Error::missing_tool("ffmpeg"));
    }
    if needs_ytdlp(config) && !is_ytdlp_available() {
        print_ytdlp_install_instructions();
        return Err(Error::missing_tool("yt-dlp"));
    }
    Ok(())
}

fn needs_ytdlp(config: &Config) -> bool {
    config
        .providers
        .audio
        .iter()
        .any(|name| name == YtDlpProvider::NAME)
}

/// Print tool versions and credential status.
pub fn cmd_check_tools() -> anyhow::Result<()> {
    println!("Checking download tools...\n");

    if let Some(version) = get_ffmpeg_version() {
        println!("✓ ffmpeg: {}", version);
    } else {
        println!("✗ ffmpeg: NOT FOUND");
        print_ffmpeg_install_instructions();
    }

    if let Some(version) = get_ytdlp_version() {
        println!("✓ yt-dlp: {}", version);
    } else {
        println!("✗ yt-dlp: NOT FOUND");
        print_ytdlp_install_instructions();
    }

    println!();
    println!("Spotify credentials:");
    let config = config::load();
    let from_env = std::env::var("SPOTIFY_CLIENT_ID").is_ok_and(|v| !v.is_empty())
        && std::env::var("SPOTIFY_CLIENT_SECRET").is_ok_and(|v| !v.is_empty());
    if config.credentials.spotify().is_some() {
        println!("✓ client id/secret: set in config");
    } else if from_env {
        println!("✓ client id/secret: set in environment");
    } else {
        println!("✗ client id/secret: not set");
        println!("  Create an app at: https://developer.spotify.com/dashboard");
        println!("  Then use: --client-id/--client-secret or SPOTIFY_CLIENT_ID/SPOTIFY_CLIENT_SECRET");
    }

    if let Some(path) = config::config_path() {
        println!();
        println!("Config file: {:?}", path);
    }

    Ok(())
}

fn print_ffmpeg_install_instructions() {
    eprintln!("Install FFmpeg:");
    eprintln!("  Windows: winget install Gyan.FFmpeg");
    eprintln!("  macOS:   brew install ffmpeg");
    eprintln!("  Linux:   apt install ffmpeg");
}

fn print_ytdlp_install_instructions() {
    eprintln!("Install yt-dlp:");
    eprintln!("  Windows: winget install yt-dlp.yt-dlp");
    eprintln!("  macOS:   brew install yt-dlp");
    eprintln!("  Linux:   pipx install yt-dlp");
}

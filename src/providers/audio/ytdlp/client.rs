//! yt-dlp process driver
//!
//! Shells out to the `yt-dlp` executable for both search and download. The
//! binary does all the site-specific work; this client only builds argument
//! lists and parses the JSON it prints.
//!
//! Install yt-dlp:
//! - Windows: `winget install yt-dlp`
//! - macOS: `brew install yt-dlp`
//! - Linux: `pipx install yt-dlp` or your distribution's package

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use super::dto::InfoJson;
use crate::providers::ProviderError;

#[cfg(windows)]
const YTDLP_PATHS: &[&str] = &[
    "yt-dlp", // In PATH
    r"C:\Program Files\yt-dlp\yt-dlp.exe",
    r"C:\ProgramData\chocolatey\bin\yt-dlp.exe",
];

#[cfg(not(windows))]
const YTDLP_PATHS: &[&str] = &[
    "yt-dlp", // In PATH
    "/usr/bin/yt-dlp",
    "/usr/local/bin/yt-dlp",
    "/opt/homebrew/bin/yt-dlp",
];

/// Find the yt-dlp executable, checking common installation paths
pub fn find_ytdlp() -> Option<&'static str> {
    YTDLP_PATHS
        .iter()
        .find(|&path| {
            std::process::Command::new(path)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        })
        .copied()
}

/// Check if yt-dlp is available on the system
pub fn is_ytdlp_available() -> bool {
    find_ytdlp().is_some()
}

/// Get yt-dlp version string (for diagnostics)
pub fn get_ytdlp_version() -> Option<String> {
    let program = find_ytdlp()?;
    std::process::Command::new(program)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

pub struct YtDlpClient {
    program: String,
}

impl YtDlpClient {
    pub fn new() -> Self {
        Self {
            program: find_ytdlp().unwrap_or(YTDLP_PATHS[0]).to_string(),
        }
    }

    /// Use a specific executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Search YouTube for `query` and return up to `limit` entries, in the
    /// order the site ranked them.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<InfoJson>, ProviderError> {
        let target = search_target(query, limit);
        tracing::debug!(query, limit, "yt-dlp search");

        let stdout = self
            .run(&[
                "--dump-json",
                "--skip-download",
                "--no-warnings",
                "--ignore-errors",
                &target,
            ])
            .await?;

        parse_search_output(&stdout)
    }

    /// Download the best audio stream of `url` to `dest_dir/{stem}.{ext}`.
    pub async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<InfoJson, ProviderError> {
        let template = dest_dir.join(format!("{}.%(ext)s", stem));
        let template = template.to_string_lossy();
        tracing::debug!(url, template = %template, "yt-dlp download");

        let stdout = self
            .run(&[
                "--format",
                "bestaudio",
                "--no-playlist",
                "--no-progress",
                "--no-warnings",
                "--no-simulate",
                "--print",
                "after_move:%()j",
                "--output",
                &template,
                url,
            ])
            .await?;

        parse_info_json(stdout.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or(""))
    }

    async fn run(&self, args: &[&str]) -> Result<String, ProviderError> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProviderError::Tool(format!("Failed to run {}: {}", self.program, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        // --ignore-errors exits non-zero when some results were unavailable
        // but still prints the rest
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Tool(format!(
                "yt-dlp failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(stdout)
    }
}

impl Default for YtDlpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn search_target(query: &str, limit: usize) -> String {
    format!("ytsearch{}:{}", limit.max(1), query)
}

/// Parse one info JSON object per non-empty line.
fn parse_search_output(stdout: &str) -> Result<Vec<InfoJson>, ProviderError> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_info_json)
        .collect()
}

fn parse_info_json(line: &str) -> Result<InfoJson, ProviderError> {
    serde_json::from_str(line)
        .map_err(|e| ProviderError::Parse(format!("Failed to parse yt-dlp output: {}", e)))
}

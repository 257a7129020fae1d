//! Audio conversion through the `ffmpeg` executable.
//!
//! Install ffmpeg:
//! - Windows: `winget install Gyan.FFmpeg`
//! - macOS: `brew install ffmpeg`
//! - Linux: `apt install ffmpeg` or equivalent

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use rand::Rng;
use tokio::process::Command;

use crate::file_tools::AudioFormat;

#[cfg(windows)]
const FFMPEG_PATHS: &[&str] = &[
    "ffmpeg", // In PATH
    r"C:\Program Files\ffmpeg\bin\ffmpeg.exe",
    r"C:\ffmpeg\bin\ffmpeg.exe",
    r"C:\ProgramData\chocolatey\bin\ffmpeg.exe",
];

#[cfg(not(windows))]
const FFMPEG_PATHS: &[&str] = &[
    "ffmpeg", // In PATH
    "/usr/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/opt/homebrew/bin/ffmpeg",
];

/// Find the ffmpeg executable, checking common installation paths
pub fn find_ffmpeg() -> Option<&'static str> {
    FFMPEG_PATHS
        .iter()
        .find(|&path| {
            std::process::Command::new(path)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        })
        .copied()
}

/// Check if ffmpeg is available on the system
pub fn is_ffmpeg_available() -> bool {
    find_ffmpeg().is_some()
}

/// First line of `ffmpeg -version` (for diagnostics)
pub fn get_ffmpeg_version() -> Option<String> {
    let ffmpeg = find_ffmpeg()?;
    std::process::Command::new(ffmpeg)
        .arg("-version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| {
            String::from_utf8_lossy(&o.stdout)
                .lines()
                .next()
                .map(|l| l.trim().to_string())
        })
}

/// One conversion job.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: AudioFormat,
    /// ffmpeg bitrate string such as `"320k"`; `None` lets the encoder pick
    pub bitrate: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TranscodeError {
    #[error("Failed to start {command}: {message}")]
    Spawn { command: String, message: String },

    #[error("Transcoder failed ({status})")]
    Failed {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },
}

impl TranscodeError {
    /// Named fields for the diagnostic report, in report order.
    pub fn diagnostics(&self) -> Vec<(&'static str, String)> {
        match self {
            TranscodeError::Spawn { command, message } => {
                vec![("command", command.clone()), ("error", message.clone())]
            }
            TranscodeError::Failed {
                command,
                status,
                stdout,
                stderr,
            } => vec![
                ("command", command.clone()),
                ("exit status", status.clone()),
                ("stdout", stdout.clone()),
                ("stderr", stderr.clone()),
            ],
        }
    }
}

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert `request.input` into `request.output`.
    ///
    /// On failure no partial output file is left behind.
    async fn convert(&self, request: &TranscodeRequest) -> Result<(), TranscodeError>;
}

pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self {
            program: find_ffmpeg().unwrap_or(FFMPEG_PATHS[0]).to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(request: &TranscodeRequest) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-y", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(request.input.to_string_lossy().into_owned());
        args.push("-vn".to_string());
        args.extend(request.format.codec_args().iter().map(|s| s.to_string()));

        if let Some(bitrate) = &request.bitrate
            && !request.format.is_lossless()
        {
            args.push("-b:a".to_string());
            args.push(bitrate.clone());
        }

        args.push(request.output.to_string_lossy().into_owned());
        args
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn convert(&self, request: &TranscodeRequest) -> Result<(), TranscodeError> {
        let args = Self::args(request);
        let command = format!("{} {}", self.program, args.join(" "));
        tracing::debug!(command = %command, "Running ffmpeg");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TranscodeError::Spawn {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        if let Err(e) = tokio::fs::remove_file(&request.output).await
            && e.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!("Could not remove failed output {:?}: {}", request.output, e);
        }

        Err(TranscodeError::Failed {
            command,
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Bitrate passed to the encoder.
///
/// `preserve_original` wins over everything and passes none; otherwise an
/// explicit override, else the source bitrate rounded to whole kbit/s.
pub fn target_bitrate(
    override_bitrate: Option<&str>,
    source_kbps: Option<f64>,
    preserve_original: bool,
) -> Option<String> {
    if preserve_original {
        return None;
    }
    if let Some(bitrate) = override_bitrate.filter(|b| !b.trim().is_empty()) {
        return Some(bitrate.trim().to_string());
    }
    source_kbps
        .filter(|kbps| kbps.is_finite() && *kbps > 0.0)
        .map(|kbps| format!("{}k", kbps.round() as u32))
}

/// Persist `error` as `ffmpeg_error_<timestamp>_<nonce>.txt` in `errors_dir`.
///
/// The file holds one `### key:` section per diagnostic field. Names never
/// collide between concurrent writers.
pub fn write_error_report(errors_dir: &Path, error: &TranscodeError) -> io::Result<PathBuf> {
    fs::create_dir_all(errors_dir)?;

    let mut body = String::new();
    for (key, value) in error.diagnostics() {
        body.push_str(&format!("### {}:\n{}\n\n", key, value));
    }

    let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S-%3f");
    loop {
        let nonce: u32 = rand::rng().random();
        let path = errors_dir.join(format!("ffmpeg_error_{}_{:08x}.txt", stamp, nonce));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(body.as_bytes())?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: AudioFormat, bitrate: Option<&str>) -> TranscodeRequest {
        TranscodeRequest {
            input: PathBuf::from("/tmp/in.webm"),
            output: PathBuf::from("/tmp/out.mp3"),
            format,
            bitrate: bitrate.map(String::from),
        }
    }

    fn failure() -> TranscodeError {
        TranscodeError::Failed {
            command: "ffmpeg -i in out".to_string(),
            status: "exit status: 1".to_string(),
            stdout: String::new(),
            stderr: "Invalid data found when processing input".to_string(),
        }
    }

    #[test]
    fn test_args_with_bitrate() {
        let args = FfmpegTranscoder::args(&request(AudioFormat::Mp3, Some("320k")));
        assert_eq!(args.first().map(String::as_str), Some("-hide_banner"));
        assert!(args.windows(2).any(|w| w == ["-b:a", "320k"]));
        assert!(args.windows(2).any(|w| w == ["-codec:a", "libmp3lame"]));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp3"));
    }

    #[test]
    fn test_args_without_bitrate() {
        let args = FfmpegTranscoder::args(&request(AudioFormat::Opus, None));
        assert!(!args.iter().any(|a| a == "-b:a"));
    }

    #[test]
    fn test_lossless_ignores_bitrate() {
        let args = FfmpegTranscoder::args(&request(AudioFormat::Flac, Some("320k")));
        assert!(!args.iter().any(|a| a == "-b:a"));
    }

    #[test]
    fn test_target_bitrate() {
        assert_eq!(target_bitrate(Some("256k"), Some(129.5), false).as_deref(), Some("256k"));
        assert_eq!(target_bitrate(None, Some(129.5), false).as_deref(), Some("130k"));
        assert_eq!(target_bitrate(None, None, false), None);
        assert_eq!(target_bitrate(Some("256k"), Some(129.5), true), None);
        assert_eq!(target_bitrate(Some(" "), Some(160.0), false).as_deref(), Some("160k"));
    }

    #[test]
    fn test_error_report_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_error_report(&dir.path().join("errors"), &failure()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("ffmpeg_error_"));
        assert!(name.ends_with(".txt"));

        let body = fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("### command:\nffmpeg -i in out\n\n"));
        assert!(body.contains("### exit status:\nexit status: 1\n\n"));
        assert!(body.contains("### stderr:\nInvalid data found"));
    }

    #[test]
    fn test_error_reports_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_error_report(dir.path(), &failure()).unwrap();
        let b = write_error_report(dir.path(), &failure()).unwrap();
        assert_ne!(a, b);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_is_ffmpeg_available() {
        let _ = is_ffmpeg_available();
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let transcoder = FfmpegTranscoder::with_program("/nonexistent/ffmpeg");
        let result = transcoder.convert(&request(AudioFormat::Mp3, None)).await;
        let err = result.unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn { .. }));
        assert_eq!(err.diagnostics()[0].0, "command");
    }
}

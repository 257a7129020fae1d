//! Output formats and filesystem helpers.
//!
//! Everything the pipeline needs to turn a finished temp file into a
//! user-visible one: the target container and its ffmpeg arguments, a
//! filename sanitizer, and a move that survives crossing filesystems.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::library::Track;

/// Container/codec the pipeline converts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Flac,
    Opus,
    M4a,
    Ogg,
    Wav,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 6] = [
        AudioFormat::Mp3,
        AudioFormat::Flac,
        AudioFormat::Opus,
        AudioFormat::M4a,
        AudioFormat::Ogg,
        AudioFormat::Wav,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::Opus => "opus",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Wav => "wav",
        }
    }

    /// ffmpeg encoder arguments for this format.
    pub fn codec_args(self) -> &'static [&'static str] {
        match self {
            AudioFormat::Mp3 => &["-codec:a", "libmp3lame"],
            AudioFormat::Flac => &["-codec:a", "flac"],
            AudioFormat::Opus => &["-codec:a", "libopus"],
            AudioFormat::M4a => &["-codec:a", "aac"],
            AudioFormat::Ogg => &["-codec:a", "libvorbis"],
            AudioFormat::Wav => &["-codec:a", "pcm_s16le"],
        }
    }

    /// Lossless targets ignore a bitrate.
    pub fn is_lossless(self) -> bool {
        matches!(self, AudioFormat::Flac | AudioFormat::Wav)
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Codec of a fetched source file, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCodec {
    /// AAC family, with the profile string (`mp4a.40.2`)
    Mp4a(String),
    Opus,
    Vorbis,
    Mp3,
    Flac,
    Unknown(String),
}

impl AudioCodec {
    pub fn parse(codec: &str) -> AudioCodec {
        let lower = codec.trim().to_ascii_lowercase();
        match lower.as_str() {
            "opus" => AudioCodec::Opus,
            "vorbis" => AudioCodec::Vorbis,
            "mp3" | "mp3float" => AudioCodec::Mp3,
            "flac" => AudioCodec::Flac,
            s if s.starts_with("mp4a") || s == "aac" => AudioCodec::Mp4a(lower),
            _ => AudioCodec::Unknown(lower),
        }
    }
}

/// Replace characters that are illegal in file names with `-`.
///
/// Covers `/ \ ? % * : | " < >`, DEL and the C0 control range.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' | '\x7f' => '-',
            c if (c as u32) < 0x20 => '-',
            _ => c,
        })
        .collect()
}

/// File name a track is placed under.
pub fn output_file_name(track: &Track, format: AudioFormat) -> String {
    format!("{}.{}", sanitize_filename(&track.full_title()), format.extension())
}

/// Full destination path for a track inside `output_dir`.
pub fn output_path(output_dir: &Path, track: &Track, format: AudioFormat) -> PathBuf {
    output_dir.join(output_file_name(track, format))
}

/// Move `source` to `dest`, replacing any existing file.
///
/// Falls back to copy + delete when a rename is not possible (different
/// filesystem).
pub fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    if let Err(e) = fs::rename(source, dest) {
        tracing::debug!("rename {:?} -> {:?} failed ({}), copying", source, dest, e);
        fs::copy(source, dest)?;
        fs::remove_file(source)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Artist;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("AC/DC"), "AC-DC");
        assert_eq!(sanitize_filename("What?"), "What-");
        assert_eq!(sanitize_filename("100%"), "100-");
        assert_eq!(sanitize_filename("a:b|c*d"), "a-b-c-d");
        assert_eq!(sanitize_filename("\"quoted\" <x>"), "-quoted- -x-");
        assert_eq!(sanitize_filename("back\\slash"), "back-slash");
        assert_eq!(sanitize_filename("Normal Name"), "Normal Name");
    }

    #[test]
    fn test_sanitize_control_characters() {
        assert_eq!(sanitize_filename("tab\there"), "tab-here");
        assert_eq!(sanitize_filename("nul\0"), "nul-");
        assert_eq!(sanitize_filename("del\x7f"), "del-");
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(sanitize_filename("Sigur Rós - Hoppípolla"), "Sigur Rós - Hoppípolla");
    }

    #[test]
    fn test_output_file_name() {
        let track = Track::new(
            "Soft Spot",
            vec![Artist::new("piri"), Artist::new("Tommy Villiers")],
            220.0,
        );
        assert_eq!(
            output_file_name(&track, AudioFormat::Mp3),
            "piri, Tommy Villiers - Soft Spot.mp3"
        );

        let slashed = Track::new("Back In Black", vec![Artist::new("AC/DC")], 255.0);
        assert_eq!(
            output_file_name(&slashed, AudioFormat::Flac),
            "AC-DC - Back In Black.flac"
        );
    }

    #[test]
    fn test_codec_parse() {
        assert_eq!(AudioCodec::parse("opus"), AudioCodec::Opus);
        assert_eq!(AudioCodec::parse("mp4a.40.2"), AudioCodec::Mp4a("mp4a.40.2".to_string()));
        assert_eq!(AudioCodec::parse("VORBIS"), AudioCodec::Vorbis);
        assert!(matches!(AudioCodec::parse("weird"), AudioCodec::Unknown(_)));
    }

    #[test]
    fn test_format_extensions_unique() {
        let mut exts: Vec<_> = AudioFormat::ALL.iter().map(|f| f.extension()).collect();
        exts.sort();
        exts.dedup();
        assert_eq!(exts.len(), AudioFormat::ALL.len());
    }

    #[test]
    fn test_format_serde_names() {
        let toml = toml::to_string(&std::collections::BTreeMap::from([("f", AudioFormat::M4a)])).unwrap();
        assert!(toml.contains("\"m4a\""));
    }

    #[test]
    fn test_move_file_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.mp3");
        let dest = dir.path().join("out").join("dest.mp3");
        fs::write(&src, b"new").unwrap();
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, b"old").unwrap();

        move_file(&src, &dest).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_move_file_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = move_file(&dir.path().join("nope"), &dir.path().join("dest"));
        assert!(result.is_err());
    }
}

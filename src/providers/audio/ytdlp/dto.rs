//! yt-dlp info JSON
//!
//! One object per line of `--dump-json` output, and the object printed by
//! `--print after_move:%()j` once a download has been moved into place.
//! Only the fields we read are listed; every one of them is optional in
//! practice, depending on the extractor.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfoJson {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Length in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    // Music metadata, present for YouTube Music uploads
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub artists: Option<Vec<String>>,
    #[serde(default)]
    pub album: Option<String>,
    /// `YYYYMMDD`
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub release_year: Option<u32>,

    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,

    // Set after a download
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    /// Audio bitrate in kbit/s
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub acodec: Option<String>,
}

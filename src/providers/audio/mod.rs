//! Audio search + fetch backends.

pub mod ytdlp;

pub use ytdlp::YtDlpProvider;

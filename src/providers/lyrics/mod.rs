//! Lyrics backends.

pub mod lrclib;

pub use lrclib::LrclibProvider;

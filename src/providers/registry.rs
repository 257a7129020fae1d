//! Statically registered provider implementations.

use std::sync::Arc;

use crate::config::ProvidersConfig;
use crate::error::{Error, Result};

use super::audio::YtDlpProvider;
use super::lyrics::LrclibProvider;
use super::{AudioProvider, LyricsProvider};

/// Audio backends known to this build, by config name.
pub const AUDIO_PROVIDERS: &[&str] = &[YtDlpProvider::NAME];

/// Lyrics backends known to this build, by config name.
pub const LYRICS_PROVIDERS: &[&str] = &[LrclibProvider::NAME];

/// Providers for one run, in priority order.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    pub audio: Vec<Arc<dyn AudioProvider>>,
    pub lyrics: Vec<Arc<dyn LyricsProvider>>,
}

impl ProviderRegistry {
    pub fn new(audio: Vec<Arc<dyn AudioProvider>>, lyrics: Vec<Arc<dyn LyricsProvider>>) -> Self {
        Self { audio, lyrics }
    }

    /// Build every provider named in the config, in the listed order.
    ///
    /// Unknown names are a configuration error.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let mut registry = Self::default();

        for name in &config.audio {
            let provider: Arc<dyn AudioProvider> = match name.as_str() {
                YtDlpProvider::NAME => {
                    Arc::new(YtDlpProvider::new(config.search_results))
                }
                other => {
                    return Err(Error::config(format!(
                        "unknown audio provider '{}' (known: {})",
                        other,
                        AUDIO_PROVIDERS.join(", ")
                    )));
                }
            };
            registry.audio.push(provider);
        }

        for name in &config.lyrics {
            let provider: Arc<dyn LyricsProvider> = match name.as_str() {
                LrclibProvider::NAME => Arc::new(LrclibProvider::new()),
                other => {
                    return Err(Error::config(format!(
                        "unknown lyrics provider '{}' (known: {})",
                        other,
                        LYRICS_PROVIDERS.join(", ")
                    )));
                }
            };
            registry.lyrics.push(provider);
        }

        if registry.audio.is_empty() {
            return Err(Error::config("no audio providers configured"));
        }

        Ok(registry)
    }
}

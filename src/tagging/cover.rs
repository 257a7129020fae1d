//! Album cover download.

use async_trait::async_trait;

use crate::providers::ProviderError;

/// Downloaded cover art
#[derive(Debug, Clone)]
pub struct CoverImage {
    /// Image data (JPEG or PNG)
    pub data: Vec<u8>,
    pub mime_type: String,
    /// Source URL
    pub url: String,
}

/// Fetches cover images by URL.
#[async_trait]
pub trait CoverSource: Send + Sync {
    async fn fetch_cover(&self, url: &str) -> Result<CoverImage, ProviderError>;
}

pub struct CoverArtClient {
    http_client: reqwest::Client,
}

impl CoverArtClient {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }
}

impl Default for CoverArtClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoverSource for CoverArtClient {
    async fn fetch_cover(&self, url: &str) -> Result<CoverImage, ProviderError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            return Err(ProviderError::Api(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?
            .to_vec();

        Ok(CoverImage {
            data,
            mime_type,
            url: url.to_string(),
        })
    }
}

//! HTTP-backed image probe.

use std::io::Cursor;
use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::errors::ProbeError;
use crate::domain::ports::{ImageProbePort, ProbedImage};

/// Configuration for the HTTP probe.
#[derive(Debug, Clone)]
pub struct HttpProbeConfig {
    /// Request timeout in seconds. Zero waits indefinitely.
    pub timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
    /// How many completed URLs to remember for `is_complete`.
    pub completed_capacity: usize,
}

impl Default for HttpProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
            completed_capacity: 500,
        }
    }
}

/// Fetches an image over HTTP and reads its header dimensions.
///
/// Completed URLs are remembered so a later `is_complete` can answer
/// synchronously, the way a platform image cache would.
pub struct HttpImageProbe {
    client: reqwest::Client,
    config: HttpProbeConfig,
    completed: Mutex<LruCache<String, (u32, u32)>>,
}

impl HttpImageProbe {
    /// Creates a probe with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: HttpProbeConfig) -> Result<Self, ProbeError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| ProbeError::network(format!("Failed to create HTTP client: {e}")))?;

        let cap = NonZeroUsize::new(config.completed_capacity).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            client,
            config,
            completed: Mutex::new(LruCache::new(cap)),
        })
    }

    async fn download(&self, url: &str) -> Result<Bytes, ProbeError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout {
                    secs: self.config.timeout_secs,
                }
            } else {
                ProbeError::network(format!("Request failed: {e}"))
            }
        })?;

        if !response.status().is_success() {
            return Err(ProbeError::Status {
                status: response.status().as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| ProbeError::network(format!("Failed to read body: {e}")))
    }
}

impl std::fmt::Debug for HttpImageProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpImageProbe")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Reads width and height from an encoded image header.
///
/// # Errors
/// Returns `ProbeError::Decode` for unrecognised data and
/// `ProbeError::EmptyImage` for a zero width.
pub fn natural_dimensions(bytes: &[u8]) -> Result<(u32, u32), ProbeError> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ProbeError::decode(format!("Failed to sniff format: {e}")))?
        .into_dimensions()
        .map_err(|e| ProbeError::decode(format!("Failed to read dimensions: {e}")))?;

    if width == 0 {
        return Err(ProbeError::EmptyImage);
    }
    Ok((width, height))
}

#[async_trait]
impl ImageProbePort for HttpImageProbe {
    fn is_complete(&self, url: &str) -> bool {
        self.completed.lock().contains(url)
    }

    async fn fetch(&self, url: &str) -> Result<ProbedImage, ProbeError> {
        if let Some((width, height)) = self.completed.lock().get(url).copied() {
            trace!(url = %url, "Probe answered from completed set");
            return Ok(ProbedImage {
                url: url.to_string(),
                natural_width: width,
                natural_height: height,
            });
        }

        debug!(url = %url, "Probing image over network");
        let bytes = self.download(url).await?;
        let (width, height) = natural_dimensions(&bytes)?;

        self.completed.lock().put(url.to_string(), (width, height));
        debug!(url = %url, width, height, "Probe confirmed image");

        Ok(ProbedImage {
            url: url.to_string(),
            natural_width: width,
            natural_height: height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn test_natural_dimensions_png() {
        let bytes = png_bytes(40, 30);
        assert_eq!(natural_dimensions(&bytes), Ok((40, 30)));
    }

    #[test]
    fn test_natural_dimensions_garbage() {
        let err = natural_dimensions(b"<html>not an image</html>").unwrap_err();
        assert!(err.is_content_error());
    }

    #[test]
    fn test_probe_creation() {
        let probe = HttpImageProbe::new(HttpProbeConfig::default());
        assert!(probe.is_ok());
    }

    #[tokio::test]
    async fn test_completed_urls_answer_synchronously() -> Result<(), Box<dyn std::error::Error>> {
        let probe = HttpImageProbe::new(HttpProbeConfig::default())?;
        let url = "https://media.example.com/s.jpg";
        assert!(!probe.is_complete(url));

        probe.completed.lock().put(url.to_string(), (800, 600));

        assert!(probe.is_complete(url));
        let probed = probe.fetch(url).await?;
        assert_eq!(probed.natural_width, 800);
        Ok(())
    }
}

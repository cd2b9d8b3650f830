//! Radar WMS tile client.
//!
//! Fetches single-pixel GetMap tiles and reads the color of their top-left
//! pixel. Failures are step-local: they are reported per tile, never
//! propagated as request errors.

use std::time::Duration;

use image::GenericImageView;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;

use crate::config::ConfigError;
use crate::services::legend::Rgb;

/// Why a single tile sample could not be read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("fetch_failed: {0}")]
    FetchFailed(String),

    #[error("invalid_image")]
    InvalidImage,
}

/// Client for the radar WMS endpoint.
#[derive(Debug, Clone)]
pub struct RadarClient {
    client: reqwest::Client,
}

impl RadarClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| ConfigError::HttpClient(format!("invalid User-Agent: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }

    /// Fetch the raw tile bytes. Any non-2xx status is a failure.
    pub async fn fetch_tile(&self, url: &Url) -> Result<Vec<u8>, SampleError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SampleError::FetchFailed(describe_transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SampleError::FetchFailed(format!("HTTP {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SampleError::FetchFailed(describe_transport_error(&e)))?;
        Ok(bytes.to_vec())
    }

    /// Fetch a tile and read its top-left pixel.
    pub async fn sample_pixel(&self, url: &Url) -> Result<Rgb, SampleError> {
        let bytes = self.fetch_tile(url).await?;
        decode_top_left_pixel(&bytes)
    }
}

/// Render a reqwest error with its full cause chain.
///
/// reqwest's own `Display` stops at "error sending request for url (...)";
/// the useful part (timeout, connection refused, DNS) lives in `source()`.
fn describe_transport_error(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    if e.is_timeout() && !message.contains("timed out") {
        message.push_str(": operation timed out");
    }
    message
}

/// Decode image bytes and return the RGB channels of pixel (0,0).
///
/// Alpha is ignored: a transparent pixel reports whatever color it stores.
pub fn decode_top_left_pixel(bytes: &[u8]) -> Result<Rgb, SampleError> {
    let img = image::load_from_memory(bytes).map_err(|e| {
        tracing::debug!("Tile decode failed: {}", e);
        SampleError::InvalidImage
    })?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(SampleError::InvalidImage);
    }

    let [r, g, b, _] = img.get_pixel(0, 0).0;
    Ok(Rgb::new(r, g, b))
}

//! HTTP fetch pipeline for comic pages.
//!
//! ### Deadlines
//! - Every call is bounded by the configured timeout (default 2000ms),
//!   covering connect, headers and body.
//! - A source that makes several calls gets a fresh deadline per call.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//! - Only 2xx responses are returned; everything else is an error.

pub mod url;

use reqwest::Url;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize, fix_srcset, fix_url, resolve};

use funnies_core::{AppConfig, Error};

/// Characters of an error response body kept in the error message.
const ERROR_BODY_PREVIEW: usize = 200;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "funnies/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Deadline per request (default: 2s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "funnies/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(2000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// URL the body was served from, after redirects
    pub final_url: Url,
    /// Response body, decoded lossily as UTF-8
    pub body: String,
}

/// HTTP client shared by every source.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// GET a page as text under the per-call deadline.
    pub async fn get_text(&self, url: &Url) -> Result<FetchResponse, Error> {
        match tokio::time::timeout(self.config.timeout, self.get_text_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(self.timeout_error(url)),
        }
    }

    async fn get_text_inner(&self, url: &Url) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(Error::HttpError(format!("{url}: HTTP {}: {}", status.as_u16(), preview.trim())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{url}: {len} bytes exceeds {}", self.config.max_bytes)));
        }

        let bytes = response.bytes().await.map_err(|e| self.request_error(url, e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{url}: {} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            url = %url,
            final_url = %final_url,
            fetch_ms,
            bytes = bytes.len(),
            "fetched page"
        );

        Ok(FetchResponse { final_url, body: String::from_utf8_lossy(&bytes).into_owned() })
    }

    fn request_error(&self, url: &Url, err: reqwest::Error) -> Error {
        if err.is_timeout() { self.timeout_error(url) } else { Error::HttpError(format!("{url}: network error: {err}")) }
    }

    fn timeout_error(&self, url: &Url) -> Error {
        Error::FetchTimeout(format!("{url} did not respond within {}ms", self.config.timeout.as_millis()))
    }
}

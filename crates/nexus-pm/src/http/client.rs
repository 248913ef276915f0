//! HTTP client for repository downloads.
//!
//! This module provides a wrapper around `reqwest` with the features artifact
//! downloads need:
//! - Streaming downloads straight to disk
//! - Optional retries with exponential backoff for server errors
//! - TLS verification toggle for self-signed repository certificates
//! - HTTP basic authentication for private repositories
//!
//! # Examples
//!
//! ```no_run
//! use nexus_pm::http::{HttpClient, HttpClientConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig::new()
//!     .with_timeout(Duration::from_secs(120))
//!     .with_basic_auth("deploy".to_string(), Some("secret".to_string()));
//!
//! let client = HttpClient::with_config(config)?;
//! client.download(
//!     "https://nexus.example.com/releases/com/example/foo/1.0.0/foo-1.0.0.tar.gz",
//!     "/tmp/foo.tar.gz".as_ref(),
//! ).await?;
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

const DEFAULT_USER_AGENT: &str = concat!("nexus-fetch/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 0;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_BACKOFF_EXPONENT: u32 = 10;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpError {
    /// HTTP status code, if the server answered with an error status
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::HttpStatus { status, .. } => Some(*status),
            HttpError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub struct HttpClient {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
    basic_auth: Option<(String, Option<String>)>,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            basic_auth: config.basic_auth,
        })
    }

    /// Perform GET request, retrying server errors up to the configured limit
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        let mut attempt = 0;

        loop {
            let error = match self.execute_get(url).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let error = HttpError::HttpStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    };
                    // 4xx other than 429 will not change on retry
                    if !status.is_server_error() && status != StatusCode::TOO_MANY_REQUESTS {
                        return Err(error);
                    }
                    error
                }
                Err(e) => e,
            };

            if attempt >= self.max_retries {
                return Err(error);
            }

            let delay = backoff_delay(self.retry_delay, attempt);
            log::debug!("Retrying {} in {:?}", url, delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Execute a GET request without retries
    async fn execute_get(&self, url: &str) -> Result<Response, HttpError> {
        let mut request = self.client.get(url);

        if let Some((username, password)) = &self.basic_auth {
            request = request.basic_auth(username, password.as_ref());
        }

        log::debug!("HTTP GET {}", url);
        let response = request.send().await?;
        log::debug!("HTTP {} {}", response.status().as_u16(), url);
        Ok(response)
    }

    /// Stream a URL to `dest`.
    ///
    /// The body goes to a temporary file next to `dest` that replaces it only
    /// once the whole body has been written, so a failed download leaves any
    /// existing file untouched.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<(), HttpError> {
        let response = self.get(url).await?;

        let parent = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent).await?;

        let partial = tempfile::Builder::new()
            .prefix(".nexus-")
            .suffix(".part")
            .tempfile_in(parent)?;
        let mut file = File::from_std(partial.reopen()?);
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        drop(file);

        partial.persist(dest).map_err(|e| HttpError::Io(e.error))?;

        Ok(())
    }
}

/// Exponential backoff, with the exponent capped so large retry counts
/// cannot overflow.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2_u32.pow(attempt.min(MAX_BACKOFF_EXPONENT)))
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
    pub basic_auth: Option<(String, Option<String>)>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
            basic_auth: None,
        }
    }
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Self {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }

    pub fn with_basic_auth(mut self, username: String, password: Option<String>) -> Self {
        self.basic_auth = Some((username, password));
        self
    }
}

//! File downloader for HTTP/HTTPS artifacts.

use std::path::Path;

use async_trait::async_trait;

use crate::http::{HttpClient, HttpClientConfig};
use crate::Result;

use super::{Fetch, FetchError};

/// Fetch primitive backed by [`HttpClient`].
///
/// Holds one client that verifies certificates and one that does not, so the
/// TLS toggle can be chosen per request.
pub struct FileDownloader {
    verifying: HttpClient,
    insecure: HttpClient,
}

impl FileDownloader {
    /// Create a new file downloader
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let verifying = HttpClient::with_config(config.clone().with_accept_invalid_certs(false))?;
        let insecure = HttpClient::with_config(config.with_accept_invalid_certs(true))?;
        Ok(Self { verifying, insecure })
    }

    fn client(&self, verify_tls: bool) -> &HttpClient {
        if verify_tls {
            &self.verifying
        } else {
            &self.insecure
        }
    }
}

#[async_trait]
impl Fetch for FileDownloader {
    async fn fetch(&self, url: &str, dest: &Path, verify_tls: bool) -> std::result::Result<(), FetchError> {
        self.client(verify_tls)
            .download(url, dest)
            .await
            .map_err(|e| FetchError::new("downloading", e.to_string()).with_status(e.status()))
    }
}

//! Download and extraction primitives.
//!
//! The artifact pipeline only talks to the [`Fetch`] and [`Extract`] traits.
//! [`FileDownloader`] and [`ArchiveExtractor`] are the production
//! implementations backed by `reqwest` and the `tar`/`zip` crates.

mod archive;
mod file;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use archive::{ArchiveError, ArchiveExtractor, ArchiveType};
pub use file::FileDownloader;

/// Failure reported by a fetch or extract primitive.
///
/// `when` is the primitive's own description of what it was doing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub when: String,
    pub message: String,
    /// HTTP status, when the failure was an error response
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(when: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            when: when.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }

    /// Whether the resource was absent.
    ///
    /// Collaborators that only report a message are classified by the `404`
    /// token in it.
    pub fn is_not_found(&self) -> bool {
        match self.status {
            Some(status) => status == 404,
            None => self.message.contains("404"),
        }
    }
}

/// Fetch a URL into a local file.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path, verify_tls: bool) -> Result<(), FetchError>;
}

/// Unpack an archive file into a directory.
#[async_trait]
pub trait Extract: Send + Sync {
    async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<(), FetchError>;
}

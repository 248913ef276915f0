use std::path::PathBuf;

use crate::coordinate::ArtifactRequest;

/// Normalized, read-only configuration shared by every artifact in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Repository base URL, without trailing slash
    pub base_url: String,
    /// Repository name (e.g. `releases`, `snapshots`)
    pub repository: String,
    /// Group id in path form (`com/example`)
    pub group_path: String,
    /// File extension, starting with a dot unless empty
    pub extension: String,
    /// Classifier appended to every artifact file name
    pub classifier: Option<String>,
    /// Unpack downloaded archives into `path/<artifact>`
    pub unpack: bool,
    /// Verify TLS certificates
    pub strict_ssl: bool,
    /// Destination root, without trailing slash
    pub path: PathBuf,
    /// Directory for temporary downloads
    pub temp_dir: PathBuf,
    /// Leading path components dropped when unpacking
    pub strip_components: usize,
    /// Upper bound on concurrently running artifact pipelines
    pub max_concurrent: Option<usize>,
}

impl RepositoryConfig {
    /// Build a request for one dependency, carrying the configured classifier.
    pub fn request(&self, artifact_id: &str, version: &str) -> ArtifactRequest {
        ArtifactRequest::new(artifact_id, version).with_classifier(self.classifier.clone())
    }
}

//! Repository URL and local path construction for artifacts.

use std::path::PathBuf;

use crate::config::RepositoryConfig;
use crate::coordinate::ArtifactRequest;

pub const METADATA_FILE_NAME: &str = "maven-metadata.xml";

/// Where an artifact lives in the repository and on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub file_name: String,
    pub folder_url: String,
    pub url: String,
    pub metadata_url: String,
    /// Final path of a non-unpacked download
    pub target: PathBuf,
    /// Directory an archive is unpacked into
    pub unpack_dir: PathBuf,
}

impl ResolvedLocation {
    pub fn new(config: &RepositoryConfig, request: &ArtifactRequest) -> Self {
        let folder_url = format!(
            "{}/{}/{}/{}/{}",
            config.base_url, config.repository, config.group_path, request.artifact_id, request.version
        );
        let file_name = request.file_name(&request.version, &config.extension);
        Self::with_file_name(config, request, folder_url, file_name)
    }

    /// Location of the timestamped snapshot file inside the same folder.
    pub fn snapshot(&self, config: &RepositoryConfig, request: &ArtifactRequest, snapshot_version: &str) -> Self {
        let file_name = request.file_name(snapshot_version, &config.extension);
        Self::with_file_name(config, request, self.folder_url.clone(), file_name)
    }

    fn with_file_name(
        config: &RepositoryConfig,
        request: &ArtifactRequest,
        folder_url: String,
        file_name: String,
    ) -> Self {
        Self {
            url: format!("{}/{}", folder_url, file_name),
            metadata_url: format!("{}/{}", folder_url, METADATA_FILE_NAME),
            target: config.path.join(&file_name),
            unpack_dir: config.path.join(&request.artifact_id),
            folder_url,
            file_name,
        }
    }
}

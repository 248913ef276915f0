//! Snapshot resolution through `maven-metadata.xml`.
//!
//! A snapshot version such as `1.0-SNAPSHOT` is published under a timestamped
//! file name (`bar-1.0-20230101.120000-3.tar.gz`). The descriptor next to the
//! artifact lists the current timestamped version:
//!
//! ```xml
//! <metadata>
//!   <versioning>
//!     <snapshotVersions>
//!       <snapshotVersion>
//!         <extension>tar.gz</extension>
//!         <value>1.0-20230101.120000-3</value>
//!       </snapshotVersion>
//!     </snapshotVersions>
//!   </versioning>
//! </metadata>
//! ```
//!
//! Only the first `snapshotVersion` entry is consulted.

use std::path::Path;
use std::sync::Arc;

use roxmltree::{Document, Node};
use tempfile::TempPath;

use crate::config::RepositoryConfig;
use crate::coordinate::ArtifactRequest;
use crate::downloader::Fetch;
use crate::error::{ArtifactError, Phase};
use crate::location::{ResolvedLocation, METADATA_FILE_NAME};

/// Timestamped version taken from a metadata descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMetadata {
    pub value: String,
}

impl SnapshotMetadata {
    /// Parse a descriptor and pick the first snapshot version's `value`.
    pub fn parse(xml: &str) -> Result<Self, ArtifactError> {
        let doc = Document::parse(xml).map_err(|e| parse_error(format!("Invalid metadata XML: {}", e)))?;

        let root = doc.root_element();
        if !root.has_tag_name("metadata") {
            return Err(parse_error(format!(
                "Expected <metadata> root element, found <{}>",
                root.tag_name().name()
            )));
        }

        let value = child(root, "versioning")
            .and_then(|n| child(n, "snapshotVersions"))
            .and_then(|n| child(n, "snapshotVersion"))
            .and_then(|n| child(n, "value"))
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| parse_error("No versioning/snapshotVersions/snapshotVersion/value in metadata"))?;

        Ok(Self { value: value.to_string() })
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn parse_error(message: impl Into<String>) -> ArtifactError {
    ArtifactError::MetadataParse { message: message.into() }
}

/// A resolved snapshot file plus the descriptor that was downloaded for it.
///
/// The descriptor is kept so the caller decides when to clean it up.
pub struct ResolvedSnapshot {
    pub location: ResolvedLocation,
    pub descriptor: TempPath,
}

/// Resolves snapshot file names from the repository's metadata descriptor.
pub struct MetadataResolver {
    fetcher: Arc<dyn Fetch>,
}

impl MetadataResolver {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self { fetcher }
    }

    /// Fetch the descriptor next to `location` and compute the real snapshot file.
    pub async fn resolve_snapshot(
        &self,
        config: &RepositoryConfig,
        request: &ArtifactRequest,
        location: &ResolvedLocation,
    ) -> Result<ResolvedSnapshot, ArtifactError> {
        let descriptor = tempfile::Builder::new()
            .prefix(&format!("{}-{}-", request.artifact_id, request.version))
            .suffix(&format!("-{}", METADATA_FILE_NAME))
            .tempfile_in(&config.temp_dir)
            .map_err(|e| ArtifactError::Transport {
                phase: Phase::FetchingMetadata,
                message: e.to_string(),
            })?
            .into_temp_path();

        self.fetcher
            .fetch(&location.metadata_url, &descriptor, config.strict_ssl)
            .await
            .map_err(|e| {
                log::debug!("{} failed while {}: {}", location.metadata_url, e.when, e.message);
                ArtifactError::Transport {
                    phase: Phase::FetchingMetadata,
                    message: e.message,
                }
            })?;

        let metadata = read_descriptor(&descriptor).await?;
        log::debug!("Resolved {} to snapshot {}", request, metadata.value);

        Ok(ResolvedSnapshot {
            location: location.snapshot(config, request, &metadata.value),
            descriptor,
        })
    }
}

async fn read_descriptor(path: &Path) -> Result<SnapshotMetadata, ArtifactError> {
    let xml = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| parse_error(format!("Failed to read metadata: {}", e)))?;
    SnapshotMetadata::parse(&xml)
}

//! Concurrent resolution of every artifact in a target.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};

use super::artifact::{ArtifactFetcher, ArtifactOutcome};
use crate::config::{RepositoryConfig, TargetConfig};
use crate::coordinate::ArtifactRequest;
use crate::downloader::{ArchiveExtractor, Extract, Fetch, FileDownloader};
use crate::error::{Phase, Result};

/// Outcome of a whole batch, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub outcomes: Vec<ArtifactOutcome>,
}

impl BatchOutcome {
    /// Whether any artifact failed
    pub fn failed(&self) -> bool {
        self.outcomes.iter().any(ArtifactOutcome::is_failed)
    }

    pub fn succeeded(&self) -> bool {
        !self.failed()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn installed(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.outcomes.iter().filter(|o| !o.is_failed())
    }
}

pub struct BatchCoordinator {
    fetcher: ArtifactFetcher,
}

impl BatchCoordinator {
    pub fn new(config: Arc<RepositoryConfig>, fetcher: Arc<dyn Fetch>, extractor: Arc<dyn Extract>) -> Self {
        Self {
            fetcher: ArtifactFetcher::new(config, fetcher, extractor),
        }
    }

    /// Coordinator backed by the HTTP downloader and archive extractor,
    /// configured from a merged target.
    pub fn from_target(name: &str, target: &TargetConfig) -> Result<Self> {
        let downloader = FileDownloader::new(target.http_config())?;
        let config = target.clone().into_repository_config(name)?;
        let extractor = ArchiveExtractor::new().with_strip_components(config.strip_components);

        Ok(Self::new(Arc::new(config), Arc::new(downloader), Arc::new(extractor)))
    }

    pub fn config(&self) -> &RepositoryConfig {
        self.fetcher.config()
    }

    /// Resolve every request. All pipelines run to completion regardless of
    /// individual failures.
    ///
    /// The destination root is created first; if that fails every artifact
    /// is reported failed without any fetch.
    pub async fn run(&self, requests: &[ArtifactRequest]) -> BatchOutcome {
        if requests.is_empty() {
            return BatchOutcome::default();
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.config().path).await {
            let message = format!("Failed to create {}: {}", self.config().path.display(), e);
            log::error!("{}", message);
            return BatchOutcome {
                outcomes: requests
                    .iter()
                    .map(|request| ArtifactOutcome::Failed {
                        artifact_id: request.artifact_id.clone(),
                        version: request.version.clone(),
                        phase: Phase::Downloading,
                        message: message.clone(),
                    })
                    .collect(),
            };
        }

        let limit = self.config().max_concurrent.unwrap_or(requests.len()).max(1);
        log::debug!("Resolving {} artifacts ({} concurrent)", requests.len(), limit);

        let mut outcomes: Vec<(usize, ArtifactOutcome)> = stream::iter(requests.iter().enumerate())
            .map(|(index, request)| async move { (index, self.fetcher.run(request).await) })
            .buffer_unordered(limit)
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);

        BatchOutcome {
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        }
    }
}

//! Single-artifact pipeline.
//!
//! ```text
//! DirectDownload --ok--------> Unpack | Done
//! DirectDownload --404-------> MetadataFetch
//! DirectDownload --error-----> Failed
//! MetadataFetch  --ok--------> ResolvedDownload
//! ResolvedDownload --ok------> Cleanup --> Done
//! Unpack --ok----------------> Done
//! ```
//!
//! Every other failure moves to `Failed`. Each state runs at most once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempPath;

use crate::config::RepositoryConfig;
use crate::coordinate::ArtifactRequest;
use crate::downloader::{Extract, Fetch, FetchError};
use crate::error::{ArtifactError, Phase};
use crate::location::ResolvedLocation;
use crate::metadata::{MetadataResolver, ResolvedSnapshot};

/// Final record of one artifact pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    Installed {
        artifact_id: String,
        version: String,
        /// Unpack directory or downloaded file
        path: PathBuf,
    },
    Failed {
        artifact_id: String,
        version: String,
        phase: Phase,
        message: String,
    },
}

impl ArtifactOutcome {
    pub fn artifact_id(&self) -> &str {
        match self {
            ArtifactOutcome::Installed { artifact_id, .. } | ArtifactOutcome::Failed { artifact_id, .. } => {
                artifact_id
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ArtifactOutcome::Failed { .. })
    }
}

/// Where the direct download was written.
enum DirectTarget {
    Temp(TempPath),
    Final(PathBuf),
}

impl DirectTarget {
    fn path(&self) -> &Path {
        match self {
            DirectTarget::Temp(path) => path,
            DirectTarget::Final(path) => path,
        }
    }

    /// Best-effort removal; errors are ignored.
    fn discard(self) {
        match self {
            DirectTarget::Temp(path) => {
                let _ = path.close();
            }
            DirectTarget::Final(path) => {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

enum State {
    DirectDownload,
    Unpack(TempPath),
    MetadataFetch(DirectTarget),
    ResolvedDownload(DirectTarget, ResolvedSnapshot),
    Cleanup(DirectTarget, TempPath, PathBuf),
    Done(PathBuf),
    Failed(ArtifactError),
}

/// Decision taken once the direct download has finished.
#[derive(Debug, PartialEq, Eq)]
enum AfterDirect {
    Unpack,
    Done,
    MetadataFetch,
    Failed(ArtifactError),
}

fn after_direct_download(result: Result<(), FetchError>, unpack: bool) -> AfterDirect {
    match result {
        Ok(()) if unpack => AfterDirect::Unpack,
        Ok(()) => AfterDirect::Done,
        Err(e) if e.is_not_found() => AfterDirect::MetadataFetch,
        Err(e) => AfterDirect::Failed(ArtifactError::Transport {
            phase: Phase::Downloading,
            message: e.message,
        }),
    }
}

/// Resolves, downloads and optionally unpacks one artifact at a time.
pub struct ArtifactFetcher {
    config: Arc<RepositoryConfig>,
    fetcher: Arc<dyn Fetch>,
    extractor: Arc<dyn Extract>,
    resolver: MetadataResolver,
}

impl ArtifactFetcher {
    pub fn new(config: Arc<RepositoryConfig>, fetcher: Arc<dyn Fetch>, extractor: Arc<dyn Extract>) -> Self {
        Self {
            resolver: MetadataResolver::new(Arc::clone(&fetcher)),
            config,
            fetcher,
            extractor,
        }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Run the pipeline for `request` to completion. Never fails; errors end
    /// up in the returned outcome.
    pub async fn run(&self, request: &ArtifactRequest) -> ArtifactOutcome {
        let location = ResolvedLocation::new(&self.config, request);
        let mut state = State::DirectDownload;

        loop {
            state = match state {
                State::Done(path) => {
                    return ArtifactOutcome::Installed {
                        artifact_id: request.artifact_id.clone(),
                        version: request.version.clone(),
                        path,
                    };
                }
                State::Failed(error) => {
                    log::error!("Error when {} {}: {}", error.phase(), request, error);
                    return ArtifactOutcome::Failed {
                        artifact_id: request.artifact_id.clone(),
                        version: request.version.clone(),
                        phase: error.phase(),
                        message: error.to_string(),
                    };
                }
                state => self.step(state, request, &location).await,
            };
        }
    }

    async fn step(&self, state: State, request: &ArtifactRequest, location: &ResolvedLocation) -> State {
        match state {
            State::DirectDownload => {
                let target = match self.direct_target(location) {
                    Ok(target) => target,
                    Err(error) => return State::Failed(error),
                };

                log::info!("Downloading {}", location.url);
                let result = self
                    .fetcher
                    .fetch(&location.url, target.path(), self.config.strict_ssl)
                    .await;

                if let Err(e) = &result {
                    log::debug!("{} failed while {}: {}", location.url, e.when, e.message);
                }

                let unpack = matches!(target, DirectTarget::Temp(_));
                match (after_direct_download(result, unpack), target) {
                    (AfterDirect::Unpack, DirectTarget::Temp(archive)) => State::Unpack(archive),
                    (AfterDirect::MetadataFetch, target) => State::MetadataFetch(target),
                    (AfterDirect::Failed(error), _) => State::Failed(error),
                    (_, target) => {
                        log::info!("Successfully installed {}", request);
                        State::Done(target.path().to_path_buf())
                    }
                }
            }
            State::Unpack(archive) => {
                log::debug!("Unpacking {} into {}", archive.display(), location.unpack_dir.display());
                let result = self.extractor.extract(&archive, &location.unpack_dir).await;
                let archive_name = archive.display().to_string();
                let _ = archive.close();

                match result {
                    Ok(()) => {
                        log::info!("Successfully installed {}", request);
                        State::Done(location.unpack_dir.clone())
                    }
                    Err(e) => {
                        log::debug!("{} failed while {}: {}", archive_name, e.when, e.message);
                        State::Failed(ArtifactError::Unpack { message: e.message })
                    }
                }
            }
            State::MetadataFetch(direct) => {
                log::info!("Fetching maven metadata from {}", location.metadata_url);
                match self.resolver.resolve_snapshot(&self.config, request, location).await {
                    Ok(snapshot) => State::ResolvedDownload(direct, snapshot),
                    Err(error) => State::Failed(error),
                }
            }
            State::ResolvedDownload(direct, snapshot) => {
                let ResolvedSnapshot { location: resolved, descriptor } = snapshot;

                log::info!("Downloading {}", resolved.url);
                match self
                    .fetcher
                    .fetch(&resolved.url, &resolved.target, self.config.strict_ssl)
                    .await
                {
                    Ok(()) => State::Cleanup(direct, descriptor, resolved.target),
                    Err(e) => {
                        log::debug!("{} failed while {}: {}", resolved.url, e.when, e.message);
                        State::Failed(ArtifactError::Transport {
                            phase: Phase::Downloading,
                            message: e.message,
                        })
                    }
                }
            }
            State::Cleanup(direct, descriptor, installed) => {
                // The snapshot file may share the direct target's name when the
                // metadata points back at the requested version.
                if direct.path() != installed.as_path() {
                    direct.discard();
                }
                let _ = descriptor.close();
                log::info!("Successfully downloaded {}", installed.display());
                State::Done(installed)
            }
            other @ (State::Done(_) | State::Failed(_)) => other,
        }
    }

    fn direct_target(&self, location: &ResolvedLocation) -> Result<DirectTarget, ArtifactError> {
        if !self.config.unpack {
            return Ok(DirectTarget::Final(location.target.clone()));
        }

        tempfile::Builder::new()
            .prefix("nexus-")
            .suffix(&self.config.extension)
            .tempfile_in(&self.config.temp_dir)
            .map(|file| DirectTarget::Temp(file.into_temp_path()))
            .map_err(|e| ArtifactError::Transport {
                phase: Phase::Downloading,
                message: format!("Failed to create temporary file: {}", e),
            })
    }
}

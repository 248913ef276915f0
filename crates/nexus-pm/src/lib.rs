pub mod config;
pub mod coordinate;
pub mod downloader;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod location;
pub mod metadata;

pub use config::{RepositoryConfig, TargetConfig};
pub use coordinate::ArtifactRequest;
pub use downloader::{ArchiveExtractor, Extract, Fetch, FetchError, FileDownloader};
pub use error::{ArtifactError, NexusError, Phase, Result};
pub use fetcher::{ArtifactFetcher, ArtifactOutcome, BatchCoordinator, BatchOutcome};
pub use location::ResolvedLocation;
pub use metadata::{MetadataResolver, SnapshotMetadata};

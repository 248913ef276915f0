//! Artifact resolution pipeline and batch coordination.

mod artifact;
mod batch;

pub use artifact::{ArtifactFetcher, ArtifactOutcome};
pub use batch::{BatchCoordinator, BatchOutcome};

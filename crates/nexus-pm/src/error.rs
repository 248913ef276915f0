use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NexusError {
    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required option '{key}' for target '{target}'")]
    MissingOption { key: String, target: String },

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, NexusError>;

/// What an artifact pipeline was doing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Downloading,
    FetchingMetadata,
    ParsingMetadata,
    Unpacking,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Downloading => "downloading",
            Phase::FetchingMetadata => "fetching metadata",
            Phase::ParsingMetadata => "parsing metadata",
            Phase::Unpacking => "unpacking",
        };
        f.write_str(s)
    }
}

/// Errors raised while resolving a single artifact.
///
/// `NotFound` only ever comes out of the direct download and switches the
/// pipeline to the snapshot metadata fallback. Every other variant is terminal
/// for the artifact and ends up in its failure record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Transport { phase: Phase, message: String },

    #[error("{message}")]
    MetadataParse { message: String },

    #[error("{message}")]
    Unpack { message: String },
}

impl ArtifactError {
    pub fn phase(&self) -> Phase {
        match self {
            ArtifactError::NotFound { .. } => Phase::Downloading,
            ArtifactError::Transport { phase, .. } => *phase,
            ArtifactError::MetadataParse { .. } => Phase::ParsingMetadata,
            ArtifactError::Unpack { .. } => Phase::Unpacking,
        }
    }
}

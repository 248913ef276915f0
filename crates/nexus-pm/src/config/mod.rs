//! Configuration for artifact targets
//!
//! A target describes one repository location (base URL, repository name,
//! group id) together with the artifacts to fetch from it and where to put
//! them. Targets are read as raw [`TargetConfig`] values, merged over shared
//! defaults, and then normalized into an immutable [`RepositoryConfig`] that
//! every artifact pipeline of a batch shares.
//!
//! # Example
//!
//! ```rust
//! use nexus_pm::config::TargetConfig;
//!
//! let target: TargetConfig = TargetConfig {
//!     base_url: Some("https://nexus.example.com/".to_string()),
//!     repository: Some("releases".to_string()),
//!     group_id: Some("com.example.web".to_string()),
//!     path: Some("vendor".to_string()),
//!     ..TargetConfig::default()
//! };
//!
//! let config = target.into_repository_config("web").unwrap();
//! assert_eq!(config.base_url, "https://nexus.example.com");
//! assert_eq!(config.group_path, "com/example/web");
//! assert_eq!(config.extension, ".tar.gz");
//! ```

mod repository;
mod target;

pub use repository::RepositoryConfig;
pub use target::{TargetConfig, DEFAULT_EXTENSION};

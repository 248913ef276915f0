use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::repository::RepositoryConfig;
use crate::coordinate::{normalize_extension, normalize_group_id, strip_trailing_slash, ArtifactRequest};
use crate::error::{NexusError, Result};
use crate::http::HttpClientConfig;

pub const DEFAULT_EXTENSION: &str = ".tar.gz";

/// Raw target configuration as written by the user.
///
/// Every field is optional so a target can be layered over shared options with
/// [`TargetConfig::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TargetConfig {
    pub base_url: Option<String>,
    pub repository: Option<String>,
    pub group_id: Option<String>,
    pub path: Option<String>,
    pub extension: Option<String>,
    pub classifier: Option<String>,
    pub unpack: Option<bool>,
    pub strict_ssl: Option<bool>,
    pub strip_components: Option<usize>,
    pub max_concurrent: Option<usize>,
    pub temp_dir: Option<PathBuf>,

    // HTTP
    pub username: Option<String>,
    pub password: Option<String>,
    pub retries: Option<u32>,
    /// Request timeout in seconds
    pub timeout: Option<u64>,

    /// artifactId -> version, in declaration order
    pub dependencies: IndexMap<String, String>,
}

macro_rules! merge_fields {
    ($target:ident, $defaults:ident, $($field:ident),+) => {
        $( if $target.$field.is_none() { $target.$field = $defaults.$field.clone(); } )+
    };
}

impl TargetConfig {
    /// Layer this target over `defaults`. Values set on the target win.
    /// Dependencies from both are combined, target versions taking precedence.
    pub fn merge(mut self, defaults: &TargetConfig) -> Self {
        merge_fields!(
            self, defaults,
            base_url, repository, group_id, path, extension, classifier, unpack,
            strict_ssl, strip_components, max_concurrent, temp_dir,
            username, password, retries, timeout
        );

        let mut dependencies = defaults.dependencies.clone();
        for (artifact, version) in self.dependencies {
            dependencies.insert(artifact, version);
        }
        self.dependencies = dependencies;
        self
    }

    /// The requests for every dependency of this target, in declaration order.
    pub fn requests(&self) -> Vec<ArtifactRequest> {
        self.dependencies
            .iter()
            .map(|(artifact, version)| {
                ArtifactRequest::new(artifact.as_str(), version.as_str())
                    .with_classifier(self.classifier.clone())
            })
            .collect()
    }

    /// HTTP settings for the fetch primitive.
    pub fn http_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::new();
        if let Some(retries) = self.retries {
            config = config.with_max_retries(retries);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(Duration::from_secs(timeout));
        }
        if let Some(username) = &self.username {
            config = config.with_basic_auth(username.clone(), self.password.clone());
        }
        config
    }

    /// Normalize into the shared repository configuration.
    ///
    /// `name` only appears in error messages.
    pub fn into_repository_config(self, name: &str) -> Result<RepositoryConfig> {
        let base_url = require(self.base_url, "base-url", name)?;
        let repository = require(self.repository, "repository", name)?;
        let group_id = require(self.group_id, "group-id", name)?;
        let path = require(self.path, "path", name)?;

        if self.max_concurrent == Some(0) {
            return Err(NexusError::Config(format!(
                "max-concurrent must be at least 1 for target '{}'",
                name
            )));
        }

        Ok(RepositoryConfig {
            base_url: strip_trailing_slash(&base_url),
            repository,
            group_path: normalize_group_id(&group_id),
            extension: normalize_extension(self.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)),
            classifier: self.classifier,
            unpack: self.unpack.unwrap_or(true),
            strict_ssl: self.strict_ssl.unwrap_or(true),
            path: PathBuf::from(strip_trailing_slash(&path)),
            temp_dir: self.temp_dir.unwrap_or_else(std::env::temp_dir),
            strip_components: self.strip_components.unwrap_or(0),
            max_concurrent: self.max_concurrent,
        })
    }
}

fn require(value: Option<String>, key: &str, target: &str) -> Result<String> {
    value.ok_or_else(|| NexusError::MissingOption {
        key: key.to_string(),
        target: target.to_string(),
    })
}

//! Artifact coordinates and their normalization into repository path segments.

/// Convert a Maven group id into its repository path form (`com.acme` -> `com/acme`).
pub fn normalize_group_id(group_id: &str) -> String {
    group_id.replace('.', "/")
}

/// Strip exactly one trailing slash, if present.
pub fn strip_trailing_slash(value: &str) -> String {
    value.strip_suffix('/').unwrap_or(value).to_string()
}

/// Ensure the extension starts with a dot. An empty extension stays empty.
pub fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}

/// One requested dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRequest {
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
}

impl ArtifactRequest {
    pub fn new(artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Option<String>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Build a file name from this artifact's id, the given version and the classifier.
    pub(crate) fn file_name(&self, version: &str, extension: &str) -> String {
        let mut parts = vec![self.artifact_id.as_str(), version];
        if let Some(classifier) = &self.classifier {
            parts.push(classifier);
        }
        format!("{}{}", parts.join("-"), extension)
    }
}

impl std::fmt::Display for ArtifactRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.artifact_id, self.version)
    }
}

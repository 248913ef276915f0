use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use nexus_pm::TargetConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "nexus.toml";

/// The nexus-fetch configuration file structure (nexus.toml)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    /// Defaults shared by every target
    pub options: TargetConfig,

    /// Named targets, in file order
    pub targets: IndexMap<String, TargetConfig>,

    /// Directory the file was loaded from; relative paths resolve against it
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl NexusConfig {
    /// Load configuration from nexus.toml, searching upward from the given directory
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                return Self::load_file(&config_path).map(Some);
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Load configuration by searching upward from the current working directory
    pub fn load_from_cwd() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    /// Load a specific configuration file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: NexusConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// The named targets merged over `[options]`, or all of them when `names` is empty.
    pub fn select(&self, names: &[String]) -> Result<Vec<(String, TargetConfig)>> {
        let names: Vec<&String> = if names.is_empty() {
            self.targets.keys().collect()
        } else {
            names.iter().collect()
        };

        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let Some(target) = self.targets.get(name) else {
                bail!("Unknown target '{}'", name);
            };
            let merged = self.resolve_paths(target.clone().merge(&self.options));
            selected.push((name.clone(), merged));
        }
        Ok(selected)
    }

    fn resolve_paths(&self, mut target: TargetConfig) -> TargetConfig {
        if let Some(path) = &target.path {
            if Path::new(path).is_relative() {
                target.path = Some(self.base_dir.join(path).to_string_lossy().into_owned());
            }
        }
        if let Some(temp_dir) = &target.temp_dir {
            if temp_dir.is_relative() {
                target.temp_dir = Some(self.base_dir.join(temp_dir));
            }
        }
        target
    }
}

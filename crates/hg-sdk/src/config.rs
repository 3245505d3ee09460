//! `hgraph.toml` configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use hg_registry::MergePolicy;
use hg_types::Vocabulary;

use crate::error::{SdkError, SdkResult};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "hgraph.toml";

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HgConfig {
    pub generation: GenerationConfig,
    pub vocabulary: VocabularyConfig,
    pub store: StoreConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Size of the render worker pool.
    pub workers: usize,
    pub output_dir: PathBuf,
    pub merge_policy: MergePolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            output_dir: PathBuf::from("out"),
            merge_policy: MergePolicy::default(),
        }
    }
}

/// Extra predicate spellings, e.g. `"consists of" = "is composed of"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    pub aliases: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub log_path: PathBuf,
    /// fsync after every append instead of only flushing.
    pub sync_every_write: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("hgraph.log"),
            sync_every_write: false,
        }
    }
}

impl HgConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SdkError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> SdkResult<Self> {
        let config: HgConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else `hgraph.toml` when present, else defaults.
    pub fn load(path: Option<&Path>) -> SdkResult<Self> {
        if let Some(path) = path {
            info!(path = %path.display(), "loading config");
            return Self::from_file(path);
        }
        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.exists() {
            info!(path = %default.display(), "loading config");
            return Self::from_file(default);
        }
        info!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// The built-in vocabulary plus configured aliases.
    pub fn vocabulary(&self) -> SdkResult<Vocabulary> {
        let mut vocabulary = Vocabulary::builtin();
        for (alias, target) in &self.vocabulary.aliases {
            vocabulary = vocabulary.with_alias(alias, target)?;
        }
        Ok(vocabulary)
    }

    fn validate(&self) -> SdkResult<()> {
        if self.generation.workers == 0 {
            return Err(SdkError::Config("generation.workers must be at least 1".into()));
        }
        self.vocabulary()?;
        Ok(())
    }
}

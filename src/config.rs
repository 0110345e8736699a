use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::constants;

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub model_cache_dir: Option<PathBuf>,
    pub embedding: Option<EmbeddingConfig>,
    pub catalog: Option<CatalogConfig>,
    pub retrieval: Option<RetrievalConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX model through fastembed
    #[default]
    Fastembed,
    /// Deterministic feature hashing, no model download
    Hashing,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// fastembed model name, e.g. "all-mpnet-base-v2"
    pub model: String,
    /// Vector size for the hashing backend (fastembed models report their own)
    pub dimensions: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: constants::DEFAULT_MODEL.to_string(),
            dimensions: constants::DEFAULT_HASHING_DIMENSIONS,
            batch_size: constants::DEFAULT_EMBED_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog CSV, relative to the workspace unless absolute
    pub books_path: PathBuf,
    /// Tagged-description file, relative to the workspace unless absolute
    pub descriptions_path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            books_path: PathBuf::from(constants::DEFAULT_BOOKS_FILENAME),
            descriptions_path: PathBuf::from(constants::DEFAULT_DESCRIPTIONS_FILENAME),
        }
    }
}

/// How candidates are ordered before tone sorting.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CandidateOrder {
    /// Most similar first
    #[default]
    Similarity,
    /// Catalog file order; similarity rank is discarded
    Catalog,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub initial_top_k: usize,
    pub final_top_k: usize,
    pub order: CandidateOrder,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            initial_top_k: constants::DEFAULT_INITIAL_TOP_K,
            final_top_k: constants::DEFAULT_FINAL_TOP_K,
            order: CandidateOrder::default(),
        }
    }
}

pub struct ConfigManager {
    global_config: Config,
    local_config: Option<Config>,
    pub global_config_path: PathBuf,
    pub local_config_path: Option<PathBuf>,
}

pub const DEFAULT_CONFIG: &str = r#"# bookrec configuration file
# Relative paths are resolved against the workspace directory

# Optional: Override the default model cache directory
# model_cache_dir = "~/.cache/bookrec/models"

# Optional: Choose the embedding backend
# [embedding]
# backend = "fastembed"   # or "hashing" for an offline, model-free index
# model = "all-mpnet-base-v2"
# dimensions = 384        # hashing backend only
# batch_size = 64

# Optional: Catalog locations
# [catalog]
# books_path = "books_with_emotions.csv"
# descriptions_path = "tagged_description.txt"

# Optional: Retrieval tuning
# [retrieval]
# initial_top_k = 50
# final_top_k = 16
# order = "similarity"    # or "catalog" to keep catalog file order
"#;

impl ConfigManager {
    pub fn new(workspace_path: Option<&Path>) -> Result<Self> {
        let global_config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join(constants::GLOBAL_CONFIG_DIR_NAME);

        fs::create_dir_all(&global_config_dir)?;
        let global_config_path = global_config_dir.join(constants::CONFIG_FILENAME);

        let local_config_path = workspace_path.map(|workspace_path| {
            workspace_path
                .join(constants::BOOKREC_DIR_NAME)
                .join(constants::CONFIG_FILENAME)
        });

        Self::load(global_config_path, local_config_path)
    }

    /// Load from explicit paths. A missing global file is created with the
    /// commented defaults; a missing local file is skipped.
    pub fn load(global_config_path: PathBuf, local_config_path: Option<PathBuf>) -> Result<Self> {
        let global_config = if global_config_path.exists() {
            read_config(&global_config_path)?
        } else {
            fs::write(&global_config_path, DEFAULT_CONFIG).with_context(|| {
                format!(
                    "Failed to write default config to {}",
                    global_config_path.display()
                )
            })?;
            Config::default()
        };

        let local_config = match &local_config_path {
            Some(path) if path.exists() => Some(read_config(path)?),
            _ => None,
        };

        Ok(Self {
            global_config,
            local_config,
            global_config_path,
            local_config_path,
        })
    }

    /// Local section if set, else global section, else default.
    fn section<T: Clone + Default>(&self, get: impl Fn(&Config) -> Option<&T>) -> T {
        self.local_config
            .as_ref()
            .and_then(&get)
            .or_else(|| get(&self.global_config))
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_model_cache_dir(&self) -> Result<PathBuf> {
        // Local config overrides global config
        if let Some(local_config) = &self.local_config {
            if let Some(cache_dir) = &local_config.model_cache_dir {
                return Ok(cache_dir.clone());
            }
        }

        // Fall back to global config
        if let Some(cache_dir) = &self.global_config.model_cache_dir {
            return Ok(cache_dir.clone());
        }

        // Default to system data directory
        let data_dir = dirs::data_dir().context("Could not find data directory")?;
        Ok(data_dir
            .join(constants::GLOBAL_CONFIG_DIR_NAME)
            .join(constants::MODELS_DIR_NAME))
    }

    pub fn get_embedding_config(&self) -> EmbeddingConfig {
        self.section(|c| c.embedding.as_ref())
    }

    pub fn get_catalog_config(&self) -> CatalogConfig {
        self.section(|c| c.catalog.as_ref())
    }

    pub fn get_retrieval_config(&self) -> RetrievalConfig {
        self.section(|c| c.retrieval.as_ref())
    }

    /// Write the commented default config into the workspace, unless one
    /// already exists. Returns the path.
    pub fn init_local_config(&self) -> Result<PathBuf> {
        let path = self
            .local_config_path
            .clone()
            .context("No workspace directory to write a local config into")?;

        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, DEFAULT_CONFIG)?;
        }
        Ok(path)
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_global_config_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("config.toml");

        let manager = ConfigManager::load(global.clone(), None).unwrap();
        assert!(global.exists());
        assert_eq!(fs::read_to_string(&global).unwrap(), DEFAULT_CONFIG);
        assert_eq!(manager.get_retrieval_config(), RetrievalConfig::default());
        assert_eq!(manager.get_embedding_config().backend, EmbeddingBackend::Fastembed);
    }

    #[test]
    fn test_default_config_parses_to_defaults() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_local_section_overrides_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let local = dir.path().join("local.toml");
        fs::write(
            &global,
            "model_cache_dir = \"/global/models\"\n[retrieval]\nfinal_top_k = 8\n[embedding]\nbackend = \"hashing\"\n",
        )
        .unwrap();
        fs::write(&local, "[retrieval]\norder = \"catalog\"\n").unwrap();

        let manager = ConfigManager::load(global, Some(local)).unwrap();
        let retrieval = manager.get_retrieval_config();
        // Local section replaces the global one wholesale
        assert_eq!(retrieval.order, CandidateOrder::Catalog);
        assert_eq!(retrieval.final_top_k, constants::DEFAULT_FINAL_TOP_K);
        assert_eq!(manager.get_embedding_config().backend, EmbeddingBackend::Hashing);
        assert_eq!(
            manager.get_model_cache_dir().unwrap(),
            PathBuf::from("/global/models")
        );
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        fs::write(&global, "[retrieval]\norder = \"random\"\n").unwrap();
        assert!(ConfigManager::load(global, None).is_err());
    }

    #[test]
    fn test_init_local_config() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(".bookrec").join("config.toml");
        let manager =
            ConfigManager::load(dir.path().join("global.toml"), Some(local.clone())).unwrap();

        assert_eq!(manager.init_local_config().unwrap(), local);
        assert!(local.exists());
    }
}

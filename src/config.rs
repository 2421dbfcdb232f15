//! Configuration module for topic clustering and hybrid search.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.topica/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `TOPICA_` and use double
//! underscores to separate nested levels:
//! - `TOPICA_SEARCH__LIMIT=20` sets `search.limit`
//! - `TOPICA_CLUSTERING__SEED=42` sets `clustering.seed`
//! - `TOPICA_EMBEDDING__BATCH_DELAY_MS=0` sets `embedding.batch_delay_ms`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR_NAME: &str = ".topica";

const ENV_PREFIX: &str = "TOPICA_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the document store and the lexical index
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Workspace root directory (where .topica is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Clustering settings
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Hybrid search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Batch extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Number of documents sent to the provider per call
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    #[serde(default = "default_embedding_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Where model weights are cached (defaults to the user cache directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClusteringConfig {
    /// Fixed number of clusters; chosen with the elbow heuristic when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,

    /// Upper bound for the elbow search
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Iteration cap for the final clustering run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Seed for reproducible clustering runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Default number of results
    #[serde(default = "default_search_limit")]
    pub limit: usize,

    /// Multiplier for vector hits that the lexical index also found
    #[serde(default = "default_vector_boost")]
    pub vector_boost: f32,

    /// Multiplier for hits found only by the lexical index
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExtractionConfig {
    /// Number of documents per extraction request
    #[serde(default = "default_extraction_batch_size")]
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    #[serde(default = "default_extraction_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_data_path() -> PathBuf {
    PathBuf::from(".topica/data")
}
fn default_false() -> bool {
    false
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_embedding_batch_size() -> usize {
    32
}
fn default_embedding_batch_delay_ms() -> u64 {
    1000
}
fn default_max_k() -> usize {
    crate::vector::DEFAULT_MAX_K
}
fn default_max_iterations() -> usize {
    crate::vector::DEFAULT_MAX_ITERATIONS
}
fn default_search_limit() -> usize {
    10
}
fn default_vector_boost() -> f32 {
    1.2
}
fn default_lexical_weight() -> f32 {
    0.5
}
fn default_extraction_batch_size() -> usize {
    10
}
fn default_extraction_batch_delay_ms() -> u64 {
    1500
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_path: default_data_path(),
            workspace_root: None,
            debug: false,
            embedding: EmbeddingConfig::default(),
            clustering: ClusteringConfig::default(),
            search: SearchConfig::default(),
            extraction: ExtractionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            batch_size: default_embedding_batch_size(),
            batch_delay_ms: default_embedding_batch_delay_ms(),
            cache_dir: None,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: None,
            max_k: default_max_k(),
            max_iterations: default_max_iterations(),
            seed: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
            vector_boost: default_vector_boost(),
            lexical_weight: default_lexical_weight(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_extraction_batch_size(),
            batch_delay_ms: default_extraction_batch_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .topica directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore
            // stays part of the field name
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by looking for a .topica directory
    /// from the current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR_NAME).join("settings.toml"))
    }

    /// Get the workspace root directory (where .topica is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR_NAME);
            if config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Data directory resolved against the workspace root
    pub fn resolved_data_path(&self) -> PathBuf {
        match &self.workspace_root {
            Some(root) if self.data_path.is_relative() => root.join(&self.data_path),
            _ => self.data_path.clone(),
        }
    }

    /// Path of the JSON document store snapshot
    pub fn store_path(&self) -> PathBuf {
        self.resolved_data_path()
            .join(crate::storage::STORE_FILE_NAME)
    }

    /// Directory of the on-disk lexical index
    pub fn lexical_index_path(&self) -> PathBuf {
        self.resolved_data_path().join("lexical")
    }

    /// Directory where embedding model weights are cached
    pub fn models_dir(&self) -> PathBuf {
        self.embedding.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("topica")
                .join("models")
        })
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(
        root: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.as_ref().join(CONFIG_DIR_NAME).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# Topica Configuration File

# Version of the configuration schema
version = 1

# Directory for the document store and lexical index (relative to workspace root)
data_path = ".topica/data"

# Global debug mode
debug = false

[embedding]
# Model to use for embeddings
model = "AllMiniLML6V2"

# Documents per embedding call
batch_size = 32

# Pause between batches in milliseconds (rate limiting)
batch_delay_ms = 1000

[clustering]
# Fixed number of topics. Leave unset to pick k with the elbow heuristic.
# k = 8

# Upper bound for the elbow search
max_k = 10

# Iteration cap for k-means
max_iterations = 100

# Seed for reproducible clustering runs
# seed = 42

[search]
# Default number of results
limit = 10

# Multiplier for semantic hits confirmed by keyword search
vector_boost = 1.2

# Multiplier for keyword-only hits
lexical_weight = 0.5

[extraction]
# Documents per extraction request
batch_size = 10

# Pause between batches in milliseconds
batch_delay_ms = 1500

[logging]
# Log filter used when RUST_LOG is not set (error, warn, info, debug, trace)
level = "warn"
"#;

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}

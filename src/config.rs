use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub tabrag: TabragConfig,
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Tabrag-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TabragConfig {
    /// Directory holding ingestion progress snapshots.
    pub state_dir: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Embeddings configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: String,
    pub batch_size: usize,
    pub dimensions: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

/// Text-generation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_generation_api_key_env")]
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            api_key_env: default_generation_api_key_env(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_chunk_size() -> usize {
    crate::ingest::DEFAULT_CHUNK_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_generation_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_top_k() -> usize {
    3
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in TABRAG_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("TABRAG_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.tabrag.chunk_size == 0 {
            anyhow::bail!("tabrag.chunk_size must be greater than 0");
        }

        match self.embeddings.provider.as_str() {
            "openai" => {
                // Check both environment variable and .env file (dotenv already
                // loaded in Config::load)
                std::env::var(&self.embeddings.api_key_env).with_context(|| {
                    format!(
                        "Environment variable {} not set. Set it in your .env file or as an environment variable with your OpenAI API key.",
                        self.embeddings.api_key_env
                    )
                })?;
            }
            "local" => {
                if self.embeddings.dimensions == 0 {
                    anyhow::bail!("embeddings.dimensions must be greater than 0 for the local provider");
                }
            }
            other => {
                anyhow::bail!("embeddings.provider must be \"openai\" or \"local\", got \"{}\"", other);
            }
        }

        if self.embeddings.batch_size == 0 {
            anyhow::bail!("embeddings.batch_size must be greater than 0");
        }

        if self.retrieval.top_k == 0 {
            anyhow::bail!("retrieval.top_k must be greater than 0");
        }

        Ok(())
    }

    /// Get the progress-snapshot directory
    pub fn state_dir(&self) -> &Path {
        &self.tabrag.state_dir
    }
}

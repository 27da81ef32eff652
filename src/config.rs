use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub hydration: HydrationConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl AppConfig {
    /// Load config.toml if it exists, otherwise start from defaults.
    /// Empty API keys are filled from the environment (`LLM_API_KEY`,
    /// `EMBEDDING_API_KEY`) so secrets can stay out of the file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config: AppConfig = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?
        } else {
            AppConfig::default()
        };

        if config.llm.api_key.is_empty() {
            if let Ok(key) = std::env::var("LLM_API_KEY") {
                config.llm.api_key = key;
            }
        }
        if config.embedding.api_key.is_empty() {
            if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
                config.embedding.api_key = key;
            }
        }

        Ok(config)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "hearthd.db".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            temperature: default_llm_temperature(),
            max_tokens: default_llm_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_temperature() -> f32 {
    0.7
}

fn default_llm_max_tokens() -> u32 {
    512
}

fn default_llm_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Fixed embedding dimension; vector records are validated against it.
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            api_key: String::new(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_base_url() -> String {
    "https://open.bigmodel.cn/api/paas/v4".to_string()
}

fn default_embedding_model() -> String {
    "embedding-3".to_string()
}

fn default_embedding_dimensions() -> usize {
    1024
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct HydrationConfig {
    /// Scheduler tick period. A deployment knob: must stay well below the
    /// 600-minute due window for reminders to land near the 10-hour mark.
    #[serde(default = "default_hydration_tick_secs")]
    pub tick_secs: u64,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_hydration_tick_secs(),
        }
    }
}

fn default_hydration_tick_secs() -> u64 {
    600
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

fn default_api_port() -> u16 {
    8002
}

//! # Configuration
//! Environment-provided: model identifiers, API credentials, DB URL, and
//! optional threshold/weight overrides (spec §6). No CLI surface.

use std::env;

use crate::validator::Thresholds;

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub chat_model: String,
    pub embedding_model: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub database_url: String,
    pub thresholds: Thresholds,
    pub bind_addr: String,
}

impl Config {
    /// Loads from the process environment, falling back to a `.env` file
    /// if present (best-effort `dotenvy::dotenv()` load).
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let llm_api_key = env::var("LLM_API_KEY")
            .map_err(|_| anyhow::anyhow!("missing LLM_API_KEY environment variable"))?;
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("missing DATABASE_URL environment variable"))?;

        let chat_model = env::var("CHAT_MODEL").unwrap_or_else(|_| default_chat_model());
        let embedding_model = env::var("EMBEDDING_MODEL").unwrap_or_else(|_| default_embedding_model());
        let llm_base_url = env::var("LLM_BASE_URL").unwrap_or_else(|_| default_llm_base_url());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let mut thresholds = Thresholds::default();
        if let Ok(v) = env::var("THRESHOLD_LABELS") {
            thresholds.min_labels_required = v.parse().unwrap_or(thresholds.min_labels_required);
        }
        if let Ok(v) = env::var("THRESHOLD_TAGS") {
            thresholds.min_tags_required = v.parse().unwrap_or(thresholds.min_tags_required);
        }
        if let Ok(v) = env::var("THRESHOLD_INTEGRATIONS") {
            thresholds.min_integrations_required = v.parse().unwrap_or(thresholds.min_integrations_required);
        }

        Ok(Self {
            chat_model,
            embedding_model,
            llm_api_key,
            llm_base_url,
            database_url,
            thresholds,
            bind_addr,
        })
    }
}

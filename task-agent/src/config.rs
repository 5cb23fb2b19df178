//! Environment-driven configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::agent::retry::RetryCounter;
use crate::reasoning::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Runtime configuration, sourced from the environment (with `.env` support).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub retry_limit: u32,
    pub database_path: PathBuf,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary lookup. Seam for tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("OPENAI_API_KEY")
            .context("OPENAI_API_KEY is not set (add it to the environment or a .env file)")?;

        let retry_limit = match lookup("TASK_AGENT_RETRY_LIMIT") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("TASK_AGENT_RETRY_LIMIT is not a number: {:?}", raw))?,
            None => RetryCounter::DEFAULT_LIMIT,
        };

        Ok(Self {
            api_key,
            base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup("TASK_AGENT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            retry_limit,
            database_path: lookup("TASK_AGENT_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("tasks.db")),
        })
    }
}

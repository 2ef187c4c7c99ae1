use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Runtime configuration for the bot.
///
/// Every field has a default, so an empty TOML file (or none at all)
/// yields a working configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Hashtag under which programs are scraped and shared.
    #[serde(default = "default_mycelial_tag")]
    pub mycelial_tag: String,
    /// Maximum candidate messages fetched per scrape.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    /// Minutes between lifecycle cycles.
    #[serde(default = "default_cycle_minutes")]
    pub cycle_minutes: u64,
    /// Minutes between mention-answering sweeps.
    #[serde(default = "default_answer_minutes")]
    pub answer_minutes: u64,
    /// Fixed seed for the evolutionary operators; entropy when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_mycelial_tag() -> String {
    "fungi".to_string()
}

const fn default_fetch_limit() -> usize {
    30
}

const fn default_cycle_minutes() -> u64 {
    60
}

const fn default_answer_minutes() -> u64 {
    3
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            mycelial_tag: default_mycelial_tag(),
            fetch_limit: default_fetch_limit(),
            cycle_minutes: default_cycle_minutes(),
            answer_minutes: default_answer_minutes(),
            rng_seed: None,
        }
    }
}

impl BotConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading bot config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}

use std::sync::Arc;

use fungi_rules::RuleSystem;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Phases of the bot's lifecycle.
///
/// `Searching` is entered once at process start; afterwards the loop
/// runs `Active → Scoring → Publishing → Evolving → Active → …`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LifecyclePhase {
    /// Scanning the channel for seed code.
    Searching,
    /// Answering mentions with the current rule system.
    Active,
    /// Computing the fitness of the current rule system.
    Scoring,
    /// Sharing the scored system and scraping peers.
    Publishing,
    /// Breeding the next generation.
    Evolving,
}

impl LifecyclePhase {
    /// Lowercase label used in logs and events.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Searching => "searching",
            Self::Active => "active",
            Self::Scoring => "scoring",
            Self::Publishing => "publishing",
            Self::Evolving => "evolving",
        }
    }
}

/// The single piece of mutable process state: the active rule system
/// and its current fitness.
#[derive(Debug, Clone, Default)]
pub struct BotState {
    /// Rule system answering mentions right now.
    pub current: RuleSystem,
    /// Fitness attributed to `current` in the last scoring phase.
    pub fitness: f64,
}

impl BotState {
    /// Creates state around a rule system with zero fitness.
    #[must_use]
    pub const fn new(current: RuleSystem) -> Self {
        Self {
            current,
            fitness: 0.0,
        }
    }
}

/// Shared handle to [`BotState`].
///
/// Mention answering takes read snapshots; only the lifecycle cycle
/// writes, so answers always see a consistent system.
pub type SharedBotState = Arc<RwLock<BotState>>;

/// Creates a fresh shared state handle.
#[must_use]
pub fn shared(state: BotState) -> SharedBotState {
    Arc::new(RwLock::new(state))
}

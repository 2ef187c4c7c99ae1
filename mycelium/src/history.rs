use fungi_rules::RuleSystem;
use serde::{Deserialize, Serialize};

/// One completed cycle: the rule system that was active and the
/// fitness it achieved. Immutable once created; the system is owned
/// exclusively and cloned when reused elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FungiState {
    system: RuleSystem,
    fitness: f64,
}

impl FungiState {
    /// Pairs a rule system with its fitness score.
    #[must_use]
    pub const fn new(system: RuleSystem, fitness: f64) -> Self {
        Self { system, fitness }
    }

    /// The recorded rule system.
    #[must_use]
    pub const fn system(&self) -> &RuleSystem {
        &self.system
    }

    /// Unitless score, higher is better.
    #[must_use]
    pub const fn fitness(&self) -> f64 {
        self.fitness
    }
}

/// This bot's own lineage: one state per completed cycle, append-only.
///
/// Retention is a caller concern; the core never prunes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FungiHistory {
    states: Vec<FungiState>,
}

impl FungiHistory {
    /// Creates an empty lineage.
    #[must_use]
    pub const fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Appends the state of a completed cycle.
    pub fn push(&mut self, state: FungiState) {
        self.states.push(state);
    }

    /// Recorded states, oldest first.
    #[must_use]
    pub fn states(&self) -> &[FungiState] {
        &self.states
    }

    /// Number of recorded cycles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no cycle has completed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Rule systems observed from other bots on the shared channel during
/// the current cycle. Rebuilt fresh each cycle, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MycelialHistory {
    states: Vec<FungiState>,
}

impl MycelialHistory {
    /// Wraps the observations scraped this cycle.
    #[must_use]
    pub const fn new(states: Vec<FungiState>) -> Self {
        Self { states }
    }

    /// Scraped observations in fetch order.
    #[must_use]
    pub fn states(&self) -> &[FungiState] {
        &self.states
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the scrape found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fungi_rules::Rule;

    #[test]
    fn history_appends_in_order() {
        let mut history = FungiHistory::new();
        history.push(FungiState::new(
            RuleSystem::new(vec![Rule::new("hello", "Hi there!")]),
            0.9,
        ));
        history.push(FungiState::new(RuleSystem::empty(), 0.2));
        assert_eq!(history.len(), 2);
        assert!((history.states()[0].fitness() - 0.9).abs() < f64::EPSILON);
        assert!(history.states()[1].system().is_empty());
    }
}

use fungi_rules::RuleSystem;
use rand::{rngs::SmallRng, Rng};

use crate::history::{FungiHistory, MycelialHistory};

/// Baseline weight keeping zero- and negative-fitness candidates selectable.
const BASE_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone)]
struct PoolEntry {
    system: RuleSystem,
    weight: f64,
}

/// Cycle-scoped set of candidate parent systems, weighted by fitness.
///
/// The pool always holds the current system alongside every system
/// from the local and mycelial histories, so its size strictly exceeds
/// the local history's length and the current candidate is never
/// collapsed into the historical set.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    entries: Vec<PoolEntry>,
}

impl CandidatePool {
    /// Assembles the pool for one evolution step.
    #[must_use]
    pub fn create(
        local: &FungiHistory,
        mycelial: &MycelialHistory,
        current: &RuleSystem,
    ) -> Self {
        let mut entries = Vec::with_capacity(local.len() + mycelial.len() + 1);
        entries.push(PoolEntry {
            system: current.clone(),
            weight: BASE_WEIGHT,
        });
        for state in local.states().iter().chain(mycelial.states()) {
            entries.push(PoolEntry {
                system: state.system().clone(),
                weight: BASE_WEIGHT + state.fitness().max(0.0),
            });
        }
        Self { entries }
    }

    /// Number of member systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The pool is never empty; it always carries the current system.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Member systems in insertion order, current first.
    #[must_use]
    pub fn systems(&self) -> Vec<&RuleSystem> {
        self.entries.iter().map(|entry| &entry.system).collect()
    }

    /// Fitness-weighted roulette selection of one parent.
    #[must_use]
    pub fn select(&self, rng: &mut SmallRng) -> &RuleSystem {
        let total: f64 = self.entries.iter().map(|entry| entry.weight).sum();
        let mut ticket = rng.gen_range(0.0..total);
        for entry in &self.entries {
            if ticket < entry.weight {
                return &entry.system;
            }
            ticket -= entry.weight;
        }
        // Rounding can exhaust the ticket before the last entry.
        &self.entries[self.entries.len() - 1].system
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::FungiState;
    use fungi_rules::Rule;
    use rand::SeedableRng;

    fn history() -> FungiHistory {
        let mut history = FungiHistory::new();
        history.push(FungiState::new(
            RuleSystem::new(vec![Rule::new("hello", "Hi there!")]),
            0.9,
        ));
        history.push(FungiState::new(
            RuleSystem::new(vec![Rule::new("pricing", "Check our pricing.")]),
            0.8,
        ));
        history
    }

    #[test]
    fn pool_exceeds_local_history_and_contains_current() {
        let current = RuleSystem::new(vec![Rule::new("support", "Support is available.")]);
        let pool = CandidatePool::create(&history(), &MycelialHistory::default(), &current);
        assert!(pool.len() > history().len());
        assert!(pool.systems().contains(&&current));
    }

    #[test]
    fn pool_includes_mycelial_observations() {
        let scraped = MycelialHistory::new(vec![FungiState::new(
            RuleSystem::new(vec![Rule::new("news", "Latest spores!")]),
            1.5,
        )]);
        let pool = CandidatePool::create(&history(), &scraped, &RuleSystem::empty());
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn selection_prefers_heavier_entries() {
        let mut heavy_history = FungiHistory::new();
        heavy_history.push(FungiState::new(
            RuleSystem::new(vec![Rule::new("hello", "Hi there!")]),
            50.0,
        ));
        let current = RuleSystem::new(vec![Rule::new("support", "Support is available.")]);
        let pool = CandidatePool::create(&heavy_history, &MycelialHistory::default(), &current);
        let mut rng = SmallRng::seed_from_u64(7);
        let picks = (0..200)
            .filter(|_| pool.select(&mut rng).rules()[0].trigger == "hello")
            .count();
        assert!(picks > 150);
    }
}

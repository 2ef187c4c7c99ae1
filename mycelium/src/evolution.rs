use fungi_rules::{Rule, RuleSystem};
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::history::{FungiHistory, MycelialHistory};
use crate::pool::CandidatePool;

/// Probability that an individual rule is rewritten during mutation.
const RULE_MUTATION_RATE: f64 = 0.4;

/// Probability that a brand-new random rule is appended during mutation.
const RULE_INJECTION_RATE: f64 = 0.2;

/// Trigger vocabulary for novelty injection.
const TRIGGER_VOCAB: &[&str] = &[
    "hello", "help", "pricing", "weather", "support", "thanks", "news", "fungi", "spore",
    "mycelium",
];

/// Response vocabulary paired with [`TRIGGER_VOCAB`] draws.
const RESPONSE_VOCAB: &[&str] = &[
    "Hi there! How can I assist you today?",
    "Happy to help!",
    "Our pricing plans are available on request.",
    "Today looks bright.",
    "Support is available.",
    "You're welcome!",
    "Fresh from the mycelial network.",
    "The colony is growing.",
    "Spreading spores across the Fediverse.",
    "Rooted and listening.",
];

/// Evolutionary operators breeding the next cycle's rule system.
///
/// All randomness flows through one injected [`SmallRng`], so a fixed
/// seed makes every operator deterministic for tests. Every operator
/// returns a non-empty system whose rules all carry non-empty
/// triggers; callers rely on this to avoid the degenerate
/// always-no-match state.
#[derive(Debug)]
pub struct EvolutionaryAlgorithm {
    rng: SmallRng,
}

impl EvolutionaryAlgorithm {
    /// Creates an algorithm with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Creates an algorithm seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Builds the weighted parent pool for one evolution step.
    #[must_use]
    pub fn create_pool(
        local: &FungiHistory,
        mycelial: &MycelialHistory,
        current: &RuleSystem,
    ) -> CandidatePool {
        CandidatePool::create(local, mycelial, current)
    }

    /// Returns a copy of the rule with a perturbed, non-empty trigger.
    ///
    /// The trigger always differs from the input's; response,
    /// condition, and template are preserved.
    pub fn mutate_rule(&mut self, rule: &Rule) -> Rule {
        let original = &rule.trigger;
        let mut trigger = match self.rng.gen_range(0..3u8) {
            0 => {
                let mut grown = original.clone();
                grown.push(self.random_letter());
                grown
            }
            1 if original.chars().count() > 1 => {
                let mut shrunk = original.clone();
                shrunk.pop();
                shrunk
            }
            _ => Self::flip_case(original, self.rng.gen_range(0..original.chars().count().max(1))),
        };
        if trigger.is_empty() || trigger == *original {
            trigger.push(self.random_letter());
        }
        let mut mutated = rule.clone();
        mutated.trigger = trigger;
        mutated
    }

    /// Produces a syntactically valid rule from the built-in vocabulary.
    pub fn generate_random_rule(&mut self) -> Rule {
        let trigger = TRIGGER_VOCAB[self.rng.gen_range(0..TRIGGER_VOCAB.len())];
        let response = RESPONSE_VOCAB[self.rng.gen_range(0..RESPONSE_VOCAB.len())];
        Rule::new(trigger, response)
    }

    /// Derives a non-empty variant of the system.
    ///
    /// A subset of rules is rewritten via [`Self::mutate_rule`]; with
    /// some probability a random rule is injected. An empty input
    /// always yields a single random rule.
    pub fn mutate(&mut self, system: &RuleSystem) -> RuleSystem {
        let mut rules: Vec<Rule> = system
            .rules()
            .iter()
            .map(|rule| {
                if self.rng.gen_bool(RULE_MUTATION_RATE) {
                    self.mutate_rule(rule)
                } else {
                    rule.clone()
                }
            })
            .collect();
        if rules.is_empty() || self.rng.gen_bool(RULE_INJECTION_RATE) {
            let injected = self.generate_random_rule();
            rules.push(injected);
        }
        RuleSystem::new(rules)
    }

    /// Combines rules from both parents into a non-empty offspring.
    ///
    /// For each position up to the longer parent's length, one
    /// parent's rule at that position is chosen at random, falling
    /// back to the other parent where only one reaches that far. Two
    /// empty parents yield a single random rule.
    pub fn crossover(&mut self, left: &RuleSystem, right: &RuleSystem) -> RuleSystem {
        let mut rules = Vec::with_capacity(left.len().max(right.len()));
        for index in 0..left.len().max(right.len()) {
            let (first, second) = if self.rng.gen_bool(0.5) {
                (left, right)
            } else {
                (right, left)
            };
            if let Some(rule) = first.get(index).or_else(|| second.get(index)) {
                rules.push(rule.clone());
            }
        }
        if rules.is_empty() {
            rules.push(self.generate_random_rule());
        }
        RuleSystem::new(rules)
    }

    /// Full evolution step: pool, weighted parent selection,
    /// crossover, then mutation. Sole entry point used by the
    /// lifecycle's evolving phase.
    pub fn evolve(
        &mut self,
        local: &FungiHistory,
        mycelial: &MycelialHistory,
        current: &RuleSystem,
    ) -> RuleSystem {
        let pool = Self::create_pool(local, mycelial, current);
        let left = pool.select(&mut self.rng).clone();
        let right = pool.select(&mut self.rng).clone();
        let offspring = self.crossover(&left, &right);
        self.mutate(&offspring)
    }

    fn random_letter(&mut self) -> char {
        char::from(b'a' + self.rng.gen_range(0..26u8))
    }

    fn flip_case(text: &str, position: usize) -> String {
        text.chars()
            .enumerate()
            .map(|(index, c)| {
                if index == position {
                    if c.is_lowercase() {
                        c.to_ascii_uppercase()
                    } else {
                        c.to_ascii_lowercase()
                    }
                } else {
                    c
                }
            })
            .collect()
    }
}

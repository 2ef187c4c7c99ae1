use fungi_rules::RuleSystem;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One answered mention, recorded for the next scoring phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Decoded mention text.
    pub prompt: String,
    /// Response the engine produced.
    pub answer: String,
    /// Whether any rule matched (the answer was not the sentinel).
    pub matched: bool,
}

/// Append-only log of the interactions seen during the current cycle.
/// Drained by the scoring phase.
#[derive(Debug, Default)]
pub struct InteractionLog {
    records: Mutex<Vec<InteractionRecord>>,
}

impl InteractionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one interaction.
    pub fn record(&self, record: InteractionRecord) {
        self.records.lock().push(record);
    }

    /// Takes all records accumulated since the last drain.
    #[must_use]
    pub fn drain(&self) -> Vec<InteractionRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether no interaction has been recorded this cycle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

/// Pluggable fitness scoring invoked by the scoring phase.
///
/// The upstream scoring function was never implemented, so the
/// lifecycle only requires this hook; [`ConstantScorer`] reproduces
/// the historical no-op behavior.
pub trait FitnessScorer: Send + Sync {
    /// Scores the system given the cycle's interactions. Higher is better.
    fn compute_fitness(&self, system: &RuleSystem, interactions: &[InteractionRecord]) -> f64;
}

/// Scorer returning a fixed value regardless of input.
#[derive(Debug, Clone, Copy)]
pub struct ConstantScorer(pub f64);

impl FitnessScorer for ConstantScorer {
    fn compute_fitness(&self, _system: &RuleSystem, _interactions: &[InteractionRecord]) -> f64 {
        self.0
    }
}

/// Scores by the share of interactions where a rule matched.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchRatioScorer;

impl FitnessScorer for MatchRatioScorer {
    #[allow(clippy::cast_precision_loss)]
    fn compute_fitness(&self, _system: &RuleSystem, interactions: &[InteractionRecord]) -> f64 {
        if interactions.is_empty() {
            return 0.0;
        }
        let matched = interactions.iter().filter(|record| record.matched).count();
        matched as f64 / interactions.len() as f64
    }
}

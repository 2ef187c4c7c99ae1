use std::sync::Arc;
use std::time::Duration;

use fungi_channel::{decode_markup, ChannelClient};
use fungi_mycelium::{EvolutionaryAlgorithm, FungiHistory, FungiState, MycelialHistory};
use fungi_rules::{respond, Rule, RuleParser, RuleSystem, NO_MATCH_RESPONSE};
use serde_json::json;
use shared_logging::LogLevel;
use tokio::sync::Mutex;
use tokio::time::interval;

use crate::config::BotConfig;
use crate::scoring::{FitnessScorer, InteractionLog, InteractionRecord};
use crate::state::{shared, BotState, LifecyclePhase, SharedBotState};
use crate::telemetry::LifecycleTelemetry;

/// Seed program used when the initial search finds nothing valid on
/// the channel.
pub const FALLBACK_PROGRAM: &str =
    "FUNGISTART RULE:hello|RESPONSE:Hello, Fediverse user! FUNGIEND";

/// State owned exclusively by the cycle task. The surrounding mutex
/// serializes lifecycle runs: a trigger firing while a cycle is still
/// in flight skips instead of interleaving.
struct CycleState {
    algorithm: EvolutionaryAlgorithm,
    history: FungiHistory,
    phase: LifecyclePhase,
    number: u64,
}

/// Drives the bot through its five phases against a channel client.
///
/// Holds the single shared [`BotState`]; mention answering reads
/// snapshots of it while the serialized cycle task is the only writer.
pub struct LifecycleController<C> {
    channel: Arc<C>,
    parser: RuleParser,
    config: BotConfig,
    state: SharedBotState,
    interactions: InteractionLog,
    scorer: Box<dyn FitnessScorer>,
    telemetry: Option<LifecycleTelemetry>,
    cycle: Mutex<CycleState>,
}

impl<C: ChannelClient + 'static> LifecycleController<C> {
    /// Wires a controller around a channel client.
    #[must_use]
    pub fn new(
        channel: Arc<C>,
        config: BotConfig,
        scorer: Box<dyn FitnessScorer>,
        telemetry: Option<LifecycleTelemetry>,
    ) -> Self {
        let algorithm = config
            .rng_seed
            .map_or_else(EvolutionaryAlgorithm::from_entropy, EvolutionaryAlgorithm::new);
        Self {
            channel,
            parser: RuleParser::new(),
            config,
            state: shared(BotState::default()),
            interactions: InteractionLog::new(),
            scorer,
            telemetry,
            cycle: Mutex::new(CycleState {
                algorithm,
                history: FungiHistory::new(),
                phase: LifecyclePhase::Searching,
                number: 0,
            }),
        }
    }

    /// Shared handle to the active rule system and its fitness.
    #[must_use]
    pub fn state(&self) -> SharedBotState {
        Arc::clone(&self.state)
    }

    /// Phase the lifecycle is currently in.
    pub async fn current_phase(&self) -> LifecyclePhase {
        self.cycle.lock().await.phase
    }

    /// Snapshot of the local lineage.
    pub async fn history(&self) -> FungiHistory {
        self.cycle.lock().await.history.clone()
    }

    /// Interactions recorded since the last scoring phase.
    #[must_use]
    pub const fn interactions(&self) -> &InteractionLog {
        &self.interactions
    }

    /// Initial search: the first candidate message carrying a valid
    /// program becomes the seed system; without one the fixed fallback
    /// program is used. This phase never fails outright.
    pub async fn run_initial_search(&self) {
        self.emit_phase(LifecyclePhase::Searching).await;
        let seed = match self.find_program_on_channel().await {
            Some(system) => system,
            None => {
                self.log(
                    LogLevel::Info,
                    "no valid program on channel, seeding from fallback",
                    None,
                    json!({}),
                );
                self.parser
                    .parse(FALLBACK_PROGRAM)
                    .unwrap_or_else(|_| RuleSystem::new(vec![Rule::new("hello", "Hello, Fediverse user!")]))
            }
        };
        self.log(
            LogLevel::Info,
            "seed rule system selected",
            None,
            json!({ "rules": seed.len() }),
        );
        {
            let mut state = self.state.write().await;
            state.current = seed;
            state.fitness = 0.0;
        }
        self.cycle.lock().await.phase = LifecyclePhase::Active;
        self.emit_phase(LifecyclePhase::Active).await;
    }

    /// Answers every pending mention with the current rule system.
    ///
    /// Each mention is independent: a failed reply is logged and the
    /// batch continues. Answers read a consistent snapshot of the
    /// current system for their whole duration.
    pub async fn answer_mentions(&self) {
        let mentions = match self.channel.fetch_mentions().await {
            Ok(mentions) => mentions,
            Err(err) => {
                self.log(
                    LogLevel::Warn,
                    "fetching mentions failed, deferring to next trigger",
                    None,
                    json!({ "error": err.to_string() }),
                );
                return;
            }
        };
        for mention in mentions {
            let prompt = decode_markup(&mention.status.content);
            let snapshot = self.state.read().await.current.clone();
            let answer = respond(&snapshot, &prompt);
            let matched = answer != NO_MATCH_RESPONSE;
            if let Err(err) = self.channel.reply(&answer, &mention.status).await {
                self.log(
                    LogLevel::Warn,
                    "reply failed, continuing with next mention",
                    None,
                    json!({ "error": err.to_string() }),
                );
            }
            self.interactions.record(InteractionRecord {
                prompt,
                answer,
                matched,
            });
        }
    }

    /// One full cycle: score, publish and scrape, evolve, back to active.
    ///
    /// Serialized by the cycle mutex; overlapping triggers skip.
    /// Channel failures defer the remainder of the cycle to the next
    /// trigger instead of crashing the process.
    pub async fn run_cycle(&self) {
        let Ok(mut cycle) = self.cycle.try_lock() else {
            self.log(
                LogLevel::Warn,
                "cycle still in flight, skipping trigger",
                None,
                json!({}),
            );
            return;
        };
        cycle.number += 1;
        let number = cycle.number;

        cycle.phase = LifecyclePhase::Scoring;
        self.emit_phase(LifecyclePhase::Scoring).await;
        let interactions = self.interactions.drain();
        let current = self.state.read().await.current.clone();
        let fitness = self.scorer.compute_fitness(&current, &interactions);
        self.state.write().await.fitness = fitness;
        self.log(
            LogLevel::Info,
            "fitness computed",
            Some(number),
            json!({ "fitness": fitness, "interactions": interactions.len() }),
        );

        cycle.phase = LifecyclePhase::Publishing;
        self.emit_phase(LifecyclePhase::Publishing).await;
        let message = format!(
            "{} Fitness: {} #{}",
            current.to_program(),
            fitness,
            self.config.mycelial_tag
        );
        if let Err(err) = self.channel.publish(&message).await {
            self.log(
                LogLevel::Error,
                "publish failed, deferring cycle",
                Some(number),
                json!({ "error": err.to_string() }),
            );
            cycle.phase = LifecyclePhase::Active;
            return;
        }
        self.emit("channel.published", json!({ "cycle": number })).await;
        let mycelial = self.scrape_mycelial(number).await;

        cycle.phase = LifecyclePhase::Evolving;
        self.emit_phase(LifecyclePhase::Evolving).await;
        // The scored system enters the pool once, as the current
        // candidate; it joins the lineage only after breeding.
        let next = {
            let CycleState {
                algorithm, history, ..
            } = &mut *cycle;
            algorithm.evolve(history, &mycelial, &current)
        };
        cycle.history.push(FungiState::new(current, fitness));
        self.log(
            LogLevel::Info,
            "evolved next rule system",
            Some(number),
            json!({ "rules": next.len(), "pool_peers": mycelial.len() }),
        );
        self.state.write().await.current = next;

        cycle.phase = LifecyclePhase::Active;
        self.emit_phase(LifecyclePhase::Active).await;
    }

    /// Runs the initial search, then the two periodic loops forever.
    pub async fn run(self: Arc<Self>) {
        self.run_initial_search().await;
        let lifecycle = Arc::clone(&self);
        let cycle_task = tokio::spawn(async move {
            let mut ticker =
                interval(Duration::from_secs((lifecycle.config.cycle_minutes * 60).max(1)));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                lifecycle.run_cycle().await;
            }
        });
        let answering = Arc::clone(&self);
        let answer_task = tokio::spawn(async move {
            let mut ticker =
                interval(Duration::from_secs((answering.config.answer_minutes * 60).max(1)));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                answering.answer_mentions().await;
            }
        });
        let _ = tokio::join!(cycle_task, answer_task);
    }

    async fn find_program_on_channel(&self) -> Option<RuleSystem> {
        let statuses = match self
            .channel
            .fetch_candidate_messages(&self.config.mycelial_tag, self.config.fetch_limit)
            .await
        {
            Ok(statuses) => statuses,
            Err(err) => {
                self.log(
                    LogLevel::Warn,
                    "candidate scrape failed during search",
                    None,
                    json!({ "error": err.to_string() }),
                );
                return None;
            }
        };
        for status in statuses {
            let decoded = decode_markup(&status.content);
            if !self.parser.contains_valid_program(&decoded) {
                continue;
            }
            if let Ok(system) = self.parser.parse(&decoded) {
                return Some(system);
            }
        }
        None
    }

    async fn scrape_mycelial(&self, number: u64) -> MycelialHistory {
        let statuses = match self
            .channel
            .fetch_candidate_messages(&self.config.mycelial_tag, self.config.fetch_limit)
            .await
        {
            Ok(statuses) => statuses,
            Err(err) => {
                self.log(
                    LogLevel::Warn,
                    "mycelial scrape failed, evolving from local history only",
                    Some(number),
                    json!({ "error": err.to_string() }),
                );
                return MycelialHistory::default();
            }
        };
        let mut states = Vec::new();
        for status in statuses {
            let decoded = decode_markup(&status.content);
            if !self.parser.contains_valid_program(&decoded) {
                continue;
            }
            if let Ok(system) = self.parser.parse(&decoded) {
                states.push(FungiState::new(system, extract_fitness(&decoded)));
            }
        }
        self.log(
            LogLevel::Info,
            "mycelial observations scraped",
            Some(number),
            json!({ "observations": states.len() }),
        );
        MycelialHistory::new(states)
    }

    fn log(&self, level: LogLevel, message: &str, cycle: Option<u64>, fields: serde_json::Value) {
        if let Some(telemetry) = &self.telemetry {
            if let Err(err) = telemetry.log(level, message, cycle, fields) {
                eprintln!("lifecycle telemetry log failed: {err:?}");
            }
        }
    }

    async fn emit(&self, kind: &str, payload: serde_json::Value) {
        if let Some(telemetry) = &self.telemetry {
            if let Err(err) = telemetry.event(kind, payload).await {
                eprintln!("lifecycle telemetry event failed: {err:?}");
            }
        }
    }

    async fn emit_phase(&self, phase: LifecyclePhase) {
        self.emit("lifecycle.phase", json!({ "phase": phase.label() }))
            .await;
    }
}

/// Extracts the trailing `Fitness: <score>` annotation from a scraped
/// message, defaulting to zero when absent or unparseable.
fn extract_fitness(text: &str) -> f64 {
    text.rfind("Fitness:")
        .and_then(|index| text[index + "Fitness:".len()..].split_whitespace().next())
        .and_then(|token| token.parse().ok())
        .unwrap_or(0.0)
}

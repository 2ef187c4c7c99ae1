//! End-to-end lifecycle runs against the in-memory channel.

use std::sync::Arc;

use async_trait::async_trait;
use fungi_channel::{ChannelClient, ChannelError, MemoryChannel, Mention, Status};
use fungi_lifecycle::{
    BotConfig, ConstantScorer, LifecycleController, LifecyclePhase, LifecycleTelemetry,
    MatchRatioScorer,
};
use fungi_mycelium::{EvolutionaryAlgorithm, FungiHistory, FungiState, MycelialHistory};
use fungi_rules::{Rule, RuleSystem, NO_MATCH_RESPONSE};
use shared_event_bus::MemoryEventBus;
use tokio::sync::Semaphore;

const SEED_PROGRAM: &str =
    "<p>FUNGISTART RULE:hello|RESPONSE:Hi there!|RULE:pricing|RESPONSE:Check our pricing. FUNGIEND</p>";

fn controller(
    channel: Arc<MemoryChannel>,
    scorer_value: f64,
) -> LifecycleController<MemoryChannel> {
    let config = BotConfig {
        rng_seed: Some(42),
        ..BotConfig::default()
    };
    LifecycleController::new(channel, config, Box::new(ConstantScorer(scorer_value)), None)
}

#[tokio::test]
async fn initial_search_seeds_from_the_channel() {
    let channel = Arc::new(MemoryChannel::new());
    channel.seed_status("just chatter, nothing embedded");
    channel.seed_status(SEED_PROGRAM);
    let controller = controller(Arc::clone(&channel), 0.0);

    controller.run_initial_search().await;

    let state = controller.state();
    assert_eq!(state.read().await.current.len(), 2);
    assert_eq!(controller.current_phase().await, LifecyclePhase::Active);
}

#[tokio::test]
async fn initial_search_degrades_to_the_fallback_program() {
    let channel = Arc::new(MemoryChannel::new());
    channel.seed_status("no program here");
    let controller = controller(Arc::clone(&channel), 0.0);

    controller.run_initial_search().await;

    let state = controller.state();
    assert!(!state.read().await.current.is_empty());
}

#[tokio::test]
async fn initial_search_survives_channel_failure() {
    let channel = Arc::new(MemoryChannel::new());
    channel.set_failing(true);
    let controller = controller(Arc::clone(&channel), 0.0);

    controller.run_initial_search().await;

    assert!(!controller.state().read().await.current.is_empty());
}

#[tokio::test]
async fn mentions_are_answered_from_a_snapshot() {
    let channel = Arc::new(MemoryChannel::new());
    channel.seed_status(SEED_PROGRAM);
    channel.queue_mention("<p>well hello there</p>");
    channel.queue_mention("completely unrelated");
    let controller = controller(Arc::clone(&channel), 0.0);

    controller.run_initial_search().await;
    controller.answer_mentions().await;

    let replies = channel.replies();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].0, "Hi there!");
    assert_eq!(replies[1].0, NO_MATCH_RESPONSE);
    assert_eq!(controller.interactions().len(), 2);
}

#[tokio::test]
async fn reply_failure_does_not_block_later_mentions() {
    let channel = Arc::new(MemoryChannel::new());
    channel.seed_status(SEED_PROGRAM);
    channel.queue_mention("hello bot");
    channel.queue_mention("pricing please");
    let controller = controller(Arc::clone(&channel), 0.0);

    controller.run_initial_search().await;
    channel.fail_next_replies(1);
    controller.answer_mentions().await;

    // The second mention still went out and both interactions were kept.
    let replies = channel.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, "Check our pricing.");
    assert_eq!(controller.interactions().len(), 2);
}

#[tokio::test]
async fn full_cycle_publishes_scores_and_evolves() {
    let channel = Arc::new(MemoryChannel::new());
    channel.seed_status(SEED_PROGRAM);
    let controller = controller(Arc::clone(&channel), 0.5);

    controller.run_initial_search().await;
    controller.run_cycle().await;

    // The scored program went out under the mycelial tag.
    let timeline = channel.timeline();
    let published = &timeline.last().unwrap().content;
    assert!(published.contains("FUNGISTART"));
    assert!(published.contains("Fitness: 0.5"));
    assert!(published.contains("#fungi"));

    // The lineage grew and the offspring took over, non-empty.
    assert_eq!(controller.history().await.len(), 1);
    let state = controller.state();
    assert!(!state.read().await.current.is_empty());
    assert_eq!(controller.current_phase().await, LifecyclePhase::Active);
}

#[tokio::test]
async fn evolution_breeds_from_the_pre_cycle_lineage() {
    let channel = Arc::new(MemoryChannel::new());
    channel.seed_status(
        "FUNGISTART RULE:spore|RESPONSE:Spreading spores across the Fediverse. FUNGIEND Fitness: 2 #fungi",
    );
    channel.seed_status(SEED_PROGRAM);
    let controller = controller(Arc::clone(&channel), 0.5);

    controller.run_initial_search().await;
    controller.run_cycle().await;

    // Replay the evolving phase: the lineage was still empty when the
    // parents were drawn, and the scrape saw the fresh publication,
    // the seed status, and the older spore program, newest first.
    let seed_system = RuleSystem::new(vec![
        Rule::new("hello", "Hi there!"),
        Rule::new("pricing", "Check our pricing."),
    ]);
    let spore_system = RuleSystem::new(vec![Rule::new(
        "spore",
        "Spreading spores across the Fediverse.",
    )]);
    let mycelial = MycelialHistory::new(vec![
        FungiState::new(seed_system.clone(), 0.5),
        FungiState::new(seed_system.clone(), 0.0),
        FungiState::new(spore_system, 2.0),
    ]);
    let mut algorithm = EvolutionaryAlgorithm::new(42);
    let expected = algorithm.evolve(&FungiHistory::new(), &mycelial, &seed_system);

    let state = controller.state();
    assert_eq!(state.read().await.current, expected);
    let lineage = controller.history().await;
    assert_eq!(lineage.len(), 1);
    assert_eq!(lineage.states()[0].system(), &seed_system);
    assert!((lineage.states()[0].fitness() - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn published_cycles_are_deterministic_for_a_fixed_seed() {
    async fn evolved_program() -> String {
        let channel = Arc::new(MemoryChannel::new());
        channel.seed_status(SEED_PROGRAM);
        let controller = controller(Arc::clone(&channel), 0.5);
        controller.run_initial_search().await;
        controller.run_cycle().await;
        let state = controller.state();
        let current = state.read().await.current.clone();
        current.to_program()
    }

    assert_eq!(evolved_program().await, evolved_program().await);
}

#[tokio::test]
async fn match_ratio_scorer_feeds_the_published_fitness() {
    let channel = Arc::new(MemoryChannel::new());
    channel.seed_status(SEED_PROGRAM);
    channel.queue_mention("hello bot");
    channel.queue_mention("nothing matching");
    let config = BotConfig {
        rng_seed: Some(7),
        ..BotConfig::default()
    };
    let controller = LifecycleController::new(
        Arc::clone(&channel),
        config,
        Box::new(MatchRatioScorer),
        None,
    );

    controller.run_initial_search().await;
    controller.answer_mentions().await;
    controller.run_cycle().await;

    let timeline = channel.timeline();
    assert!(timeline.last().unwrap().content.contains("Fitness: 0.5"));
}

#[tokio::test]
async fn publish_failure_defers_the_cycle() {
    let channel = Arc::new(MemoryChannel::new());
    channel.seed_status(SEED_PROGRAM);
    let controller = controller(Arc::clone(&channel), 0.5);
    controller.run_initial_search().await;

    channel.set_failing(true);
    controller.run_cycle().await;

    // No lineage entry and no system swap happened.
    assert_eq!(controller.history().await.len(), 0);
    assert_eq!(controller.current_phase().await, LifecyclePhase::Active);
}

/// Channel whose publish parks until released, holding a cycle open.
struct GatedChannel {
    inner: MemoryChannel,
    entered: Semaphore,
    release: Semaphore,
}

impl GatedChannel {
    fn new() -> Self {
        Self {
            inner: MemoryChannel::new(),
            entered: Semaphore::new(0),
            release: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl ChannelClient for GatedChannel {
    async fn fetch_candidate_messages(
        &self,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<Status>, ChannelError> {
        self.inner.fetch_candidate_messages(tag, limit).await
    }

    async fn fetch_mentions(&self) -> Result<Vec<Mention>, ChannelError> {
        self.inner.fetch_mentions().await
    }

    async fn publish(&self, text: &str) -> Result<(), ChannelError> {
        self.entered.add_permits(1);
        let _token = self
            .release
            .acquire()
            .await
            .map_err(|_| ChannelError::Unavailable)?;
        self.inner.publish(text).await
    }

    async fn reply(&self, text: &str, target: &Status) -> Result<(), ChannelError> {
        self.inner.reply(text, target).await
    }
}

#[tokio::test]
async fn overlapping_cycle_trigger_skips() {
    let channel = Arc::new(GatedChannel::new());
    channel.inner.seed_status(SEED_PROGRAM);
    let config = BotConfig {
        rng_seed: Some(42),
        ..BotConfig::default()
    };
    let controller = Arc::new(LifecycleController::new(
        Arc::clone(&channel),
        config,
        Box::new(ConstantScorer(0.5)),
        None,
    ));
    controller.run_initial_search().await;

    let running = Arc::clone(&controller);
    let first = tokio::spawn(async move { running.run_cycle().await });
    // Wait until the first cycle is parked inside publish.
    channel.entered.acquire().await.unwrap().forget();

    // The overlapping trigger returns without publishing or evolving.
    controller.run_cycle().await;
    assert_eq!(channel.inner.timeline().len(), 1);

    channel.release.add_permits(1);
    first.await.unwrap();
    assert_eq!(controller.history().await.len(), 1);
    assert_eq!(channel.inner.timeline().len(), 2);
}

#[tokio::test]
async fn phase_events_reach_the_bus() {
    let channel = Arc::new(MemoryChannel::new());
    channel.seed_status(SEED_PROGRAM);
    let bus = Arc::new(MemoryEventBus::new(64));
    let telemetry = LifecycleTelemetry::builder("lifecycle")
        .event_publisher(bus.clone())
        .build()
        .unwrap();
    let config = BotConfig {
        rng_seed: Some(42),
        ..BotConfig::default()
    };
    let controller = LifecycleController::new(
        Arc::clone(&channel),
        config,
        Box::new(ConstantScorer(0.0)),
        Some(telemetry),
    );

    controller.run_initial_search().await;
    controller.run_cycle().await;

    let phases: Vec<String> = bus
        .snapshot_of_kind("lifecycle.phase")
        .into_iter()
        .map(|event| event.payload["phase"].as_str().unwrap_or_default().to_string())
        .collect();
    assert!(phases.contains(&"searching".to_string()));
    assert!(phases.contains(&"scoring".to_string()));
    assert!(phases.contains(&"publishing".to_string()));
    assert!(phases.contains(&"evolving".to_string()));
    assert_eq!(bus.snapshot_of_kind("channel.published").len(), 1);
}

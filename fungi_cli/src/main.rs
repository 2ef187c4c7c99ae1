//! `fungi` — hosts the evolving rule-system bot against an in-memory
//! channel and offers one-shot subcommands for working with FUNGI
//! programs.

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fungi_channel::MemoryChannel;
use fungi_lifecycle::{
    BotConfig, ConstantScorer, FitnessScorer, LifecycleController, LifecycleTelemetry,
    MatchRatioScorer,
};
use fungi_mycelium::EvolutionaryAlgorithm;
use fungi_rules::{respond, RuleParser};
use shared_event_bus::FileEventSink;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "fungi", version, about = "Evolving FUNGI rule-system host")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the bot lifecycle against an in-memory channel.
    Run {
        /// TOML configuration file; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// File whose lines seed the channel timeline before start.
        #[arg(long)]
        seed_timeline: Option<PathBuf>,
        /// Directory for JSON logs and the event stream.
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
        /// Score cycles by mention match ratio instead of a constant.
        #[arg(long)]
        match_ratio: bool,
    },
    /// Parses a program and prints its rule table.
    Parse {
        /// File containing the program text.
        file: PathBuf,
    },
    /// Answers a single input with a program, then exits.
    Respond {
        /// Program text (markers included).
        program: String,
        /// Input message to answer.
        input: String,
    },
    /// Evolves a program one step and prints the offspring.
    Evolve {
        /// Program text (markers included).
        program: String,
        /// Seed for the evolutionary operators.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            seed_timeline,
            log_dir,
            match_ratio,
        } => run_bot(config.as_deref(), seed_timeline.as_deref(), &log_dir, match_ratio),
        Commands::Parse { file } => parse_program(&file),
        Commands::Respond { program, input } => respond_once(&program, &input),
        Commands::Evolve { program, seed } => evolve_once(&program, seed),
    }
}

fn run_bot(
    config_path: Option<&std::path::Path>,
    seed_timeline: Option<&std::path::Path>,
    log_dir: &std::path::Path,
    match_ratio: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => BotConfig::load(path)?,
        None => BotConfig::default(),
    };

    let channel = Arc::new(MemoryChannel::new());
    if let Some(path) = seed_timeline {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading timeline seed {}", path.display()))?;
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            channel.seed_status(line);
        }
    }

    let event_sink = Arc::new(
        FileEventSink::new(log_dir.join("lifecycle.events.jsonl"))
            .context("initializing event sink")?,
    );
    let telemetry = LifecycleTelemetry::builder("lifecycle")
        .log_path(log_dir.join("lifecycle.log.jsonl"))
        .event_publisher(event_sink)
        .build()
        .context("initializing lifecycle telemetry")?;

    let scorer: Box<dyn FitnessScorer> = if match_ratio {
        Box::new(MatchRatioScorer)
    } else {
        Box::new(ConstantScorer(0.0))
    };

    let controller = Arc::new(LifecycleController::new(
        channel,
        config,
        scorer,
        Some(telemetry),
    ));
    println!("fungihost running; logs under {}", log_dir.display());
    Runtime::new()?.block_on(controller.run());
    Ok(())
}

fn parse_program(file: &std::path::Path) -> Result<()> {
    let raw =
        fs::read_to_string(file).with_context(|| format!("reading program {}", file.display()))?;
    let system = RuleParser::new()
        .parse(&raw)
        .with_context(|| format!("parsing program {}", file.display()))?;
    if system.is_empty() {
        println!("(empty rule system)");
        return Ok(());
    }
    for (index, rule) in system.rules().iter().enumerate() {
        println!("{index}: {:?} -> {:?}", rule.trigger, rule.response);
        if let Some(condition) = &rule.condition {
            println!("   condition: {condition}");
        }
        if let Some(template) = &rule.template {
            for (key, value) in template {
                println!("   template: {key}={value}");
            }
        }
    }
    Ok(())
}

fn respond_once(program: &str, input: &str) -> Result<()> {
    let parser = RuleParser::new();
    if !parser.contains_valid_program(program) {
        bail!("program is not valid FUNGI code");
    }
    let system = parser.parse(program)?;
    println!("{}", respond(&system, input));
    Ok(())
}

fn evolve_once(program: &str, seed: u64) -> Result<()> {
    let system = RuleParser::new()
        .parse(program)
        .context("parsing program")?;
    let offspring = EvolutionaryAlgorithm::new(seed).mutate(&system);
    println!("{}", offspring.to_program());
    Ok(())
}

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Lifecycle of the fungihost bot: search for seed code, answer
//! mentions with the active rule system, score it, share it on the
//! channel, and evolve the next generation.

/// Bot configuration loaded from TOML.
pub mod config;

/// Lifecycle phases and the shared mutable bot state.
pub mod state;

/// Pluggable fitness scoring and the per-cycle interaction log.
pub mod scoring;

/// Telemetry handle wiring logs and bus events.
pub mod telemetry;

/// The five-phase lifecycle controller.
pub mod controller;

pub use config::BotConfig;
pub use controller::{LifecycleController, FALLBACK_PROGRAM};
pub use scoring::{ConstantScorer, FitnessScorer, InteractionLog, InteractionRecord, MatchRatioScorer};
pub use state::{BotState, LifecyclePhase, SharedBotState};
pub use telemetry::{LifecycleTelemetry, LifecycleTelemetryBuilder};

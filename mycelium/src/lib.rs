#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Mycelial layer: rule-system lineage records and the evolutionary
//! engine that breeds the next cycle's rule system from them.

/// Local and channel-scraped lineage records.
pub mod history;

/// Weighted candidate pool assembled per cycle.
pub mod pool;

/// Mutation, crossover, and the evolve entry point.
pub mod evolution;

pub use evolution::EvolutionaryAlgorithm;
pub use history::{FungiHistory, FungiState, MycelialHistory};
pub use pool::CandidatePool;

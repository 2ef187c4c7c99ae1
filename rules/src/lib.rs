#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! FUNGI rule systems: the value model, the wire-grammar parser, and the
//! matching engine that turns an incoming message into a response.

/// Rule and rule-system value types.
pub mod model;

/// Parser for the `FUNGISTART .. FUNGIEND` wire grammar.
pub mod parser;

/// Substring matching engine.
pub mod engine;

pub use engine::{respond, NO_MATCH_RESPONSE};
pub use model::{Rule, RuleSystem};
pub use parser::{ParseError, RuleParser, PROGRAM_END, PROGRAM_START};

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Boundary to the shared public channel. The core never talks to a
//! real social network; it programs against [`ChannelClient`], and the
//! in-memory implementation here backs tests and local runs.

/// Client trait and channel value types.
pub mod client;

/// Presentation-markup decoding for fetched content.
pub mod markup;

/// In-memory channel implementation.
pub mod memory;

pub use client::{ChannelClient, ChannelError, Mention, Status};
pub use markup::decode_markup;
pub use memory::MemoryChannel;

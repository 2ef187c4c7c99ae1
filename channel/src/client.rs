use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One public message on the channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Status {
    /// Raw message content, possibly carrying presentation markup.
    pub content: String,
}

impl Status {
    /// Wraps raw message content.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// An inbound message addressed to the bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mention {
    /// The status that mentioned the bot.
    pub status: Status,
}

/// Failures surfaced by channel collaborators.
///
/// These propagate to the lifecycle controller, which logs them and
/// defers the current phase to the next scheduled trigger.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Transport-level failure while talking to the channel.
    #[error("channel transport failure: {0}")]
    Transport(String),
    /// The channel refused or timed out the operation.
    #[error("channel unavailable")]
    Unavailable,
}

/// Read/write access to the shared public channel.
///
/// Publish operations are fire-and-forget from the core's point of
/// view; retries and rate limiting are the implementation's concern.
#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// Most recent messages under `tag`, newest first, at most `limit`.
    async fn fetch_candidate_messages(
        &self,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<Status>, ChannelError>;

    /// Inbound messages addressed to the bot since the last fetch.
    async fn fetch_mentions(&self) -> Result<Vec<Mention>, ChannelError>;

    /// Posts a public message.
    async fn publish(&self, text: &str) -> Result<(), ChannelError>;

    /// Replies to a specific status.
    async fn reply(&self, text: &str, target: &Status) -> Result<(), ChannelError>;
}

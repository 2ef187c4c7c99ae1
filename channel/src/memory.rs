use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{ChannelClient, ChannelError, Mention, Status};

/// In-memory channel backing tests and local runs.
///
/// Published messages join the timeline, so a bot scraping the tag it
/// publishes under sees its own posts the way it would on a real
/// shared channel. A failure flag lets tests exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    timeline: Mutex<Vec<Status>>,
    mentions: Mutex<Vec<Mention>>,
    replies: Mutex<Vec<(String, Status)>>,
    failing: Mutex<bool>,
    failing_replies: Mutex<u32>,
}

impl MemoryChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a status to the timeline, as if another account posted it.
    pub fn seed_status(&self, content: impl Into<String>) {
        self.timeline.lock().push(Status::new(content));
    }

    /// Queues an inbound mention for the next fetch.
    pub fn queue_mention(&self, content: impl Into<String>) {
        self.mentions.lock().push(Mention {
            status: Status::new(content),
        });
    }

    /// All timeline statuses, oldest first.
    #[must_use]
    pub fn timeline(&self) -> Vec<Status> {
        self.timeline.lock().clone()
    }

    /// Replies captured so far as (text, target) pairs.
    #[must_use]
    pub fn replies(&self) -> Vec<(String, Status)> {
        self.replies.lock().clone()
    }

    /// Makes every subsequent operation fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    /// Makes only the next `count` reply calls fail; other operations
    /// stay healthy.
    pub fn fail_next_replies(&self, count: u32) {
        *self.failing_replies.lock() = count;
    }

    fn check(&self) -> Result<(), ChannelError> {
        if *self.failing.lock() {
            return Err(ChannelError::Transport("memory channel failing".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelClient for MemoryChannel {
    async fn fetch_candidate_messages(
        &self,
        _tag: &str,
        limit: usize,
    ) -> Result<Vec<Status>, ChannelError> {
        self.check()?;
        let timeline = self.timeline.lock();
        Ok(timeline.iter().rev().take(limit).cloned().collect())
    }

    async fn fetch_mentions(&self) -> Result<Vec<Mention>, ChannelError> {
        self.check()?;
        Ok(std::mem::take(&mut *self.mentions.lock()))
    }

    async fn publish(&self, text: &str) -> Result<(), ChannelError> {
        self.check()?;
        self.timeline.lock().push(Status::new(text));
        Ok(())
    }

    async fn reply(&self, text: &str, target: &Status) -> Result<(), ChannelError> {
        self.check()?;
        {
            let mut remaining = self.failing_replies.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ChannelError::Transport("reply rejected".into()));
            }
        }
        self.replies.lock().push((text.to_string(), target.clone()));
        Ok(())
    }
}

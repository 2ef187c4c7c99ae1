#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Event bus carrying lifecycle and channel events between fungihost crates.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::broadcast};
use uuid::Uuid;

/// One event on the bus, encoded as JSON when persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    /// Unique identifier.
    pub id: Uuid,
    /// Component that produced the event.
    pub source: String,
    /// Event kind (e.g. `lifecycle.phase`, `channel.published`).
    pub kind: String,
    /// Emission time in UTC.
    pub timestamp: DateTime<Utc>,
    /// Arbitrary JSON payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl BusEvent {
    /// Creates an event stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        kind: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            kind: kind.into(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Event producer interface.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes an event to the bus.
    async fn publish(&self, event: BusEvent) -> Result<()>;
}

/// Event consumer interface.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Opens a receiver streaming events until the channel closes.
    async fn subscribe(&self) -> Result<broadcast::Receiver<BusEvent>>;
}

/// In-memory broadcast bus retaining a bounded backlog, for local runs and tests.
#[derive(Debug, Clone)]
pub struct MemoryEventBus {
    sender: broadcast::Sender<BusEvent>,
    backlog: Arc<Mutex<VecDeque<BusEvent>>>,
    capacity: usize,
}

impl MemoryEventBus {
    /// Creates a bus retaining at most `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            backlog: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Snapshot of the retained backlog, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BusEvent> {
        self.backlog.lock().iter().cloned().collect()
    }

    /// Retained events of one kind, oldest first.
    #[must_use]
    pub fn snapshot_of_kind(&self, kind: &str) -> Vec<BusEvent> {
        self.backlog
            .lock()
            .iter()
            .filter(|event| event.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventPublisher for MemoryEventBus {
    async fn publish(&self, event: BusEvent) -> Result<()> {
        {
            let mut backlog = self.backlog.lock();
            backlog.push_back(event.clone());
            while backlog.len() > self.capacity {
                backlog.pop_front();
            }
        }
        let _ = self.sender.send(event);
        Ok(())
    }
}

#[async_trait]
impl EventSubscriber for MemoryEventBus {
    async fn subscribe(&self) -> Result<broadcast::Receiver<BusEvent>> {
        Ok(self.sender.subscribe())
    }
}

/// File-backed sink appending events as JSON lines.
#[derive(Debug, Clone)]
pub struct FileEventSink {
    path: PathBuf,
}

impl FileEventSink {
    /// Creates a sink writing to the given path, creating parent directories.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }
}

#[async_trait]
impl EventPublisher for FileEventSink {
    async fn publish(&self, event: BusEvent) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_event_bus::{BusEvent, EventPublisher};
use shared_logging::{JsonLogger, LogLevel, LogRecord};

/// Builder configuring the lifecycle telemetry sinks.
pub struct LifecycleTelemetryBuilder {
    component: String,
    log_path: Option<PathBuf>,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl LifecycleTelemetryBuilder {
    /// Creates a builder for the given component label.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            log_path: None,
            event_publisher: None,
        }
    }

    /// Sets the JSON-lines log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Registers the bus publisher for lifecycle events.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Finalizes the builder, opening the log file if configured.
    pub fn build(self) -> Result<LifecycleTelemetry> {
        let logger = match self.log_path {
            Some(path) => Some(JsonLogger::new(path)?),
            None => None,
        };
        Ok(LifecycleTelemetry {
            inner: Arc::new(Inner {
                component: self.component,
                logger,
                publisher: self.event_publisher,
            }),
        })
    }
}

/// Telemetry handle shared by the controller and the host binary.
///
/// Both sinks are optional; an unconfigured handle is a no-op, which
/// keeps tests quiet without conditional wiring.
#[derive(Clone)]
pub struct LifecycleTelemetry {
    inner: Arc<Inner>,
}

struct Inner {
    component: String,
    logger: Option<JsonLogger>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl fmt::Debug for LifecycleTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleTelemetry")
            .field("component", &self.inner.component)
            .finish()
    }
}

impl LifecycleTelemetry {
    /// Returns a builder for this handle.
    #[must_use]
    pub fn builder(component: impl Into<String>) -> LifecycleTelemetryBuilder {
        LifecycleTelemetryBuilder::new(component)
    }

    /// Writes a structured log line, tagging it with the cycle number
    /// when one applies.
    pub fn log(&self, level: LogLevel, message: &str, cycle: Option<u64>, fields: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let mut record = LogRecord::new(&self.inner.component, level, message).with_fields(fields);
            if let Some(cycle) = cycle {
                record = record.with_cycle(cycle);
            }
            logger.log(&record)?;
        }
        Ok(())
    }

    /// Emits an event on the configured bus.
    pub async fn event(&self, kind: &str, payload: Value) -> Result<()> {
        if let Some(publisher) = &self.inner.publisher {
            publisher
                .publish(BusEvent::new(&self.inner.component, kind, payload))
                .await?;
        }
        Ok(())
    }
}

//! Event observation for nemesis runs.
//!
//! This module contains:
//! - `SctEvent`: informational and database-log events published during a run
//! - `EventBus` trait: delivery of events to collectors and failure detectors
//! - `EventsFilterRegistry`: pattern-scoped suppression windows
//! - Implementations: in-process channel bus, mock bus

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::error;

pub mod channel;
pub mod filter;
pub mod mock;

pub use channel::ChannelEventBus;
pub use filter::{EventsFilterGuard, EventsFilterRegistry};
pub use mock::MockEventBus;

// ============================================================================
// Event model
// ============================================================================

/// Severity attached to every published event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Normal => "NORMAL",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Event class discriminator. Suppression windows are scoped to one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    /// Informational events published by test code.
    Info,
    /// Error lines scraped from database node logs.
    DatabaseError,
}

/// A single event on the observation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SctEvent {
    pub class: EventClass,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl SctEvent {
    /// Informational event with `Normal` severity.
    pub fn info(message: impl Into<String>) -> Self {
        Self::info_with_severity(message, Severity::Normal)
    }

    pub fn info_with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            class: EventClass::Info,
            severity,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Error line reported by a database node.
    pub fn database_error(line: impl Into<String>) -> Self {
        Self {
            class: EventClass::DatabaseError,
            severity: Severity::Error,
            message: line.into(),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors that can occur during bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Subscribe not supported for this bus type")]
    SubscribeNotSupported,
}

/// Handler for events delivered by the bus.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: Arc<SctEvent>) -> BoxFuture<'static, std::result::Result<(), BusError>>;
}

/// Result of publishing one event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishResult {
    /// True when an active suppression window swallowed the event.
    pub suppressed: bool,
}

/// Interface for event delivery to collectors.
///
/// Implementations:
/// - `ChannelEventBus`: in-process broadcast delivery
/// - `MockEventBus`: in-memory recorder for testing
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event.
    ///
    /// Events matching an active suppression window are dropped and reported
    /// through `PublishResult::suppressed`.
    async fn publish(&self, event: Arc<SctEvent>) -> Result<PublishResult>;

    /// Subscribe a handler to delivered (non-suppressed) events.
    async fn subscribe(&self, handler: Box<dyn EventHandler>) -> Result<()>;
}

/// Publish without letting a bus failure affect the caller.
///
/// Events never alter control flow of the index workflow, so failures are
/// only logged.
pub async fn publish_event(bus: &dyn EventBus, event: SctEvent) {
    if let Err(e) = bus.publish(Arc::new(event)).await {
        error!(error = %e, "Failed to publish event");
    }
}

/// Dispatch an event to all registered handlers.
///
/// Returns `true` if all handlers succeeded.
pub(crate) async fn dispatch_to_handlers(
    handlers: &Arc<RwLock<Vec<Box<dyn EventHandler>>>>,
    event: &Arc<SctEvent>,
) -> bool {
    let handlers_guard = handlers.read().await;
    let mut all_succeeded = true;

    for handler in handlers_guard.iter() {
        if let Err(e) = handler.handle(Arc::clone(event)).await {
            error!(error = %e, "Handler failed");
            all_succeeded = false;
        }
    }

    all_succeeded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_event_defaults_to_normal() {
        let event = SctEvent::info("hello");
        assert_eq!(event.class, EventClass::Info);
        assert_eq!(event.severity, Severity::Normal);
    }

    #[test]
    fn test_database_error_event_is_error_severity() {
        let event = SctEvent::database_error("view - Error applying view update to ks.t");
        assert_eq!(event.class, EventClass::DatabaseError);
        assert_eq!(event.severity, Severity::Error);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Error.to_string(), "ERROR");
        assert_eq!(Severity::Normal.to_string(), "NORMAL");
    }

    #[tokio::test]
    async fn test_publish_event_swallows_bus_failure() {
        let bus = MockEventBus::new();
        bus.set_fail_on_publish(true).await;

        publish_event(&bus, SctEvent::info("ignored")).await;

        assert_eq!(bus.published_count().await, 0);
    }
}

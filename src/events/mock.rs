//! Mock event bus implementation for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    BusError, EventBus, EventHandler, EventsFilterRegistry, PublishResult, Result, SctEvent,
    Severity,
};

/// Mock event bus that records every published event.
#[derive(Default)]
pub struct MockEventBus {
    filters: Option<Arc<EventsFilterRegistry>>,
    published: RwLock<Vec<SctEvent>>,
    suppressed: RwLock<Vec<SctEvent>>,
    fail_on_publish: RwLock<bool>,
}

impl MockEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock bus that honors the given suppression registry.
    pub fn with_filters(filters: Arc<EventsFilterRegistry>) -> Self {
        Self {
            filters: Some(filters),
            ..Self::default()
        }
    }

    pub async fn set_fail_on_publish(&self, fail: bool) {
        *self.fail_on_publish.write().await = fail;
    }

    pub async fn published_count(&self) -> usize {
        self.published.read().await.len()
    }

    pub async fn published(&self) -> Vec<SctEvent> {
        self.published.read().await.clone()
    }

    pub async fn messages(&self) -> Vec<String> {
        self.published
            .read()
            .await
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    pub async fn with_severity(&self, severity: Severity) -> Vec<SctEvent> {
        self.published
            .read()
            .await
            .iter()
            .filter(|e| e.severity == severity)
            .cloned()
            .collect()
    }

    pub async fn suppressed(&self) -> Vec<SctEvent> {
        self.suppressed.read().await.clone()
    }
}

#[async_trait]
impl EventBus for MockEventBus {
    async fn publish(&self, event: Arc<SctEvent>) -> Result<PublishResult> {
        if *self.fail_on_publish.read().await {
            return Err(BusError::Publish("Mock publish failure".to_string()));
        }
        if let Some(filters) = &self.filters {
            if filters.is_suppressed(&event) {
                self.suppressed.write().await.push((*event).clone());
                return Ok(PublishResult { suppressed: true });
            }
        }
        self.published.write().await.push((*event).clone());
        Ok(PublishResult::default())
    }

    async fn subscribe(&self, _handler: Box<dyn EventHandler>) -> Result<()> {
        Err(BusError::SubscribeNotSupported)
    }
}

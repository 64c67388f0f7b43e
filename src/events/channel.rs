//! In-memory channel-based event bus.
//!
//! Uses a tokio broadcast channel to fan events out to subscribed collectors
//! within a single process. Every event is checked against the shared
//! suppression registry before it enters the channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

use super::{EventBus, EventHandler, EventsFilterRegistry, PublishResult, Result, SctEvent};

/// Channel capacity for broadcast.
const CHANNEL_CAPACITY: usize = 1024;

/// In-memory event bus using tokio broadcast channels.
pub struct ChannelEventBus {
    sender: broadcast::Sender<Arc<SctEvent>>,
    filters: Arc<EventsFilterRegistry>,
    handlers: Arc<RwLock<Vec<Box<dyn EventHandler>>>>,
    consuming: Arc<RwLock<bool>>,
    suppressed: AtomicU64,
}

impl ChannelEventBus {
    pub fn new(filters: Arc<EventsFilterRegistry>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        info!("Channel event bus initialized");

        Self {
            sender,
            filters,
            handlers: Arc::new(RwLock::new(Vec::new())),
            consuming: Arc::new(RwLock::new(false)),
            suppressed: AtomicU64::new(0),
        }
    }

    /// Registry consulted on publish.
    pub fn filters(&self) -> &Arc<EventsFilterRegistry> {
        &self.filters
    }

    /// Number of events dropped by suppression windows so far.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    /// Start delivering events to subscribed handlers.
    pub async fn start_consuming(&self) -> Result<()> {
        {
            let mut consuming = self.consuming.write().await;
            if *consuming {
                return Ok(());
            }
            *consuming = true;
        }

        let mut receiver = self.sender.subscribe();
        let handlers = self.handlers.clone();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        debug!(class = ?event.class, severity = %event.severity, "Delivering event");
                        super::dispatch_to_handlers(&handlers, &event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        error!(skipped = n, "Event consumer lagged, skipped events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Event channel closed, stopping consumer");
                        break;
                    }
                }
            }
        });

        info!("Event consumer started");

        Ok(())
    }
}

#[async_trait]
impl EventBus for ChannelEventBus {
    #[tracing::instrument(name = "events.publish", skip_all, fields(class = ?event.class))]
    async fn publish(&self, event: Arc<SctEvent>) -> Result<PublishResult> {
        if self.filters.is_suppressed(&event) {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            debug!(message = %event.message, "Event suppressed by active filter");
            return Ok(PublishResult { suppressed: true });
        }

        match self.sender.send(event) {
            Ok(receivers) => debug!(receivers, "Published event to channel"),
            Err(_) => debug!("Published event (no receivers)"),
        }

        Ok(PublishResult::default())
    }

    async fn subscribe(&self, handler: Box<dyn EventHandler>) -> Result<()> {
        let count = {
            let mut handlers = self.handlers.write().await;
            handlers.push(handler);
            handlers.len()
        };

        info!(handler_count = count, "Handler subscribed to event bus");

        Ok(())
    }
}

#[cfg(test)]
mod tests;

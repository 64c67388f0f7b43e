use super::*;
use crate::events::{BusError, EventClass};
use futures::future::BoxFuture;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (
            Self {
                count: count.clone(),
            },
            count,
        )
    }
}

impl EventHandler for CountingHandler {
    fn handle(&self, _event: Arc<SctEvent>) -> BoxFuture<'static, std::result::Result<(), BusError>> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

#[tokio::test]
async fn test_publish_no_receivers() {
    let bus = ChannelEventBus::new(EventsFilterRegistry::new());

    let result = bus.publish(Arc::new(SctEvent::info("hello"))).await;
    assert!(!result.unwrap().suppressed);
}

#[tokio::test]
async fn test_subscribe_and_receive() {
    let bus = ChannelEventBus::new(EventsFilterRegistry::new());
    let (handler, count) = CountingHandler::new();
    bus.subscribe(Box::new(handler)).await.unwrap();
    bus.start_consuming().await.unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;

    bus.publish(Arc::new(SctEvent::database_error("real failure")))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_suppressed_event_never_reaches_handlers() {
    let filters = EventsFilterRegistry::new();
    let bus = ChannelEventBus::new(filters.clone());
    let (handler, count) = CountingHandler::new();
    bus.subscribe(Box::new(handler)).await.unwrap();
    bus.start_consuming().await.unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;

    let guard = filters
        .acquire(
            EventClass::DatabaseError,
            ".*Error applying view update.*",
            Duration::ZERO,
        )
        .unwrap();

    let noisy = SctEvent::database_error("view - Error applying view update to 10.0.0.1");
    let result = bus.publish(Arc::new(noisy.clone())).await.unwrap();
    assert!(result.suppressed);

    drop(guard);
    let result = bus.publish(Arc::new(noisy)).await.unwrap();
    assert!(!result.suppressed);

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(bus.suppressed_count(), 1);
}

#[tokio::test]
async fn test_start_consuming_is_idempotent() {
    let bus = ChannelEventBus::new(EventsFilterRegistry::new());
    let (handler, count) = CountingHandler::new();
    bus.subscribe(Box::new(handler)).await.unwrap();
    bus.start_consuming().await.unwrap();
    bus.start_consuming().await.unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;

    bus.publish(Arc::new(SctEvent::info("once"))).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

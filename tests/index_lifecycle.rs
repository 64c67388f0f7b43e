//! End-to-end index lifecycle against scripted cluster doubles.
//!
//! Run with: cargo test --test index_lifecycle --features test-utils

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use nemesis_indexes::config::{IndexNemesisConfig, BUILD_WAIT_PATTERN, DROP_INDEX_PATTERN};
use nemesis_indexes::events::{BusError, ChannelEventBus, EventBus, EventClass, EventHandler};
use nemesis_indexes::interfaces::CommandResult;
use nemesis_indexes::test_utils::{column_rows, text_row, MockNode, MockSession};
use nemesis_indexes::{
    CycleOutcome, EventsFilterRegistry, IndexNemesis, SctEvent, StructuralObject, VerifyOutcome,
};

const VIEW_UPDATE_NOISE: &str = "view - Error applying view update to ks1.t1 (view: ks1.mv1)";

/// Collects every event delivered by the bus.
#[derive(Clone, Default)]
struct Collector {
    events: Arc<Mutex<Vec<Arc<SctEvent>>>>,
}

impl Collector {
    async fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }
}

impl EventHandler for Collector {
    fn handle(&self, event: Arc<SctEvent>) -> BoxFuture<'static, Result<(), BusError>> {
        let events = self.events.clone();
        Box::pin(async move {
            events.lock().await.push(event);
            Ok(())
        })
    }
}

async fn scripted_table(session: &MockSession, table: &str, column: &str) {
    session
        .on(
            &format!("table_name = '{}'", table),
            column_rows(&[(column, "text")]),
        )
        .await;
    session
        .on(
            &format!("SELECT \"{}\" FROM ks1.{}", column, table),
            vec![text_row(&["v1"])],
        )
        .await;
    session
        .on(
            &format!("FROM ks1.{} WHERE", table),
            vec![text_row(&["k1", "v1"])],
        )
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_cycle_suppresses_view_update_noise_until_grace_expires() {
    let filters = EventsFilterRegistry::new();
    let bus = Arc::new(ChannelEventBus::new(filters.clone()));
    let collector = Collector::default();
    bus.subscribe(Box::new(collector.clone())).await.unwrap();
    bus.start_consuming().await.unwrap();

    let session = Arc::new(MockSession::observing_filters(filters.clone()));
    scripted_table(&session, "t1", "c1").await;

    let node = Arc::new(
        MockNode::new("node1")
            .with_nemesis_count(2)
            .observing_filters(filters.clone()),
    );
    node.push_response(CommandResult::ok("")).await;
    node.set_fallback(CommandResult::ok(
        "ks1.t1_c1_nemesis_index has finished building",
    ))
    .await;

    let config = IndexNemesisConfig::default();
    let nemesis = IndexNemesis::new(
        session.clone(),
        node.clone(),
        bus.clone(),
        filters.clone(),
        config.clone(),
    );

    let outcome = nemesis.run_cycle("ks1", "t1").await.unwrap();
    assert!(matches!(
        outcome,
        CycleOutcome::Completed {
            verification: VerifyOutcome::Verified { rows: 1 },
            ..
        }
    ));

    // Concurrent nemeses: every poll ran inside the build-wait window.
    let during_polls = node.observed_patterns().await;
    assert_eq!(during_polls.len(), 2);
    for patterns in &during_polls {
        assert_eq!(patterns, &vec![BUILD_WAIT_PATTERN.to_string()]);
    }

    // The drop ran inside its own window.
    let queries = session.queries().await;
    let drop_at = queries
        .iter()
        .position(|q| q == "DROP INDEX ks1.t1_c1_nemesis")
        .unwrap();
    assert_eq!(
        session.observed_patterns().await[drop_at],
        vec![DROP_INDEX_PATTERN.to_string()]
    );

    // Noise right after the cycle is still swallowed.
    let result = bus
        .publish(Arc::new(SctEvent::database_error(VIEW_UPDATE_NOISE)))
        .await
        .unwrap();
    assert!(result.suppressed);
    assert_eq!(bus.suppressed_count(), 1);

    tokio::time::advance(config.filter_grace()).await;

    let result = bus
        .publish(Arc::new(SctEvent::database_error(VIEW_UPDATE_NOISE)))
        .await
        .unwrap();
    assert!(!result.suppressed);

    tokio::time::sleep(Duration::from_millis(10)).await;
    let delivered = collector.messages().await;
    assert!(delivered.contains(&"Starting creating index: ks1.t1(c1)".to_string()));
    assert!(delivered.contains(&"View/index ks1.t1_c1_nemesis_index was built".to_string()));
    assert_eq!(
        delivered
            .iter()
            .filter(|m| m.as_str() == VIEW_UPDATE_NOISE)
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_errors_pass_through_open_window() {
    let filters = EventsFilterRegistry::new();
    let bus = ChannelEventBus::new(filters.clone());

    let _window = filters
        .acquire(
            EventClass::DatabaseError,
            DROP_INDEX_PATTERN,
            Duration::from_secs(180),
        )
        .unwrap();

    let unrelated = bus
        .publish(Arc::new(SctEvent::database_error("Compaction failed on ks1.t1")))
        .await
        .unwrap();
    let info = bus
        .publish(Arc::new(SctEvent::info(VIEW_UPDATE_NOISE)))
        .await
        .unwrap();

    assert!(!unrelated.suppressed);
    assert!(!info.suppressed);
    assert_eq!(bus.suppressed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_nemeses_share_suppression_windows() {
    let filters = EventsFilterRegistry::new();
    let bus = Arc::new(ChannelEventBus::new(filters.clone()));
    let config = IndexNemesisConfig::default();

    let session = Arc::new(MockSession::new());
    scripted_table(&session, "t1", "c1").await;
    scripted_table(&session, "t2", "c2").await;

    let first_node = Arc::new(MockNode::new("node1").with_nemesis_count(2));
    first_node
        .set_fallback(CommandResult::ok(
            "ks1.t1_c1_nemesis_index has finished building",
        ))
        .await;
    let second_node = Arc::new(MockNode::new("node2").with_nemesis_count(2));
    for _ in 0..3 {
        second_node.push_response(CommandResult::ok("")).await;
    }
    second_node
        .set_fallback(CommandResult::ok(
            "ks1.t2_c2_nemesis_index has finished building",
        ))
        .await;

    let first = IndexNemesis::new(
        session.clone(),
        first_node.clone(),
        bus.clone(),
        filters.clone(),
        config.clone(),
    );
    let second = IndexNemesis::new(
        session.clone(),
        second_node.clone(),
        bus.clone(),
        filters.clone(),
        config.clone(),
    );

    let (a, b) = tokio::join!(first.run_cycle("ks1", "t1"), second.run_cycle("ks1", "t2"));
    assert!(matches!(a.unwrap(), CycleOutcome::Completed { .. }));
    assert!(matches!(b.unwrap(), CycleOutcome::Completed { .. }));

    // Both holders released; the window survives on grace alone.
    assert_eq!(
        filters.holders(EventClass::DatabaseError, BUILD_WAIT_PATTERN),
        0
    );
    let noise = SctEvent::database_error(VIEW_UPDATE_NOISE);
    assert!(filters.is_suppressed(&noise));

    tokio::time::advance(config.filter_grace()).await;
    assert!(!filters.is_suppressed(&noise));
    assert!(filters.active_patterns().is_empty());

    assert_eq!(second_node.call_count().await, 4);
    assert_eq!(
        session.queries_containing("DROP INDEX").await.len(),
        2
    );
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_build_reports_last_status_output() {
    let filters = EventsFilterRegistry::new();
    let bus = Arc::new(ChannelEventBus::new(filters.clone()));
    let session = Arc::new(MockSession::new());
    scripted_table(&session, "t1", "c1").await;

    let node = Arc::new(MockNode::new("node1"));
    node.set_fallback(CommandResult {
        stdout: "ks1.t1_c1_nemesis_index is still building".to_string(),
        stderr: "warning: slow node".to_string(),
        exit_status: 1,
    })
    .await;

    let config = IndexNemesisConfig {
        build_timeout_secs: 60,
        ..IndexNemesisConfig::default()
    };
    let nemesis = IndexNemesis::new(session.clone(), node.clone(), bus, filters, config);

    let start = tokio::time::Instant::now();
    let err = nemesis.run_cycle("ks1", "t1").await.unwrap_err();

    assert!(err.is_build_timeout());
    assert_eq!(
        err.last_output(),
        Some((
            "ks1.t1_c1_nemesis_index is still building",
            "warning: slow node"
        ))
    );
    assert!(err.to_string().contains("t1_c1_nemesis_index"));
    assert_eq!(node.call_count().await, 2);
    assert!(start.elapsed() >= Duration::from_secs(60));

    let object = StructuralObject::index_on("ks1", "t1", "c1");
    assert_eq!(
        session.queries_containing("DROP INDEX").await,
        vec![format!("DROP INDEX ks1.{}", object.name())]
    );
}

//! Create-index nemesis cycle.
//!
//! Composes the lifecycle steps for one table:
//! pick column → create index → wait for build → verify → drop.
//! The index is dropped even when the build times out; the timeout is then
//! returned so the calling scenario can record the failure.

use std::sync::Arc;

use tracing::{info, warn};

use crate::build::BuildWaiter;
use crate::config::IndexNemesisConfig;
use crate::error::Result;
use crate::events::{EventBus, EventsFilterRegistry};
use crate::index::{IndexCommands, StructuralObject};
use crate::interfaces::{ClusterNode, CqlSession};
use crate::schema::{is_materialized_view, pick_random_column, IndexedColumn};
use crate::verify::{IndexVerifier, VerifyOutcome};

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The target is a materialized view; indexes are not created on views.
    SkippedView,
    /// The table has no indexable column.
    NoColumn,
    /// Index created, built, checked and dropped.
    Completed {
        index: String,
        column: IndexedColumn,
        verification: VerifyOutcome,
    },
}

/// Runs index lifecycles against one cluster.
pub struct IndexNemesis {
    session: Arc<dyn CqlSession>,
    commands: IndexCommands,
    waiter: BuildWaiter,
    verifier: IndexVerifier,
}

impl IndexNemesis {
    pub fn new(
        session: Arc<dyn CqlSession>,
        node: Arc<dyn ClusterNode>,
        events: Arc<dyn EventBus>,
        filters: Arc<EventsFilterRegistry>,
        config: IndexNemesisConfig,
    ) -> Self {
        let verifier = IndexVerifier::new(session.clone(), events.clone(), &config);
        let waiter = BuildWaiter::new(node, events.clone(), filters.clone(), config.clone());
        let commands = IndexCommands::new(session.clone(), events, filters, config);
        Self {
            session,
            commands,
            waiter,
            verifier,
        }
    }

    /// Run one create → wait → verify → drop cycle on `keyspace.table`.
    pub async fn run_cycle(&self, keyspace: &str, table: &str) -> Result<CycleOutcome> {
        if is_materialized_view(self.session.as_ref(), keyspace, table).await {
            info!(keyspace = %keyspace, table = %table, "Target is a materialized view, skipping");
            return Ok(CycleOutcome::SkippedView);
        }

        let Some(column) = pick_random_column(self.session.as_ref(), keyspace, table, true).await?
        else {
            info!(keyspace = %keyspace, table = %table, "No indexable column, skipping");
            return Ok(CycleOutcome::NoColumn);
        };

        let index = self
            .commands
            .create_index(keyspace, table, &column.name)
            .await?;
        let object = StructuralObject::Index {
            keyspace: keyspace.to_string(),
            name: index.clone(),
        };

        let verification = match self.waiter.wait_for(&object).await {
            Ok(()) => self.verifier.verify(keyspace, table, &column.name).await,
            Err(e) => {
                if let Err(drop_err) = self.commands.drop_object(&object).await {
                    warn!(index = %index, error = %drop_err, "Failed to drop index after build failure");
                }
                return Err(e);
            }
        };

        self.commands.drop_object(&object).await?;

        info!(keyspace = %keyspace, index = %index, ?verification, "Index cycle completed");
        Ok(CycleOutcome::Completed {
            index,
            column,
            verification,
        })
    }
}

//! Structural commands: create index, drop index, drop materialized view.
//!
//! Drops always run inside a suppression window because the cluster keeps
//! logging view-update errors for a few minutes after the command returns.

use std::sync::Arc;

use tracing::info;

use crate::config::IndexNemesisConfig;
use crate::error::Result;
use crate::events::{publish_event, EventBus, EventClass, EventsFilterRegistry, SctEvent};
use crate::interfaces::{CqlSession, Statement};

/// Index or materialized view managed by a nemesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralObject {
    Index { keyspace: String, name: String },
    MaterializedView { keyspace: String, name: String },
}

impl StructuralObject {
    /// Index on `table.column` with its derived name.
    pub fn index_on(keyspace: &str, table: &str, column: &str) -> Self {
        StructuralObject::Index {
            keyspace: keyspace.to_string(),
            name: index_name(table, column),
        }
    }

    pub fn view(keyspace: &str, name: &str) -> Self {
        StructuralObject::MaterializedView {
            keyspace: keyspace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn keyspace(&self) -> &str {
        match self {
            StructuralObject::Index { keyspace, .. }
            | StructuralObject::MaterializedView { keyspace, .. } => keyspace,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StructuralObject::Index { name, .. } | StructuralObject::MaterializedView { name, .. } => {
                name
            }
        }
    }

    /// Name under which the cluster tracks the build.
    ///
    /// Secondary indexes are backed by a view named `<index>_index`.
    pub fn build_target(&self) -> String {
        match self {
            StructuralObject::Index { name, .. } => format!("{}_index", name),
            StructuralObject::MaterializedView { name, .. } => name.clone(),
        }
    }
}

/// Derived index name for `table.column`. Same inputs, same name.
pub fn index_name(table: &str, column: &str) -> String {
    format!("{}_{}_nemesis", table, column).to_lowercase()
}

/// Issues structural commands against the cluster.
pub struct IndexCommands {
    session: Arc<dyn CqlSession>,
    events: Arc<dyn EventBus>,
    filters: Arc<EventsFilterRegistry>,
    config: IndexNemesisConfig,
}

impl IndexCommands {
    pub fn new(
        session: Arc<dyn CqlSession>,
        events: Arc<dyn EventBus>,
        filters: Arc<EventsFilterRegistry>,
        config: IndexNemesisConfig,
    ) -> Self {
        Self {
            session,
            events,
            filters,
            config,
        }
    }

    /// Create an index on `keyspace.table(column)` and return its name.
    pub async fn create_index(&self, keyspace: &str, table: &str, column: &str) -> Result<String> {
        publish_event(
            self.events.as_ref(),
            SctEvent::info(format!(
                "Starting creating index: {}.{}({})",
                keyspace, table, column
            )),
        )
        .await;

        let name = index_name(table, column);
        let statement = Statement::new(format!(
            "CREATE INDEX {} ON {}.{}(\"{}\")",
            name, keyspace, table, column
        ));
        self.session.execute(&statement).await?;

        info!(keyspace = %keyspace, index = %name, "Index created");
        Ok(name)
    }

    /// Drop an index inside a view-update suppression window.
    pub async fn drop_index(&self, keyspace: &str, index_name: &str) -> Result<()> {
        publish_event(
            self.events.as_ref(),
            SctEvent::info(format!("Starting dropping index: {}.{}", keyspace, index_name)),
        )
        .await;

        let _window = self.filters.acquire(
            EventClass::DatabaseError,
            &self.config.patterns.drop_index,
            self.config.filter_grace(),
        )?;
        let statement = Statement::new(format!("DROP INDEX {}.{}", keyspace, index_name));
        self.session.execute(&statement).await?;

        info!(keyspace = %keyspace, index = %index_name, "Index dropped");
        Ok(())
    }

    /// Drop a materialized view inside a view-update suppression window.
    pub async fn drop_materialized_view(&self, keyspace: &str, view_name: &str) -> Result<()> {
        info!(keyspace = %keyspace, view = %view_name, "start dropping MV");

        let _window = self.filters.acquire(
            EventClass::DatabaseError,
            &self.config.patterns.drop_view,
            self.config.filter_grace(),
        )?;
        let statement = Statement::new(format!(
            "DROP MATERIALIZED VIEW {}.{}",
            keyspace, view_name
        ));
        self.session.execute(&statement).await?;

        Ok(())
    }

    /// Drop either kind of structural object.
    pub async fn drop_object(&self, object: &StructuralObject) -> Result<()> {
        match object {
            StructuralObject::Index { keyspace, name } => self.drop_index(keyspace, name).await,
            StructuralObject::MaterializedView { keyspace, name } => {
                self.drop_materialized_view(keyspace, name).await
            }
        }
    }
}

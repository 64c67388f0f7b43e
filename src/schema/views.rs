//! Materialized view presence check.

use tracing::debug;

use crate::interfaces::session::{CqlSession, Result, Statement};

/// Look up `keyspace.table` in `system_schema.views`.
///
/// `Ok(false)` means the lookup succeeded and found no view; `Err` means the
/// answer could not be determined.
pub async fn probe_materialized_view(
    session: &dyn CqlSession,
    keyspace: &str,
    table: &str,
) -> Result<bool> {
    let statement = Statement::new(format!(
        "SELECT view_name FROM system_schema.views \
         WHERE keyspace_name = '{}' AND view_name = '{}'",
        keyspace, table
    ));
    let rows = session.execute(&statement).await?;
    Ok(!rows.is_empty())
}

/// Whether `keyspace.table` is a materialized view.
///
/// Lookup failures count as "not a view".
pub async fn is_materialized_view(session: &dyn CqlSession, keyspace: &str, table: &str) -> bool {
    match probe_materialized_view(session, keyspace, table).await {
        Ok(found) => found,
        Err(e) => {
            debug!(
                keyspace = %keyspace,
                table = %table,
                error = %e,
                "Got no result from system_schema.views"
            );
            false
        }
    }
}

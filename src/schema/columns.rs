//! Column discovery for index targets.

use rand::seq::IndexedRandom;
use tracing::debug;

use crate::interfaces::session::{CqlSession, Result, Statement};

/// Type prefixes of collection columns, which cannot take a regular index.
const COLLECTION_TYPES: [&str; 3] = ["list", "set", "map"];

/// Column kind as stored in `system_schema.columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    PartitionKey,
    Clustering,
    Static,
    Regular,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::PartitionKey => "partition_key",
            ColumnKind::Clustering => "clustering",
            ColumnKind::Static => "static",
            ColumnKind::Regular => "regular",
        }
    }
}

/// Which columns `list_columns` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnFilter {
    /// Partition key and clustering columns instead of static and regular ones.
    pub primary_key_only: bool,
    /// Drop list/set/map typed columns.
    pub exclude_collections: bool,
}

impl ColumnFilter {
    fn kinds(&self) -> [ColumnKind; 2] {
        if self.primary_key_only {
            [ColumnKind::PartitionKey, ColumnKind::Clustering]
        } else {
            [ColumnKind::Static, ColumnKind::Regular]
        }
    }
}

/// A column chosen as index target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedColumn {
    pub keyspace: String,
    pub table: String,
    pub name: String,
    pub cql_type: String,
    pub is_collection: bool,
}

/// Whether a CQL type string names a collection.
pub fn is_collection_type(cql_type: &str) -> bool {
    COLLECTION_TYPES.iter().any(|prefix| cql_type.starts_with(prefix))
}

fn columns_query(keyspace: &str, table: &str, filter: &ColumnFilter) -> String {
    let [a, b] = filter.kinds();
    format!(
        "SELECT column_name, type FROM system_schema.columns \
         WHERE keyspace_name = '{}' AND table_name = '{}' \
         AND kind in ('{}', '{}') ALLOW FILTERING",
        keyspace,
        table,
        a.as_str(),
        b.as_str()
    )
}

/// List the columns of a table, in metadata order.
///
/// Metadata errors are returned as-is.
pub async fn list_columns(
    session: &dyn CqlSession,
    keyspace: &str,
    table: &str,
    filter: ColumnFilter,
) -> Result<Vec<IndexedColumn>> {
    let statement = Statement::new(columns_query(keyspace, table, &filter));
    let rows = session.execute(&statement).await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let cql_type = row.text(1)?;
        let is_collection = is_collection_type(cql_type);
        if filter.exclude_collections && is_collection {
            continue;
        }
        columns.push(IndexedColumn {
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            name: row.text(0)?.to_string(),
            cql_type: cql_type.to_string(),
            is_collection,
        });
    }

    debug!(
        keyspace = %keyspace,
        table = %table,
        count = columns.len(),
        "Listed columns"
    );

    Ok(columns)
}

/// Pick a random static or regular column.
///
/// `None` means the table has no eligible column, which callers treat as
/// "nothing to do" rather than an error.
pub async fn pick_random_column(
    session: &dyn CqlSession,
    keyspace: &str,
    table: &str,
    exclude_collections: bool,
) -> Result<Option<IndexedColumn>> {
    let filter = ColumnFilter {
        primary_key_only: false,
        exclude_collections,
    };
    let columns = list_columns(session, keyspace, table, filter).await?;
    Ok(columns.choose(&mut rand::rng()).cloned())
}

//! Schema metadata lookups.
//!
//! Column selection for index targets and the view-presence check.

pub mod columns;
pub mod views;

pub use columns::{
    is_collection_type, list_columns, pick_random_column, ColumnFilter, ColumnKind, IndexedColumn,
};
pub use views::{is_materialized_view, probe_materialized_view};

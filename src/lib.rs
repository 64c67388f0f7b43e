//! Nemesis Indexes - index and materialized view disruption
//!
//! Creates secondary indexes on live tables, waits for their builds, checks
//! that queries through them work and drops them again, while suppressing
//! the view-update error noise these schema changes cause on the cluster.

pub mod build;
pub mod config;
pub mod error;
pub mod events;
pub mod index;
pub mod interfaces;
pub mod nemesis;
pub mod nodetool;
pub mod schema;
pub mod utils;
pub mod verify;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use build::{BuildStatus, BuildWaiter};
pub use error::{IndexError, Result};
pub use events::{EventBus, EventsFilterGuard, EventsFilterRegistry, SctEvent, Severity};
pub use index::{index_name, IndexCommands, StructuralObject};
pub use nemesis::{CycleOutcome, IndexNemesis};
pub use nodetool::ProcessNodetool;
pub use verify::{IndexVerifier, VerifyOutcome};

//! Abstract interfaces for the cluster under test.
//!
//! These traits define the contracts for:
//! - Query execution (CQL session)
//! - Admin commands on a node (nodetool)

pub mod node;
pub mod session;

pub use node::{ClusterNode, CommandResult, NodetoolError, NodetoolOptions};
pub use session::{CqlSession, CqlValue, Row, SessionError, Statement};

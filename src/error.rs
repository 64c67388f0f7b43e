//! Error types for the index lifecycle.

use std::time::Duration;

use crate::events::BusError;
use crate::interfaces::{NodetoolError, SessionError};

/// Result type for index lifecycle operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can halt an index lifecycle step.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Query interface failure while issuing a structural command.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Admin command could not be run at all.
    #[error("nodetool error: {0}")]
    Nodetool(#[from] NodetoolError),

    /// A suppression window could not be opened.
    #[error("event filter error: {0}")]
    Filter(#[from] BusError),

    /// The build did not report completion in time.
    #[error(
        "Timeout error while creating view/index {target} after {timeout:?}. \
         stdout\n: {stdout}\nstderr\n: {stderr}"
    )]
    BuildTimeout {
        keyspace: String,
        target: String,
        timeout: Duration,
        stdout: String,
        stderr: String,
    },
}

impl IndexError {
    /// Returns true if this is a build timeout.
    pub fn is_build_timeout(&self) -> bool {
        matches!(self, IndexError::BuildTimeout { .. })
    }

    /// Last status command output carried by a build timeout.
    pub fn last_output(&self) -> Option<(&str, &str)> {
        match self {
            IndexError::BuildTimeout { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_timeout_message_carries_output() {
        let err = IndexError::BuildTimeout {
            keyspace: "ks1".to_string(),
            target: "t1_c1_nemesis_index".to_string(),
            timeout: Duration::from_secs(300),
            stdout: "ks1.t1_c1_nemesis_index has not finished building".to_string(),
            stderr: "warning: slow".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("t1_c1_nemesis_index"));
        assert!(msg.contains("has not finished building"));
        assert!(msg.contains("warning: slow"));
        assert!(err.is_build_timeout());
        assert_eq!(
            err.last_output(),
            Some((
                "ks1.t1_c1_nemesis_index has not finished building",
                "warning: slow"
            ))
        );
    }

    #[test]
    fn test_session_error_is_not_timeout() {
        let err = IndexError::from(SessionError::Query("boom".to_string()));
        assert!(!err.is_build_timeout());
        assert!(err.last_output().is_none());
    }
}

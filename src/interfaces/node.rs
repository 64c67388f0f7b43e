//! Administrative access to a single cluster node.

use async_trait::async_trait;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodetoolError>;

/// Errors that can occur while running an admin command on a node.
#[derive(Debug, thiserror::Error)]
pub enum NodetoolError {
    #[error("Failed to spawn admin command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Admin command `{command}` exited with status {status}: {stderr}")]
    Command {
        command: String,
        status: i32,
        stderr: String,
    },
}

/// Options for one admin command invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodetoolOptions {
    /// Return the output even when the command exits non-zero.
    pub ignore_status: bool,
    /// Log the command output at info level.
    pub verbose: bool,
}

impl NodetoolOptions {
    /// Options used by status polling: exit code ignored, quiet.
    pub fn quiet_ignore_status() -> Self {
        Self {
            ignore_status: true,
            verbose: false,
        }
    }
}

/// Captured output of an admin command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl CommandResult {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_status == 0
    }
}

/// A cluster node that can run the admin CLI.
#[async_trait]
pub trait ClusterNode: Send + Sync {
    /// Node name for logging.
    fn name(&self) -> &str;

    /// Number of nemesis agents concurrently running against this node's cluster.
    fn nemesis_count(&self) -> usize;

    /// Run `nodetool <sub_cmd>` on the node.
    async fn run_nodetool(&self, sub_cmd: &str, options: NodetoolOptions) -> Result<CommandResult>;
}

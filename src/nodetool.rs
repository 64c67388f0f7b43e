//! Process-backed admin command runner.
//!
//! Runs the configured admin command prefix with the subcommand appended,
//! e.g. `["ssh", "db-node-1", "nodetool"]` + `viewbuildstatus ks.t`.
//! No shell interpretation - direct exec.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::NodetoolConfig;
use crate::interfaces::node::{ClusterNode, CommandResult, NodetoolError, NodetoolOptions, Result};

/// `ClusterNode` that spawns the admin CLI as a child process.
pub struct ProcessNodetool {
    name: String,
    command: Vec<String>,
    nemesis_count: usize,
}

impl ProcessNodetool {
    pub fn new(name: impl Into<String>, config: &NodetoolConfig, nemesis_count: usize) -> Self {
        Self {
            name: name.into(),
            command: config.command.clone(),
            nemesis_count,
        }
    }

    fn argv(&self, sub_cmd: &str) -> Vec<String> {
        self.command
            .iter()
            .cloned()
            .chain(sub_cmd.split_whitespace().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl ClusterNode for ProcessNodetool {
    fn name(&self) -> &str {
        &self.name
    }

    fn nemesis_count(&self) -> usize {
        self.nemesis_count
    }

    async fn run_nodetool(&self, sub_cmd: &str, options: NodetoolOptions) -> Result<CommandResult> {
        let argv = self.argv(sub_cmd);
        let Some((executable, args)) = argv.split_first() else {
            return Err(NodetoolError::Spawn(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "admin command cannot be empty",
            )));
        };

        debug!(node = %self.name, executable = %executable, ?args, "Running admin command");

        let output = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                error!(node = %self.name, executable = %executable, error = %e, "Failed to spawn admin command");
                e
            })?;

        let result = CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_status: output.status.code().unwrap_or(-1),
        };

        if options.verbose {
            info!(node = %self.name, sub_cmd = %sub_cmd, stdout = %result.stdout, "Admin command output");
        }

        if !result.succeeded() && !options.ignore_status {
            return Err(NodetoolError::Command {
                command: argv.join(" "),
                status: result.exit_status,
                stderr: result.stderr,
            });
        }

        Ok(result)
    }
}

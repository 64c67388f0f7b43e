//! Build status polling for indexes and materialized views.
//!
//! Index and view builds run asynchronously on the cluster. The waiter polls
//! `nodetool viewbuildstatus` at a fixed interval until the view-style
//! completion marker shows up or the timeout elapses.
//!
//! ## States
//!
//! ```text
//! Waiting ──(view marker found)──▶ Built
//!    │
//!    └──(elapsed >= timeout)────▶ TimedOut
//! ```
//!
//! The status command has no failure marker we act on; a build that fails
//! outright looks like one still running until the timeout.
//!
//! When more than one nemesis runs against the cluster, concurrent schema
//! changes make nodes log view-apply errors, so the whole poll loop runs
//! inside a suppression window. A single nemesis polls without one.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::IndexNemesisConfig;
use crate::error::{IndexError, Result};
use crate::events::{publish_event, EventBus, EventClass, EventsFilterRegistry, SctEvent};
use crate::index::StructuralObject;
use crate::interfaces::{ClusterNode, CommandResult, NodetoolOptions};

/// Build state derived from one status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// No completion marker yet.
    Unknown,
    /// View-style completion marker found.
    Built,
}

/// Markers found in one `viewbuildstatus` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusScan {
    /// `<ks>.<target>_index has finished building` was present.
    pub index_marker: bool,
    pub status: BuildStatus,
}

impl StatusScan {
    pub fn from_output(stdout: &str, keyspace: &str, target: &str) -> Self {
        let index_marker = stdout.contains(&format!(
            "{}.{}_index has finished building",
            keyspace, target
        ));
        let view_marker = stdout.contains(&format!("{}.{} has finished building", keyspace, target));
        Self {
            index_marker,
            status: if view_marker {
                BuildStatus::Built
            } else {
                BuildStatus::Unknown
            },
        }
    }
}

/// Waits for index and view builds to complete.
pub struct BuildWaiter {
    node: Arc<dyn ClusterNode>,
    events: Arc<dyn EventBus>,
    filters: Arc<EventsFilterRegistry>,
    config: IndexNemesisConfig,
}

impl BuildWaiter {
    pub fn new(
        node: Arc<dyn ClusterNode>,
        events: Arc<dyn EventBus>,
        filters: Arc<EventsFilterRegistry>,
        config: IndexNemesisConfig,
    ) -> Self {
        Self {
            node,
            events,
            filters,
            config,
        }
    }

    /// Wait for the build of any structural object with the configured timeout.
    pub async fn wait_for(&self, object: &StructuralObject) -> Result<()> {
        self.wait_for_view_to_be_built(
            object.keyspace(),
            &object.build_target(),
            self.config.build_timeout(),
        )
        .await
    }

    /// Wait for a secondary index; its build is tracked as `<index_name>_index`.
    pub async fn wait_for_index_to_be_built(
        &self,
        keyspace: &str,
        index_name: &str,
        timeout: Duration,
    ) -> Result<()> {
        self.wait_for_view_to_be_built(keyspace, &format!("{}_index", index_name), timeout)
            .await
    }

    /// Poll until `keyspace.view_name` reports completion or `timeout` elapses.
    pub async fn wait_for_view_to_be_built(
        &self,
        keyspace: &str,
        view_name: &str,
        timeout: Duration,
    ) -> Result<()> {
        info!(keyspace = %keyspace, view = %view_name, ?timeout, "waiting for view/index to be built");
        let start = Instant::now();

        let concurrent = self.node.nemesis_count();
        let _window = if concurrent > 1 {
            Some(self.filters.acquire(
                EventClass::DatabaseError,
                &self.config.patterns.build_wait,
                self.config.filter_grace(),
            )?)
        } else {
            None
        };

        let sub_cmd = format!("viewbuildstatus {}.{}", keyspace, view_name);
        let mut last = CommandResult::default();
        let mut polls = 0u32;

        while start.elapsed() < timeout {
            last = self
                .node
                .run_nodetool(&sub_cmd, NodetoolOptions::quiet_ignore_status())
                .await?;
            polls += 1;

            let scan = StatusScan::from_output(&last.stdout, keyspace, view_name);
            debug!(
                view = %view_name,
                polls,
                elapsed = ?start.elapsed(),
                status = ?scan.status,
                "Polled build status"
            );

            if scan.index_marker {
                publish_event(
                    self.events.as_ref(),
                    SctEvent::info(format!("Index {}.{} was built", keyspace, view_name)),
                )
                .await;
            }
            if scan.status == BuildStatus::Built {
                publish_event(
                    self.events.as_ref(),
                    SctEvent::info(format!("View/index {}.{} was built", keyspace, view_name)),
                )
                .await;
                info!(view = %view_name, polls, elapsed = ?start.elapsed(), "Build finished");
                return Ok(());
            }

            sleep(self.config.poll_interval()).await;
        }

        warn!(
            keyspace = %keyspace,
            view = %view_name,
            polls,
            elapsed = ?start.elapsed(),
            "Timed out waiting for build"
        );

        Err(IndexError::BuildTimeout {
            keyspace: keyspace.to_string(),
            target: view_name.to_string(),
            timeout,
            stdout: last.stdout,
            stderr: last.stderr,
        })
    }
}

//! Post-build check that a new index answers queries.
//!
//! The check is diagnostic: problems are published as error-severity events
//! and never returned as errors.

use std::sync::Arc;

use tracing::debug;

use crate::config::IndexNemesisConfig;
use crate::events::{publish_event, EventBus, SctEvent, Severity};
use crate::interfaces::{CqlSession, Statement};

mod literal;

pub use literal::{quote, to_cql_literal};

/// Result of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The equality query through the index returned rows.
    Verified { rows: usize },
    /// The sampled value was null; null equality cannot be queried.
    SkippedNull,
    /// The table had no row to sample.
    SkippedEmpty,
    /// The check failed and an error event was published.
    Failed { query: String, reason: String },
}

/// Queries a table through a freshly built index.
pub struct IndexVerifier {
    session: Arc<dyn CqlSession>,
    events: Arc<dyn EventBus>,
    row_limit: u32,
}

impl IndexVerifier {
    pub fn new(
        session: Arc<dyn CqlSession>,
        events: Arc<dyn EventBus>,
        config: &IndexNemesisConfig,
    ) -> Self {
        Self {
            session,
            events,
            row_limit: config.verify_row_limit,
        }
    }

    /// Sample one value of `column` and query the table by it.
    pub async fn verify(&self, keyspace: &str, table: &str, column: &str) -> VerifyOutcome {
        let sample_query = format!("SELECT \"{}\" FROM {}.{} LIMIT 1", column, keyspace, table);
        let sample = match self
            .session
            .execute(&Statement::new(sample_query.as_str()).with_fetch_size(1))
            .await
        {
            Ok(rows) => rows.into_iter().next().and_then(|row| row.columns.into_iter().next()),
            Err(e) => {
                let reason = e.to_string();
                self.report(format!(
                    "Index {}.{}({}) could not be sampled with query: {}. Reason: {}",
                    keyspace, table, column, sample_query, reason
                ))
                .await;
                return VerifyOutcome::Failed {
                    query: sample_query,
                    reason,
                };
            }
        };

        let value = match sample {
            None => {
                publish_event(
                    self.events.as_ref(),
                    SctEvent::info_with_severity(
                        format!(
                            "No rows in {}.{}, skipping querying created index.",
                            keyspace, table
                        ),
                        Severity::Normal,
                    ),
                )
                .await;
                return VerifyOutcome::SkippedEmpty;
            }
            Some(value) => value,
        };

        // Null equality is not supported by the engine.
        let Some(literal) = to_cql_literal(&value) else {
            publish_event(
                self.events.as_ref(),
                SctEvent::info_with_severity(
                    format!(
                        "No value for column {} in {}.{}, skipping querying created index.",
                        column, keyspace, table
                    ),
                    Severity::Normal,
                ),
            )
            .await;
            return VerifyOutcome::SkippedNull;
        };

        let query = format!(
            "SELECT * FROM {}.{} WHERE \"{}\" = {} LIMIT {}",
            keyspace, table, column, literal, self.row_limit
        );
        debug!(query = %query, "Verifying query by index works");

        match self
            .session
            .execute(&Statement::new(query.as_str()).with_fetch_size(self.row_limit))
            .await
        {
            Ok(rows) if rows.is_empty() => {
                let reason = "no rows returned".to_string();
                self.report(format!(
                    "Index {}.{}({}) does not work. No rows returned for query {}",
                    keyspace, table, column, query
                ))
                .await;
                VerifyOutcome::Failed { query, reason }
            }
            Ok(rows) => VerifyOutcome::Verified { rows: rows.len() },
            Err(e) => {
                let reason = e.to_string();
                self.report(format!(
                    "Index {}.{}({}) does not work in query: {}. Reason: {}",
                    keyspace, table, column, query, reason
                ))
                .await;
                VerifyOutcome::Failed { query, reason }
            }
        }
    }

    async fn report(&self, message: String) {
        publish_event(
            self.events.as_ref(),
            SctEvent::info_with_severity(message, Severity::Error),
        )
        .await;
    }
}

//! Test utilities and mock implementations.
//!
//! This module provides scripted implementations of the session and node
//! traits for testing without a running cluster.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::events::EventsFilterRegistry;
use crate::interfaces::node::{
    ClusterNode, CommandResult, NodetoolError, NodetoolOptions, Result as NodeResult,
};
use crate::interfaces::session::{
    CqlSession, CqlValue, Result as SessionResult, Row, SessionError, Statement,
};

/// Build a row of text cells.
pub fn text_row(cells: &[&str]) -> Row {
    Row::new(cells.iter().map(|c| CqlValue::Text(c.to_string())).collect())
}

/// Rows as returned by the `system_schema.columns` query.
pub fn column_rows(columns: &[(&str, &str)]) -> Vec<Row> {
    columns
        .iter()
        .map(|(name, cql_type)| text_row(&[name, cql_type]))
        .collect()
}

#[derive(Debug, Clone)]
enum Scripted {
    Rows(Vec<Row>),
    Fail(String),
}

/// Mock session answering queries by substring match.
///
/// The most recently registered matching rule wins. Queries without a rule
/// succeed with no rows, which is what DDL statements return.
#[derive(Default)]
pub struct MockSession {
    rules: RwLock<Vec<(String, Scripted)>>,
    executed: RwLock<Vec<Statement>>,
    filters: Option<Arc<EventsFilterRegistry>>,
    observed_patterns: RwLock<Vec<Vec<String>>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the live suppression patterns at every execute.
    pub fn observing_filters(filters: Arc<EventsFilterRegistry>) -> Self {
        Self {
            filters: Some(filters),
            ..Self::default()
        }
    }

    /// Live suppression patterns seen at each execute, if observing.
    pub async fn observed_patterns(&self) -> Vec<Vec<String>> {
        self.observed_patterns.read().await.clone()
    }

    /// Answer queries containing `fragment` with `rows`.
    pub async fn on(&self, fragment: &str, rows: Vec<Row>) {
        self.rules
            .write()
            .await
            .push((fragment.to_string(), Scripted::Rows(rows)));
    }

    /// Fail queries containing `fragment`.
    pub async fn fail_on(&self, fragment: &str, message: &str) {
        self.rules
            .write()
            .await
            .push((fragment.to_string(), Scripted::Fail(message.to_string())));
    }

    pub async fn executed(&self) -> Vec<Statement> {
        self.executed.read().await.clone()
    }

    pub async fn queries(&self) -> Vec<String> {
        self.executed
            .read()
            .await
            .iter()
            .map(|s| s.query.clone())
            .collect()
    }

    /// Executed queries containing `fragment`.
    pub async fn queries_containing(&self, fragment: &str) -> Vec<String> {
        self.queries()
            .await
            .into_iter()
            .filter(|q| q.contains(fragment))
            .collect()
    }
}

#[async_trait]
impl CqlSession for MockSession {
    async fn execute(&self, statement: &Statement) -> SessionResult<Vec<Row>> {
        self.executed.write().await.push(statement.clone());

        if let Some(filters) = &self.filters {
            self.observed_patterns
                .write()
                .await
                .push(filters.active_patterns());
        }

        let rules = self.rules.read().await;
        let scripted = rules
            .iter()
            .rev()
            .find(|(fragment, _)| statement.query.contains(fragment.as_str()))
            .map(|(_, scripted)| scripted.clone());

        match scripted {
            Some(Scripted::Rows(rows)) => Ok(rows),
            Some(Scripted::Fail(message)) => Err(SessionError::Query(message)),
            None => Ok(Vec::new()),
        }
    }
}

/// Mock node replaying scripted admin command output.
///
/// Responses are consumed in order; once exhausted the fallback is returned
/// for every further call. A configured failure overrides both.
pub struct MockNode {
    name: String,
    nemesis_count: usize,
    responses: RwLock<VecDeque<CommandResult>>,
    fallback: RwLock<CommandResult>,
    failure: RwLock<Option<String>>,
    calls: RwLock<Vec<String>>,
    filters: Option<Arc<EventsFilterRegistry>>,
    observed_patterns: RwLock<Vec<Vec<String>>>,
}

impl MockNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nemesis_count: 1,
            responses: RwLock::new(VecDeque::new()),
            fallback: RwLock::new(CommandResult::default()),
            failure: RwLock::new(None),
            calls: RwLock::new(Vec::new()),
            filters: None,
            observed_patterns: RwLock::new(Vec::new()),
        }
    }

    pub fn with_nemesis_count(mut self, count: usize) -> Self {
        self.nemesis_count = count;
        self
    }

    /// Record the live suppression patterns at every call.
    pub fn observing_filters(mut self, filters: Arc<EventsFilterRegistry>) -> Self {
        self.filters = Some(filters);
        self
    }

    pub async fn push_response(&self, result: CommandResult) {
        self.responses.write().await.push_back(result);
    }

    pub async fn set_fallback(&self, result: CommandResult) {
        *self.fallback.write().await = result;
    }

    /// Fail every further call as if the admin command could not be spawned.
    pub async fn fail_with(&self, message: &str) {
        *self.failure.write().await = Some(message.to_string());
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Live suppression patterns seen at each call, if observing.
    pub async fn observed_patterns(&self) -> Vec<Vec<String>> {
        self.observed_patterns.read().await.clone()
    }
}

#[async_trait]
impl ClusterNode for MockNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn nemesis_count(&self) -> usize {
        self.nemesis_count
    }

    async fn run_nodetool(&self, sub_cmd: &str, _options: NodetoolOptions) -> NodeResult<CommandResult> {
        self.calls.write().await.push(sub_cmd.to_string());

        if let Some(filters) = &self.filters {
            self.observed_patterns
                .write()
                .await
                .push(filters.active_patterns());
        }

        if let Some(message) = self.failure.read().await.clone() {
            return Err(NodetoolError::Spawn(std::io::Error::other(message)));
        }

        let next = self.responses.write().await.pop_front();
        match next {
            Some(result) => Ok(result),
            None => Ok(self.fallback.read().await.clone()),
        }
    }
}

//! CQL query interface.

use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while talking to the cluster's query interface.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Unexpected row shape: {0}")]
    UnexpectedRow(String),
}

/// A typed cell value as returned by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    Null,
    Text(String),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Blob(Vec<u8>),
    Int(i64),
    Double(f64),
    Boolean(bool),
    Uuid(Uuid),
    Inet(IpAddr),
    /// Values with no dedicated variant, already in CQL literal form
    /// (decimal, varint, duration).
    Other(String),
}

impl CqlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CqlValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub columns: Vec<CqlValue>,
}

impl Row {
    pub fn new(columns: Vec<CqlValue>) -> Self {
        Self { columns }
    }

    pub fn get(&self, index: usize) -> Option<&CqlValue> {
        self.columns.get(index)
    }

    /// Text cell at `index`, or an `UnexpectedRow` error.
    pub fn text(&self, index: usize) -> Result<&str> {
        self.get(index).and_then(CqlValue::as_text).ok_or_else(|| {
            SessionError::UnexpectedRow(format!("expected text at column {}: {:?}", index, self))
        })
    }
}

/// A query with paging hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub query: String,
    pub fetch_size: Option<u32>,
}

impl Statement {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            fetch_size: None,
        }
    }

    pub fn with_fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = Some(fetch_size);
        self
    }
}

impl From<&str> for Statement {
    fn from(query: &str) -> Self {
        Self::new(query)
    }
}

impl From<String> for Statement {
    fn from(query: String) -> Self {
        Self::new(query)
    }
}

/// Interface for executing statements on the cluster.
///
/// Connection establishment, load balancing and retries belong to the
/// implementation; this crate only issues statements and reads rows.
#[async_trait]
pub trait CqlSession: Send + Sync {
    /// Execute a statement and return all fetched rows.
    async fn execute(&self, statement: &Statement) -> Result<Vec<Row>>;
}

//! Relational binding contract and the prepared-statement surface.
//!
//! Two call paths over a single query implementation:
//! - direct: [`RelationalBinding::query`] returns `Result`, and a failure
//!   propagates to the caller;
//! - enveloped: [`PreparedQuery::all`] never fails, folding the same error
//!   into a `success = false` envelope with the identical message.
//!
//! Row values are JSON throughout so the hosted router sees exactly what a
//! JSON result set would carry on the real platform.

use crate::error::QueryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// One result row: column name to JSON value, in column order.
pub type Row = serde_json::Map<String, Value>;

/// Backend seam for the relational binding. The production backend wraps
/// SQLite; tests substitute in-memory fakes.
#[async_trait]
pub trait RelationalBinding: Send + Sync {
    /// Run `text` with positional `params` bound in order, returning every
    /// row. Implementations must report post-close use as
    /// [`QueryError::Closed`] rather than panicking.
    async fn query(&self, text: &str, params: &[Value]) -> Result<Vec<Row>, QueryError>;
}

/// Execution metadata slot in the envelope. Always serializes to `{}`;
/// present so consumers that index into `meta` find an object there.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QueryMeta {}

/// Uniform result envelope produced by the enveloped call path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryEnvelope {
    pub success: bool,
    pub results: Vec<Row>,
    pub meta: QueryMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryEnvelope {
    pub fn ok(results: Vec<Row>) -> Self {
        Self { success: true, results, meta: QueryMeta {}, error: None }
    }

    pub fn failed(err: &QueryError) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            meta: QueryMeta {},
            error: Some(err.to_string()),
        }
    }
}

/// The relational binding handed to the hosted router.
#[derive(Clone)]
pub struct Database {
    backend: Arc<dyn RelationalBinding>,
}

impl Database {
    pub fn new(backend: Arc<dyn RelationalBinding>) -> Self {
        Self { backend }
    }

    /// Start a statement. Binding and execution happen on the returned
    /// [`PreparedQuery`].
    pub fn prepare(&self, text: impl Into<String>) -> PreparedQuery {
        PreparedQuery {
            backend: Arc::clone(&self.backend),
            text: text.into(),
            params: Vec::new(),
        }
    }

    /// Direct call path: rows or a propagated [`QueryError`].
    pub async fn query(&self, text: &str, params: &[Value]) -> Result<Vec<Row>, QueryError> {
        self.backend.query(text, params).await
    }
}

/// A statement under construction: text plus bound positional parameters.
pub struct PreparedQuery {
    backend: Arc<dyn RelationalBinding>,
    text: String,
    params: Vec<Value>,
}

impl PreparedQuery {
    /// Replace the bound parameters. Later calls win; bindings never
    /// accumulate across calls.
    pub fn bind(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    /// Enveloped call path. Never returns an error: a failed query comes
    /// back as `success = false` with the driver message in `error`.
    pub async fn all(&self) -> QueryEnvelope {
        match self.backend.query(&self.text, &self.params).await {
            Ok(results) => QueryEnvelope::ok(results),
            Err(err) => QueryEnvelope::failed(&err),
        }
    }

    /// First row, if any. Unlike [`PreparedQuery::all`] this propagates the
    /// failure, matching the platform's thrown-rejection contract.
    pub async fn first(&self) -> Result<Option<Row>, QueryError> {
        let mut rows = self.backend.query(&self.text, &self.params).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }

    /// Execute for effect. Result rows are dropped; only the envelope's
    /// success flag and error carry information.
    pub async fn run(&self) -> QueryEnvelope {
        match self.backend.query(&self.text, &self.params).await {
            Ok(_) => QueryEnvelope::ok(Vec::new()),
            Err(err) => QueryEnvelope::failed(&err),
        }
    }
}

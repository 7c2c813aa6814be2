//! Query provider trait and structured error types.
//!
//! The QueryProvider trait abstracts over the remote query-execution API so
//! the fetch stage can run against Dune or against a stub in tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured error types for remote query operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        status: u16,
        endpoint: String,
        body: String,
    },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("execution {execution_id} ended in state {state}: {message}")]
    ExecutionFailed {
        execution_id: String,
        state: String,
        message: String,
    },

    #[error("artifact write failed for {path}: {reason}")]
    ArtifactWrite { path: String, reason: String },
}

/// Shape of the result payload requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    /// Raw CSV text.
    Csv,
    /// JSON document with `result.rows` and `result.metadata.column_names`.
    Json,
}

impl ResultFormat {
    pub fn label(self) -> &'static str {
        match self {
            ResultFormat::Csv => "csv",
            ResultFormat::Json => "json",
        }
    }
}

/// A named query to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub query_id: u64,
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl QueryRequest {
    pub fn new(query_id: u64, name: impl Into<String>) -> Self {
        Self {
            query_id,
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }
}

/// Result of a completed query execution.
#[derive(Debug, Clone)]
pub struct QueryOutput {
    pub execution_id: String,
    pub format: ResultFormat,
    pub body: String,
}

/// Trait for remote query-execution services.
///
/// Implementations block until the execution reaches a terminal state.
/// There is no retry: any failure is returned to the caller as-is.
pub trait QueryProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Execute a query and return its full result in the requested format.
    fn run_query(&self, request: &QueryRequest, format: ResultFormat)
        -> Result<QueryOutput, DataError>;
}

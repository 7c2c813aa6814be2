//! Dune Analytics query provider.
//!
//! Runs a saved query through Dune's execution API: submit, poll the
//! execution status until it is terminal, then download the result as CSV
//! or JSON. Every request is made exactly once; a failed request, a failed
//! execution, or an unreadable response ends the fetch.

use super::provider::{DataError, QueryOutput, QueryProvider, QueryRequest, ResultFormat};
use crate::config::ConfigError;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.dune.com/api/v1";
pub const API_KEY_ENV: &str = "DUNE_API_KEY";
pub const BASE_URL_ENV: &str = "DUNE_API_BASE_URL";
pub const TIMEOUT_ENV: &str = "DUNE_API_REQUEST_TIMEOUT";

const API_KEY_HEADER: &str = "X-Dune-API-Key";
const PERFORMANCE_TIER: &str = "medium";

/// Connection settings resolved from the environment.
#[derive(Clone)]
pub struct DuneSettings {
    pub api_key: String,
    pub base_url: String,
    /// Per-request timeout. `None` leaves the HTTP client default in place.
    pub request_timeout: Option<Duration>,
}

impl fmt::Debug for DuneSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuneSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl DuneSettings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential(API_KEY_ENV.to_string()))?;

        let base_url = lookup(BASE_URL_ENV)
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let request_timeout = match lookup(TIMEOUT_ENV) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    name: TIMEOUT_ENV.to_string(),
                    reason: e.to_string(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            api_key,
            base_url,
            request_timeout,
        })
    }
}

/// Lifecycle state of a Dune query execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    Pending,
    Executing,
    Completed,
    CompletedPartial,
    Failed,
    Cancelled,
    Expired,
    Unknown(String),
}

impl ExecutionState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "QUERY_STATE_PENDING" => Self::Pending,
            "QUERY_STATE_EXECUTING" => Self::Executing,
            "QUERY_STATE_COMPLETED" => Self::Completed,
            "QUERY_STATE_COMPLETED_PARTIAL" => Self::CompletedPartial,
            "QUERY_STATE_FAILED" => Self::Failed,
            "QUERY_STATE_CANCELLED" => Self::Cancelled,
            "QUERY_STATE_EXPIRED" => Self::Expired,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::CompletedPartial)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Pending | Self::Executing)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "QUERY_STATE_PENDING",
            Self::Executing => "QUERY_STATE_EXECUTING",
            Self::Completed => "QUERY_STATE_COMPLETED",
            Self::CompletedPartial => "QUERY_STATE_COMPLETED_PARTIAL",
            Self::Failed => "QUERY_STATE_FAILED",
            Self::Cancelled => "QUERY_STATE_CANCELLED",
            Self::Expired => "QUERY_STATE_EXPIRED",
            Self::Unknown(raw) => raw,
        }
    }
}

#[derive(Debug, Serialize)]
struct ExecuteBody<'a> {
    query_parameters: &'a BTreeMap<String, String>,
    performance: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    execution_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    execution_id: String,
    state: String,
    error: Option<ExecutionErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ExecutionErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Parsed execution status.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionStatus {
    pub execution_id: String,
    pub state: ExecutionState,
    pub error_message: Option<String>,
}

/// Extract the execution id from an `execute` response body.
pub fn parse_execute_response(body: &str) -> Result<String, DataError> {
    let resp: ExecuteResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!("execute response: {e}"))
    })?;
    if resp.execution_id.is_empty() {
        return Err(DataError::ResponseFormatChanged(
            "execute response has an empty execution_id".into(),
        ));
    }
    Ok(resp.execution_id)
}

/// Parse a `status` response body.
pub fn parse_status_response(body: &str) -> Result<ExecutionStatus, DataError> {
    let resp: StatusResponse = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("status response: {e}")))?;
    let error_message = resp.error.and_then(|e| match (e.kind, e.message) {
        (Some(kind), Some(msg)) => Some(format!("{kind}: {msg}")),
        (None, Some(msg)) => Some(msg),
        (Some(kind), None) => Some(kind),
        (None, None) => None,
    });
    Ok(ExecutionStatus {
        execution_id: resp.execution_id,
        state: ExecutionState::parse(&resp.state),
        error_message,
    })
}

/// Decide what one status poll means: `None` keeps polling, `Some` is a
/// finished execution, and any other terminal or unrecognised state is fatal.
pub fn next_step(status: ExecutionStatus) -> Result<Option<ExecutionState>, DataError> {
    if status.state.is_running() {
        return Ok(None);
    }
    if status.state.is_success() {
        if status.state == ExecutionState::CompletedPartial {
            warn!(
                execution_id = %status.execution_id,
                "execution completed with a partial (truncated) result"
            );
        }
        return Ok(Some(status.state));
    }
    Err(DataError::ExecutionFailed {
        execution_id: status.execution_id,
        state: status.state.as_str().to_string(),
        message: status
            .error_message
            .unwrap_or_else(|| "no error message".to_string()),
    })
}

/// Pass through a 2xx body; anything else is an HTTP error.
pub fn check_response(status: u16, endpoint: &str, body: String) -> Result<String, DataError> {
    if (200..300).contains(&status) {
        Ok(body)
    } else {
        Err(DataError::Http {
            status,
            endpoint: endpoint.to_string(),
            body: truncate_body(&body),
        })
    }
}

/// Dune Analytics provider backed by a blocking HTTP client.
pub struct DuneProvider {
    client: Client,
    settings: DuneSettings,
    poll_interval: Duration,
}

impl DuneProvider {
    pub fn new(settings: DuneSettings, poll_interval: Duration) -> Result<Self, DataError> {
        let mut builder =
            Client::builder().user_agent(concat!("celo-insights/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        // A local API stand-in is reached directly, never through a system proxy.
        if is_loopback(&settings.base_url) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            settings,
            poll_interval,
        })
    }

    /// Build a provider from environment variables.
    pub fn from_env(poll_interval: Duration) -> Result<Self, ProviderInitError> {
        let settings = DuneSettings::from_env()?;
        Ok(Self::new(settings, poll_interval)?)
    }

    pub fn execute_url(&self, query_id: u64) -> String {
        format!("{}/query/{query_id}/execute", self.settings.base_url)
    }

    pub fn status_url(&self, execution_id: &str) -> String {
        format!("{}/execution/{execution_id}/status", self.settings.base_url)
    }

    pub fn results_url(&self, execution_id: &str, format: ResultFormat) -> String {
        match format {
            ResultFormat::Csv => {
                format!("{}/execution/{execution_id}/results/csv", self.settings.base_url)
            }
            ResultFormat::Json => {
                format!("{}/execution/{execution_id}/results", self.settings.base_url)
            }
        }
    }

    /// Send a request once and return the body text of a 2xx response.
    fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<String, DataError> {
        let resp = request
            .header(API_KEY_HEADER, &self.settings.api_key)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(format!("{endpoint}: {e}")))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(format!("{endpoint}: {e}")))?;
        check_response(status, endpoint, body)
    }

    fn execute(&self, request: &QueryRequest) -> Result<String, DataError> {
        let url = self.execute_url(request.query_id);
        let body = ExecuteBody {
            query_parameters: &request.params,
            performance: PERFORMANCE_TIER,
        };
        let text = self.send(self.client.post(&url).json(&body), "execute")?;
        parse_execute_response(&text)
    }

    fn status(&self, execution_id: &str) -> Result<ExecutionStatus, DataError> {
        let text = self.send(self.client.get(self.status_url(execution_id)), "status")?;
        parse_status_response(&text)
    }

    /// Poll the execution until it leaves the pending/executing states.
    fn wait_for_completion(&self, execution_id: &str) -> Result<ExecutionState, DataError> {
        loop {
            let status = self.status(execution_id)?;
            debug!(execution_id, state = status.state.as_str(), "execution status");

            if let Some(state) = next_step(status)? {
                return Ok(state);
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    fn results(&self, execution_id: &str, format: ResultFormat) -> Result<String, DataError> {
        let url = self.results_url(execution_id, format);
        self.send(self.client.get(url), "results")
    }
}

impl QueryProvider for DuneProvider {
    fn name(&self) -> &str {
        "dune"
    }

    fn run_query(
        &self,
        request: &QueryRequest,
        format: ResultFormat,
    ) -> Result<QueryOutput, DataError> {
        info!(
            query_id = request.query_id,
            name = %request.name,
            params = request.params.len(),
            "submitting query"
        );
        let execution_id = self.execute(request)?;
        info!(%execution_id, "query submitted, waiting for results");

        self.wait_for_completion(&execution_id)?;
        let body = self.results(&execution_id, format)?;
        info!(%execution_id, bytes = body.len(), format = format.label(), "results downloaded");

        Ok(QueryOutput {
            execution_id,
            format,
            body,
        })
    }
}

/// Failure to construct a provider: either configuration or client setup.
#[derive(Debug, thiserror::Error)]
pub enum ProviderInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
}

fn is_loopback(base_url: &str) -> bool {
    let rest = base_url
        .strip_prefix("http://")
        .or_else(|| base_url.strip_prefix("https://"))
        .unwrap_or(base_url);
    rest.starts_with("127.0.0.1") || rest.starts_with("localhost") || rest.starts_with("[::1]")
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX).collect();
        format!("{head}...")
    }
}

//! GraphQL readiness check for a subgraph deployment
//!
//! Sends `{_meta {block {number}}}` to the deployment's GraphQL endpoint
//! and treats any response carrying a non-null `data` member as ready.
//! Every failure along the way (transport, status, body) is reported as
//! a `ProbeError`; `is_deployed` collapses them into a plain `false`.

use crate::config::ProbeConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request body sent to the deployment, byte for byte
pub const META_QUERY_BODY: &str = r#"{"query": "{_meta {block {number}}}"}"#;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("GraphQL endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("GraphQL request timed out after {0:?}")]
    Timeout(Duration),

    #[error("GraphQL endpoint returned HTTP {0}")]
    HttpStatus(StatusCode),

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response is not a JSON object")]
    UnexpectedShape,

    #[error("response has no data (errors: {errors:?})")]
    NoData { errors: Vec<String> },
}

/// What a ready deployment told us about itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncedMeta {
    /// Latest indexed block, when the response includes `_meta.block.number`
    pub block_number: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

/// Decide readiness from a raw GraphQL response body
///
/// The body must be a JSON object whose `data` member is present and not
/// null. Any non-null value counts, including an empty object.
pub fn evaluate_response(body: &[u8]) -> Result<SyncedMeta, ProbeError> {
    let response: Value =
        serde_json::from_slice(body).map_err(|e| ProbeError::InvalidJson(e.to_string()))?;

    let object = response.as_object().ok_or(ProbeError::UnexpectedShape)?;

    match object.get("data") {
        Some(data) if !data.is_null() => Ok(SyncedMeta {
            block_number: data.pointer("/_meta/block/number").and_then(Value::as_u64),
        }),
        _ => Err(ProbeError::NoData {
            errors: error_messages(object.get("errors")),
        }),
    }
}

/// Messages from a GraphQL `errors` array; anything unexpected yields none
fn error_messages(errors: Option<&Value>) -> Vec<String> {
    errors
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<GraphqlError>>(v).ok())
        .map(|errs| errs.into_iter().map(|e| e.message).collect())
        .unwrap_or_default()
}

/// One-shot readiness probe against a graph node GraphQL endpoint
pub struct SubgraphProbe {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl SubgraphProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url(),
            timeout: config.timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send the `_meta` query and evaluate the response
    pub async fn check(&self) -> Result<SyncedMeta, ProbeError> {
        debug!(url = %self.url, timeout_secs = self.timeout.as_secs_f64(), "Querying subgraph _meta");

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(META_QUERY_BODY)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::HttpStatus(status));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        evaluate_response(&body)
    }

    /// Readiness verdict: `true` only when `check` succeeds
    pub async fn is_deployed(&self) -> bool {
        match self.check().await {
            Ok(meta) => {
                info!(url = %self.url, block_number = ?meta.block_number, "Subgraph is deployed");
                true
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "Subgraph is not ready");
                false
            }
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ProbeError {
        if e.is_timeout() {
            ProbeError::Timeout(self.timeout)
        } else {
            ProbeError::Unreachable(e.to_string())
        }
    }
}

#[cfg(test)]
#[path = "probe_test.rs"]
mod tests;

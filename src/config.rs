//! Probe configuration read from the process environment
//!
//! Required:
//! - `GRAPH_NODE_GRAPHQL_PORT`: port of the graph node GraphQL endpoint
//! - `DEPLOYMENT_NAME`: subgraph name, used verbatim as a URL path segment
//!
//! Optional:
//! - `GRAPH_NODE_GRAPHQL_HOST`: host to probe (default: localhost)
//! - `SUBGRAPH_PROBE_TIMEOUT_SECS`: request timeout in seconds (default: 10)

use std::num::ParseIntError;
use std::time::Duration;
use thiserror::Error;

pub const PORT_VAR: &str = "GRAPH_NODE_GRAPHQL_PORT";
pub const DEPLOYMENT_NAME_VAR: &str = "DEPLOYMENT_NAME";
pub const HOST_VAR: &str = "GRAPH_NODE_GRAPHQL_HOST";
pub const TIMEOUT_VAR: &str = "SUBGRAPH_PROBE_TIMEOUT_SECS";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {var} is not set")]
    Missing { var: &'static str },

    #[error("GRAPH_NODE_GRAPHQL_PORT must be a port number, got {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("SUBGRAPH_PROBE_TIMEOUT_SECS must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { value: String },
}

/// Validated settings for a single probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub deployment_name: String,
    pub timeout: Duration,
}

impl ProbeConfig {
    /// Settings for probing `deployment_name` on localhost with the default timeout
    pub fn new(port: u16, deployment_name: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port,
            deployment_name: deployment_name.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// The port is checked before anything else, so a missing port is
    /// always the reported error even when other variables are absent too.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_port = lookup(PORT_VAR).ok_or(ConfigError::Missing { var: PORT_VAR })?;
        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|source| ConfigError::InvalidPort {
                value: raw_port.clone(),
                source,
            })?;

        let deployment_name = lookup(DEPLOYMENT_NAME_VAR).ok_or(ConfigError::Missing {
            var: DEPLOYMENT_NAME_VAR,
        })?;

        let host = lookup(HOST_VAR)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let timeout = match lookup(TIMEOUT_VAR) {
            None => DEFAULT_TIMEOUT,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout { value }),
            },
        };

        Ok(Self {
            host,
            port,
            deployment_name,
            timeout,
        })
    }

    /// GraphQL endpoint of the deployment: `http://<host>:<port>/subgraphs/name/<name>`
    pub fn url(&self) -> String {
        format!(
            "http://{}:{}/subgraphs/name/{}",
            self.host, self.port, self.deployment_name
        )
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

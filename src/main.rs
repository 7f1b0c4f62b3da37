use anyhow::Context;
use std::process::ExitCode;
use subgraph_probe::{ProbeConfig, SubgraphProbe};
use tracing::{error, info};

/// Exit code when the subgraph is deployed
const EXIT_READY: u8 = 0;

/// Exit code when the subgraph is not ready (including every probe failure)
const EXIT_NOT_READY: u8 = 1;

/// Exit code when configuration is missing or invalid; no request was sent
const EXIT_CONFIG_ERROR: u8 = 2;

/// Run the probe and return the readiness verdict
///
/// Errors here are setup failures; failures of the probe itself are
/// already folded into `false` by `is_deployed`.
async fn run(config: &ProbeConfig) -> anyhow::Result<bool> {
    let probe = SubgraphProbe::new(config).context("Failed to set up subgraph probe")?;
    info!(
        url = %probe.url(),
        timeout_secs = config.timeout.as_secs(),
        "Checking subgraph deployment"
    );
    Ok(probe.is_deployed().await)
}

fn exit_status(ready: bool) -> u8 {
    if ready {
        EXIT_READY
    } else {
        EXIT_NOT_READY
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout stays empty for health check consumers
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match ProbeConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid probe configuration");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    match run(&config).await {
        Ok(ready) => ExitCode::from(exit_status(ready)),
        Err(e) => {
            error!(error = ?e, "Subgraph probe failed");
            ExitCode::from(EXIT_NOT_READY)
        }
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

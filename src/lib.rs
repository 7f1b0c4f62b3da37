//! Readiness probe for subgraph deployments on a local graph node
//!
//! Queries `_meta.block.number` over GraphQL and reports whether the
//! deployment answers with data. Intended to back container health checks:
//! the `subgraph-probe` binary exits 0 when ready and 1 otherwise.

pub mod config;
pub mod probe;

pub use config::{ConfigError, ProbeConfig};
pub use probe::{evaluate_response, ProbeError, SubgraphProbe, SyncedMeta};

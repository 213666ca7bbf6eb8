//! # LokiStack Controller
//!
//! Kubernetes controller that reports the health of LokiStack resources as
//! status conditions.
//!
//! ## Features
//!
//! - Ready, Failed and Pending conditions derived from component pod phases
//! - Degraded condition for invalid storage and replication settings
//! - Optimistic-concurrency status writes, skipped when nothing changed
//! - Prometheus metrics and health probes

use anyhow::Result;
use lokistack_controller::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(init.stacks, init.pods, init.reconciler, init.server_state).await
}

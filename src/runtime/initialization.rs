//! # Initialization
//!
//! Controller initialization logic including rustls setup, tracing,
//! metrics, server startup, and Kubernetes client setup.

use crate::config::ControllerConfig;
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::LokiStack;
use crate::observability;
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// API for LokiStack CRD
    pub stacks: Api<LokiStack>,
    /// API for the component pods
    pub pods: Api<Pod>,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
/// - Reconciler setup
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before any rustls use; ring is the crypto provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    let config = ControllerConfig::from_env();
    observability::logging::init_tracing(config.log_format)?;

    info!("Starting LokiStack Controller");
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        metrics_port = config.metrics_port,
        watch_namespace = config.watch_namespace().unwrap_or("<all>"),
        resync_interval_secs = config.resync_interval_secs,
        "Loaded controller configuration"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_port = config.metrics_port;
    let server_state_clone = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let (stacks, pods): (Api<LokiStack>, Api<Pod>) = match config.watch_namespace() {
        Some(namespace) => (
            Api::namespaced(client.clone(), namespace),
            Api::namespaced(client.clone(), namespace),
        ),
        None => (Api::all(client.clone()), Api::all(client.clone())),
    };

    summarize_existing_stacks(&stacks).await?;

    let reconciler = Arc::new(Reconciler::new(client.clone(), config));
    server_state.set_ready(true);

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        stacks,
        pods,
        reconciler,
        server_state,
    })
}

/// Check the CRD is queryable and log the stacks that already exist
async fn summarize_existing_stacks(stacks: &Api<LokiStack>) -> Result<()> {
    let list = stacks
        .list(&ListParams::default())
        .await
        .context("LokiStack CRD is not queryable, is it installed?")?;

    let mut by_namespace: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for stack in &list.items {
        by_namespace
            .entry(stack.namespace().unwrap_or_default())
            .or_default()
            .push(stack.name_any());
    }

    info!(
        "Found {} existing LokiStack resources in {} namespaces",
        list.items.len(),
        by_namespace.len()
    );
    for (namespace, names) in &by_namespace {
        info!("  {}: {}", namespace, names.join(", "));
    }
    Ok(())
}

//! # Watch Loop
//!
//! Controller watch loop that monitors LokiStack resources and their
//! component pods, and triggers reconciliation when either changes.

use crate::constants::LABEL_INSTANCE;
use crate::controller::reconciler::{reconcile, BackoffState, Reconciler, StackKey};
use crate::controller::server::ServerState;
use crate::crd::LokiStack;
use crate::runtime::error_policy::{
    forget_backoff, handle_reconciliation_error, log_watch_stream_error,
};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::controller::Error as ControllerError;
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Run the controller watch loop
///
/// Restarts the controller stream whenever it ends while the server is
/// still marked ready. Returns once SIGINT or SIGTERM was received.
pub async fn run_watch_loop(
    stacks: Api<LokiStack>,
    pods: Api<Pod>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let shutdown = Arc::new(Notify::new());
    tokio::spawn(mark_shutdown(
        shutdown_signal()?,
        Arc::clone(&server_state),
        Arc::clone(&shutdown),
    ));

    let restart_delay = reconciler.config.watch_restart_delay();

    loop {
        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        info!("Starting controller watch loop...");
        let trigger = Arc::clone(&shutdown);
        Controller::new(stacks.clone(), watcher::Config::default().any_semantic())
            .watches(
                pods.clone(),
                watcher::Config::default().labels(LABEL_INSTANCE),
                pod_to_stack,
            )
            .graceful_shutdown_on(async move { trigger.notified().await })
            .run(reconcile, handle_reconciliation_error, Arc::clone(&reconciler))
            .for_each(|result| {
                let reconciler = Arc::clone(&reconciler);
                async move {
                    match result {
                        Ok((obj, action)) => {
                            debug!(resource = %obj, ?action, "watch.event.reconciled");
                        }
                        // Already logged by the error policy
                        Err(ControllerError::ReconcilerFailed(_, obj)) => {
                            debug!(resource = %obj, "watch.event.reconciliation_failed");
                        }
                        // A retry fired for a stack that was deleted meanwhile
                        Err(ControllerError::ObjectNotFound(obj)) => {
                            forget_deleted_stack(
                                &reconciler.backoff_states,
                                obj.namespace.as_deref(),
                                &obj.name,
                            );
                        }
                        Err(e) => {
                            log_watch_stream_error(&format!("{e:?}"));
                        }
                    }
                }
            })
            .await;

        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            restart_delay.as_secs()
        );
        tokio::time::sleep(restart_delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}

/// Wait for SIGINT or SIGTERM and name the one that arrived
///
/// The SIGTERM handler is installed before this returns.
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = &'static str> + Send> {
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        }
    })
}

/// Clear readiness once `received` fires, then stop the running controller
///
/// Readiness is cleared first so the loop does not restart the stream.
async fn mark_shutdown<F>(received: F, state: Arc<ServerState>, shutdown: Arc<Notify>)
where
    F: Future<Output = &'static str>,
{
    let name = received.await;
    info!("Received {name}, initiating graceful shutdown...");
    state.set_ready(false);
    shutdown.notify_one();
    info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
}

/// Drop the backoff of a stack that no longer exists
fn forget_deleted_stack(
    states: &Mutex<HashMap<StackKey, BackoffState>>,
    namespace: Option<&str>,
    name: &str,
) -> bool {
    let key = StackKey::new(namespace.unwrap_or_default(), name);
    let forgotten = forget_backoff(states, &key);
    if forgotten {
        debug!(resource = %key, "Dropped backoff of deleted stack");
    }
    forgotten
}

/// Map a component pod to the stack named by its instance label
fn pod_to_stack(pod: Pod) -> Option<ObjectRef<LokiStack>> {
    let instance = pod.labels().get(LABEL_INSTANCE)?;
    let namespace = pod.namespace()?;
    Some(ObjectRef::new(instance).within(&namespace))
}

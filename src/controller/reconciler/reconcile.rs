//! # Reconciliation Logic
//!
//! Main reconciliation loop for LokiStack resources.
//!
//! Each pass validates the stack, then derives one of Ready, Failed or
//! Pending from the component pods. Validation failures are reported as a
//! Degraded condition and stop the pass.

use crate::config::ControllerConfig;
use crate::constants::LABEL_INSTANCE;
use crate::controller::reconciler::components::{ComponentStatus, PodPhase};
use crate::controller::reconciler::status::{
    handle_degraded_error, refresh_conditions, ConditionUpdate, StatusError, StatusStore,
};
use crate::controller::reconciler::types::{Reconciler, ReconcilerError, StackKey};
use crate::controller::reconciler::validation::validate_stack;
use crate::crd::{ConditionKind, ConditionReason, LokiStack, ManagementState};
use crate::observability;
use anyhow::Context;
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::api::{Api, ListParams};
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// What a single pass did to the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The stack is not managed by the operator
    Unmanaged,
    /// Validation failed and the Degraded condition was set
    Degraded {
        reason: ConditionReason,
        update: ConditionUpdate,
        requeue: bool,
    },
    /// One of Ready, Failed or Pending was set from the component pods
    Refreshed {
        kind: ConditionKind,
        update: ConditionUpdate,
    },
}

impl ReconcileOutcome {
    /// Controller action following this outcome
    #[must_use]
    pub fn action(&self, config: &ControllerConfig) -> Action {
        match self {
            Self::Degraded { requeue: true, .. } => {
                Action::requeue(config.degraded_requeue_interval())
            }
            Self::Degraded { requeue: false, .. }
            | Self::Refreshed {
                update: ConditionUpdate::Gone,
                ..
            } => Action::await_change(),
            Self::Unmanaged | Self::Refreshed { .. } => Action::requeue(config.resync_interval()),
        }
    }
}

/// Reconcile one LokiStack
///
/// Reads the storage secret and the component pods from the cluster, then
/// hands them to [`sync_conditions`].
pub async fn reconcile(
    stack: Arc<LokiStack>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    let key = StackKey::from_stack(&stack)?;
    observability::metrics::increment_reconciliations();

    let span = info_span!(
        "controller.reconcile",
        resource.namespace = key.namespace.as_str(),
        resource.name = key.name.as_str(),
        resource.generation = stack.metadata.generation.unwrap_or(0),
    );

    let result = async {
        let (storage_secret, pods) = if stack.spec.management_state == ManagementState::Unmanaged {
            (None, Vec::new())
        } else {
            fetch_inputs(&ctx, &stack, &key).await?
        };

        let outcome = sync_conditions(
            ctx.store.as_ref(),
            &key,
            &stack,
            storage_secret.as_ref(),
            &pods,
        )
        .await?;

        ctx.reset_backoff(&key);
        Ok::<_, ReconcilerError>(outcome.action(&ctx.config))
    }
    .instrument(span)
    .await;

    observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    result
}

/// Fetch the storage secret and the pods of the stack's components
async fn fetch_inputs(
    ctx: &Reconciler,
    stack: &LokiStack,
    key: &StackKey,
) -> Result<(Option<Secret>, Vec<Pod>), ReconcilerError> {
    let secret_name = stack.spec.storage.secret.name.as_str();
    let storage_secret = if secret_name.is_empty() {
        None
    } else {
        let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), &key.namespace);
        secrets.get_opt(secret_name).await.with_context(|| {
            format!("Failed to get storage secret {}/{secret_name}", key.namespace)
        })?
    };

    let pods: Api<Pod> = Api::namespaced(ctx.client.clone(), &key.namespace);
    let selector = format!("{LABEL_INSTANCE}={}", key.name);
    let pods = pods
        .list(&ListParams::default().labels(&selector))
        .await
        .with_context(|| format!("Failed to list pods for {key}"))?
        .items;

    Ok((storage_secret, pods))
}

/// Bring the stack's conditions in line with its inputs
///
/// The stack itself is only consulted for its spec; conditions are always
/// re-read from the store.
pub async fn sync_conditions<S>(
    store: &S,
    key: &StackKey,
    stack: &LokiStack,
    storage_secret: Option<&Secret>,
    pods: &[Pod],
) -> Result<ReconcileOutcome, StatusError>
where
    S: StatusStore + ?Sized,
{
    if stack.spec.management_state == ManagementState::Unmanaged {
        debug!("Skipping reconciliation - stack is unmanaged");
        return Ok(ReconcileOutcome::Unmanaged);
    }

    if let Err(degraded) = validate_stack(&stack.spec, storage_secret) {
        warn!(reason = %degraded.reason, "Stack is degraded: {}", degraded.message);
        let update = handle_degraded_error(store, key, &degraded).await?;
        record_update(ConditionKind::Degraded, update);
        return Ok(ReconcileOutcome::Degraded {
            reason: degraded.reason,
            update,
            requeue: degraded.requeue,
        });
    }

    let components = ComponentStatus::from_pods(pods);
    let (kind, update) = refresh_conditions(store, key, &components).await?;
    if kind == ConditionKind::Failed && update == ConditionUpdate::Written {
        warn!(pods = ?components.pod_names(PodPhase::Failed), "Stack has failed components");
    }
    record_update(kind, update);
    Ok(ReconcileOutcome::Refreshed { kind, update })
}

fn record_update(kind: ConditionKind, update: ConditionUpdate) {
    match update {
        ConditionUpdate::Written => {
            info!(condition = %kind, "Condition updated");
            observability::metrics::increment_condition_writes(kind.as_str());
        }
        ConditionUpdate::Unchanged => {
            debug!(condition = %kind, "Condition already current");
            observability::metrics::increment_condition_skips(kind.as_str());
        }
        ConditionUpdate::Gone => {
            debug!(condition = %kind, "Stack no longer exists");
        }
    }
}

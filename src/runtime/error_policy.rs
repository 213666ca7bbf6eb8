//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and watch stream errors.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{BackoffState, Reconciler, ReconcilerError, StackKey};
use crate::crd::LokiStack;
use crate::observability;
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Handle reconciliation errors with Fibonacci backoff
///
/// Backoff state is tracked per resource to avoid cross-resource interference.
pub fn handle_reconciliation_error(
    obj: Arc<LokiStack>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let key = StackKey::new(
        obj.metadata.namespace.as_deref().unwrap_or("default"),
        obj.metadata.name.as_deref().unwrap_or("unknown"),
    );

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = key.name.as_str(),
        resource.namespace = key.namespace.as_str(),
        error = %error
    );
    let _error_guard = error_span.enter();

    if matches!(error, ReconcilerError::Status(e) if e.is_gone()) {
        debug!("{} was deleted during reconciliation, dropping its backoff", key);
        forget_backoff(&ctx.backoff_states, &key);
        return Action::await_change();
    }

    if matches!(error, ReconcilerError::Status(e) if e.is_conflict()) {
        warn!("Status of {} changed during reconciliation, retrying", key);
    } else {
        error!("Reconciliation error for {}: {:?}", key, error);
    }
    observability::metrics::increment_reconciliation_errors();

    let (delay, error_count) = next_backoff(&ctx.backoff_states, &ctx.config, &key);

    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::seconds(60));
    info!(
        "Retrying {} with Fibonacci backoff: {}s (error count: {}, next retry: {})",
        key,
        delay.as_secs(),
        error_count,
        next_trigger_time.to_rfc3339()
    );

    Action::requeue(delay)
}

/// Advance the backoff of `key` and return the delay with the error count so far
pub fn next_backoff(
    states: &Mutex<HashMap<StackKey, BackoffState>>,
    config: &ControllerConfig,
    key: &StackKey,
) -> (Duration, u32) {
    match states.lock() {
        Ok(mut states) => {
            let state = states
                .entry(key.clone())
                .or_insert_with(|| BackoffState::new(config));
            state.increment_error();
            (state.backoff.next_backoff(), state.error_count)
        }
        Err(e) => {
            warn!(
                "Failed to lock backoff_states: {}, using maximum backoff",
                e
            );
            (config.backoff_max_duration(), 0)
        }
    }
}

/// Drop the backoff of `key`; returns whether there was one
pub fn forget_backoff(states: &Mutex<HashMap<StackKey, BackoffState>>, key: &StackKey) -> bool {
    match states.lock() {
        Ok(mut states) => states.remove(key).is_some(),
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, keeping entry for {}", e, key);
            false
        }
    }
}

/// Broad category of a watch stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    NotFound,
    Unauthorized,
    Expired,
    TooManyRequests,
    Other,
}

impl WatchErrorKind {
    /// Classify from the debug rendering of the error
    ///
    /// 404 is checked before 401: a plain-text 404 body surfaces as a
    /// deserialization error that also mentions `WatchFailed`. A status code
    /// counts only when written as `code: N`, `"N"` or `` `N` ``.
    #[must_use]
    pub fn classify(error_string: &str) -> Self {
        let is_not_found = error_string.contains("ObjectNotFound")
            || has_status_code(error_string, 404)
            || error_string.contains("not found");
        if is_not_found {
            Self::NotFound
        } else if has_status_code(error_string, 401) || error_string.contains("Unauthorized") {
            Self::Unauthorized
        } else if has_status_code(error_string, 410)
            || error_string.contains("too old resource version")
            || error_string.contains("Expired")
        {
            Self::Expired
        } else if has_status_code(error_string, 429) || error_string.contains("TooManyRequests") {
            Self::TooManyRequests
        } else {
            Self::Other
        }
    }
}

fn has_status_code(error_string: &str, code: u16) -> bool {
    [
        format!("code: {code}"),
        format!("\"{code}\""),
        format!("`{code}`"),
    ]
    .iter()
    .any(|pattern| error_string.contains(pattern.as_str()))
}

/// Log a watch stream error according to its kind
pub fn log_watch_stream_error(error_string: &str) -> WatchErrorKind {
    let kind = WatchErrorKind::classify(error_string);
    match kind {
        WatchErrorKind::NotFound => warn!(
            "LokiStack or CRD not found (404), this may be normal if the resource was deleted: {}",
            error_string
        ),
        WatchErrorKind::Unauthorized => error!(
            "Watch authentication failed (401 Unauthorized), RBAC may have been revoked or the token expired"
        ),
        WatchErrorKind::Expired => warn!(
            error_type = "410",
            "Watch resource version expired, watch will restart"
        ),
        WatchErrorKind::TooManyRequests => warn!(
            error_type = "429",
            "API server is throttling watch requests"
        ),
        WatchErrorKind::Other => error!("Controller stream error: {}", error_string),
    }
    kind
}

//! # Error Handling Unit Tests
//!
//! These tests verify:
//! - Backoff calculation using Fibonacci sequence
//! - Per-resource backoff isolation in the error policy
//! - Watch error classification
//! - Error propagation and wrapping
//! - Backoff cleanup for stacks deleted while failing

use kube_runtime::controller::Action;
use lokistack_controller::config::ControllerConfig;
use lokistack_controller::controller::backoff::FibonacciBackoff;
use lokistack_controller::controller::reconciler::status::{StatusError, StoreError};
use lokistack_controller::controller::reconciler::{Reconciler, ReconcilerError, StackKey};
use lokistack_controller::crd::{LokiStack, LokiStackSpec};
use lokistack_controller::runtime::error_policy::{
    handle_reconciliation_error, next_backoff, WatchErrorKind,
};
use std::collections::HashMap;
use std::error::Error as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Context whose client points at an address nothing listens on
fn offline_reconciler() -> Arc<Reconciler> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let config = kube::Config::new("http://127.0.0.1:9".parse().unwrap());
    let client = kube::Client::try_from(config).unwrap();
    Arc::new(Reconciler::new(client, ControllerConfig::default()))
}

fn failing_stack() -> Arc<LokiStack> {
    let mut stack = LokiStack::new("my-stack", LokiStackSpec::default());
    stack.metadata.namespace = Some("some-ns".to_string());
    Arc::new(stack)
}

#[test]
fn test_backoff_calculation_fibonacci_sequence() {
    let mut backoff = FibonacciBackoff::new(Duration::from_secs(5), Duration::from_secs(300));
    let expected = [5, 5, 10, 15, 25, 40, 65, 105, 170, 275, 300, 300];

    for (attempt, expected_seconds) in expected.into_iter().enumerate() {
        let delay = backoff.next_backoff();
        assert_eq!(
            delay.as_secs(),
            expected_seconds,
            "Backoff for attempt {} should be {} seconds, got {}",
            attempt,
            expected_seconds,
            delay.as_secs()
        );
    }
}

#[test]
fn test_error_policy_backoff_uses_configured_bounds() {
    let config = ControllerConfig {
        backoff_min_secs: 1,
        backoff_max_secs: 3,
        ..ControllerConfig::default()
    };
    let states = Mutex::new(HashMap::new());
    let key = StackKey::new("some-ns", "my-stack");

    let delays: Vec<u64> = (0..5)
        .map(|_| next_backoff(&states, &config, &key).0.as_secs())
        .collect();
    assert_eq!(delays, vec![1, 1, 2, 3, 3]);
}

#[test]
fn test_error_policy_counts_errors_per_resource() {
    let config = ControllerConfig::default();
    let states = Mutex::new(HashMap::new());
    let a = StackKey::new("team-a", "logs");
    let b = StackKey::new("team-b", "logs");

    next_backoff(&states, &config, &a);
    next_backoff(&states, &config, &a);
    let (_, count_a) = next_backoff(&states, &config, &a);
    let (_, count_b) = next_backoff(&states, &config, &b);

    assert_eq!(count_a, 3);
    assert_eq!(count_b, 1);
}

#[test]
fn test_plain_text_404_is_not_unauthorized() {
    let error = "WatchFailed(Api(ErrorResponse { status: \"404\", message: \"401 in body\" }))";
    assert_eq!(WatchErrorKind::classify(error), WatchErrorKind::NotFound);
}

#[test]
fn test_status_error_keeps_store_error_as_source() {
    let err = StatusError::Lookup {
        key: StackKey::new("some-ns", "my-stack"),
        source: StoreError::Rejected {
            code: 503,
            message: "unavailable".to_string(),
        },
    };

    assert_eq!(err.to_string(), "failed to lookup LokiStack some-ns/my-stack");
    let source = err.source().map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("request rejected (503): unavailable"));
}

#[test]
fn test_conflict_classification_survives_wrapping() {
    let status = StatusError::Update {
        key: StackKey::new("some-ns", "my-stack"),
        source: StoreError::Conflict {
            message: "the object has been modified".to_string(),
        },
    };
    assert!(status.is_conflict());

    let reconciler: ReconcilerError = status.into();
    assert!(matches!(&reconciler, ReconcilerError::Status(e) if e.is_conflict()));
}

#[test]
fn test_lookup_error_is_not_a_conflict() {
    let err = StatusError::Lookup {
        key: StackKey::new("some-ns", "my-stack"),
        source: StoreError::Conflict {
            message: "unexpected".to_string(),
        },
    };
    assert!(!err.is_conflict());
}

#[tokio::test]
async fn test_stack_deleted_while_failing_drops_backoff() {
    let ctx = offline_reconciler();
    let key = StackKey::new("some-ns", "my-stack");
    let transient: ReconcilerError = StatusError::Update {
        key: key.clone(),
        source: StoreError::Rejected {
            code: 503,
            message: "unavailable".to_string(),
        },
    }
    .into();

    let action = handle_reconciliation_error(failing_stack(), &transient, Arc::clone(&ctx));
    assert_eq!(action, Action::requeue(Duration::from_secs(5)));
    assert!(ctx.backoff_states.lock().unwrap().contains_key(&key));

    let deleted: ReconcilerError = StatusError::Update {
        key: key.clone(),
        source: StoreError::NotFound,
    }
    .into();

    let action = handle_reconciliation_error(failing_stack(), &deleted, Arc::clone(&ctx));
    assert_eq!(action, Action::await_change());
    assert!(ctx.backoff_states.lock().unwrap().is_empty());
}

#[test]
fn test_resource_version_digits_are_not_a_404() {
    let error = "Api(ErrorResponse { message: \"too many writes at 14045\", code: 500 })";
    assert_eq!(WatchErrorKind::classify(error), WatchErrorKind::Other);
}

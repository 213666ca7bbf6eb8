//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::reconciler::status::{KubeStatusStore, StatusError, StatusStore};
use crate::crd::LokiStack;
use crate::runtime::error_policy::forget_backoff;
use kube::{Client, ResourceExt};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("LokiStack is missing metadata.{0}")]
    MissingMetadata(&'static str),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error("Reconciliation failed: {0}")]
    ReconciliationFailed(#[from] anyhow::Error),
}

/// Namespace and name of one LokiStack
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackKey {
    pub namespace: String,
    pub name: String,
}

impl StackKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an object read from the cluster
    pub fn from_stack(stack: &LokiStack) -> Result<Self, ReconcilerError> {
        let namespace = stack
            .namespace()
            .ok_or(ReconcilerError::MissingMetadata("namespace"))?;
        let name = stack
            .metadata
            .name
            .clone()
            .ok_or(ReconcilerError::MissingMetadata("name"))?;
        Ok(Self { namespace, name })
    }
}

impl fmt::Display for StackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            backoff: FibonacciBackoff::new(
                config.backoff_min_duration(),
                config.backoff_max_duration(),
            ),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}

/// Shared context handed to every reconciliation
pub struct Reconciler {
    pub client: Client,
    pub store: Arc<dyn StatusStore>,
    pub config: ControllerConfig,
    // Per resource (namespace/name), owned by the error policy
    pub backoff_states: Mutex<HashMap<StackKey, BackoffState>>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(client: Client, config: ControllerConfig) -> Self {
        let store: Arc<dyn StatusStore> = Arc::new(KubeStatusStore::new(client.clone()));
        Self {
            client,
            store,
            config,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Forget the error history of a resource once it reconciled or was deleted
    pub fn reset_backoff(&self, key: &StackKey) {
        forget_backoff(&self.backoff_states, key);
    }
}

//! # Degraded Errors
//!
//! Validation failures that should surface as a Degraded condition instead
//! of a reconciliation error.

use crate::controller::reconciler::status::conditions::{
    set_degraded_condition, ConditionUpdate, StatusError,
};
use crate::controller::reconciler::status::store::StatusStore;
use crate::controller::reconciler::types::StackKey;
use crate::crd::ConditionReason;
use thiserror::Error;

/// The stack cannot be reconciled as specified
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({reason})")]
pub struct DegradedError {
    pub message: String,
    pub reason: ConditionReason,
    /// Whether the controller should retry without waiting for a spec change
    pub requeue: bool,
}

impl DegradedError {
    pub fn new(reason: ConditionReason, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason,
            requeue: false,
        }
    }

    #[must_use]
    pub fn with_requeue(mut self) -> Self {
        self.requeue = true;
        self
    }
}

/// Report `err` as the stack's Degraded condition
pub async fn handle_degraded_error<S>(
    store: &S,
    key: &StackKey,
    err: &DegradedError,
) -> Result<ConditionUpdate, StatusError>
where
    S: StatusStore + ?Sized,
{
    set_degraded_condition(store, key, &err.message, err.reason).await
}

//! # Condition Updates
//!
//! Sets one of the four LokiStack health conditions (Ready, Failed, Degraded,
//! Pending) to `True`.
//!
//! Every call performs one read and at most one write: the stack is fetched,
//! the condition list is compared with the target, and the status is written
//! back only when the list actually changed. A stack that no longer exists is
//! not an error. Other condition types on the stack are never touched, so
//! clearing a previously reported kind is up to the caller.
//!
//! Nothing in this module logs or records metrics; callers inspect the
//! returned [`ConditionUpdate`] instead.

use crate::constants::{MESSAGE_FAILED, MESSAGE_PENDING, MESSAGE_READY};
use crate::controller::reconciler::status::store::{StatusStore, StoreError};
use crate::controller::reconciler::types::StackKey;
use crate::crd::{Condition, ConditionKind, ConditionReason, ConditionStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned by the condition setters
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("failed to lookup LokiStack {key}")]
    Lookup {
        key: StackKey,
        #[source]
        source: StoreError,
    },
    #[error("failed to update LokiStack {key} status")]
    Update {
        key: StackKey,
        #[source]
        source: StoreError,
    },
    #[error("invalid {kind} condition for LokiStack {key}: {detail}")]
    InvalidInput {
        key: StackKey,
        kind: ConditionKind,
        detail: &'static str,
    },
}

impl StatusError {
    /// True when the write lost an optimistic-concurrency race
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StatusError::Update { source, .. } if source.is_conflict())
    }

    /// True when the stack was deleted between the read and the write
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(self, StatusError::Update { source, .. } if source.is_not_found())
    }
}

/// Outcome of a successful condition update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionUpdate {
    /// The condition list changed and was written
    Written,
    /// The condition was already set as requested, nothing was written
    Unchanged,
    /// The stack no longer exists, nothing was written
    Gone,
}

/// Condition a setter drives to `True`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionTarget<'a> {
    pub kind: ConditionKind,
    pub reason: &'a str,
    pub message: &'a str,
}

impl ConditionTarget<'static> {
    /// Target with the default reason and message of `kind`
    ///
    /// Degraded has no defaults and yields `None`.
    #[must_use]
    pub fn default_for(kind: ConditionKind) -> Option<Self> {
        let (reason, message) = match kind {
            ConditionKind::Ready => (ConditionReason::ReadyComponents, MESSAGE_READY),
            ConditionKind::Failed => (ConditionReason::FailedComponents, MESSAGE_FAILED),
            ConditionKind::Pending => (ConditionReason::PendingComponents, MESSAGE_PENDING),
            ConditionKind::Degraded => return None,
        };
        Some(Self {
            kind,
            reason: reason.as_str(),
            message,
        })
    }
}

impl ConditionTarget<'_> {
    fn matches(&self, condition: &Condition) -> bool {
        condition.is_true()
            && condition.reason.as_deref() == Some(self.reason)
            && condition.message.as_deref() == Some(self.message)
    }
}

/// First condition of the given kind
#[must_use]
pub fn find_condition(conditions: &[Condition], kind: ConditionKind) -> Option<&Condition> {
    conditions.iter().find(|c| c.is_kind(kind))
}

/// Drive the target condition to `True` in memory
///
/// Updates the existing entry for the kind in place or appends a new one.
/// The transition time moves only when the status flips or the entry is new.
/// Returns `false` when the list already satisfied the target.
pub fn apply_condition(
    conditions: &mut Vec<Condition>,
    target: &ConditionTarget<'_>,
    now: DateTime<Utc>,
) -> bool {
    let now = now.to_rfc3339();

    match conditions.iter_mut().find(|c| c.is_kind(target.kind)) {
        Some(existing) if target.matches(existing) => false,
        Some(existing) => {
            if !existing.is_true() {
                existing.status = ConditionStatus::True.as_str().to_string();
                existing.last_transition_time = Some(now);
            }
            existing.reason = Some(target.reason.to_string());
            existing.message = Some(target.message.to_string());
            true
        }
        None => {
            conditions.push(Condition {
                r#type: target.kind.as_str().to_string(),
                status: ConditionStatus::True.as_str().to_string(),
                last_transition_time: Some(now),
                reason: Some(target.reason.to_string()),
                message: Some(target.message.to_string()),
                observed_generation: None,
            });
            true
        }
    }
}

/// Fetch, compare and, if needed, write one condition
pub async fn set_condition<S>(
    store: &S,
    key: &StackKey,
    target: ConditionTarget<'_>,
) -> Result<ConditionUpdate, StatusError>
where
    S: StatusStore + ?Sized,
{
    let mut stack = match store.get(key).await {
        Ok(stack) => stack,
        Err(StoreError::NotFound) => return Ok(ConditionUpdate::Gone),
        Err(source) => {
            return Err(StatusError::Lookup {
                key: key.clone(),
                source,
            })
        }
    };

    let generation = stack.metadata.generation;
    let status = stack.status.get_or_insert_with(Default::default);
    if !apply_condition(&mut status.conditions, &target, Utc::now()) {
        return Ok(ConditionUpdate::Unchanged);
    }
    if let Some(condition) = status
        .conditions
        .iter_mut()
        .find(|c| c.is_kind(target.kind))
    {
        condition.observed_generation = generation;
    }

    store
        .update_status(&stack)
        .await
        .map_err(|source| StatusError::Update {
            key: key.clone(),
            source,
        })?;

    Ok(ConditionUpdate::Written)
}

async fn set_default_condition<S>(
    store: &S,
    key: &StackKey,
    kind: ConditionKind,
) -> Result<ConditionUpdate, StatusError>
where
    S: StatusStore + ?Sized,
{
    let target = ConditionTarget::default_for(kind).ok_or_else(|| StatusError::InvalidInput {
        key: key.clone(),
        kind,
        detail: "no default reason",
    })?;
    set_condition(store, key, target).await
}

/// Report that every component of the stack is running
pub async fn set_ready_condition<S>(
    store: &S,
    key: &StackKey,
) -> Result<ConditionUpdate, StatusError>
where
    S: StatusStore + ?Sized,
{
    set_default_condition(store, key, ConditionKind::Ready).await
}

/// Report that at least one component of the stack failed
pub async fn set_failed_condition<S>(
    store: &S,
    key: &StackKey,
) -> Result<ConditionUpdate, StatusError>
where
    S: StatusStore + ?Sized,
{
    set_default_condition(store, key, ConditionKind::Failed).await
}

/// Report that components of the stack are waiting on dependencies
pub async fn set_pending_condition<S>(
    store: &S,
    key: &StackKey,
) -> Result<ConditionUpdate, StatusError>
where
    S: StatusStore + ?Sized,
{
    set_default_condition(store, key, ConditionKind::Pending).await
}

/// Report that the stack is degraded for `reason`
///
/// Rejects an empty message before touching the store.
pub async fn set_degraded_condition<S>(
    store: &S,
    key: &StackKey,
    message: &str,
    reason: ConditionReason,
) -> Result<ConditionUpdate, StatusError>
where
    S: StatusStore + ?Sized,
{
    if message.trim().is_empty() {
        return Err(StatusError::InvalidInput {
            key: key.clone(),
            kind: ConditionKind::Degraded,
            detail: "message must not be empty",
        });
    }

    let target = ConditionTarget {
        kind: ConditionKind::Degraded,
        reason: reason.as_str(),
        message,
    };
    set_condition(store, key, target).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn ready_target() -> ConditionTarget<'static> {
        ConditionTarget::default_for(ConditionKind::Ready).unwrap()
    }

    #[test]
    fn test_defaults_per_kind() {
        let failed = ConditionTarget::default_for(ConditionKind::Failed).unwrap();
        assert_eq!(failed.reason, "FailedComponents");
        assert_eq!(failed.message, MESSAGE_FAILED);

        let pending = ConditionTarget::default_for(ConditionKind::Pending).unwrap();
        assert_eq!(pending.reason, "PendingComponents");

        assert!(ConditionTarget::default_for(ConditionKind::Degraded).is_none());
    }

    #[test]
    fn test_apply_appends_when_absent() {
        let mut conditions = Vec::new();
        assert!(apply_condition(&mut conditions, &ready_target(), at(10)));
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].r#type, "Ready");
        assert_eq!(conditions[0].status, "True");
        assert_eq!(conditions[0].reason.as_deref(), Some("ReadyComponents"));
        assert_eq!(
            conditions[0].last_transition_time.as_deref(),
            Some(at(10).to_rfc3339().as_str())
        );
    }

    #[test]
    fn test_apply_is_noop_when_already_true_with_same_reason() {
        let mut conditions = vec![Condition::new(ConditionKind::Ready, ConditionStatus::True)
            .with_reason(ConditionReason::ReadyComponents, MESSAGE_READY)];
        let before = conditions.clone();
        assert!(!apply_condition(&mut conditions, &ready_target(), at(10)));
        assert_eq!(conditions, before);
    }

    #[test]
    fn test_apply_updates_stale_entry_in_place() {
        let mut conditions = vec![
            Condition::new(ConditionKind::Pending, ConditionStatus::True),
            Condition::new(ConditionKind::Ready, ConditionStatus::False),
        ];
        assert!(apply_condition(&mut conditions, &ready_target(), at(20)));
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[1].r#type, "Ready");
        assert_eq!(conditions[1].status, "True");
        assert!(conditions[1].last_transition_time.is_some());
    }

    #[test]
    fn test_apply_keeps_transition_time_when_only_message_changes() {
        let mut conditions = vec![Condition {
            last_transition_time: Some(at(5).to_rfc3339()),
            ..Condition::new(ConditionKind::Degraded, ConditionStatus::True)
                .with_reason(ConditionReason::MissingObjectStorageSecret, "old")
        }];
        let target = ConditionTarget {
            kind: ConditionKind::Degraded,
            reason: ConditionReason::MissingObjectStorageSecret.as_str(),
            message: "new",
        };
        assert!(apply_condition(&mut conditions, &target, at(50)));
        assert_eq!(conditions[0].message.as_deref(), Some("new"));
        assert_eq!(
            conditions[0].last_transition_time.as_deref(),
            Some(at(5).to_rfc3339().as_str())
        );
    }

    #[test]
    fn test_apply_leaves_other_kinds_untouched() {
        let failed = Condition::new(ConditionKind::Failed, ConditionStatus::True)
            .with_reason(ConditionReason::FailedComponents, MESSAGE_FAILED);
        let mut conditions = vec![failed.clone()];
        assert!(apply_condition(&mut conditions, &ready_target(), at(1)));
        assert_eq!(conditions[0], failed);
        assert_eq!(conditions.len(), 2);
    }

    #[test]
    fn test_find_condition_by_kind() {
        let conditions = vec![
            Condition::new(ConditionKind::Failed, ConditionStatus::False),
            Condition::new(ConditionKind::Pending, ConditionStatus::True),
        ];
        let found = find_condition(&conditions, ConditionKind::Pending).unwrap();
        assert!(found.is_true());
        assert!(find_condition(&conditions, ConditionKind::Ready).is_none());
    }

    #[test]
    fn test_conflict_classification() {
        let err = StatusError::Update {
            key: StackKey::new("some-ns", "my-stack"),
            source: StoreError::Conflict {
                message: "the object has been modified".to_string(),
            },
        };
        assert!(err.is_conflict());
        assert!(!err.is_gone());
        assert_eq!(err.to_string(), "failed to update LokiStack some-ns/my-stack status");
    }

    #[test]
    fn test_not_found_on_write_is_gone() {
        let key = StackKey::new("some-ns", "my-stack");
        let on_write = StatusError::Update {
            key: key.clone(),
            source: StoreError::NotFound,
        };
        assert!(on_write.is_gone());
        assert!(!on_write.is_conflict());

        let on_read = StatusError::Lookup {
            key,
            source: StoreError::NotFound,
        };
        assert!(!on_read.is_gone());
    }
}

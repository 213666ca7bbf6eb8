//! # Status Refresh
//!
//! Picks the condition that describes the current component pods and sets it.

use crate::controller::reconciler::components::{ComponentStatus, PodPhase};
use crate::controller::reconciler::status::conditions::{
    set_failed_condition, set_pending_condition, set_ready_condition, ConditionUpdate,
    StatusError,
};
use crate::controller::reconciler::status::store::StatusStore;
use crate::controller::reconciler::types::StackKey;
use crate::crd::ConditionKind;

/// Condition kind implied by the component pods
///
/// Any failed pod wins over pending ones. A stack without pods is still
/// waiting for its workloads and counts as pending.
#[must_use]
pub fn condition_for(components: &ComponentStatus) -> ConditionKind {
    if components.count(PodPhase::Failed) > 0 {
        ConditionKind::Failed
    } else if components.is_empty()
        || components.count(PodPhase::Pending) > 0
        || components.count(PodPhase::Unknown) > 0
    {
        ConditionKind::Pending
    } else {
        ConditionKind::Ready
    }
}

/// Set the Ready, Failed or Pending condition for the stack
///
/// Only the selected kind is written. Kinds set by earlier passes keep their
/// status, so after a recovery from Failed the stack carries both
/// `Failed=True` and `Ready=True`, and a stale `Degraded=True` stays as well.
/// Read `lastTransitionTime` to tell which one is current.
pub async fn refresh_conditions<S>(
    store: &S,
    key: &StackKey,
    components: &ComponentStatus,
) -> Result<(ConditionKind, ConditionUpdate), StatusError>
where
    S: StatusStore + ?Sized,
{
    let kind = condition_for(components);
    let update = match kind {
        ConditionKind::Failed => set_failed_condition(store, key).await?,
        ConditionKind::Pending => set_pending_condition(store, key).await?,
        _ => set_ready_condition(store, key).await?,
    };
    Ok((kind, update))
}

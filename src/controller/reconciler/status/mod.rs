//! # Status Management
//!
//! Keeps the Ready, Failed, Degraded and Pending conditions of a LokiStack
//! up to date.

mod conditions;
mod degraded;
mod refresh;
mod store;

pub use conditions::{
    apply_condition, find_condition, set_condition, set_degraded_condition,
    set_failed_condition, set_pending_condition, set_ready_condition, ConditionTarget,
    ConditionUpdate, StatusError,
};
pub use degraded::{handle_degraded_error, DegradedError};
pub use refresh::{condition_for, refresh_conditions};
pub use store::{KubeStatusStore, StatusStore, StoreError};

//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use lokistack_controller::prelude::*;
//! ```

// CRD types - most commonly used
pub use crate::crd::*;

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile, ComponentStatus, Reconciler, ReconcilerError, StackKey,
};

// Condition setters and the store they write through
pub use crate::controller::reconciler::status::{
    handle_degraded_error, refresh_conditions, set_degraded_condition, set_failed_condition,
    set_pending_condition, set_ready_condition, ConditionUpdate, DegradedError, StatusError,
    StatusStore, StoreError,
};

// Config types - for configuration management
pub use crate::config::ControllerConfig;

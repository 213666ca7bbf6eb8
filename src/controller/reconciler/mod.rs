//! # Reconciler
//!
//! Core reconciliation logic for `LokiStack` resources.
//!
//! The reconciler:
//! - Watches `LokiStack` resources across all namespaces (or one, if configured)
//! - Validates the object storage secret and replication settings
//! - Aggregates the phases of the stack's component pods
//! - Keeps the Ready, Failed, Degraded and Pending conditions in the status current
//!
//! ## Reconciliation Flow
//!
//! 1. Skip unmanaged stacks
//! 2. Validate storage and replication; failures set Degraded
//! 3. List component pods by instance label
//! 4. Set Failed, Pending or Ready from the pod phases

pub mod components;
pub mod reconcile;
pub mod status;
pub mod types;
pub mod validation;

// Re-export public API
pub use components::{Component, ComponentStatus, PodPhase};
pub use reconcile::{reconcile, sync_conditions, ReconcileOutcome};
pub use types::{BackoffState, Reconciler, ReconcilerError, StackKey};
pub use validation::validate_stack;

//! # Custom Resource Definitions
//!
//! CRD types for the LokiStack controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - Main CRD specification and sizes
//! - `storage.rs` - Object storage secret reference
//! - `status.rs` - Status types and the condition vocabulary

mod spec;
mod status;
mod storage;

// Re-export all public types
pub use spec::{LokiStack, LokiStackSize, LokiStackSpec, ManagementState};
pub use status::{Condition, ConditionKind, ConditionReason, ConditionStatus, LokiStackStatus};
pub use storage::{ObjectStorageSecretSpec, ObjectStorageSecretType, ObjectStorageSpec};

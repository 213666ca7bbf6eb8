//! # LokiStack Status
//!
//! Status types and the condition vocabulary reported on a LokiStack.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of the LokiStack resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LokiStackStatus {
    /// Conditions represent the latest available observations
    /// At most one entry per condition type
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last time the status changed (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    /// Machine-readable reason for the condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Message describing the condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Generation the condition was computed against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    /// Condition of the given kind and status with no reason or message
    #[must_use]
    pub fn new(kind: ConditionKind, status: ConditionStatus) -> Self {
        Self {
            r#type: kind.as_str().to_string(),
            status: status.as_str().to_string(),
            last_transition_time: None,
            reason: None,
            message: None,
            observed_generation: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: ConditionReason, message: &str) -> Self {
        self.reason = Some(reason.as_str().to_string());
        self.message = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn is_kind(&self, kind: ConditionKind) -> bool {
        self.r#type == kind.as_str()
    }

    #[must_use]
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True.as_str()
    }
}

/// The four mutually exclusive health reports of a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// All components are running
    Ready,
    /// At least one component failed
    Failed,
    /// The stack is misconfigured or missing a dependency
    Degraded,
    /// Components are waiting to be scheduled or started
    Pending,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 4] = [
        ConditionKind::Ready,
        ConditionKind::Failed,
        ConditionKind::Degraded,
        ConditionKind::Pending,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionKind::Ready => "Ready",
            ConditionKind::Failed => "Failed",
            ConditionKind::Degraded => "Degraded",
            ConditionKind::Pending => "Pending",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable condition reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionReason {
    /// All components are running
    ReadyComponents,
    /// One or more components failed
    FailedComponents,
    /// One or more components are waiting on dependencies
    PendingComponents,
    /// The object storage secret referenced by the spec does not exist
    MissingObjectStorageSecret,
    /// The object storage secret lacks keys required by its type
    InvalidObjectStorageSecret,
    /// The replication factor cannot be satisfied by the selected size
    InvalidReplicationConfiguration,
    /// The storage class name is set but empty
    InvalidStorageClass,
}

impl ConditionReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionReason::ReadyComponents => "ReadyComponents",
            ConditionReason::FailedComponents => "FailedComponents",
            ConditionReason::PendingComponents => "PendingComponents",
            ConditionReason::MissingObjectStorageSecret => "MissingObjectStorageSecret",
            ConditionReason::InvalidObjectStorageSecret => "InvalidObjectStorageSecret",
            ConditionReason::InvalidReplicationConfiguration => "InvalidReplicationConfiguration",
            ConditionReason::InvalidStorageClass => "InvalidStorageClass",
        }
    }
}

impl fmt::Display for ConditionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

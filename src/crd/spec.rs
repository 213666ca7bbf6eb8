//! # LokiStack Spec
//!
//! Main CRD specification types and default values.

use serde::{Deserialize, Serialize};

/// LokiStack Custom Resource Definition
///
/// A LokiStack describes one Loki deployment made of several components
/// (distributor, ingester, querier, ...). The controller only reports the
/// stack's health through `status.conditions`.
///
/// # Example
///
/// ```yaml
/// apiVersion: loki.grafana.com/v1
/// kind: LokiStack
/// metadata:
///   name: my-stack
///   namespace: some-ns
/// spec:
///   size: 1x.small
///   storage:
///     secret:
///       name: loki-s3
///       type: s3
///   storageClassName: gp3
/// ```
#[derive(
    kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema,
)]
#[kube(
    kind = "LokiStack",
    group = "loki.grafana.com",
    version = "v1",
    namespaced,
    status = "crate::crd::LokiStackStatus",
    shortname = "ls",
    printcolumn = r#"{"name":"Size", "type":"string", "jsonPath":".spec.size"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct LokiStackSpec {
    /// T-shirt size of the deployment, selects replica counts per component
    #[serde(default)]
    pub size: LokiStackSize,
    /// Object storage used for chunks and indexes
    #[serde(default)]
    pub storage: crate::crd::ObjectStorageSpec,
    /// Storage class for the persistent volumes of stateful components
    #[serde(default)]
    pub storage_class_name: Option<String>,
    /// Number of ingesters each log stream is replicated to
    /// Must not exceed the ingester replicas of the selected size
    #[serde(default)]
    pub replication_factor: Option<i32>,
    /// Managed stacks are reconciled, Unmanaged stacks are left alone
    #[serde(default)]
    pub management_state: ManagementState,
}

/// Deployment size of a LokiStack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum LokiStackSize {
    #[default]
    #[serde(rename = "1x.demo")]
    OneXDemo,
    #[serde(rename = "1x.extra-small")]
    OneXExtraSmall,
    #[serde(rename = "1x.small")]
    OneXSmall,
    #[serde(rename = "1x.medium")]
    OneXMedium,
}

impl LokiStackSize {
    /// Number of ingester replicas deployed for this size
    #[must_use]
    pub fn ingester_replicas(self) -> i32 {
        match self {
            LokiStackSize::OneXDemo => 1,
            LokiStackSize::OneXExtraSmall | LokiStackSize::OneXSmall => 2,
            LokiStackSize::OneXMedium => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LokiStackSize::OneXDemo => "1x.demo",
            LokiStackSize::OneXExtraSmall => "1x.extra-small",
            LokiStackSize::OneXSmall => "1x.small",
            LokiStackSize::OneXMedium => "1x.medium",
        }
    }
}

/// Whether the controller reconciles the stack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ManagementState {
    #[default]
    Managed,
    Unmanaged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults_from_empty_object() {
        let spec: LokiStackSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.size, LokiStackSize::OneXDemo);
        assert_eq!(spec.management_state, ManagementState::Managed);
        assert!(spec.replication_factor.is_none());
        assert!(spec.storage_class_name.is_none());
    }

    #[test]
    fn test_size_uses_tshirt_names_on_the_wire() {
        let spec: LokiStackSpec =
            serde_json::from_str(r#"{"size":"1x.extra-small","managementState":"Unmanaged"}"#)
                .unwrap();
        assert_eq!(spec.size, LokiStackSize::OneXExtraSmall);
        assert_eq!(spec.management_state, ManagementState::Unmanaged);
        assert_eq!(
            serde_json::to_value(LokiStackSize::OneXMedium).unwrap(),
            serde_json::json!("1x.medium")
        );
    }

    #[test]
    fn test_ingester_replicas_per_size() {
        assert_eq!(LokiStackSize::OneXDemo.ingester_replicas(), 1);
        assert_eq!(LokiStackSize::OneXExtraSmall.ingester_replicas(), 2);
        assert_eq!(LokiStackSize::OneXSmall.ingester_replicas(), 2);
        assert_eq!(LokiStackSize::OneXMedium.ingester_replicas(), 3);
    }
}

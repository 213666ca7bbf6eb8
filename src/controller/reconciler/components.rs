//! # Component Status
//!
//! Groups the pods of a LokiStack by component and pod phase.

use crate::constants::LABEL_COMPONENT;
use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeMap;
use std::fmt;

/// Loki micro-services deployed for a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    Compactor,
    Distributor,
    Ingester,
    Querier,
    QueryFrontend,
    IndexGateway,
    Gateway,
    Ruler,
}

impl Component {
    pub const ALL: [Component; 8] = [
        Component::Compactor,
        Component::Distributor,
        Component::Ingester,
        Component::Querier,
        Component::QueryFrontend,
        Component::IndexGateway,
        Component::Gateway,
        Component::Ruler,
    ];

    /// Value of the component label on the component's pods
    #[must_use]
    pub fn label_value(self) -> &'static str {
        match self {
            Component::Compactor => "compactor",
            Component::Distributor => "distributor",
            Component::Ingester => "ingester",
            Component::Querier => "querier",
            Component::QueryFrontend => "query-frontend",
            Component::IndexGateway => "index-gateway",
            Component::Gateway => "lokistack-gateway",
            Component::Ruler => "ruler",
        }
    }

    #[must_use]
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label_value() == value)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label_value())
    }
}

/// Kubernetes pod phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// Absent or unrecognised phases count as Unknown
    #[must_use]
    pub fn parse(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

/// Pod names per component and phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentStatus {
    pods: BTreeMap<Component, BTreeMap<PodPhase, Vec<String>>>,
}

impl ComponentStatus {
    /// Record one pod
    pub fn insert(&mut self, component: Component, phase: PodPhase, pod_name: impl Into<String>) {
        self.pods
            .entry(component)
            .or_default()
            .entry(phase)
            .or_default()
            .push(pod_name.into());
    }

    /// Build from the pods of one stack
    ///
    /// Pods without a recognised component label are ignored.
    #[must_use]
    pub fn from_pods(pods: &[Pod]) -> Self {
        let mut status = Self::default();
        for pod in pods {
            let component = pod
                .metadata
                .labels
                .as_ref()
                .and_then(|labels| labels.get(LABEL_COMPONENT))
                .and_then(|value| Component::from_label(value));
            let Some(component) = component else {
                continue;
            };
            let phase = PodPhase::parse(pod.status.as_ref().and_then(|s| s.phase.as_deref()));
            let name = pod.metadata.name.clone().unwrap_or_default();
            status.insert(component, phase, name);
        }
        status
    }

    /// Pods of `component` in `phase`
    #[must_use]
    pub fn pods(&self, component: Component, phase: PodPhase) -> &[String] {
        self.pods
            .get(&component)
            .and_then(|phases| phases.get(&phase))
            .map_or(&[], Vec::as_slice)
    }

    /// Names of the pods in `phase`, ordered by component
    #[must_use]
    pub fn pod_names(&self, phase: PodPhase) -> Vec<&str> {
        Component::ALL
            .into_iter()
            .flat_map(|component| self.pods(component, phase))
            .map(String::as_str)
            .collect()
    }

    /// Number of pods in `phase` across all components
    #[must_use]
    pub fn count(&self, phase: PodPhase) -> usize {
        self.pods
            .values()
            .filter_map(|phases| phases.get(&phase))
            .map(Vec::len)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pods.values().all(|phases| phases.values().all(Vec::is_empty))
    }
}

//! Common test utilities
//!
//! Provides an in-memory [`StatusStore`] and builders for LokiStack fixtures.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, PodStatus, Secret};
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use lokistack_controller::constants::{LABEL_COMPONENT, LABEL_INSTANCE};
use lokistack_controller::controller::reconciler::status::{StatusStore, StoreError};
use lokistack_controller::controller::reconciler::StackKey;
use lokistack_controller::crd::{
    Condition, ConditionKind, LokiStack, LokiStackSize, LokiStackSpec, LokiStackStatus,
    ObjectStorageSecretType,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub const NAMESPACE: &str = "some-ns";
pub const NAME: &str = "my-stack";
pub const STORAGE_SECRET: &str = "loki-storage";

/// Failure the fake store returns instead of serving a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Conflict,
    Rejected(u16),
}

impl Failure {
    fn to_error(self) -> StoreError {
        match self {
            Failure::NotFound => StoreError::NotFound,
            Failure::Conflict => StoreError::Conflict {
                message: "the object has been modified".to_string(),
            },
            Failure::Rejected(code) => StoreError::Rejected {
                code,
                message: "injected failure".to_string(),
            },
        }
    }
}

/// In-memory store with resource-version checks and call counters
#[derive(Debug, Default)]
pub struct FakeStatusStore {
    stacks: Mutex<HashMap<StackKey, LokiStack>>,
    gets: AtomicUsize,
    updates: AtomicUsize,
    read_failure: Mutex<Option<Failure>>,
    write_failure: Mutex<Option<Failure>>,
    /// Bump the stored resource version right after every read
    interfere_after_get: AtomicBool,
    written: Mutex<Vec<LokiStack>>,
}

impl FakeStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack(stack: LokiStack) -> Self {
        let store = Self::new();
        store.insert(stack);
        store
    }

    pub fn insert(&self, stack: LokiStack) {
        let key = key_of(&stack);
        self.stacks.lock().unwrap().insert(key, stack);
    }

    pub fn remove(&self, key: &StackKey) {
        self.stacks.lock().unwrap().remove(key);
    }

    pub fn stored(&self, key: &StackKey) -> Option<LokiStack> {
        self.stacks.lock().unwrap().get(key).cloned()
    }

    pub fn conditions(&self, key: &StackKey) -> Vec<Condition> {
        self.stored(key)
            .and_then(|s| s.status)
            .map(|s| s.conditions)
            .unwrap_or_default()
    }

    pub fn fail_reads(&self, failure: Failure) {
        *self.read_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_writes(&self, failure: Failure) {
        *self.write_failure.lock().unwrap() = Some(failure);
    }

    pub fn interfere_after_get(&self) {
        self.interfere_after_get.store(true, Ordering::SeqCst);
    }

    /// Simulate another writer touching the object
    pub fn touch(&self, key: &StackKey) {
        if let Some(stack) = self.stacks.lock().unwrap().get_mut(key) {
            bump_resource_version(stack);
        }
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Every object passed to a successful `update_status`
    pub fn written(&self) -> Vec<LokiStack> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusStore for FakeStatusStore {
    async fn get(&self, key: &StackKey) -> Result<LokiStack, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.read_failure.lock().unwrap() {
            return Err(failure.to_error());
        }

        let mut stacks = self.stacks.lock().unwrap();
        let stack = stacks.get_mut(key).ok_or(StoreError::NotFound)?;
        let snapshot = stack.clone();
        if self.interfere_after_get.load(Ordering::SeqCst) {
            bump_resource_version(stack);
        }
        Ok(snapshot)
    }

    async fn update_status(&self, stack: &LokiStack) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.write_failure.lock().unwrap() {
            return Err(failure.to_error());
        }

        let mut stacks = self.stacks.lock().unwrap();
        let stored = stacks.get_mut(&key_of(stack)).ok_or(StoreError::NotFound)?;
        if stored.metadata.resource_version != stack.metadata.resource_version {
            return Err(StoreError::Conflict {
                message: format!(
                    "resource version {:?} does not match {:?}",
                    stack.metadata.resource_version, stored.metadata.resource_version
                ),
            });
        }

        stored.status = stack.status.clone();
        bump_resource_version(stored);
        self.written.lock().unwrap().push(stack.clone());
        Ok(())
    }
}

fn key_of(stack: &LokiStack) -> StackKey {
    StackKey::new(
        stack.metadata.namespace.clone().unwrap_or_default(),
        stack.metadata.name.clone().unwrap_or_default(),
    )
}

fn bump_resource_version(stack: &mut LokiStack) {
    let next = stack
        .metadata
        .resource_version
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    stack.metadata.resource_version = Some(next.to_string());
}

pub fn key() -> StackKey {
    StackKey::new(NAMESPACE, NAME)
}

/// A small S3-backed stack with no status
pub fn stack() -> LokiStack {
    let mut spec = LokiStackSpec {
        size: LokiStackSize::OneXSmall,
        ..LokiStackSpec::default()
    };
    spec.storage.secret.name = STORAGE_SECRET.to_string();
    spec.storage.secret.r#type = ObjectStorageSecretType::S3;

    let mut stack = LokiStack::new(NAME, spec);
    stack.metadata.namespace = Some(NAMESPACE.to_string());
    stack.metadata.resource_version = Some("1".to_string());
    stack.metadata.generation = Some(1);
    stack
}

pub fn stack_with_conditions(conditions: Vec<Condition>) -> LokiStack {
    let mut stack = stack();
    stack.status = Some(LokiStackStatus { conditions });
    stack
}

pub fn condition(kind: ConditionKind, status: &str, reason: &str, message: &str) -> Condition {
    Condition {
        r#type: kind.as_str().to_string(),
        status: status.to_string(),
        last_transition_time: Some("2020-01-01T00:00:00+00:00".to_string()),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        observed_generation: Some(1),
    }
}

/// Storage secret holding every S3 key
pub fn s3_secret() -> Secret {
    let keys = [
        "bucketnames",
        "endpoint",
        "access_key_id",
        "access_key_secret",
    ];
    Secret {
        metadata: ObjectMeta {
            name: Some(STORAGE_SECRET.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..ObjectMeta::default()
        },
        data: Some(
            keys.iter()
                .map(|k| ((*k).to_string(), ByteString(b"value".to_vec())))
                .collect(),
        ),
        ..Secret::default()
    }
}

pub fn pod(component: &str, name: &str, phase: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            labels: Some(
                [
                    (LABEL_COMPONENT.to_string(), component.to_string()),
                    (LABEL_INSTANCE.to_string(), NAME.to_string()),
                ]
                .into_iter()
                .collect(),
            ),
            ..ObjectMeta::default()
        },
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            ..PodStatus::default()
        }),
        ..Pod::default()
    }
}

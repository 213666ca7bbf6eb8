//! # Status Store
//!
//! Capability interface over the system of record holding LokiStack objects.
//!
//! The condition reconciler only needs two operations, a read and a status
//! write. Keeping them behind [`StatusStore`] lets the reconciler run against
//! the Kubernetes API in production and against an in-memory fake in tests.

use crate::constants::FIELD_MANAGER;
use crate::controller::reconciler::types::StackKey;
use crate::crd::LokiStack;
use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use thiserror::Error;

/// Errors returned by a [`StatusStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist (HTTP 404)
    #[error("object not found")]
    NotFound,
    /// The write carried a stale resource version (HTTP 409)
    #[error("conflicting update: {message}")]
    Conflict { message: String },
    /// The API server rejected the request with a non-retryable status
    #[error("request rejected ({code}): {message}")]
    Rejected { code: u16, message: String },
    /// The object is missing metadata required to address it
    #[error("object is missing metadata.{field}")]
    MissingMetadata { field: &'static str },
    /// Client-side or transport failure
    #[error(transparent)]
    Kube(kube::Error),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

impl From<kube::Error> for StoreError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(api_err) if api_err.code == 404 => StoreError::NotFound,
            kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict {
                message: api_err.message.clone(),
            },
            kube::Error::Api(api_err) => StoreError::Rejected {
                code: api_err.code,
                message: api_err.message.clone(),
            },
            other => StoreError::Kube(other),
        }
    }
}

/// Read and status-write access to LokiStack objects
///
/// Implementations must fail `update_status` atomically and must reject a
/// write whose `metadata.resourceVersion` no longer matches the stored object
/// with [`StoreError::Conflict`].
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Fetch the stack addressed by `key`
    async fn get(&self, key: &StackKey) -> Result<LokiStack, StoreError>;

    /// Persist the whole status sub-resource of `stack`
    async fn update_status(&self, stack: &LokiStack) -> Result<(), StoreError>;
}

/// [`StatusStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStatusStore {
    client: Client,
}

impl std::fmt::Debug for KubeStatusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStatusStore").finish_non_exhaustive()
    }
}

impl KubeStatusStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusStore for KubeStatusStore {
    async fn get(&self, key: &StackKey) -> Result<LokiStack, StoreError> {
        let api: Api<LokiStack> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get(&key.name).await?)
    }

    async fn update_status(&self, stack: &LokiStack) -> Result<(), StoreError> {
        let name = stack
            .metadata
            .name
            .as_deref()
            .ok_or(StoreError::MissingMetadata { field: "name" })?;
        let namespace = stack
            .metadata
            .namespace
            .as_deref()
            .ok_or(StoreError::MissingMetadata { field: "namespace" })?;

        let api: Api<LokiStack> = Api::namespaced(self.client.clone(), namespace);

        // resourceVersion in a merge patch makes the API server reject stale writes with 409
        let patch = serde_json::json!({
            "metadata": {
                "resourceVersion": stack.metadata.resource_version,
            },
            "status": stack.status,
        });

        api.patch_status(
            name,
            &PatchParams::apply(FIELD_MANAGER),
            &Patch::Merge(patch),
        )
        .await?;

        Ok(())
    }
}

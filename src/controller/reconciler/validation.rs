//! # Validation
//!
//! Spec checks that turn into a Degraded condition when they fail.
//!
//! All checks are pure; the reconcile step fetches the referenced objects
//! beforehand and passes them in.

use crate::controller::reconciler::status::DegradedError;
use crate::crd::{ConditionReason, LokiStackSpec};
use k8s_openapi::api::core::v1::Secret;

/// Validate everything the stack needs before components can run
pub fn validate_stack(
    spec: &LokiStackSpec,
    storage_secret: Option<&Secret>,
) -> Result<(), DegradedError> {
    validate_storage_secret(spec, storage_secret)?;
    validate_replication(spec)?;
    validate_storage_class(spec)?;
    Ok(())
}

/// The storage secret must exist and carry every key of its backend type
///
/// Secrets are not watched, so a missing one is retried on the degraded
/// requeue interval rather than waiting for a stack change.
pub fn validate_storage_secret(
    spec: &LokiStackSpec,
    storage_secret: Option<&Secret>,
) -> Result<(), DegradedError> {
    let Some(secret) = storage_secret else {
        return Err(DegradedError::new(
            ConditionReason::MissingObjectStorageSecret,
            "Missing object storage secret",
        )
        .with_requeue());
    };

    let secret_type = spec.storage.secret.r#type;
    let missing: Vec<&str> = secret_type
        .required_keys()
        .iter()
        .copied()
        .filter(|key| !secret_has_key(secret, key))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DegradedError::new(
            ConditionReason::InvalidObjectStorageSecret,
            format!(
                "Invalid object storage secret contents: missing {} for type {}",
                missing.join(", "),
                secret_type.as_str()
            ),
        ))
    }
}

/// The replication factor must fit the ingesters of the selected size
pub fn validate_replication(spec: &LokiStackSpec) -> Result<(), DegradedError> {
    let factor = spec.replication_factor.unwrap_or(1);
    let ingesters = spec.size.ingester_replicas();

    if factor < 1 {
        return Err(DegradedError::new(
            ConditionReason::InvalidReplicationConfiguration,
            format!("Replication factor must be at least 1, got {factor}"),
        ));
    }
    if factor > ingesters {
        return Err(DegradedError::new(
            ConditionReason::InvalidReplicationConfiguration,
            format!(
                "Replication factor {factor} exceeds the {ingesters} ingester replicas of size {}",
                spec.size.as_str()
            ),
        ));
    }
    Ok(())
}

pub fn validate_storage_class(spec: &LokiStackSpec) -> Result<(), DegradedError> {
    match spec.storage_class_name.as_deref() {
        Some(name) if name.trim().is_empty() => Err(DegradedError::new(
            ConditionReason::InvalidStorageClass,
            "Storage class name must not be empty",
        )),
        _ => Ok(()),
    }
}

fn secret_has_key(secret: &Secret, key: &str) -> bool {
    let in_data = secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .is_some_and(|value| !value.0.is_empty());
    let in_string_data = secret
        .string_data
        .as_ref()
        .and_then(|data| data.get(key))
        .is_some_and(|value| !value.is_empty());
    in_data || in_string_data
}

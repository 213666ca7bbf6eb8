//! # Object Storage
//!
//! Object storage configuration referenced by a LokiStack.

use serde::{Deserialize, Serialize};

/// Object storage used by the stack
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStorageSpec {
    /// Secret holding the storage credentials, in the stack's namespace
    #[serde(default)]
    pub secret: ObjectStorageSecretSpec,
}

/// Reference to the storage credentials secret
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStorageSecretSpec {
    /// Name of the secret
    #[serde(default)]
    pub name: String,
    /// Storage backend the secret is for
    #[serde(default)]
    pub r#type: ObjectStorageSecretType,
}

/// Supported object storage backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStorageSecretType {
    #[default]
    S3,
    Azure,
    Gcs,
    Swift,
    AlibabaCloud,
}

impl ObjectStorageSecretType {
    /// Keys that must be present in the secret's data for this backend
    #[must_use]
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            ObjectStorageSecretType::S3 => &[
                "bucketnames",
                "endpoint",
                "access_key_id",
                "access_key_secret",
            ],
            ObjectStorageSecretType::Azure => {
                &["environment", "container", "account_name", "account_key"]
            }
            ObjectStorageSecretType::Gcs => &["bucketname", "key.json"],
            ObjectStorageSecretType::Swift => &[
                "auth_url",
                "username",
                "user_domain_name",
                "user_domain_id",
                "user_id",
                "password",
                "domain_id",
                "domain_name",
                "container_name",
            ],
            ObjectStorageSecretType::AlibabaCloud => &[
                "endpoint",
                "bucket",
                "access_key_id",
                "secret_access_key",
            ],
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectStorageSecretType::S3 => "s3",
            ObjectStorageSecretType::Azure => "azure",
            ObjectStorageSecretType::Gcs => "gcs",
            ObjectStorageSecretType::Swift => "swift",
            ObjectStorageSecretType::AlibabaCloud => "alibabacloud",
        }
    }
}

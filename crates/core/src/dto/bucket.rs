//! Bucket API types

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A bucket as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(alias = "id", alias = "ID", alias = "bucketId")]
    pub bucket_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, alias = "ownerId", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Body of `GET /buckets`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketListResponse {
    #[serde(default)]
    pub count: usize,

    #[serde(default, deserialize_with = "super::null_as_default")]
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucketInput {
    pub name: String,
    pub owner_id: String,
}

impl CreateBucketInput {
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner_id: owner_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBucketInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Usage counters of a bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    #[serde(default)]
    pub bucket_id: String,

    #[serde(default)]
    pub total_files: u64,

    #[serde(default, rename = "total_size_bytes")]
    pub total_size: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

/// Access policy document attached to a bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyResponse {
    #[serde(default, alias = "bucketId")]
    pub bucket_id: String,

    /// Raw policy document
    #[serde(default)]
    pub policy: serde_json::Value,

    #[serde(default, alias = "policyVersion", skip_serializing_if = "Option::is_none")]
    pub policy_version: Option<i64>,

    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Body of `PUT /buckets/{id}/policy`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePolicyInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// `Allow` or `Deny`
    pub effect: String,

    pub actions: Vec<String>,

    pub resources: Vec<String>,

    pub principals: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningInput {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersioningOutput {
    #[serde(default, alias = "versioning_enabled")]
    pub enabled: bool,

    /// `Enabled`, `Suspended`, or empty when never configured
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleStatus {
    #[default]
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub prefix: String,

    #[serde(default)]
    pub status: LifecycleStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_days: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_days: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_storage_class: Option<String>,
}

/// Body of `PUT /buckets/{id}/lifecycle`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleInput {
    pub rules: Vec<LifecycleRule>,
}

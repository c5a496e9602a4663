//! Request and response bodies of the storage API
//!
//! Field names follow the service's snake_case JSON. Responses tolerate
//! missing fields, and a few fields also accept the alternative spellings the
//! service emits on some endpoints.

pub mod bucket;
pub mod file;

pub use bucket::{
    Bucket, BucketListResponse, BucketStats, CreateBucketInput, LifecycleInput, LifecycleRule,
    LifecycleStatus, PolicyResponse, UpdateBucketInput, UpdatePolicyInput, VersioningInput,
    VersioningOutput,
};
pub use file::{CopyFileInput, FileInfo, FileListResponse, MoveFileInput, UpdateFileMetadataInput};

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    use serde::Deserialize;
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

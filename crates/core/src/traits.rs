//! Storage operations trait
//!
//! [`ObjectStore`] is the bucket and file surface of the storage service. The
//! CLI and other consumers depend on this trait, not on a concrete client, so
//! they can be driven by a mock in tests.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::dto::{
    Bucket, BucketStats, CopyFileInput, CreateBucketInput, FileInfo, LifecycleInput,
    MoveFileInput, PolicyResponse, UpdateBucketInput, UpdatePolicyInput, VersioningOutput,
};
use crate::error::Result;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    // Buckets

    async fn create_bucket(&self, input: &CreateBucketInput) -> Result<Bucket>;

    async fn list_buckets(&self) -> Result<Vec<Bucket>>;

    async fn get_bucket(&self, bucket_id: &str) -> Result<Bucket>;

    async fn update_bucket(&self, bucket_id: &str, input: &UpdateBucketInput) -> Result<Bucket>;

    async fn delete_bucket(&self, bucket_id: &str) -> Result<()>;

    async fn bucket_stats(&self, bucket_id: &str) -> Result<BucketStats>;

    async fn get_bucket_policy(&self, bucket_id: &str) -> Result<PolicyResponse>;

    async fn set_bucket_policy(&self, bucket_id: &str, policy: &UpdatePolicyInput) -> Result<()>;

    async fn get_versioning(&self, bucket_id: &str) -> Result<VersioningOutput>;

    async fn set_versioning(&self, bucket_id: &str, enabled: bool) -> Result<()>;

    async fn set_lifecycle(&self, bucket_id: &str, lifecycle: &LifecycleInput) -> Result<()>;

    // Files

    /// Upload a local file into a bucket
    async fn upload_file(&self, bucket_id: &str, path: &Path) -> Result<FileInfo>;

    async fn list_files(&self, bucket_id: &str) -> Result<Vec<FileInfo>>;

    async fn get_file(&self, bucket_id: &str, file_id: &str) -> Result<FileInfo>;

    /// Download file contents unchanged
    async fn download_file(&self, bucket_id: &str, file_id: &str) -> Result<Bytes>;

    async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<()>;

    async fn update_file_metadata(
        &self,
        bucket_id: &str,
        file_id: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<FileInfo>;

    async fn copy_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        input: &CopyFileInput,
    ) -> Result<FileInfo>;

    async fn move_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        input: &MoveFileInput,
    ) -> Result<FileInfo>;
}

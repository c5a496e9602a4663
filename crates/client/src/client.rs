//! Storage service client
//!
//! Implements the ObjectStore trait from osc-core. Each operation is a single
//! dispatcher call; routing and retries live in the dispatcher.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use osc_core::dto::{
    Bucket, BucketListResponse, BucketStats, CopyFileInput, CreateBucketInput, FileInfo,
    FileListResponse, LifecycleInput, MoveFileInput, PolicyResponse, UpdateBucketInput,
    UpdateFileMetadataInput, UpdatePolicyInput, VersioningInput, VersioningOutput,
};
use osc_core::{
    Alias, ClientConfig, Dispatcher, Json, NoContent, ObjectStore, PoolStats, RawBytes,
    RequestDescriptor, Result, Transport,
};

use crate::transport::ReqwestTransport;

const BUCKETS: &str = "/api/v1/buckets";
const FILES: &str = "/api/v1/files";

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn bucket_path(bucket_id: &str) -> String {
    format!("{BUCKETS}/{}", segment(bucket_id))
}

fn file_path(bucket_id: &str, file_id: &str) -> String {
    format!("{FILES}/{}/files/{}", segment(bucket_id), segment(file_id))
}

/// Client for the bucket and file API
pub struct StorageClient<T = ReqwestTransport> {
    dispatcher: Arc<Dispatcher<T>>,
}

impl<T> Clone for StorageClient<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<T> std::fmt::Debug for StorageClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl StorageClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, transport)
    }

    /// Create a client from an alias configuration
    pub fn from_alias(alias: &Alias) -> Result<Self> {
        Self::new(alias.client_config())
    }
}

impl<T: Transport> StorageClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        Ok(Self {
            dispatcher: Arc::new(Dispatcher::new(config, transport)?),
        })
    }

    pub fn from_dispatcher(dispatcher: Arc<Dispatcher<T>>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<T>> {
        &self.dispatcher
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.dispatcher.pool_stats()
    }

    /// Shut down the underlying dispatcher
    pub fn close(&self) {
        self.dispatcher.close();
    }
}

#[async_trait]
impl<T: Transport> ObjectStore for StorageClient<T> {
    async fn create_bucket(&self, input: &CreateBucketInput) -> Result<Bucket> {
        let request = RequestDescriptor::post(BUCKETS).json(input)?;
        self.dispatcher.execute::<Json<Bucket>>(&request).await
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let response = self
            .dispatcher
            .execute::<Json<BucketListResponse>>(&RequestDescriptor::get(BUCKETS))
            .await?;
        Ok(response.buckets)
    }

    async fn get_bucket(&self, bucket_id: &str) -> Result<Bucket> {
        self.dispatcher
            .execute::<Json<Bucket>>(&RequestDescriptor::get(bucket_path(bucket_id)))
            .await
    }

    async fn update_bucket(&self, bucket_id: &str, input: &UpdateBucketInput) -> Result<Bucket> {
        let request = RequestDescriptor::patch(bucket_path(bucket_id)).json(input)?;
        self.dispatcher.execute::<Json<Bucket>>(&request).await
    }

    async fn delete_bucket(&self, bucket_id: &str) -> Result<()> {
        self.dispatcher
            .execute::<NoContent>(&RequestDescriptor::delete(bucket_path(bucket_id)))
            .await
    }

    async fn bucket_stats(&self, bucket_id: &str) -> Result<BucketStats> {
        let path = format!("{}/stats", bucket_path(bucket_id));
        self.dispatcher
            .execute::<Json<BucketStats>>(&RequestDescriptor::get(path))
            .await
    }

    async fn get_bucket_policy(&self, bucket_id: &str) -> Result<PolicyResponse> {
        let path = format!("{}/policy", bucket_path(bucket_id));
        self.dispatcher
            .execute::<Json<PolicyResponse>>(&RequestDescriptor::get(path))
            .await
    }

    async fn set_bucket_policy(&self, bucket_id: &str, policy: &UpdatePolicyInput) -> Result<()> {
        let path = format!("{}/policy", bucket_path(bucket_id));
        let request = RequestDescriptor::put(path).json(policy)?;
        self.dispatcher.execute::<NoContent>(&request).await
    }

    async fn get_versioning(&self, bucket_id: &str) -> Result<VersioningOutput> {
        let path = format!("{}/versioning", bucket_path(bucket_id));
        self.dispatcher
            .execute::<Json<VersioningOutput>>(&RequestDescriptor::get(path))
            .await
    }

    async fn set_versioning(&self, bucket_id: &str, enabled: bool) -> Result<()> {
        let path = format!("{}/versioning", bucket_path(bucket_id));
        let request = RequestDescriptor::put(path).json(&VersioningInput { enabled })?;
        self.dispatcher.execute::<NoContent>(&request).await
    }

    async fn set_lifecycle(&self, bucket_id: &str, lifecycle: &LifecycleInput) -> Result<()> {
        let path = format!("{}/lifecycle", bucket_path(bucket_id));
        let request = RequestDescriptor::put(path).json(lifecycle)?;
        self.dispatcher.execute::<NoContent>(&request).await
    }

    async fn upload_file(&self, bucket_id: &str, path: &Path) -> Result<FileInfo> {
        let route = format!("{FILES}/upload/{}", segment(bucket_id));
        let request = RequestDescriptor::post(route).file(path);
        self.dispatcher.execute::<Json<FileInfo>>(&request).await
    }

    async fn list_files(&self, bucket_id: &str) -> Result<Vec<FileInfo>> {
        let path = format!("{FILES}/{}", segment(bucket_id));
        let response = self
            .dispatcher
            .execute::<Json<FileListResponse>>(&RequestDescriptor::get(path))
            .await?;
        Ok(response.files)
    }

    async fn get_file(&self, bucket_id: &str, file_id: &str) -> Result<FileInfo> {
        self.dispatcher
            .execute::<Json<FileInfo>>(&RequestDescriptor::get(file_path(bucket_id, file_id)))
            .await
    }

    async fn download_file(&self, bucket_id: &str, file_id: &str) -> Result<Bytes> {
        let path = format!("{}/download", file_path(bucket_id, file_id));
        self.dispatcher
            .execute::<RawBytes>(&RequestDescriptor::get(path))
            .await
    }

    async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<()> {
        self.dispatcher
            .execute::<NoContent>(&RequestDescriptor::delete(file_path(bucket_id, file_id)))
            .await
    }

    async fn update_file_metadata(
        &self,
        bucket_id: &str,
        file_id: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<FileInfo> {
        let request = RequestDescriptor::patch(file_path(bucket_id, file_id))
            .json(&UpdateFileMetadataInput { metadata })?;
        self.dispatcher.execute::<Json<FileInfo>>(&request).await
    }

    async fn copy_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        input: &CopyFileInput,
    ) -> Result<FileInfo> {
        let path = format!("{}/copy", file_path(bucket_id, file_id));
        let request = RequestDescriptor::post(path).json(input)?;
        self.dispatcher.execute::<Json<FileInfo>>(&request).await
    }

    async fn move_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        input: &MoveFileInput,
    ) -> Result<FileInfo> {
        let path = format!("{}/move", file_path(bucket_id, file_id));
        let request = RequestDescriptor::post(path).json(input)?;
        self.dispatcher.execute::<Json<FileInfo>>(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_percent_encoded() {
        assert_eq!(bucket_path("photos"), "/api/v1/buckets/photos");
        assert_eq!(bucket_path("a b/c"), "/api/v1/buckets/a%20b%2Fc");
        assert_eq!(
            file_path("b1", "report 2024.pdf"),
            "/api/v1/files/b1/files/report%202024.pdf"
        );
    }

    #[test]
    fn test_client_rejects_invalid_base_url() {
        assert!(StorageClient::new(ClientConfig::new("not a url")).is_err());
    }

    #[test]
    fn test_client_from_alias() {
        let alias = Alias::new("local", "http://localhost:8080");
        let client = StorageClient::from_alias(&alias).unwrap();
        assert_eq!(client.dispatcher().config().base_url, "http://localhost:8080");
        assert_eq!(client.pool_stats().max, 100);
    }
}

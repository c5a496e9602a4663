//! File API types

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Metadata of a stored file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(alias = "ID", alias = "id", alias = "fileId")]
    pub file_id: String,

    #[serde(default, alias = "BucketID", alias = "bucketId")]
    pub bucket_id: String,

    #[serde(default, alias = "Key")]
    pub key: String,

    #[serde(default, alias = "Size")]
    pub size: u64,

    #[serde(default, alias = "MimeType", alias = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(
        default,
        alias = "Metadata",
        deserialize_with = "super::null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub metadata: BTreeMap<String, String>,

    #[serde(default, alias = "CreatedAt", alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

/// Body of `GET /files/{bucket}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileListResponse {
    #[serde(default, alias = "bucketId", skip_serializing_if = "Option::is_none")]
    pub bucket_id: Option<String>,

    #[serde(default)]
    pub count: usize,

    #[serde(default, deserialize_with = "super::null_as_default")]
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFileMetadataInput {
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyFileInput {
    pub destination_bucket: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_key: Option<String>,
}

impl CopyFileInput {
    pub fn new(destination_bucket: impl Into<String>) -> Self {
        Self {
            destination_bucket: destination_bucket.into(),
            new_key: None,
        }
    }

    pub fn with_key(mut self, new_key: impl Into<String>) -> Self {
        self.new_key = Some(new_key.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFileInput {
    pub destination_bucket: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_key: Option<String>,
}

impl MoveFileInput {
    pub fn new(destination_bucket: impl Into<String>) -> Self {
        Self {
            destination_bucket: destination_bucket.into(),
            new_key: None,
        }
    }

    pub fn with_key(mut self, new_key: impl Into<String>) -> Self {
        self.new_key = Some(new_key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_metadata_is_empty() {
        let info: FileInfo = serde_json::from_str(
            r#"{"file_id": "f-1", "bucket_id": "b-1", "key": "a.txt", "size": 3, "metadata": null}"#,
        )
        .unwrap();
        assert_eq!(info.key, "a.txt");
        assert!(info.metadata.is_empty());
    }

    #[test]
    fn test_empty_file_list_with_null() {
        let list: FileListResponse =
            serde_json::from_str(r#"{"bucketId": "b-1", "count": 0, "files": null}"#).unwrap();
        assert_eq!(list.bucket_id.as_deref(), Some("b-1"));
        assert!(list.files.is_empty());
    }

    #[test]
    fn test_listed_file_with_null_metadata() {
        let list: FileListResponse = serde_json::from_str(
            r#"{"count": 1, "files": [{"ID": "f-1", "Key": "a.txt", "Metadata": null}]}"#,
        )
        .unwrap();
        assert_eq!(list.files.len(), 1);
        assert!(list.files[0].metadata.is_empty());
    }

    #[test]
    fn test_upload_response() {
        let info: FileInfo = serde_json::from_str(
            r#"{"file_id":"f-1","key":"cat.png","size":10,"created_at":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(info.file_id, "f-1");
        assert_eq!(info.size, 10);
        assert!(info.bucket_id.is_empty());
    }

    #[test]
    fn test_list_entries_in_pascal_case() {
        let list: FileListResponse = serde_json::from_str(
            r#"{
                "bucketId": "b-1",
                "count": 1,
                "files": [{
                    "ID": "f-1",
                    "BucketID": "b-1",
                    "Key": "a.txt",
                    "Size": 5,
                    "MimeType": "text/plain",
                    "Metadata": {"owner": "me"}
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(list.bucket_id.as_deref(), Some("b-1"));
        let file = &list.files[0];
        assert_eq!(file.file_id, "f-1");
        assert_eq!(file.key, "a.txt");
        assert_eq!(file.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(file.metadata.get("owner").map(String::as_str), Some("me"));
    }

    #[test]
    fn test_copy_input_omits_missing_key() {
        let json = serde_json::to_value(CopyFileInput::new("archive")).unwrap();
        assert_eq!(json, serde_json::json!({"destination_bucket": "archive"}));

        let json = serde_json::to_value(MoveFileInput::new("archive").with_key("b.txt")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"destination_bucket": "archive", "new_key": "b.txt"})
        );
    }
}

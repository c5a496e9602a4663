//! Remote path parsing
//!
//! Remote resources are addressed as `alias/bucket` or `alias/bucket/file-id`.

use crate::error::{Error, Result};

/// A parsed remote path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    pub alias: String,
    pub bucket: String,
    pub file_id: Option<String>,
}

impl RemotePath {
    pub fn bucket(alias: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            bucket: bucket.into(),
            file_id: None,
        }
    }

    pub fn file(
        alias: impl Into<String>,
        bucket: impl Into<String>,
        file_id: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            bucket: bucket.into(),
            file_id: Some(file_id.into()),
        }
    }

    /// File id, or an error naming the path when it only points at a bucket
    pub fn require_file(&self) -> Result<&str> {
        self.file_id
            .as_deref()
            .ok_or_else(|| Error::InvalidPath(format!("{self} does not name a file")))
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.alias, self.bucket)?;
        if let Some(file_id) = &self.file_id {
            write!(f, "/{file_id}")?;
        }
        Ok(())
    }
}

/// Parse `alias/bucket[/file-id]`
pub fn parse_path(path: &str) -> Result<RemotePath> {
    let trimmed = path.trim().trim_end_matches('/');
    let mut parts = trimmed.splitn(3, '/');

    let alias = parts.next().unwrap_or_default();
    let bucket = parts.next().unwrap_or_default();
    let file_id = parts.next();

    if alias.is_empty() {
        return Err(Error::InvalidPath(format!("missing alias in '{path}'")));
    }
    if bucket.is_empty() {
        return Err(Error::InvalidPath(format!(
            "expected alias/bucket[/file-id], got '{path}'"
        )));
    }

    match file_id {
        None => Ok(RemotePath::bucket(alias, bucket)),
        Some(id) if id.is_empty() || id.contains('/') => Err(Error::InvalidPath(format!(
            "invalid file id in '{path}'"
        ))),
        Some(id) => Ok(RemotePath::file(alias, bucket, id)),
    }
}

//! multipart/form-data encoding for file uploads
//!
//! The body has a single part named `file`. File bytes are never loaded into
//! memory: [`MultipartBody::open`] yields the part header, then the file
//! streamed from disk, then the closing boundary. Every call to `open` reopens
//! the file, so a retried attempt sends the same bytes again.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Bytes, BytesMut};
use futures::future::{self, Ready};
use futures::stream::{self, Chain, Once, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, Take};
use tokio_util::io::ReaderStream;

use crate::error::{Error, Result};

/// Name of the form field carrying the file
pub const FILE_FIELD: &str = "file";

const PART_CONTENT_TYPE: &str = "application/octet-stream";

type Chunk = Ready<std::io::Result<Bytes>>;

/// Encoded body: part header, file contents, closing boundary
pub type MultipartStream = Chain<Chain<Once<Chunk>, ReaderStream<Take<File>>>, Once<Chunk>>;

static BOUNDARY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Boundary token, unique per request within this process
pub fn generate_boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let sequence = BOUNDARY_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("----OscBoundary{nanos:x}{sequence:04x}")
}

/// Builds multipart bodies from local files
#[derive(Debug, Default, Clone, Copy)]
pub struct MultipartEncoder;

impl MultipartEncoder {
    /// Encode `path` as the `file` part.
    ///
    /// Fails with [`Error::InvalidRequest`] when the path has no file name or
    /// is not a readable regular file.
    pub fn encode(path: &Path) -> Result<MultipartBody> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::InvalidRequest(format!("upload path has no file name: {}", path.display()))
            })?;

        let metadata = std::fs::metadata(path).map_err(|e| {
            Error::InvalidRequest(format!("cannot read upload file {}: {e}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(Error::InvalidRequest(format!(
                "upload path is not a file: {}",
                path.display()
            )));
        }

        Ok(MultipartBody::new(
            generate_boundary(),
            path.to_path_buf(),
            &file_name,
            metadata.len(),
        ))
    }
}

/// A ready-to-send multipart body backed by a file on disk
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    path: PathBuf,
    head: Bytes,
    tail: Bytes,
    file_len: u64,
}

impl MultipartBody {
    fn new(boundary: String, path: PathBuf, file_name: &str, file_len: u64) -> Self {
        let head = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{FILE_FIELD}\"; filename=\"{}\"\r\n\
             Content-Type: {PART_CONTENT_TYPE}\r\n\r\n",
            escape_filename(file_name)
        );
        let tail = format!("\r\n--{boundary}--\r\n");

        Self {
            boundary,
            path,
            head: Bytes::from(head),
            tail: Bytes::from(tail),
            file_len,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value for the request's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact encoded size in bytes
    pub fn content_length(&self) -> u64 {
        self.head.len() as u64 + self.file_len + self.tail.len() as u64
    }

    /// Open a fresh stream over the encoded body
    pub async fn open(&self) -> std::io::Result<MultipartStream> {
        let file = File::open(&self.path).await?;
        let contents = ReaderStream::new(file.take(self.file_len));

        let head = stream::once(future::ready(Ok(self.head.clone())));
        let tail = stream::once(future::ready(Ok(self.tail.clone())));

        Ok(head.chain(contents).chain(tail))
    }

    /// Collect the whole body into memory
    pub async fn to_bytes(&self) -> std::io::Result<Bytes> {
        let mut stream = self.open().await?;
        let mut buf = BytesMut::with_capacity(self.content_length() as usize);
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

fn escape_filename(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\\' => escaped.push_str("\\\\"),
            '\r' | '\n' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

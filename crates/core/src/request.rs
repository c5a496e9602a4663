//! Request descriptors and wire request construction
//!
//! A [`RequestDescriptor`] is the logical call: method, path relative to the
//! service root, query parameters, headers and body. It is immutable and owned,
//! so the dispatcher can replay it on every attempt. [`RequestBuilder`] turns a
//! descriptor into a [`WireRequest`] bound to a concrete base URL.

use std::path::PathBuf;

use bytes::Bytes;
use serde::Serialize;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::multipart::{MultipartBody, MultipartEncoder};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP methods used by the storage API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a logical call
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    None,
    Json(serde_json::Value),
    /// Local file sent as a multipart upload
    File(PathBuf),
}

/// An immutable description of one logical API call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: RequestBody,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append a query parameter. Order is preserved on the wire.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a header, replacing any earlier value with the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        self.headers.retain(|(existing, _)| *existing != name);
        self.headers.push((name, value.into()));
        self
    }

    /// Serialize `value` as the JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::InvalidRequest(format!("failed to serialize request body: {e}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Upload the file at `path` as multipart/form-data
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.body = RequestBody::File(path.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

/// Encoded body of a wire request
#[derive(Debug, Clone)]
pub enum WireBody {
    Empty,
    Json(Bytes),
    Multipart(MultipartBody),
}

impl WireBody {
    pub fn content_length(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Json(bytes) => bytes.len() as u64,
            Self::Multipart(body) => body.content_length(),
        }
    }
}

/// A fully resolved request, ready for a transport
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: Method,
    pub url: Url,
    /// Lower-case header names
    pub headers: Vec<(String, String)>,
    pub body: WireBody,
}

impl WireRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Resolves descriptors against a base URL and credentials
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: Url,
    api_key: Option<String>,
}

impl RequestBuilder {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.validate()?;
        Ok(Self {
            base_url,
            api_key: config.api_key().map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the wire request for one attempt
    pub fn build(&self, descriptor: &RequestDescriptor) -> Result<WireRequest> {
        let mut url = self.resolve(descriptor.path())?;
        if !descriptor.query_params().is_empty() {
            url.query_pairs_mut()
                .extend_pairs(descriptor.query_params().iter());
        }

        let mut headers = descriptor.headers().to_vec();

        let body = match descriptor.body() {
            RequestBody::None => WireBody::Empty,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value).map_err(|e| {
                    Error::InvalidRequest(format!("failed to serialize request body: {e}"))
                })?;
                if !descriptor.has_header(CONTENT_TYPE_HEADER) {
                    headers.push((CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string()));
                }
                WireBody::Json(Bytes::from(bytes))
            }
            RequestBody::File(path) => {
                let body = MultipartEncoder::encode(path)?;
                headers.retain(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER));
                headers.push((CONTENT_TYPE_HEADER.to_string(), body.content_type()));
                WireBody::Multipart(body)
            }
        };

        if let Some(key) = &self.api_key {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case(API_KEY_HEADER));
            headers.push((API_KEY_HEADER.to_string(), key.clone()));
        }

        Ok(WireRequest {
            method: descriptor.method(),
            url,
            headers,
            body,
        })
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let joined = format!("{base}/{path}");
        Url::parse(&joined).map_err(|e| Error::InvalidRequest(format!("invalid URL '{joined}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder(base: &str, key: Option<&str>) -> RequestBuilder {
        let mut config = ClientConfig::new(base);
        config.api_key = key.map(str::to_string);
        RequestBuilder::new(&config).unwrap()
    }

    #[test]
    fn test_joins_base_url_and_path() {
        let builder = builder("http://localhost:8080/", None);
        let wire = builder
            .build(&RequestDescriptor::get("/api/v1/buckets"))
            .unwrap();
        assert_eq!(wire.url.as_str(), "http://localhost:8080/api/v1/buckets");
        assert_eq!(wire.method, Method::Get);
        assert!(matches!(wire.body, WireBody::Empty));
    }

    #[test]
    fn test_keeps_base_path_prefix() {
        let builder = builder("https://example.com/storage", None);
        let wire = builder.build(&RequestDescriptor::get("api/v1/buckets")).unwrap();
        assert_eq!(wire.url.as_str(), "https://example.com/storage/api/v1/buckets");
    }

    #[test]
    fn test_query_params_in_order() {
        let builder = builder("http://localhost:8080", None);
        let descriptor = RequestDescriptor::get("/api/v1/files/b1")
            .query("prefix", "photos/")
            .query("limit", "10");
        let wire = builder.build(&descriptor).unwrap();
        assert_eq!(wire.url.query(), Some("prefix=photos%2F&limit=10"));
    }

    #[test]
    fn test_api_key_injected_only_when_configured() {
        let descriptor = RequestDescriptor::get("/api/v1/buckets");

        let with_key = builder("http://localhost:8080", Some("secret"))
            .build(&descriptor)
            .unwrap();
        assert_eq!(with_key.header("x-api-key"), Some("secret"));

        let without_key = builder("http://localhost:8080", None)
            .build(&descriptor)
            .unwrap();
        assert_eq!(without_key.header("x-api-key"), None);

        let empty_key = builder("http://localhost:8080", Some(""))
            .build(&descriptor)
            .unwrap();
        assert_eq!(empty_key.header("x-api-key"), None);
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let descriptor = RequestDescriptor::post("/api/v1/buckets")
            .json(&json!({"name": "photos", "owner_id": "u1"}))
            .unwrap();
        let wire = builder("http://localhost:8080", None)
            .build(&descriptor)
            .unwrap();

        assert_eq!(wire.header("Content-Type"), Some("application/json"));
        match wire.body {
            WireBody::Json(bytes) => {
                let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(value["name"], "photos");
            }
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_content_type_wins() {
        let descriptor = RequestDescriptor::put("/x")
            .header("Content-Type", "application/merge-patch+json")
            .json(&json!({}))
            .unwrap();
        let wire = builder("http://localhost:8080", None)
            .build(&descriptor)
            .unwrap();
        assert_eq!(wire.header("content-type"), Some("application/merge-patch+json"));
        assert_eq!(
            wire.headers
                .iter()
                .filter(|(name, _)| name == "content-type")
                .count(),
            1
        );
    }

    #[test]
    fn test_header_replaces_previous_value() {
        let descriptor = RequestDescriptor::get("/x")
            .header("X-Trace", "a")
            .header("x-trace", "b");
        assert_eq!(descriptor.headers(), &[("x-trace".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_file_body_becomes_multipart() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("upload.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let wire = builder("http://localhost:8080", None)
            .build(&RequestDescriptor::post("/api/v1/files/upload/b1").file(&path))
            .unwrap();

        let content_type = wire.header("content-type").unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert!(matches!(wire.body, WireBody::Multipart(_)));
        assert!(wire.body.content_length() > 10);
    }

    #[test]
    fn test_unreadable_file_fails_before_sending() {
        let err = builder("http://localhost:8080", None)
            .build(&RequestDescriptor::post("/upload").file("/definitely/not/here.bin"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(RequestBuilder::new(&ClientConfig::new("::not a url::")).is_err());
    }
}

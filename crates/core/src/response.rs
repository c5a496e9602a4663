//! Response envelopes and decoding
//!
//! The caller picks the expected result shape at the call site with a marker
//! type: [`Json<T>`] for a typed JSON value, [`RawBytes`] for downloads and
//! [`NoContent`] for calls whose body is ignored. Non-2xx responses always
//! become an [`ApiError`] carrying the raw body text.

use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, Error, Result};

/// Raw result of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub status: u16,
    /// Lower-case header names
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseEnvelope {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Body as text, replacing invalid UTF-8
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Expected result shape of a call
pub trait ResponseShape: Send + 'static {
    type Output: Send + 'static;

    /// Decode the body of a 2xx response
    fn decode_success(body: Bytes) -> Result<Self::Output>;
}

/// Typed JSON value
pub struct Json<T>(PhantomData<fn() -> T>);

impl<T> ResponseShape for Json<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    fn decode_success(body: Bytes) -> Result<T> {
        serde_json::from_slice(&body).map_err(|e| Error::Decode {
            message: e.to_string(),
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Body bytes, unchanged
pub struct RawBytes;

impl ResponseShape for RawBytes {
    type Output = Bytes;

    fn decode_success(body: Bytes) -> Result<Bytes> {
        Ok(body)
    }
}

/// Body is ignored
pub struct NoContent;

impl ResponseShape for NoContent {
    type Output = ();

    fn decode_success(_body: Bytes) -> Result<()> {
        Ok(())
    }
}

/// Turns envelopes into results or typed errors
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseDecoder;

impl ResponseDecoder {
    pub fn decode<S: ResponseShape>(envelope: ResponseEnvelope) -> Result<S::Output> {
        if envelope.is_success() {
            return S::decode_success(envelope.body);
        }

        let body = envelope.body_text();
        Err(ApiError::from_status(envelope.status, body).into())
    }
}

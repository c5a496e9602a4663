//! Network seam between the dispatcher and an HTTP implementation

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::request::WireRequest;
use crate::response::ResponseEnvelope;

/// Sends one wire request and returns the raw response.
///
/// Implementations return `Ok` for every HTTP response, whatever its status,
/// and [`Error::Transport`](crate::Error::Transport) for failures below HTTP
/// (refused connection, timeout, broken stream).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: WireRequest) -> Result<ResponseEnvelope>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: WireRequest) -> Result<ResponseEnvelope> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: WireRequest) -> Result<ResponseEnvelope> {
        (**self).send(request).await
    }
}

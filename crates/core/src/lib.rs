//! osc-core: request dispatch for the osc storage client
//!
//! This crate provides everything between a logical API call and the wire:
//! - Error taxonomy for HTTP and transport failures
//! - Retry state machine with exponential backoff
//! - Connection pool with global and per-route limits
//! - Request builder, multipart encoder and response decoder
//! - The async [`Dispatcher`] and its blocking wrapper
//! - Configuration, aliases and the bucket/file API types
//!
//! Networking sits behind the [`Transport`] trait, so the dispatcher can be
//! exercised without a server.

pub mod alias;
pub mod blocking;
pub mod config;
pub mod dispatcher;
pub mod dto;
pub mod error;
pub mod multipart;
pub mod path;
pub mod pool;
pub mod request;
pub mod response;
pub mod retry;
pub mod traits;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use alias::{Alias, AliasManager};
pub use blocking::BlockingDispatcher;
pub use config::{ClientConfig, Config, ConfigManager, PoolConfig};
pub use dispatcher::Dispatcher;
pub use error::{ApiError, Error, ErrorCategory, ErrorKind, Result, TransportErrorKind};
pub use multipart::{MultipartBody, MultipartEncoder, MultipartStream};
pub use path::{RemotePath, parse_path};
pub use pool::{ConnectionPool, Lease, PoolStats};
pub use request::{Method, RequestBody, RequestBuilder, RequestDescriptor, WireBody, WireRequest};
pub use response::{Json, NoContent, RawBytes, ResponseDecoder, ResponseEnvelope, ResponseShape};
pub use retry::{RetryPhase, RetryPolicy, RetryState, retry_with_backoff};
pub use traits::ObjectStore;
pub use transport::Transport;

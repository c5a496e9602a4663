//! osc-client: HTTP client for the osc storage service
//!
//! Provides the reqwest [`ReqwestTransport`] and [`StorageClient`], which
//! implements the `ObjectStore` trait from osc-core on top of the dispatcher.

mod client;
mod transport;

pub use client::StorageClient;
pub use transport::ReqwestTransport;

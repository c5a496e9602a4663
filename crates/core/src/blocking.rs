//! Blocking calling convention
//!
//! [`BlockingDispatcher`] owns a small tokio runtime and drives the async
//! [`Dispatcher`] on it, blocking the calling thread until the call resolves.
//! It must not be used from inside an async context.

use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::pool::PoolStats;
use crate::request::RequestDescriptor;
use crate::response::ResponseShape;
use crate::transport::Transport;

pub struct BlockingDispatcher<T> {
    inner: Arc<Dispatcher<T>>,
    runtime: Runtime,
}

impl<T> std::fmt::Debug for BlockingDispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingDispatcher")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> BlockingDispatcher<T> {
    pub fn new(config: ClientConfig, transport: T) -> Result<Self> {
        Self::from_dispatcher(Arc::new(Dispatcher::new(config, transport)?))
    }

    /// Share an existing dispatcher, including its pool and retry policy
    pub fn from_dispatcher(inner: Arc<Dispatcher<T>>) -> Result<Self> {
        // One worker keeps connection tasks progressing between calls; any
        // number of threads may block on the runtime at once.
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("osc-blocking")
            .enable_all()
            .build()?;

        Ok(Self { inner, runtime })
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<T>> {
        &self.inner
    }

    pub fn execute<S: ResponseShape>(&self, descriptor: &RequestDescriptor) -> Result<S::Output> {
        self.runtime.block_on(self.inner.execute::<S>(descriptor))
    }

    /// Blocking call that gives up with `Error::Cancelled` once `cancel`
    /// fires, typically from another thread
    pub fn execute_with_cancel<S: ResponseShape>(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<S::Output> {
        self.runtime
            .block_on(self.inner.execute_with_cancel::<S>(descriptor, cancel))
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.inner.pool_stats()
    }

    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

//! Request dispatcher
//!
//! Every API call flows through [`Dispatcher::execute`]: the descriptor is
//! resolved into a wire request once, then each attempt leases a pooled
//! connection, sends through the [`Transport`] and decodes the envelope. The
//! retry policy decides whether a failed attempt is tried again.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::pool::{ConnectionPool, PoolStats, route_key};
use crate::request::{RequestBuilder, RequestDescriptor, WireRequest};
use crate::response::{ResponseDecoder, ResponseShape};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::transport::Transport;

/// Executes logical calls against one storage service
pub struct Dispatcher<T> {
    transport: T,
    config: ClientConfig,
    builder: RequestBuilder,
    pool: ConnectionPool,
    policy: RetryPolicy,
    shutdown: CancellationToken,
}

impl<T> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.config.base_url)
            .field("pool", &self.pool)
            .field("policy", &self.policy)
            .field("closed", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(config: ClientConfig, transport: T) -> Result<Self> {
        let builder = RequestBuilder::new(&config)?;
        let pool = ConnectionPool::new(config.pool, config.timeout());

        Ok(Self {
            transport,
            config,
            builder,
            pool,
            policy: RetryPolicy::standard(),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Drop idle pool routes now instead of waiting for the next sweep
    pub fn evict_idle(&self) -> usize {
        self.pool.evict_idle()
    }

    /// Execute a call and decode the result as `S`
    pub async fn execute<S: ResponseShape>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<S::Output> {
        self.execute_with_cancel::<S>(descriptor, &CancellationToken::new())
            .await
    }

    /// Execute a call that resolves with [`Error::Cancelled`] as soon as
    /// `cancel` fires, whether the call is waiting for a connection, on the
    /// network, or sleeping between attempts.
    pub async fn execute_with_cancel<S: ResponseShape>(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<S::Output> {
        if self.is_closed() {
            return Err(Error::ClientClosed);
        }

        let wire = self.builder.build(descriptor)?;
        let route = route_key(&wire.url);
        let span = tracing::debug_span!(
            "execute",
            method = %descriptor.method(),
            path = descriptor.path(),
        );

        async {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => Err(Error::ClientClosed),
                _ = cancel.cancelled() => {
                    tracing::debug!("Call cancelled");
                    Err(Error::Cancelled)
                }
                result = retry_with_backoff(&self.policy, |attempt| {
                    self.attempt::<S>(wire.clone(), &route, attempt)
                }) => result,
            }
        }
        .instrument(span)
        .await
    }

    async fn attempt<S: ResponseShape>(
        &self,
        wire: WireRequest,
        route: &str,
        attempt: u32,
    ) -> Result<S::Output> {
        let method = wire.method;
        let url = wire.url.clone();

        let lease = self.pool.lease(route).await?;
        let started = tokio::time::Instant::now();
        let outcome = self.transport.send(wire).await;
        drop(lease);
        let elapsed_ms = elapsed_ms(started.elapsed());

        match &outcome {
            Ok(envelope) => tracing::debug!(
                %method,
                %url,
                attempt,
                status = envelope.status,
                elapsed_ms,
                "HTTP exchange"
            ),
            Err(e) => tracing::debug!(
                %method,
                %url,
                attempt,
                elapsed_ms,
                error = %e,
                "HTTP exchange failed"
            ),
        }

        ResponseDecoder::decode::<S>(outcome?)
    }

    /// Shut the dispatcher down. Pending and future calls fail with
    /// [`Error::ClientClosed`]. Calling it again has no effect.
    pub fn close(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        self.pool.close();
        tracing::debug!(base_url = %self.config.base_url, "Dispatcher closed");
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

//! Connection pool accounting
//!
//! Bounds the number of in-flight exchanges globally and per route
//! (`scheme://host:port`). A [`Lease`] holds one slot of each and gives them
//! back when dropped, so every exit path of a call releases its connection.
//! Routes idle for longer than the eviction interval are dropped, either
//! opportunistically on lease or through [`ConnectionPool::evict_idle`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use url::Url;

use crate::config::PoolConfig;
use crate::error::{Error, Result, TransportErrorKind};

/// Point-in-time view of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub leased: usize,
    pub pending: usize,
    pub available: usize,
    pub max: usize,
}

struct RouteEntry {
    permits: Arc<Semaphore>,
    last_used: Instant,
}

struct PoolInner {
    config: PoolConfig,
    lease_timeout: Duration,
    global: Arc<Semaphore>,
    routes: Mutex<HashMap<String, RouteEntry>>,
    last_sweep: Mutex<Instant>,
    leased: AtomicUsize,
    pending: AtomicUsize,
    closed: AtomicBool,
}

/// Bounded pool shared by every call of a dispatcher
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Route key of a URL: `scheme://host:port`
pub fn route_key(url: &Url) -> String {
    format!(
        "{}://{}:{}",
        url.scheme(),
        url.host_str().unwrap_or_default().to_ascii_lowercase(),
        url.port_or_known_default().unwrap_or_default()
    )
}

impl ConnectionPool {
    /// `lease_timeout` bounds how long a lease may wait for a free slot
    pub fn new(config: PoolConfig, lease_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                config,
                lease_timeout,
                global: Arc::new(Semaphore::new(config.max_total)),
                routes: Mutex::new(HashMap::new()),
                last_sweep: Mutex::new(Instant::now()),
                leased: AtomicUsize::new(0),
                pending: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Lease a slot for `route`, waiting while the pool is saturated
    pub async fn lease(&self, route: &str) -> Result<Lease> {
        if self.is_closed() {
            return Err(Error::ClientClosed);
        }
        self.maybe_evict();

        let route_permits = {
            let mut routes = lock(&self.inner.routes);
            let entry = routes
                .entry(route.to_string())
                .or_insert_with(|| RouteEntry {
                    permits: Arc::new(Semaphore::new(self.inner.config.max_per_route)),
                    last_used: Instant::now(),
                });
            entry.last_used = Instant::now();
            entry.permits.clone()
        };

        let _pending = PendingGuard::new(&self.inner.pending);

        let acquire = async {
            let route_permit = route_permits
                .acquire_owned()
                .await
                .map_err(|_| Error::ClientClosed)?;
            let global_permit = self
                .inner
                .global
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| Error::ClientClosed)?;
            Ok::<_, Error>((route_permit, global_permit))
        };

        let (route_permit, global_permit) =
            match tokio::time::timeout(self.inner.lease_timeout, acquire).await {
                Ok(permits) => permits?,
                Err(_) => {
                    tracing::debug!(route, timeout = ?self.inner.lease_timeout, "Connection lease timed out");
                    return Err(Error::transport(
                        TransportErrorKind::PoolTimeout,
                        format!(
                            "timed out after {:?} waiting for a pooled connection to {route}",
                            self.inner.lease_timeout
                        ),
                    ));
                }
            };

        if self.is_closed() {
            return Err(Error::ClientClosed);
        }

        self.inner.leased.fetch_add(1, Ordering::SeqCst);
        Ok(Lease {
            pool: self.inner.clone(),
            route: route.to_string(),
            _route_permit: route_permit,
            _global_permit: global_permit,
        })
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            leased: self.inner.leased.load(Ordering::SeqCst),
            pending: self.inner.pending.load(Ordering::SeqCst),
            available: self.inner.global.available_permits(),
            max: self.inner.config.max_total,
        }
    }

    /// Number of routes currently tracked
    pub fn route_count(&self) -> usize {
        lock(&self.inner.routes).len()
    }

    /// Drop routes with no active lease that have been idle for longer than
    /// the eviction interval. Returns how many were dropped.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        *lock(&self.inner.last_sweep) = now;

        let idle_for = self.inner.config.idle_eviction();
        let max_per_route = self.inner.config.max_per_route;
        let mut routes = lock(&self.inner.routes);
        let before = routes.len();
        routes.retain(|_, entry| {
            entry.permits.available_permits() < max_per_route
                || now.duration_since(entry.last_used) <= idle_for
        });

        let evicted = before - routes.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = routes.len(), "Evicted idle routes");
        }
        evicted
    }

    fn maybe_evict(&self) {
        let due = {
            let last_sweep = lock(&self.inner.last_sweep);
            last_sweep.elapsed() >= self.inner.config.idle_eviction()
        };
        if due {
            self.evict_idle();
        }
    }

    /// Reject pending and future leases. Idempotent.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.global.close();
        for entry in lock(&self.inner.routes).values() {
            entry.permits.close();
        }
        tracing::debug!("Connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

/// A leased connection slot, released on drop
pub struct Lease {
    pool: Arc<PoolInner>,
    route: String,
    _route_permit: OwnedSemaphorePermit,
    _global_permit: OwnedSemaphorePermit,
}

impl Lease {
    pub fn route(&self) -> &str {
        &self.route
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease").field("route", &self.route).finish()
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.pool.leased.fetch_sub(1, Ordering::SeqCst);
        if let Some(entry) = lock(&self.pool.routes).get_mut(&self.route) {
            entry.last_used = Instant::now();
        }
    }
}

struct PendingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> PendingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(max_total: usize, max_per_route: usize) -> ConnectionPool {
        ConnectionPool::new(
            PoolConfig {
                max_total,
                max_per_route,
                idle_eviction_secs: 30,
            },
            Duration::from_secs(5),
        )
    }

    const ROUTE: &str = "http://localhost:8080";

    #[test]
    fn test_route_key() {
        let url = Url::parse("https://Example.com/api/v1/buckets").unwrap();
        assert_eq!(route_key(&url), "https://example.com:443");
        let url = Url::parse("http://localhost:9000/x").unwrap();
        assert_eq!(route_key(&url), "http://localhost:9000");
    }

    #[tokio::test]
    async fn test_lease_and_release() {
        let pool = pool(10, 5);
        let lease = pool.lease(ROUTE).await.unwrap();
        assert_eq!(lease.route(), ROUTE);

        let stats = pool.stats();
        assert_eq!(stats.leased, 1);
        assert_eq!(stats.available, 9);
        assert_eq!(stats.max, 10);

        drop(lease);
        let stats = pool.stats();
        assert_eq!(stats.leased, 0);
        assert_eq!(stats.available, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_leases_respect_max_total() {
        let pool = pool(10, 20);
        let high_water = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let pool = pool.clone();
            let high_water = high_water.clone();
            handles.push(tokio::spawn(async move {
                let _lease = pool.lease(ROUTE).await.unwrap();
                high_water.fetch_max(pool.stats().leased, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(high_water.load(Ordering::SeqCst) <= 10);
        assert_eq!(pool.stats().leased, 0);
        assert_eq!(pool.stats().pending, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_route_limit() {
        let pool = pool(10, 1);
        let first = pool.lease(ROUTE).await.unwrap();

        // A different route is unaffected
        let other = pool.lease("http://other:80").await.unwrap();
        drop(other);

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.lease(ROUTE).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(pool.stats().pending, 1);

        drop(first);
        waiter.await.unwrap().unwrap();
        assert_eq!(pool.stats().pending, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lease_timeout_is_retryable_transport_error() {
        let pool = pool(1, 1);
        let _held = pool.lease(ROUTE).await.unwrap();

        let err = pool.lease(ROUTE).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport {
                kind: TransportErrorKind::PoolTimeout,
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_rejects_pending_and_future_leases() {
        let pool = pool(1, 1);
        let held = pool.lease(ROUTE).await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.lease(ROUTE).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        pool.close();
        pool.close();

        assert!(matches!(waiter.await.unwrap(), Err(Error::ClientClosed)));
        assert!(matches!(pool.lease(ROUTE).await, Err(Error::ClientClosed)));

        drop(held);
        assert_eq!(pool.stats().leased, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_routes_are_evicted() {
        let pool = pool(10, 5);
        drop(pool.lease(ROUTE).await.unwrap());
        let active = pool.lease("http://busy:80").await.unwrap();
        assert_eq!(pool.route_count(), 2);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(pool.evict_idle(), 1);
        assert_eq!(pool.route_count(), 1);

        drop(active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_runs_on_lease_after_interval() {
        let pool = pool(10, 5);
        drop(pool.lease("http://stale:80").await.unwrap());

        tokio::time::advance(Duration::from_secs(31)).await;
        drop(pool.lease(ROUTE).await.unwrap());

        assert_eq!(pool.route_count(), 1);
    }
}

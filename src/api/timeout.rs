//! Deadline-bounding store adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use super::{CoordinationStore, StoreError};

/// Configuration for [`TimeoutStore`].
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// Deadline applied to every store operation, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            // Five minutes, matching the usual default of store clients.
            timeout_ms: 300_000,
        }
    }
}

impl TimeoutConfig {
    /// Config with the given deadline in milliseconds.
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }
}

/// Store adapter that bounds every operation with a deadline.
///
/// The rendezvous and barrier protocols never time out on their own: a
/// blocking `get` parks until the key appears and `wait` parks until the
/// group is released, forever if peers are missing. Wrapping the store is
/// the supported way to bound that blocking. An elapsed deadline surfaces
/// as [`StoreError::Timeout`], which the coordination layer propagates to
/// the caller without retrying.
pub struct TimeoutStore<S: CoordinationStore + ?Sized> {
    store: Arc<S>,
    config: TimeoutConfig,
}

impl<S: CoordinationStore + ?Sized> TimeoutStore<S> {
    /// Wrap `store`, applying `config.timeout_ms` to every operation.
    pub fn new(store: Arc<S>, config: TimeoutConfig) -> Self {
        Self { store, config }
    }

    fn deadline(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    fn elapsed(&self) -> StoreError {
        StoreError::Timeout {
            duration_ms: self.config.timeout_ms,
        }
    }
}

#[async_trait]
impl<S: CoordinationStore + ?Sized> CoordinationStore for TimeoutStore<S> {
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        timeout(self.deadline(), self.store.set(key, value))
            .await
            .map_err(|_| self.elapsed())?
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        timeout(self.deadline(), self.store.get(key))
            .await
            .map_err(|_| self.elapsed())?
    }

    async fn add(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        timeout(self.deadline(), self.store.add(key, delta))
            .await
            .map_err(|_| self.elapsed())?
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new_value: &[u8],
    ) -> Result<Vec<u8>, StoreError> {
        timeout(
            self.deadline(),
            self.store.compare_and_set(key, expected, new_value),
        )
        .await
        .map_err(|_| self.elapsed())?
    }

    async fn check(&self, keys: &[String]) -> Result<bool, StoreError> {
        timeout(self.deadline(), self.store.check(keys))
            .await
            .map_err(|_| self.elapsed())?
    }

    async fn wait(&self, keys: &[String]) -> Result<(), StoreError> {
        timeout(self.deadline(), self.store.wait(keys))
            .await
            .map_err(|_| self.elapsed())?
    }
}

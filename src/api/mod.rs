//! Store contract consumed by the rendezvous and barrier primitives.
//!
//! The coordination layer never talks to peers directly; every protocol
//! step goes through one shared, strongly consistent key-value store that
//! implements [`CoordinationStore`]. The trait is deliberately narrow (six
//! operations) so that any store with atomic writes and a blocking read
//! can back a group: a test double lives in [`inmemory`], and the
//! [`prefix`] and [`timeout`] adapters layer namespacing and deadlines on
//! top of any implementation.

use async_trait::async_trait;
use thiserror::Error;

pub mod inmemory;
pub mod prefix;
pub mod timeout;

pub use inmemory::DeterministicCoordinationStore;
pub use prefix::PrefixStore;
pub use timeout::{TimeoutConfig, TimeoutStore};

/// Errors surfaced by [`CoordinationStore`] implementations.
///
/// The coordination layer performs no retries: every store error is
/// propagated unchanged to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Returned by stores whose `get` does not block on absent keys.
    #[error("key '{key}' not found")]
    NotFound { key: String },
    /// A deadline layered on the store elapsed (see [`TimeoutStore`]).
    #[error("operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },
    /// The store cannot currently serve requests.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("operation failed: {reason}")]
    Failed { reason: String },
}

/// Minimal capability set a shared store must provide for group
/// rendezvous and counter-aggregating barriers.
///
/// All operations must be atomic and totally ordered with respect to each
/// other (a strongly consistent store). Values are opaque byte sequences;
/// the only format the trait itself imposes is on counter keys touched by
/// [`add`](CoordinationStore::add).
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Unconditionally write `value` under `key`.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Read the value under `key`.
    ///
    /// Behavior on an absent key is implementation-defined: a blocking
    /// store parks the caller until the key is written (fixed-size
    /// rendezvous relies on this), while a non-blocking store returns
    /// [`StoreError::NotFound`].
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Atomically add `delta` to the numeric value under `key` and return
    /// the new total.
    ///
    /// An absent key counts as zero. The stored representation is the
    /// decimal ASCII form of the total, so a later `get` on a counter key
    /// yields parseable text.
    async fn add(&self, key: &str, delta: i64) -> Result<i64, StoreError>;

    /// Atomically write `new_value` if the current value matches
    /// `expected`, where `None` means the key must be absent.
    ///
    /// Returns the value stored under `key` after the attempt: `new_value`
    /// on success, the unchanged current value on mismatch, empty bytes if
    /// the key is still absent. Callers detect success by comparing the
    /// returned bytes with `new_value`; a key that already holds
    /// `new_value` therefore reads as success even though nothing was
    /// written.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new_value: &[u8],
    ) -> Result<Vec<u8>, StoreError>;

    /// Report whether every key in `keys` currently exists. Never blocks.
    async fn check(&self, keys: &[String]) -> Result<bool, StoreError>;

    /// Block until every key in `keys` exists.
    async fn wait(&self, keys: &[String]) -> Result<(), StoreError>;
}

// Blanket implementation for Arc<T> where T: CoordinationStore
#[async_trait]
impl<T: CoordinationStore + ?Sized> CoordinationStore for std::sync::Arc<T> {
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        (**self).get(key).await
    }

    async fn add(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        (**self).add(key, delta).await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new_value: &[u8],
    ) -> Result<Vec<u8>, StoreError> {
        (**self).compare_and_set(key, expected, new_value).await
    }

    async fn check(&self, keys: &[String]) -> Result<bool, StoreError> {
        (**self).check(keys).await
    }

    async fn wait(&self, keys: &[String]) -> Result<(), StoreError> {
        (**self).wait(keys).await
    }
}

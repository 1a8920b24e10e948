//! Key-namespacing store adapter.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CoordinationStore, StoreError};

/// Store adapter that prepends a fixed prefix to every key.
///
/// Gives a worker group (or one coordination domain of a group) a private
/// namespace on a shared physical store: two groups using identical
/// logical keys cannot interfere as long as their prefixes differ. The
/// prefix is joined by plain concatenation, so include a trailing
/// separator in the prefix itself if the backing store benefits from one.
/// Adapters compose; wrapping a `PrefixStore` in another `PrefixStore`
/// concatenates both prefixes.
///
/// # Example
///
/// ```ignore
/// use muster::api::{DeterministicCoordinationStore, PrefixStore};
///
/// let backing = Arc::new(DeterministicCoordinationStore::new());
/// let group_a = PrefixStore::new(backing.clone(), "groupA/");
/// let group_b = PrefixStore::new(backing, "groupB/");
/// ```
pub struct PrefixStore<S: CoordinationStore + ?Sized> {
    store: Arc<S>,
    prefix: String,
}

impl<S: CoordinationStore + ?Sized> PrefixStore<S> {
    /// Wrap `store`, prefixing every key with `prefix`.
    pub fn new(store: Arc<S>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn prefixed_all(&self, keys: &[String]) -> Vec<String> {
        keys.iter().map(|key| self.prefixed(key)).collect()
    }
}

#[async_trait]
impl<S: CoordinationStore + ?Sized> CoordinationStore for PrefixStore<S> {
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.store.set(&self.prefixed(key), value).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.store.get(&self.prefixed(key)).await
    }

    async fn add(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        self.store.add(&self.prefixed(key), delta).await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new_value: &[u8],
    ) -> Result<Vec<u8>, StoreError> {
        self.store
            .compare_and_set(&self.prefixed(key), expected, new_value)
            .await
    }

    async fn check(&self, keys: &[String]) -> Result<bool, StoreError> {
        self.store.check(&self.prefixed_all(keys)).await
    }

    async fn wait(&self, keys: &[String]) -> Result<(), StoreError> {
        self.store.wait(&self.prefixed_all(keys)).await
    }
}

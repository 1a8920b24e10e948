//! In-memory implementation of the store contract for testing.
//!
//! Provides a deterministic, non-persistent [`CoordinationStore`] for unit
//! tests and single-process simulations of multi-worker groups. Blocking
//! reads are real (callers park on a notifier until the key appears), so
//! rendezvous and barrier interleavings exercise the same wait points they
//! would against a production store, without network I/O.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use super::{CoordinationStore, StoreError};

/// In-memory deterministic implementation of [`CoordinationStore`] for testing.
///
/// Keys live in a HashMap behind a mutex. Every mutation signals a shared
/// [`Notify`], and the blocking operations (`get` on an absent key, `wait`)
/// re-check their condition on each signal. Waiters register with the
/// notifier before checking the map, so a write that lands between the
/// check and the park cannot be missed.
///
/// # Limitations
///
/// - Single-process only (no replication, no persistence)
/// - No key expiry; entries live until overwritten
///
/// # Example
///
/// ```ignore
/// use muster::api::{CoordinationStore, DeterministicCoordinationStore};
///
/// let store = Arc::new(DeterministicCoordinationStore::new());
/// store.set("greeting", b"hello").await?;
/// assert_eq!(store.get("greeting").await?, b"hello");
/// ```
#[derive(Clone, Default)]
pub struct DeterministicCoordinationStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    changed: Arc<Notify>,
}

impl DeterministicCoordinationStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored. Test helper.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// True if no keys are stored. Test helper.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// Parse the decimal text a counter key holds.
fn parse_counter(key: &str, bytes: &[u8]) -> Result<i64, StoreError> {
    let text = std::str::from_utf8(bytes).map_err(|_| StoreError::Failed {
        reason: format!("counter key '{}' holds non-UTF-8 bytes", key),
    })?;
    text.parse::<i64>().map_err(|_| StoreError::Failed {
        reason: format!("counter key '{}' holds non-numeric text '{}'", key, text),
    })
}

#[async_trait]
impl CoordinationStore for DeterministicCoordinationStore {
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_vec());
        drop(entries);
        self.changed.notify_waiters();
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        loop {
            // Register before checking so a concurrent set cannot slip
            // between the miss and the park.
            let notified = self.changed.notified();
            {
                let entries = self.entries.lock().await;
                if let Some(value) = entries.get(key) {
                    return Ok(value.clone());
                }
            }
            notified.await;
        }
    }

    async fn add(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let mut entries = self.entries.lock().await;
        let current = match entries.get(key) {
            Some(bytes) => parse_counter(key, bytes)?,
            None => 0,
        };
        let total = current.checked_add(delta).ok_or_else(|| StoreError::Failed {
            reason: format!("counter key '{}' overflowed", key),
        })?;
        entries.insert(key.to_string(), total.to_string().into_bytes());
        drop(entries);
        self.changed.notify_waiters();
        Ok(total)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new_value: &[u8],
    ) -> Result<Vec<u8>, StoreError> {
        let mut entries = self.entries.lock().await;
        let current = entries.get(key).cloned();
        let condition_matches = match (&expected, &current) {
            (None, None) => true,
            (Some(exp), Some(cur)) => *exp == cur.as_slice(),
            _ => false,
        };
        if condition_matches {
            entries.insert(key.to_string(), new_value.to_vec());
            drop(entries);
            self.changed.notify_waiters();
            Ok(new_value.to_vec())
        } else {
            Ok(current.unwrap_or_default())
        }
    }

    async fn check(&self, keys: &[String]) -> Result<bool, StoreError> {
        let entries = self.entries.lock().await;
        Ok(keys.iter().all(|key| entries.contains_key(key)))
    }

    async fn wait(&self, keys: &[String]) -> Result<(), StoreError> {
        loop {
            let notified = self.changed.notified();
            {
                let entries = self.entries.lock().await;
                if keys.iter().all(|key| entries.contains_key(key)) {
                    return Ok(());
                }
            }
            notified.await;
        }
    }
}

//! Counter-aggregating barrier for worker groups.
//!
//! `sync_call_count` blocks every caller until all `group_size` workers
//! of the group have arrived, then hands each of them the group-wide sum
//! of the per-worker contributions for that round. Rounds are separated
//! by an epoch counter local to each handle; each round uses three fresh
//! store keys (contribution accumulator, arrival counter, release
//! marker), so consecutive rounds never interfere.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::api::CoordinationStore;
use crate::error::CoordinationError;
use crate::keys;

/// Counter-aggregating barrier over a shared store.
///
/// The epoch counter lives on the handle, not in process-global state,
/// so several independent groups can coexist in one process: give each
/// group its own `BarrierCounter` (and its own key namespace via
/// [`PrefixStore`](crate::api::PrefixStore)). One handle may be shared
/// by several threads; concurrent calls receive distinct epochs.
pub struct BarrierCounter<S: CoordinationStore + ?Sized> {
    store: Arc<S>,
    epoch: AtomicU64,
}

impl<S: CoordinationStore + ?Sized + 'static> BarrierCounter<S> {
    /// Create a barrier handle backed by `store`. The first round uses
    /// epoch 1.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            epoch: AtomicU64::new(0),
        }
    }

    /// The last epoch this handle used; 0 before the first round.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Block until all `group_size` workers have called, then return the
    /// group-wide sum of the `active_calls` contributions for this round.
    ///
    /// Every worker of the group must perform the same sequence of
    /// `sync_call_count` calls in the same order, so that call *k* on one
    /// worker pairs with call *k* on every other; the epochs pair the
    /// calls, nothing else does. Contributions may be zero or negative.
    ///
    /// If fewer than `group_size` workers call, everyone blocks forever;
    /// the protocol has no timeout of its own. Bound the blocking by
    /// wrapping the store in a [`TimeoutStore`](crate::api::TimeoutStore),
    /// which surfaces as [`CoordinationError::Storage`]. More than
    /// `group_size` callers in one round is undefined.
    pub async fn sync_call_count(
        &self,
        group_size: u32,
        active_calls: i64,
    ) -> Result<i64, CoordinationError> {
        assert!(group_size > 0, "BARRIER: group_size must be positive");

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let process_count_key = keys::process_count_key(epoch);
        let active_call_count_key = keys::active_call_count_key(epoch);
        let ready_key = keys::ready_key(epoch);

        debug!(epoch, group_size, active_calls, "entering barrier");

        // Contribute before announcing arrival: when the last arrival is
        // counted the aggregate is already complete.
        self.store
            .add(&active_call_count_key, active_calls)
            .await?;
        let arrived = self.store.add(&process_count_key, 1).await?;

        if arrived == i64::from(group_size) {
            // Last arriver releases the whole group. The marker's
            // existence is the signal; its value stays empty.
            self.store.set(&ready_key, b"").await?;
        }

        self.store.wait(&[ready_key]).await?;

        let bytes = self.store.get(&active_call_count_key).await?;
        let total = parse_total(&active_call_count_key, &bytes)?;

        debug!(epoch, total, "barrier released");
        Ok(total)
    }
}

/// Parse the decimal text of the contribution accumulator.
fn parse_total(key: &str, bytes: &[u8]) -> Result<i64, CoordinationError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CoordinationError::CorruptedData {
        key: key.to_string(),
        reason: "aggregate is not valid UTF-8".to_string(),
    })?;
    text.parse::<i64>()
        .map_err(|_| CoordinationError::CorruptedData {
            key: key.to_string(),
            reason: format!("aggregate is not a decimal integer: '{}'", text),
        })
}

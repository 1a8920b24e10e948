//! Worker name rendezvous through a shared store.
//!
//! Every worker in a group publishes its own (id, name) pair into the
//! store and learns the complete roster of its peers before proceeding.
//! Two group modes:
//!
//! 1. **Fixed-size** ([`NameRegistry::collect_names`]): the group size is
//!    known upfront. Each worker publishes its name under its own id key
//!    and then performs a blocking read for every other id in the group,
//!    so the call completes only once all members have published.
//! 2. **Dynamic-size** ([`NameRegistry::collect_current_names`]): the
//!    group grows incrementally. A worker claims its id with a
//!    compare-and-set, then reads, extends, and rewrites a shared
//!    manifest of all members registered so far.
//!
//! Workers never talk to each other directly; the store is the only
//! channel, so independently deployed processes rendezvous as long as
//! they share a store (and a key namespace, see
//! [`PrefixStore`](crate::api::PrefixStore)).

use std::sync::Arc;

use tracing::debug;

use crate::api::{CoordinationStore, StoreError};
use crate::error::CoordinationError;
use crate::keys::{self, GROUP_MANIFEST_KEY, NameTable, WorkerId};

/// Name rendezvous over a shared store.
pub struct NameRegistry<S: CoordinationStore + ?Sized> {
    store: Arc<S>,
}

impl<S: CoordinationStore + ?Sized + 'static> NameRegistry<S> {
    /// Create a registry backed by `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Rendezvous with a group of known size.
    ///
    /// Publishes `self_name` under this worker's id key, then reads the
    /// name of every other id in `0..group_size`. Each of those reads
    /// blocks until the peer has published, so the call returns only once
    /// the whole group is present. Every member returns an identical
    /// [`NameTable`] with exactly `group_size` entries, its own pair
    /// included.
    ///
    /// Fails with [`CoordinationError::NameCollision`] if two workers
    /// registered the same name, naming both ids. A missing peer blocks
    /// forever unless the store bounds its reads (see
    /// [`TimeoutStore`](crate::api::TimeoutStore)).
    pub async fn collect_names(
        &self,
        self_id: WorkerId,
        self_name: &str,
        group_size: u32,
    ) -> Result<NameTable, CoordinationError> {
        assert!(group_size > 0, "REGISTRY: group_size must be positive");
        assert!(self_id < group_size, "REGISTRY: self_id must lie in 0..group_size");
        assert!(!self_name.is_empty(), "REGISTRY: worker name must not be empty");

        self.store
            .set(&keys::worker_key(self_id), self_name.as_bytes())
            .await?;
        debug!(id = self_id, name = self_name, group_size, "published own name, reading peers");

        let mut table = NameTable::with_capacity(group_size as usize);
        table.insert(self_name.to_string(), self_id);

        for peer_id in 0..group_size {
            if peer_id == self_id {
                continue;
            }
            let bytes = self.store.get(&keys::worker_key(peer_id)).await?;
            let peer_name = decode_name(peer_id, &bytes)?;
            insert_unique(&mut table, peer_name, peer_id)?;
        }

        debug!(id = self_id, entries = table.len(), "group roster complete");
        Ok(table)
    }

    /// Rendezvous with a group whose size is discovered incrementally.
    ///
    /// Claims this worker's id key with a compare-and-set (absent →
    /// `self_name`), re-publishes the name unconditionally, then reads
    /// the shared manifest of members registered so far, appends its own
    /// record, and writes the manifest back. Returns the roster as of
    /// this join: all earlier members plus the caller.
    ///
    /// Fails with [`CoordinationError::IdCollision`] if the id is already
    /// registered under a different name (re-claiming one's own id with
    /// the same name passes the claim step), and with
    /// [`CoordinationError::NameCollision`] if `self_name` duplicates any
    /// registered name, the caller's own earlier record included.
    ///
    /// # Known consistency gap
    ///
    /// The manifest rewrite is a plain last-writer-wins `set`: two
    /// workers joining concurrently can each read a manifest missing the
    /// other, and one rewrite can drop the other's record. Later joiners
    /// then see an incomplete roster. The id claim itself is race-free;
    /// only the manifest aggregation carries this gap, so concurrent
    /// joins need external serialization if a complete roster matters.
    pub async fn collect_current_names(
        &self,
        self_id: WorkerId,
        self_name: &str,
    ) -> Result<NameTable, CoordinationError> {
        assert!(!self_name.is_empty(), "REGISTRY: worker name must not be empty");
        assert!(
            !self_name.contains([',', '-']),
            "REGISTRY: worker name must not contain manifest separators ',' or '-'"
        );

        // Claim the id. The store returns whatever the key holds after
        // the attempt; reading back our own name counts as a successful
        // claim even if an earlier registration already wrote it.
        let claim_key = keys::worker_key(self_id);
        let stored = self
            .store
            .compare_and_set(&claim_key, None, self_name.as_bytes())
            .await?;
        if stored.as_slice() != self_name.as_bytes() {
            let occupant = decode_name(self_id, &stored)?;
            return Err(CoordinationError::IdCollision {
                id: self_id,
                occupant,
                candidate: self_name.to_string(),
            });
        }

        // Unconditional re-publish after the claim; refreshes the entry
        // on stores with lease semantics.
        self.store.set(&claim_key, self_name.as_bytes()).await?;
        debug!(id = self_id, name = self_name, "claimed worker id");

        // Read the roster registered so far. The manifest key exists only
        // after the first member finished joining.
        let manifest_keys = vec![GROUP_MANIFEST_KEY.to_string()];
        let manifest_text = if self.store.check(&manifest_keys).await? {
            match self.store.get(GROUP_MANIFEST_KEY).await {
                Ok(bytes) => Some(decode_manifest(&bytes)?),
                // Non-blocking stores may race the check; an absent
                // manifest means no members yet.
                Err(StoreError::NotFound { .. }) => None,
                Err(e) => return Err(e.into()),
            }
        } else {
            None
        };

        let mut table = NameTable::new();
        let mut manifest = String::new();
        if let Some(text) = manifest_text {
            for (peer_name, peer_id) in keys::parse_manifest(&text)? {
                insert_unique(&mut table, peer_name, peer_id)?;
            }
            manifest = text;
        }
        insert_unique(&mut table, self_name.to_string(), self_id)?;

        // Last writer wins; see the consistency gap above.
        keys::append_manifest_record(&mut manifest, self_name, self_id);
        self.store
            .set(GROUP_MANIFEST_KEY, manifest.as_bytes())
            .await?;

        debug!(id = self_id, name = self_name, entries = table.len(), "joined dynamic group");
        Ok(table)
    }
}

/// Decode the name published under a worker id key.
fn decode_name(id: WorkerId, bytes: &[u8]) -> Result<String, CoordinationError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| CoordinationError::CorruptedData {
        key: keys::worker_key(id),
        reason: "worker name is not valid UTF-8".to_string(),
    })
}

/// Decode the manifest value into text.
fn decode_manifest(bytes: &[u8]) -> Result<String, CoordinationError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| CoordinationError::CorruptedData {
        key: GROUP_MANIFEST_KEY.to_string(),
        reason: "manifest is not valid UTF-8".to_string(),
    })
}

/// Insert (name, id) into the table, failing if the name is taken.
fn insert_unique(
    table: &mut NameTable,
    name: String,
    id: WorkerId,
) -> Result<(), CoordinationError> {
    if let Some(&first_id) = table.get(&name) {
        return Err(CoordinationError::NameCollision {
            name,
            first_id,
            second_id: id,
        });
    }
    table.insert(name, id);
    Ok(())
}

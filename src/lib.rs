//! Group rendezvous and counter-aggregating barriers over a shared
//! key-value store.
//!
//! A group of worker processes that share nothing but one strongly
//! consistent key-value store can discover each other and synchronize
//! with two primitives:
//!
//! - `NameRegistry` - name/id rendezvous for fixed-size and dynamic
//!   groups, yielding the complete `NameTable` of the group
//! - `BarrierCounter` - an epoch-separated barrier where every worker
//!   blocks until the whole group arrives and receives the group-wide
//!   sum of per-worker counter contributions
//!
//! The store is an injected capability: anything implementing
//! [`api::CoordinationStore`] works, from the bundled in-memory test
//! double to a production metadata store. The [`api::PrefixStore`] and
//! [`api::TimeoutStore`] adapters add key namespacing and deadlines
//! without touching the protocols.
//!
//! ## Rendezvous and barrier example
//!
//! ```ignore
//! use muster::{BarrierCounter, NameRegistry};
//!
//! // Runs on every worker of a three-member group.
//! let registry = NameRegistry::new(store.clone());
//! let roster = registry.collect_names(self_id, &self_name, 3).await?;
//!
//! // Later: block until all three call, and learn the group total.
//! let barrier = BarrierCounter::new(store);
//! let total_active = barrier.sync_call_count(3, my_active_calls).await?;
//! ```

pub mod api;
mod barrier;
mod error;
pub mod keys;
mod registry;

pub use api::{
    CoordinationStore, DeterministicCoordinationStore, PrefixStore, StoreError, TimeoutConfig,
    TimeoutStore,
};
pub use barrier::BarrierCounter;
pub use error::CoordinationError;
pub use keys::{GROUP_MANIFEST_KEY, NameTable, WorkerId};
pub use registry::NameRegistry;

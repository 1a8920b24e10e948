//! Error types for the rendezvous and barrier primitives.

use snafu::Snafu;

use crate::api::StoreError;
use crate::keys::WorkerId;

/// Errors from group rendezvous and barrier operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CoordinationError {
    /// Two workers registered under the same name.
    #[snafu(display("worker name '{name}' is not unique: claimed by both id {first_id} and id {second_id}"))]
    NameCollision {
        /// The shared name.
        name: String,
        /// Id already holding the name.
        first_id: WorkerId,
        /// Id that tried to register the name as well.
        second_id: WorkerId,
    },

    /// A worker id is already registered under a different name.
    #[snafu(display("worker id {id} is already registered as '{occupant}', cannot claim it for '{candidate}'"))]
    IdCollision {
        /// The contested id.
        id: WorkerId,
        /// Name currently registered under the id.
        occupant: String,
        /// Name that tried to claim the id.
        candidate: String,
    },

    /// Data in the store is corrupted or unparseable.
    #[snafu(display("corrupted data in key '{key}': {reason}"))]
    CorruptedData {
        /// The key with corrupted data.
        key: String,
        /// Description of what went wrong.
        reason: String,
    },

    /// Underlying store error, propagated without retries.
    #[snafu(display("store error: {source}"))]
    Storage {
        /// The underlying error.
        source: StoreError,
    },
}

impl From<StoreError> for CoordinationError {
    fn from(source: StoreError) -> Self {
        CoordinationError::Storage { source }
    }
}

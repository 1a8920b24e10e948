//! Key derivation and manifest codec shared by every group member.
//!
//! The strings produced here are part of the wire format: all workers in
//! one group must derive identical keys and parse the manifest the same
//! way, or rendezvous silently misses peers. Deployments isolate groups
//! from each other by wrapping the store in a
//! [`PrefixStore`](crate::api::PrefixStore), not by changing these
//! formats.

use std::collections::HashMap;

use crate::error::CoordinationError;

/// Identifier of one worker within a group. Assigned externally,
/// unique per group.
pub type WorkerId = u32;

/// Complete name-to-id mapping for a group.
///
/// Built at rendezvous completion; always contains the caller's own
/// (name, id) pair.
pub type NameTable = HashMap<String, WorkerId>;

/// Well-known key holding the dynamic-mode group manifest.
pub const GROUP_MANIFEST_KEY: &str = "AllWorkerInfos";

/// Base of the per-round arrival counter key.
const PROCESS_COUNT: &str = "PROCESS_COUNT";
/// Base of the per-round contribution accumulator key.
const ACTIVE_CALLS: &str = "ACTIVE_CALLS";
/// Base of the per-round release marker key.
const READY: &str = "READY";
/// Separator between a barrier key base and its epoch.
const EPOCH_SEP: &str = "_ID_";

/// Separator between manifest records.
const RECORD_SEP: char = ',';
/// Separator between the name and id fields of one record.
const FIELD_SEP: char = '-';

/// Key under which a worker publishes its name: the decimal id.
pub fn worker_key(id: WorkerId) -> String {
    id.to_string()
}

/// Arrival-counter key for barrier round `epoch`.
pub fn process_count_key(epoch: u64) -> String {
    format!("{}{}{}", PROCESS_COUNT, EPOCH_SEP, epoch)
}

/// Contribution-accumulator key for barrier round `epoch`.
pub fn active_call_count_key(epoch: u64) -> String {
    format!("{}{}{}", ACTIVE_CALLS, EPOCH_SEP, epoch)
}

/// Release-marker key for barrier round `epoch`.
pub fn ready_key(epoch: u64) -> String {
    format!("{}{}{}", READY, EPOCH_SEP, epoch)
}

/// Append one `name`/`id` record to manifest text, comma-joined.
pub fn append_manifest_record(manifest: &mut String, name: &str, id: WorkerId) {
    if !manifest.is_empty() {
        manifest.push(RECORD_SEP);
    }
    manifest.push_str(name);
    manifest.push(FIELD_SEP);
    manifest.push_str(&id.to_string());
}

/// Parse manifest text into its (name, id) records.
///
/// Records are split on `,` and each record on its first `-`; names must
/// not contain either separator. The text must hold at least one record
/// (the manifest key is only ever written with a record in it), so empty
/// or trailing-separator text is corrupt.
pub fn parse_manifest(text: &str) -> Result<Vec<(String, WorkerId)>, CoordinationError> {
    let mut records = Vec::new();
    for record in text.split(RECORD_SEP) {
        let (name, id_text) =
            record
                .split_once(FIELD_SEP)
                .ok_or_else(|| CoordinationError::CorruptedData {
                    key: GROUP_MANIFEST_KEY.to_string(),
                    reason: format!("record '{}' has no id separator", record),
                })?;
        let id = id_text
            .parse::<WorkerId>()
            .map_err(|_| CoordinationError::CorruptedData {
                key: GROUP_MANIFEST_KEY.to_string(),
                reason: format!("record '{}' has a non-numeric id '{}'", record, id_text),
            })?;
        records.push((name.to_string(), id));
    }
    Ok(records)
}

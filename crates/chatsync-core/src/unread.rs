//! Unread counters.
//!
//! Two writers feed the ledger: optimistic increments from live frames for
//! rooms that are not open, and authoritative snapshots pushed by the durable
//! store. Snapshots are folded in with [`merge_unread`], a pure per-key
//! reducer: the snapshot wins for every key it mentions, keys it does not
//! mention keep their local value.
//!
//! # Invariants
//!
//! - A stored count is never zero; zero means absent.
//! - The active room never has an entry.

use std::collections::BTreeMap;

use chatsync_proto::RoomId;

/// Merge an authoritative snapshot into local counters.
///
/// For each key in `remote`, the remote count replaces the local one (a
/// remote zero removes it). Keys only present in `local` are kept. `active`
/// is always absent from the result.
pub fn merge_unread(
    local: &BTreeMap<RoomId, u32>,
    remote: &BTreeMap<RoomId, u32>,
    active: Option<&RoomId>,
) -> BTreeMap<RoomId, u32> {
    let mut merged = local.clone();
    for (room_id, &count) in remote {
        if count == 0 {
            merged.remove(room_id);
        } else {
            merged.insert(room_id.clone(), count);
        }
    }
    if let Some(active) = active {
        merged.remove(active);
    }
    merged
}

/// Per-room unread counters for rooms the user is not viewing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadLedger {
    counts: BTreeMap<RoomId, u32>,
}

impl UnreadLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Optimistic increment for a live message. Messages for the active room
    /// do not count. Returns the new count.
    pub fn increment(&mut self, room_id: &RoomId, active: Option<&RoomId>) -> u32 {
        if active == Some(room_id) {
            return 0;
        }
        let count = self.counts.entry(room_id.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Drop a room's counter (room opened). Returns the previous count.
    pub fn clear(&mut self, room_id: &RoomId) -> Option<u32> {
        self.counts.remove(room_id)
    }

    /// Drop every counter whose room is not in `keep`. Returns the purged
    /// room ids.
    pub fn retain_rooms(&mut self, keep: impl Fn(&RoomId) -> bool) -> Vec<RoomId> {
        let stale: Vec<RoomId> = self.counts.keys().filter(|id| !keep(*id)).cloned().collect();
        for id in &stale {
            self.counts.remove(id);
        }
        stale
    }

    /// Fold in an authoritative snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &BTreeMap<RoomId, u32>, active: Option<&RoomId>) {
        self.counts = merge_unread(&self.counts, snapshot, active);
    }

    /// Count for a room; zero when absent.
    pub fn get(&self, room_id: &RoomId) -> u32 {
        self.counts.get(room_id).copied().unwrap_or(0)
    }

    /// Whether a room has an entry.
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.counts.contains_key(room_id)
    }

    /// Underlying map.
    pub fn as_map(&self) -> &BTreeMap<RoomId, u32> {
        &self.counts
    }
}

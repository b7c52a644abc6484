//! In-memory cache of the most recent scan's network records.
//!
//! Single-writer: the scan orchestrator replaces the whole record set on
//! each successful scan; queries take point lookups against it. The swap
//! is atomic with respect to readers: a lookup sees either the fully-old
//! or the fully-new set, never a mix of two scans. Nothing is persisted
//! across process restarts.

use std::sync::RwLock;

use crate::network::NetworkRecord;

#[derive(Debug, Default)]
pub struct NetworkStore {
    records: RwLock<Vec<NetworkRecord>>,
}

impl NetworkStore {
    pub fn new() -> Self {
        NetworkStore::default()
    }

    /// Discards the previous record set and installs `records`,
    /// deduplicated by identity (BSSID when present, else SSID).
    ///
    /// When the platform reports the same identity twice, the last
    /// occurrence wins but keeps the first occurrence's position, so
    /// iteration order stays the platform's discovery order.
    pub fn replace_all(&self, records: Vec<NetworkRecord>) {
        let mut deduped: Vec<NetworkRecord> = Vec::with_capacity(records.len());
        for record in records {
            if let Some(existing) = deduped.iter_mut().find(|r| r.identity() == record.identity())
            {
                *existing = record;
            } else {
                deduped.push(record);
            }
        }

        let mut guard = self.records.write().expect("store lock poisoned");
        *guard = deduped;
    }

    /// First match for `ssid`; when several BSSIDs share the SSID, the
    /// one with the strongest signal wins, falling back to the first
    /// inserted when no signal is available.
    pub fn lookup_by_ssid(&self, ssid: &str) -> Option<NetworkRecord> {
        let guard = self.records.read().expect("store lock poisoned");
        let mut best: Option<&NetworkRecord> = None;
        for record in guard.iter().filter(|r| r.ssid == ssid) {
            best = match best {
                None => Some(record),
                Some(current) => {
                    if record.signal_dbm > current.signal_dbm {
                        Some(record)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best.cloned()
    }

    /// Every record, in the insertion order of the last `replace_all`.
    pub fn all(&self) -> Vec<NetworkRecord> {
        self.records.read().expect("store lock poisoned").clone()
    }

    /// SSIDs of the cached records, deduplicated, first-seen order,
    /// hidden (empty) SSIDs omitted.
    pub fn known_ssids(&self) -> Vec<String> {
        let guard = self.records.read().expect("store lock poisoned");
        let mut seen = Vec::new();
        for record in guard.iter() {
            if !record.ssid.is_empty() && !seen.contains(&record.ssid) {
                seen.push(record.ssid.clone());
            }
        }
        seen
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().expect("store lock poisoned").is_empty()
    }
}

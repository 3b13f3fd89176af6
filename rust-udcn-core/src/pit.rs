//! Pending Interest Table: tracks in-flight Interests and the in/out faces
//! associated with them (spec.md §4.4).

use crate::scheduler::EventId;
use rust_udcn_common::ndn::{Interest, Name, SelectorKey};
use rust_udcn_common::types::FaceId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One record of an Interest received or sent on a particular face.
#[derive(Debug, Clone)]
pub struct InRecord {
    pub face: FaceId,
    pub nonce: u32,
    pub last_renewed: Instant,
    pub expiry: Instant,
}

#[derive(Debug, Clone)]
pub struct OutRecord {
    pub face: FaceId,
    pub nonce: u32,
    pub last_sent: Instant,
    pub expiry: Instant,
    /// Set by the incoming-Nack pipeline (spec.md §4.8 Incoming Nack step 2).
    pub nack_reason: Option<rust_udcn_common::ndn::NackReason>,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct PitKey(pub u32);

pub struct PitEntry {
    pub name: Name,
    pub selectors: SelectorKey,
    pub in_records: Vec<InRecord>,
    pub out_records: Vec<OutRecord>,
    /// Forwarding hint carried by the Interest that created this entry,
    /// preserved for retransmissions (spec.md §4.8.1).
    pub forwarding_hint: Vec<rust_udcn_common::ndn::Delegation>,
    /// Straggler timer set once the entry becomes unsatisfied (spec.md §4.9);
    /// `None` while the entry is still live.
    pub straggler_deadline: Option<Instant>,
    /// Scheduler handles for the unsatisfy and straggler timers, so the
    /// Forwarder can cancel them (spec.md §5 "cancelling a PIT entry's
    /// timers before erasure is mandatory").
    pub unsatisfy_timer: Option<EventId>,
    pub straggler_timer: Option<EventId>,
    pub is_satisfied: bool,
}

impl PitEntry {
    pub fn expiry(&self) -> Option<Instant> {
        self.in_records.iter().map(|r| r.expiry).max()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expiry() {
            Some(exp) => now >= exp,
            None => true,
        }
    }

    pub fn has_unexpired_out_record_other_than(&self, face: FaceId, now: Instant) -> bool {
        self.out_records
            .iter()
            .any(|r| r.face != face && r.expiry > now)
    }

    pub fn find_in_record(&self, face: FaceId) -> Option<&InRecord> {
        self.in_records.iter().find(|r| r.face == face)
    }

    pub fn find_in_record_mut(&mut self, face: FaceId) -> Option<&mut InRecord> {
        self.in_records.iter_mut().find(|r| r.face == face)
    }

    pub fn find_out_record(&self, face: FaceId) -> Option<&OutRecord> {
        self.out_records.iter().find(|r| r.face == face)
    }

    pub fn find_out_record_mut(&mut self, face: FaceId) -> Option<&mut OutRecord> {
        self.out_records.iter_mut().find(|r| r.face == face)
    }

    pub fn insert_or_update_in_record(&mut self, face: FaceId, nonce: u32, now: Instant, lifetime: Duration) {
        let expiry = now + lifetime;
        if let Some(rec) = self.find_in_record_mut(face) {
            rec.nonce = nonce;
            rec.last_renewed = now;
            rec.expiry = expiry;
        } else {
            self.in_records.push(InRecord {
                face,
                nonce,
                last_renewed: now,
                expiry,
            });
        }
    }

    pub fn insert_or_update_out_record(&mut self, face: FaceId, nonce: u32, now: Instant, lifetime: Duration) {
        let expiry = now + lifetime;
        if let Some(rec) = self.find_out_record_mut(face) {
            rec.nonce = nonce;
            rec.last_sent = now;
            rec.expiry = expiry;
            rec.nack_reason = None;
        } else {
            self.out_records.push(OutRecord {
                face,
                nonce,
                last_sent: now,
                expiry,
                nack_reason: None,
            });
        }
    }

    pub fn delete_in_record(&mut self, face: FaceId) {
        self.in_records.retain(|r| r.face != face);
    }

    pub fn delete_out_record(&mut self, face: FaceId) {
        self.out_records.retain(|r| r.face != face);
    }

    /// Bitmask of nonces seen on in- or out-records, used by the
    /// Interest-Loop pipeline's duplicate-nonce check (spec.md §4.8).
    pub fn has_nonce(&self, nonce: u32) -> bool {
        self.in_records.iter().any(|r| r.nonce == nonce)
            || self.out_records.iter().any(|r| r.nonce == nonce)
    }
}

/// PIT entries are keyed by `(name, selectors)` (spec.md §4.4): two
/// Interests aggregate into one entry only when both match.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct Key {
    name: Name,
    selectors: SelectorKey,
}

pub struct Pit {
    next_id: u32,
    entries: HashMap<PitKey, PitEntry>,
    index: HashMap<Key, PitKey>,
}

impl Default for Pit {
    fn default() -> Self {
        Self::new()
    }
}

impl Pit {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: HashMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `insert(interest) -> (entry, isNew)`: looks up or creates the entry
    /// keyed by `(name, selectors())`.
    pub fn insert(&mut self, interest: &Interest) -> (PitKey, bool) {
        let key = Key {
            name: interest.name.clone(),
            selectors: interest.selector_key(),
        };
        if let Some(&id) = self.index.get(&key) {
            return (id, false);
        }
        let id = PitKey(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            PitEntry {
                name: interest.name.clone(),
                selectors: interest.selector_key(),
                in_records: Vec::new(),
                out_records: Vec::new(),
                forwarding_hint: interest.forwarding_hint.clone(),
                straggler_deadline: None,
                unsatisfy_timer: None,
                straggler_timer: None,
                is_satisfied: false,
            },
        );
        self.index.insert(key, id);
        (id, true)
    }

    pub fn get(&self, id: PitKey) -> Option<&PitEntry> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: PitKey) -> Option<&mut PitEntry> {
        self.entries.get_mut(&id)
    }

    /// `find(interest)`: exact `(name, selectors)` match only, used by
    /// loop detection (spec.md §4.8 Interest-Loop).
    pub fn find(&self, interest: &Interest) -> Option<PitKey> {
        let key = Key {
            name: interest.name.clone(),
            selectors: interest.selector_key(),
        };
        self.index.get(&key).copied()
    }

    /// `findAllDataMatches(data)`: every PIT entry whose name is a prefix of
    /// (or equal to) `data.name`, honouring `canBePrefix` per entry (spec.md
    /// §4.8 Incoming Data).
    pub fn find_all_data_matches(&self, data_name: &Name) -> Vec<PitKey> {
        self.entries
            .iter()
            .filter(|(_, entry)| {
                if entry.selectors.can_be_prefix {
                    entry.name.is_prefix_of(data_name)
                } else {
                    &entry.name == data_name
                }
            })
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn erase(&mut self, id: PitKey) {
        if let Some(entry) = self.entries.remove(&id) {
            let key = Key {
                name: entry.name,
                selectors: entry.selectors,
            };
            self.index.remove(&key);
        }
    }

    /// Entries whose in-records have all expired and whose straggler timer
    /// (if any) has also elapsed — candidates for deletion by the scheduler
    /// (spec.md §4.9).
    pub fn expired_entries(&self, now: Instant) -> Vec<PitKey> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_expired(now) && e.straggler_deadline.map(|d| now >= d).unwrap_or(true))
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PitKey, &PitEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_aggregates_by_name_and_selectors() {
        let mut pit = Pit::new();
        let i1 = Interest::new(Name::from_string("/a"));
        let i2 = Interest::new(Name::from_string("/a"));
        let (id1, new1) = pit.insert(&i1);
        let (id2, new2) = pit.insert(&i2);
        assert!(new1);
        assert!(!new2);
        assert_eq!(id1, id2);
        assert_eq!(pit.len(), 1);
    }

    #[test]
    fn distinct_selectors_get_distinct_entries() {
        let mut pit = Pit::new();
        let i1 = Interest::new(Name::from_string("/a")).with_can_be_prefix(true);
        let i2 = Interest::new(Name::from_string("/a")).with_can_be_prefix(false);
        let (id1, _) = pit.insert(&i1);
        let (id2, _) = pit.insert(&i2);
        assert_ne!(id1, id2);
    }

    #[test]
    fn in_record_tracks_nonce_and_expiry() {
        let mut pit = Pit::new();
        let interest = Interest::new(Name::from_string("/a"));
        let (id, _) = pit.insert(&interest);
        let now = Instant::now();
        pit.get_mut(id)
            .unwrap()
            .insert_or_update_in_record(FaceId(1), 42, now, Duration::from_millis(4000));
        let entry = pit.get(id).unwrap();
        assert!(entry.find_in_record(FaceId(1)).is_some());
        assert!(entry.has_nonce(42));
        assert!(!entry.has_nonce(99));
    }

    #[test]
    fn find_all_data_matches_respects_can_be_prefix() {
        let mut pit = Pit::new();
        let exact = Interest::new(Name::from_string("/a/b")).with_can_be_prefix(false);
        let prefix = Interest::new(Name::from_string("/a")).with_can_be_prefix(true);
        pit.insert(&exact);
        pit.insert(&prefix);

        let matches = pit.find_all_data_matches(&Name::from_string("/a/b"));
        assert_eq!(matches.len(), 2);

        let matches_other = pit.find_all_data_matches(&Name::from_string("/a/c"));
        assert_eq!(matches_other.len(), 1);
    }

    #[test]
    fn erase_removes_from_index() {
        let mut pit = Pit::new();
        let interest = Interest::new(Name::from_string("/a"));
        let (id, _) = pit.insert(&interest);
        pit.erase(id);
        assert_eq!(pit.len(), 0);
        assert!(pit.find(&interest).is_none());
    }

    #[test]
    fn expired_entries_reported_once_in_records_lapse() {
        let mut pit = Pit::new();
        let interest = Interest::new(Name::from_string("/a"));
        let (id, _) = pit.insert(&interest);
        let now = Instant::now();
        pit.get_mut(id)
            .unwrap()
            .insert_or_update_in_record(FaceId(1), 1, now, Duration::from_millis(0));
        let later = now + Duration::from_millis(1);
        assert_eq!(pit.expired_entries(later), vec![id]);
    }
}

//! Dead Nonce List: a FIFO of recently-seen `(name, nonce)` pairs used to
//! detect looped Interests after their PIT entry has already been erased
//! (spec.md §4.6). Capacity self-tunes to the observed satisfaction rate.

use rust_udcn_common::ndn::Name;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

/// Nominal age bound the list maintains (spec.md §4.8.2 "shorter than
/// `DeadNonceList.lifetime`"); mark-insertion and capacity-adjustment
/// intervals are derived fractions of it (spec.md §4.6).
pub const NOMINAL_LIFETIME: Duration = Duration::from_secs(6);

pub const MIN_CAPACITY: usize = 32;
pub const MAX_CAPACITY: usize = 200_000;
pub const INITIAL_CAPACITY: usize = 16_384;
/// Target number of lifecycle markers live in the list at once; the
/// capacity-adjustment event compares the actual count against this.
pub const EXPECTED_MARKER_COUNT: usize = 8;
/// Evict at most this many entries per adjustment event.
pub const EVICT_LIMIT: usize = 64 * EXPECTED_MARKER_COUNT;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct Entry {
    name: Name,
    nonce: u32,
}

/// A `Marker` is a sentinel entry inserted periodically so the
/// capacity-adjustment event can measure how much of the list has turned
/// over since the last adjustment (spec.md §4.6 self-tuning algorithm).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker(u64);

enum Slot {
    Entry(Entry),
    Marker(Marker),
}

pub struct DeadNonceList {
    capacity: usize,
    order: VecDeque<Slot>,
    index: HashSet<Entry>,
    next_marker: u64,
    /// Marker counts recorded by `insert_marker` since the last
    /// `adjust_capacity` call (spec.md §4.6 "records the current count of
    /// markers present").
    samples: Vec<usize>,
}

impl Default for DeadNonceList {
    fn default() -> Self {
        Self::new()
    }
}

impl DeadNonceList {
    pub fn new() -> Self {
        Self {
            capacity: INITIAL_CAPACITY,
            order: VecDeque::new(),
            index: HashSet::new(),
            next_marker: 0,
            samples: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn lifetime(&self) -> Duration {
        NOMINAL_LIFETIME
    }

    pub fn mark_insertion_interval(&self) -> Duration {
        NOMINAL_LIFETIME / 8
    }

    pub fn capacity_adjustment_interval(&self) -> Duration {
        NOMINAL_LIFETIME / 2
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn has(&self, name: &Name, nonce: u32) -> bool {
        self.index.contains(&Entry {
            name: name.clone(),
            nonce,
        })
    }

    pub fn add(&mut self, name: &Name, nonce: u32) {
        let entry = Entry {
            name: name.clone(),
            nonce,
        };
        if self.index.insert(entry.clone()) {
            self.order.push_back(Slot::Entry(entry));
            self.evict_excess();
        }
    }

    fn evict_excess(&mut self) {
        while self.index.len() > self.capacity {
            match self.order.pop_front() {
                Some(Slot::Entry(e)) => {
                    self.index.remove(&e);
                }
                Some(Slot::Marker(_)) => {}
                None => break,
            }
        }
    }

    /// Periodic event (every `lifetime / 8`): drop a marker into the queue
    /// and record how many markers are now live as a sample for the next
    /// capacity-adjustment event (spec.md §4.6 "marker insertion event").
    pub fn insert_marker(&mut self) {
        let id = self.next_marker;
        self.next_marker += 1;
        self.order.push_back(Slot::Marker(Marker(id)));
        let marker_count = self.order.iter().filter(|s| matches!(s, Slot::Marker(_))).count();
        self.samples.push(marker_count);
    }

    /// Periodic event (every `lifetime / 2`): if every sample recorded
    /// since the last adjustment exceeded `EXPECTED_MARKER_COUNT`, shrink
    /// capacity by half; if every sample was below it, grow by 1.2x;
    /// otherwise leave capacity unchanged. Then evict from the FIFO head
    /// until the list is back within capacity, up to `EVICT_LIMIT` entries
    /// (spec.md §4.6).
    pub fn adjust_capacity(&mut self) {
        if !self.samples.is_empty() {
            if self.samples.iter().all(|&c| c > EXPECTED_MARKER_COUNT) {
                self.capacity = (self.capacity as f64 * 0.5) as usize;
            } else if self.samples.iter().all(|&c| c < EXPECTED_MARKER_COUNT) {
                self.capacity = (self.capacity as f64 * 1.2) as usize;
            }
            self.capacity = self.capacity.clamp(MIN_CAPACITY, MAX_CAPACITY);
            self.samples.clear();
        }

        let mut evicted = 0;
        while self.index.len() > self.capacity && evicted < EVICT_LIMIT {
            match self.order.pop_front() {
                Some(Slot::Entry(e)) => {
                    self.index.remove(&e);
                    evicted += 1;
                }
                Some(Slot::Marker(_)) => {}
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_has_round_trip() {
        let mut dnl = DeadNonceList::new();
        let name = Name::from_string("/a");
        assert!(!dnl.has(&name, 1));
        dnl.add(&name, 1);
        assert!(dnl.has(&name, 1));
        assert!(!dnl.has(&name, 2));
    }

    #[test]
    fn capacity_bounds_respected_on_growth() {
        let mut dnl = DeadNonceList::new();
        dnl.capacity = MAX_CAPACITY - 1;
        dnl.insert_marker();
        dnl.adjust_capacity();
        assert!(dnl.capacity() <= MAX_CAPACITY);
    }

    #[test]
    fn capacity_never_drops_below_minimum() {
        let mut dnl = DeadNonceList::new();
        dnl.capacity = MIN_CAPACITY;
        for i in 0..(EXPECTED_MARKER_COUNT + 2) {
            dnl.insert_marker();
            let _ = i;
        }
        for i in 0..1000u32 {
            dnl.add(&Name::from_string(&format!("/n{i}")), i);
        }
        dnl.adjust_capacity();
        assert!(dnl.capacity() >= MIN_CAPACITY);
    }

    #[test]
    fn eviction_keeps_list_within_capacity() {
        let mut dnl = DeadNonceList::new();
        dnl.capacity = 4;
        for i in 0..10u32 {
            dnl.add(&Name::from_string("/a"), i);
        }
        assert!(dnl.len() <= 4);
    }

    #[test]
    fn insert_marker_records_current_marker_count_as_sample() {
        let mut dnl = DeadNonceList::new();
        dnl.insert_marker();
        dnl.insert_marker();
        dnl.insert_marker();
        assert_eq!(dnl.samples, vec![1, 2, 3]);
    }

    #[test]
    fn capacity_shrinks_when_all_samples_exceed_expected() {
        let mut dnl = DeadNonceList::new();
        dnl.capacity = 1000;
        dnl.samples = vec![9, 10, 12];
        dnl.adjust_capacity();
        assert_eq!(dnl.capacity, 500);
        assert!(dnl.samples.is_empty());
    }

    #[test]
    fn capacity_grows_when_all_samples_below_expected() {
        let mut dnl = DeadNonceList::new();
        dnl.capacity = 1000;
        dnl.samples = vec![1, 2, 3];
        dnl.adjust_capacity();
        assert_eq!(dnl.capacity, 1200);
    }

    #[test]
    fn capacity_unchanged_when_samples_mixed() {
        let mut dnl = DeadNonceList::new();
        dnl.capacity = 1000;
        dnl.samples = vec![2, 9, 3];
        dnl.adjust_capacity();
        assert_eq!(dnl.capacity, 1000);
    }

    #[test]
    fn adjust_capacity_evicts_down_to_new_capacity() {
        let mut dnl = DeadNonceList::new();
        dnl.capacity = 10;
        for i in 0..10u32 {
            dnl.add(&Name::from_string("/a"), i);
        }
        dnl.samples = vec![9, 10];
        dnl.adjust_capacity();
        assert_eq!(dnl.capacity, 5);
        assert!(dnl.len() <= 5);
    }
}

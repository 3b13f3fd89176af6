//! Content Store: a bounded, name-indexed cache of Data packets with
//! admission/serve policy and eviction (spec.md §4.3).

use rust_udcn_common::ndn::{Data, Interest, Name};
use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct CsEntry {
    pub data: Data,
    pub insertion_time: Instant,
    pub is_unsolicited: bool,
}

impl CsEntry {
    fn satisfies(&self, interest: &Interest, now: Instant) -> bool {
        if interest.can_be_prefix {
            if !interest.name.is_prefix_of(&self.data.name) {
                return false;
            }
        } else if interest.name != self.data.name {
            return false;
        }
        if interest.must_be_fresh && !self.data.is_fresh_at(self.insertion_time, now) {
            return false;
        }
        true
    }
}

/// Default eviction policy: unsolicited entries evicted oldest-first, then
/// solicited entries oldest-first (spec.md §4.3 eviction policy contract).
pub struct ContentStore {
    limit: usize,
    admit: bool,
    serve: bool,
    entries: BTreeMap<Name, CsEntry>,
    /// Insertion order, oldest first; re-inserting a name moves it to the
    /// back. Used to find priority-FIFO eviction victims.
    order: VecDeque<Name>,
}

impl ContentStore {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            admit: true,
            serve: true,
            entries: BTreeMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.evict_to_limit();
    }

    pub fn enable_admit(&mut self, admit: bool) {
        self.admit = admit;
    }

    pub fn enable_serve(&mut self, serve: bool) {
        self.serve = serve;
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// `insert(data, unsolicited)`.
    pub fn insert(&mut self, data: Data, unsolicited: bool) {
        if !self.admit {
            return;
        }
        let name = data.name.clone();
        if self.entries.contains_key(&name) {
            self.order.retain(|n| n != &name);
        }
        self.entries.insert(
            name.clone(),
            CsEntry {
                data,
                insertion_time: Instant::now(),
                is_unsolicited: unsolicited,
            },
        );
        self.order.push_back(name);
        self.evict_to_limit();
    }

    fn evict_to_limit(&mut self) {
        while self.entries.len() > self.limit {
            let Some(victim) = self.select_victim() else {
                break;
            };
            self.entries.remove(&victim);
            self.order.retain(|n| n != &victim);
        }
    }

    /// Oldest unsolicited entry if any exist, else the oldest entry overall.
    fn select_victim(&self) -> Option<Name> {
        self.order
            .iter()
            .find(|name| self.entries.get(*name).map(|e| e.is_unsolicited).unwrap_or(false))
            .or_else(|| self.order.front())
            .cloned()
    }

    /// `find(interest) -> Option<&Data>`. Returns `None` (the "miss"
    /// continuation in spec.md §4.3) when serving is disabled or nothing
    /// matches.
    pub fn find(&self, interest: &Interest) -> Option<&Data> {
        if !self.serve {
            return None;
        }
        let now = Instant::now();
        if !interest.can_be_prefix {
            return self
                .entries
                .get(&interest.name)
                .filter(|e| e.satisfies(interest, now))
                .map(|e| &e.data);
        }
        // canBePrefix: first match in name order at or below interest.name.
        self.entries
            .range(interest.name.clone()..)
            .map(|(_, entry)| entry)
            .find(|entry| entry.satisfies(interest, now))
            .map(|e| &e.data)
    }

    /// `erase(prefix, limit) -> (erased, moreRemain)`. `moreRemain` is the
    /// capacity hint of open question 4: a follow-up probe under the same
    /// prefix after hitting `limit`.
    pub fn erase(&mut self, prefix: &Name, limit: Option<usize>) -> (usize, bool) {
        let victims: Vec<Name> = self
            .entries
            .range(prefix.clone()..)
            .map(|(n, _)| n.clone())
            .take_while(|n| prefix.is_prefix_of(n))
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        let erased = victims.len();
        for name in &victims {
            self.entries.remove(name);
            self.order.retain(|n| n != name);
        }
        let more_remain = match limit {
            Some(lim) if erased == lim => self
                .entries
                .range(prefix.clone()..)
                .any(|(n, _)| prefix.is_prefix_of(n)),
            _ => false,
        };
        (erased, more_remain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::thread::sleep;
    use std::time::Duration;

    fn data(name: &str, freshness_ms: Option<u32>) -> Data {
        let mut d = Data::new(Name::from_string(name), Bytes::from_static(b"x"));
        if let Some(fp) = freshness_ms {
            d = d.with_freshness_period(fp);
        }
        d
    }

    #[test]
    fn insert_then_find_hits() {
        let mut cs = ContentStore::new(10);
        cs.insert(data("/d", Some(1000)), false);
        let interest = Interest::new(Name::from_string("/d"));
        assert!(cs.find(&interest).is_some());
    }

    #[test]
    fn admission_disabled_drops_insert() {
        let mut cs = ContentStore::new(10);
        cs.enable_admit(false);
        cs.insert(data("/d", Some(1000)), false);
        assert_eq!(cs.size(), 0);
    }

    #[test]
    fn serve_disabled_always_misses() {
        let mut cs = ContentStore::new(10);
        cs.insert(data("/d", Some(1000)), false);
        cs.enable_serve(false);
        let interest = Interest::new(Name::from_string("/d"));
        assert!(cs.find(&interest).is_none());
    }

    #[test]
    fn freshness_window_s4() {
        let mut cs = ContentStore::new(10);
        cs.insert(data("/d", Some(100)), false);

        let fresh_only = Interest::new(Name::from_string("/d")).with_must_be_fresh(true);
        assert!(cs.find(&fresh_only).is_some());

        sleep(Duration::from_millis(150));
        assert!(cs.find(&fresh_only).is_none());

        let any = Interest::new(Name::from_string("/d")).with_must_be_fresh(false);
        assert!(cs.find(&any).is_some());
    }

    #[test]
    fn set_limit_bounds_size() {
        let mut cs = ContentStore::new(10);
        for i in 0..5 {
            cs.insert(data(&format!("/d{i}"), Some(60_000)), false);
        }
        cs.set_limit(2);
        assert!(cs.size() <= 2);
    }

    #[test]
    fn unsolicited_entries_evicted_first() {
        let mut cs = ContentStore::new(2);
        cs.insert(data("/solicited", Some(60_000)), false);
        cs.insert(data("/unsolicited", Some(60_000)), true);
        cs.insert(data("/new", Some(60_000)), false); // forces eviction

        assert!(cs.find(&Interest::new(Name::from_string("/unsolicited"))).is_none());
        assert!(cs.find(&Interest::new(Name::from_string("/solicited"))).is_some());
    }

    #[test]
    fn erase_removes_and_reports_hint() {
        let mut cs = ContentStore::new(10);
        cs.insert(data("/p/1", Some(1000)), false);
        cs.insert(data("/p/2", Some(1000)), false);
        cs.insert(data("/p/3", Some(1000)), false);

        let (erased, more) = cs.erase(&Name::from_string("/p"), Some(2));
        assert_eq!(erased, 2);
        assert!(more);

        let (erased2, more2) = cs.erase(&Name::from_string("/p"), None);
        assert_eq!(erased2, 1);
        assert!(!more2);
    }
}

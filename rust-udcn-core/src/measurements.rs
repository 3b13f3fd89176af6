//! Measurements table: per-prefix forwarding statistics strategies use to
//! make decisions (spec.md §4.7), e.g. `BestRoute`'s per-face RTT estimates.

use crate::name_tree::{NameTreeHandle, NodeId};
use rust_udcn_common::ndn::Name;
use rust_udcn_common::types::FaceId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct FaceStats {
    pub rtt_estimate: Duration,
    pub last_satisfied: Option<Instant>,
    pub n_in_data: u64,
    pub n_timeouts: u64,
}

impl Default for FaceStats {
    fn default() -> Self {
        Self {
            rtt_estimate: Duration::from_millis(100),
            last_satisfied: None,
            n_in_data: 0,
            n_timeouts: 0,
        }
    }
}

impl FaceStats {
    fn record_rtt(&mut self, sample: Duration, now: Instant) {
        // Exponential moving average, 1/8 weight on the new sample — the
        // same smoothing constant NFD's RTT estimator uses.
        let prev = self.rtt_estimate.as_secs_f64();
        let sample_secs = sample.as_secs_f64();
        let next = prev + (sample_secs - prev) / 8.0;
        self.rtt_estimate = Duration::from_secs_f64(next.max(0.0));
        self.last_satisfied = Some(now);
        self.n_in_data += 1;
    }

    fn record_timeout(&mut self) {
        self.n_timeouts += 1;
    }
}

#[derive(Default)]
struct MeasurementEntry {
    faces: HashMap<FaceId, FaceStats>,
    expiry: Option<Instant>,
}

pub struct Measurements {
    name_tree: NameTreeHandle,
    entries: HashMap<NodeId, MeasurementEntry>,
    default_lifetime: Duration,
}

impl Measurements {
    pub fn new(name_tree: NameTreeHandle) -> Self {
        Self {
            name_tree,
            entries: HashMap::new(),
            default_lifetime: Duration::from_secs(60),
        }
    }

    fn entry_id(&mut self, prefix: &Name) -> NodeId {
        let id = self.name_tree.borrow_mut().lookup(prefix);
        if let std::collections::hash_map::Entry::Vacant(v) = self.entries.entry(id) {
            self.name_tree.borrow_mut().attach(id);
            v.insert(MeasurementEntry::default());
        }
        id
    }

    /// `recordRtt(prefix, face, sample, now)`.
    pub fn record_rtt(&mut self, prefix: &Name, face: FaceId, sample: Duration, now: Instant) {
        let id = self.entry_id(prefix);
        let lifetime = self.default_lifetime;
        let entry = self.entries.get_mut(&id).unwrap();
        entry.expiry = Some(now + lifetime);
        entry.faces.entry(face).or_default().record_rtt(sample, now);
    }

    pub fn record_timeout(&mut self, prefix: &Name, face: FaceId, now: Instant) {
        let id = self.entry_id(prefix);
        let lifetime = self.default_lifetime;
        let entry = self.entries.get_mut(&id).unwrap();
        entry.expiry = Some(now + lifetime);
        entry.faces.entry(face).or_default().record_timeout();
    }

    /// `getFaceStats(name, face) -> stats`, using the longest matching
    /// measurement entry (as opposed to an exact node match).
    pub fn get_face_stats(&self, name: &Name, face: FaceId) -> Option<FaceStats> {
        let tree = self.name_tree.borrow();
        let id = tree.find_longest_prefix_match(name, |id| self.entries.contains_key(&id))?;
        self.entries[&id].faces.get(&face).copied()
    }

    /// Best-route ranking: faces seen at `name`'s measurement entry,
    /// ordered by ascending RTT estimate (fastest-first).
    pub fn ranked_faces(&self, name: &Name) -> Vec<(FaceId, FaceStats)> {
        let tree = self.name_tree.borrow();
        let Some(id) = tree.find_longest_prefix_match(name, |id| self.entries.contains_key(&id)) else {
            return Vec::new();
        };
        let mut faces: Vec<_> = self.entries[&id]
            .faces
            .iter()
            .map(|(&f, &s)| (f, s))
            .collect();
        faces.sort_by_key(|(_, s)| s.rtt_estimate);
        faces
    }

    /// Periodic cleanup event: evict entries whose lifetime has elapsed
    /// (spec.md §4.7 "measurements expire").
    pub fn expire(&mut self, now: Instant) {
        let expired: Vec<NodeId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.expiry.map(|exp| now >= exp).unwrap_or(false))
            .map(|(&id, _)| id)
            .collect();
        for id in expired {
            self.entries.remove(&id);
            self.name_tree.borrow_mut().detach(id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name_tree::NameTree;

    #[test]
    fn rtt_sample_moves_estimate_toward_sample() {
        let mut m = Measurements::new(NameTree::new_handle());
        let now = Instant::now();
        m.record_rtt(&Name::from_string("/a"), FaceId(1), Duration::from_millis(50), now);
        let stats = m.get_face_stats(&Name::from_string("/a"), FaceId(1)).unwrap();
        assert!(stats.rtt_estimate < Duration::from_millis(100));
        assert!(stats.rtt_estimate > Duration::from_millis(50));
    }

    #[test]
    fn ranked_faces_orders_by_rtt() {
        let mut m = Measurements::new(NameTree::new_handle());
        let now = Instant::now();
        for _ in 0..20 {
            m.record_rtt(&Name::from_string("/a"), FaceId(1), Duration::from_millis(10), now);
            m.record_rtt(&Name::from_string("/a"), FaceId(2), Duration::from_millis(200), now);
        }
        let ranked = m.ranked_faces(&Name::from_string("/a"));
        assert_eq!(ranked[0].0, FaceId(1));
        assert_eq!(ranked[1].0, FaceId(2));
    }

    #[test]
    fn longest_prefix_match_used_for_lookup() {
        let mut m = Measurements::new(NameTree::new_handle());
        let now = Instant::now();
        m.record_rtt(&Name::from_string("/a"), FaceId(1), Duration::from_millis(50), now);
        assert!(m.get_face_stats(&Name::from_string("/a/b/c"), FaceId(1)).is_some());
    }

    #[test]
    fn expire_drops_stale_entries() {
        let mut m = Measurements::new(NameTree::new_handle());
        m.default_lifetime = Duration::from_millis(0);
        let now = Instant::now();
        m.record_rtt(&Name::from_string("/a"), FaceId(1), Duration::from_millis(50), now);
        assert_eq!(m.len(), 1);
        m.expire(now + Duration::from_millis(1));
        assert_eq!(m.len(), 0);
    }
}

//! Forwarding Information Base: longest-prefix-match table of name prefixes
//! to next-hop sets (spec.md §4.2).

use crate::name_tree::{NameTreeHandle, NodeId};
use rust_udcn_common::ndn::Name;
use rust_udcn_common::types::FaceId;
use std::collections::HashMap;

/// `(faceId, cost)` next hop. Ordering within a [`FibEntry`] is ascending
/// cost, ties broken by ascending `faceId` (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextHop {
    pub face: FaceId,
    pub cost: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FibEntry {
    pub prefix: Name,
    pub next_hops: Vec<NextHop>,
}

impl FibEntry {
    fn insert_sorted(&mut self, hop: NextHop) {
        if let Some(existing) = self.next_hops.iter_mut().find(|h| h.face == hop.face) {
            existing.cost = hop.cost;
        } else {
            self.next_hops.push(hop);
        }
        self.next_hops.sort_by(|a, b| a.cost.cmp(&b.cost).then(a.face.cmp(&b.face)));
    }

    fn remove(&mut self, face: FaceId) -> bool {
        let before = self.next_hops.len();
        self.next_hops.retain(|h| h.face != face);
        self.next_hops.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.next_hops.is_empty()
    }
}

pub struct Fib {
    name_tree: NameTreeHandle,
    entries: HashMap<NodeId, FibEntry>,
}

impl Fib {
    pub fn new(name_tree: NameTreeHandle) -> Self {
        Self {
            name_tree,
            entries: HashMap::new(),
        }
    }

    /// `insert(prefix) -> (entry, isNew)`.
    pub fn insert(&mut self, prefix: &Name) -> (NodeId, bool) {
        let id = self.name_tree.borrow_mut().lookup(prefix);
        if self.entries.contains_key(&id) {
            return (id, false);
        }
        self.name_tree.borrow_mut().attach(id);
        self.entries.insert(
            id,
            FibEntry {
                prefix: prefix.clone(),
                next_hops: Vec::new(),
            },
        );
        (id, true)
    }

    pub fn get(&self, id: NodeId) -> Option<&FibEntry> {
        self.entries.get(&id)
    }

    /// `findLongestPrefixMatch(name) -> entry`: never returns `None` — an
    /// empty sentinel entry stands in for "no route".
    pub fn find_longest_prefix_match(&self, name: &Name) -> FibEntry {
        let tree = self.name_tree.borrow();
        let found = tree.find_longest_prefix_match(name, |id| self.entries.contains_key(&id));
        match found {
            Some(id) => self.entries[&id].clone(),
            None => FibEntry {
                prefix: Name::new(),
                next_hops: Vec::new(),
            },
        }
    }

    /// `addNextHop(entry, faceId, cost)`.
    pub fn add_next_hop(&mut self, prefix: &Name, face: FaceId, cost: u64) {
        let (id, _) = self.insert(prefix);
        self.entries.get_mut(&id).unwrap().insert_sorted(NextHop { face, cost });
    }

    /// `removeNextHop(entry, faceId)`: erases the entry if it becomes empty
    /// and is not the root.
    pub fn remove_next_hop(&mut self, prefix: &Name, face: FaceId) {
        let Some(id) = self.name_tree.borrow().get(prefix) else {
            return;
        };
        let became_empty = match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.remove(face);
                entry.is_empty()
            }
            None => return,
        };
        if became_empty && !prefix.is_empty() {
            self.entries.remove(&id);
            self.name_tree.borrow_mut().detach(id);
        }
    }

    /// `removeNextHopFromAllEntries(faceId)`, invoked when a face is gone.
    pub fn remove_next_hop_from_all_entries(&mut self, face: FaceId) {
        let prefixes: Vec<Name> = self.entries.values().map(|e| e.prefix.clone()).collect();
        for prefix in prefixes {
            self.remove_next_hop(&prefix, face);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FibEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_udcn_common::types::FaceId;

    fn fib() -> Fib {
        Fib::new(crate::name_tree::NameTree::new_handle())
    }

    #[test]
    fn longest_prefix_match_prefers_deepest_entry() {
        let mut fib = fib();
        fib.add_next_hop(&Name::from_string("/a"), FaceId(10), 5);
        fib.add_next_hop(&Name::from_string("/a/b"), FaceId(20), 3);

        let entry = fib.find_longest_prefix_match(&Name::from_string("/a/b/c"));
        assert_eq!(entry.prefix, Name::from_string("/a/b"));
        assert_eq!(entry.next_hops, vec![NextHop { face: FaceId(20), cost: 3 }]);
    }

    #[test]
    fn no_match_returns_empty_sentinel() {
        let fib = fib();
        let entry = fib.find_longest_prefix_match(&Name::from_string("/x"));
        assert!(entry.is_empty());
    }

    #[test]
    fn next_hops_ordered_by_cost_then_face() {
        let mut fib = fib();
        fib.add_next_hop(&Name::from_string("/a"), FaceId(30), 5);
        fib.add_next_hop(&Name::from_string("/a"), FaceId(10), 5);
        fib.add_next_hop(&Name::from_string("/a"), FaceId(20), 1);

        let entry = fib.find_longest_prefix_match(&Name::from_string("/a"));
        assert_eq!(
            entry.next_hops,
            vec![
                NextHop { face: FaceId(20), cost: 1 },
                NextHop { face: FaceId(10), cost: 5 },
                NextHop { face: FaceId(30), cost: 5 },
            ]
        );
    }

    #[test]
    fn remove_next_hop_erases_empty_entry() {
        let mut fib = fib();
        fib.add_next_hop(&Name::from_string("/a"), FaceId(10), 5);
        assert_eq!(fib.len(), 1);
        fib.remove_next_hop(&Name::from_string("/a"), FaceId(10));
        assert_eq!(fib.len(), 0);
    }
}

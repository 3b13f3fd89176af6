//! Shared lexical index over NDN names (spec.md §4.1).
//!
//! Rather than the C++ original's web of `shared_ptr`s between a
//! `NameTreeNode` and the FIB/PIT/StrategyChoice/Measurements entries rooted
//! at it (spec.md §9 "Cyclic references in NameTree"), this is a slab of
//! nodes addressed by a stable [`NodeId`]. A node only materializes when some
//! table calls [`NameTree::lookup`], and is dropped once its attachment count
//! reaches zero. Longest-prefix-match and all-ancestors walks don't need a
//! parent pointer at all: they recompute each ancestor name with
//! [`Name::get_prefix`] and probe the name index directly, which is the
//! O(depth)-with-a-hash-index-per-level behaviour spec.md §4.1 requires.

use rust_udcn_common::ndn::Name;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Stable identifier for a NameTree node. Never reused while the node it
/// named is alive; the underlying slab slot is recycled after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

struct Slot {
    name: Name,
    /// Number of table attachments (FIB/PIT/StrategyChoice/Measurements)
    /// currently rooted at this node. The node is garbage-collected when
    /// this reaches zero (spec.md §3 NameTree invariant (i)).
    attachments: u32,
}

#[derive(Default)]
pub struct NameTree {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
    index: HashMap<Name, NodeId>,
}

pub type NameTreeHandle = Rc<RefCell<NameTree>>;

impl NameTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_handle() -> NameTreeHandle {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn name_of(&self, id: NodeId) -> &Name {
        &self.slots[id.0 as usize].as_ref().expect("dangling NodeId").name
    }

    /// `lookup(name)`: returns the node for `name`, creating it (with zero
    /// attachments) if absent.
    pub fn lookup(&mut self, name: &Name) -> NodeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let slot = Slot {
            name: name.clone(),
            attachments: 0,
        };
        let id = match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize] = Some(slot);
                NodeId(idx)
            }
            None => {
                self.slots.push(Some(slot));
                NodeId((self.slots.len() - 1) as u32)
            }
        };
        self.index.insert(name.clone(), id);
        id
    }

    /// Look up a node without creating it.
    pub fn get(&self, name: &Name) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Register one more attachment (a FIB/PIT/StrategyChoice/Measurements
    /// entry) rooted at `id`.
    pub fn attach(&mut self, id: NodeId) {
        self.slots[id.0 as usize].as_mut().expect("dangling NodeId").attachments += 1;
    }

    /// Drop one attachment; garbage-collects the node if it is now unused.
    /// This is `eraseIfEmpty` (spec.md §4.1) folded into the detach call,
    /// since in this arena design a node's only reason to exist past its
    /// attachments is... nothing: nothing else references a NodeId across
    /// calls except the owning table.
    pub fn detach(&mut self, id: NodeId) {
        let empty = {
            let slot = self.slots[id.0 as usize].as_mut().expect("dangling NodeId");
            slot.attachments = slot.attachments.saturating_sub(1);
            slot.attachments == 0
        };
        if empty {
            let slot = self.slots[id.0 as usize].take().expect("dangling NodeId");
            self.index.remove(&slot.name);
            self.free.push(id.0);
        }
    }

    /// `findLongestPrefixMatch(name, pred)`: the deepest ancestor (including
    /// `name` itself) for which `pred` holds over an existing node.
    pub fn find_longest_prefix_match(
        &self,
        name: &Name,
        mut pred: impl FnMut(NodeId) -> bool,
    ) -> Option<NodeId> {
        for len in (0..=name.len()).rev() {
            let prefix = name.get_prefix(len);
            if let Some(&id) = self.index.get(&prefix) {
                if pred(id) {
                    return Some(id);
                }
            }
        }
        None
    }

    /// `findAllMatches(name)`: every existing ancestor node (including
    /// `name` itself), longest to shortest.
    pub fn find_all_matches(&self, name: &Name) -> Vec<NodeId> {
        (0..=name.len())
            .rev()
            .filter_map(|len| self.index.get(&name.get_prefix(len)).copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_creates_and_reuses_nodes() {
        let mut tree = NameTree::new();
        let a = tree.lookup(&Name::from_string("/a/b"));
        let a2 = tree.lookup(&Name::from_string("/a/b"));
        assert_eq!(a, a2);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn detach_to_zero_garbage_collects() {
        let mut tree = NameTree::new();
        let id = tree.lookup(&Name::from_string("/a/b"));
        tree.attach(id);
        assert_eq!(tree.len(), 1);
        tree.detach(id);
        assert_eq!(tree.len(), 0);
        assert!(tree.get(&Name::from_string("/a/b")).is_none());
    }

    #[test]
    fn longest_prefix_match_walks_ancestors() {
        let mut tree = NameTree::new();
        let root = tree.lookup(&Name::from_string("/a"));
        tree.attach(root);
        let _leaf = tree.lookup(&Name::from_string("/a/b/c")); // no attachment

        let found = tree.find_longest_prefix_match(&Name::from_string("/a/b/c"), |id| {
            tree.name_of(id) == &Name::from_string("/a")
        });
        assert_eq!(found, Some(root));
    }

    #[test]
    fn find_all_matches_is_longest_to_shortest() {
        let mut tree = NameTree::new();
        tree.lookup(&Name::from_string("/a"));
        tree.lookup(&Name::from_string("/a/b"));
        let matches = tree.find_all_matches(&Name::from_string("/a/b/c"));
        let names: Vec<_> = matches.iter().map(|&id| tree.name_of(id).to_string()).collect();
        assert_eq!(names, vec!["/a/b", "/a"]);
    }
}

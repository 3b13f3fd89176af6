//! StrategyChoice table: maps name prefixes to the forwarding strategy
//! responsible for them (spec.md §4.5).

use crate::name_tree::{NameTreeHandle, NodeId};
use rust_udcn_common::ndn::Name;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrategyId(pub String);

impl StrategyId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct StrategyChoice {
    name_tree: NameTreeHandle,
    entries: HashMap<NodeId, StrategyId>,
    default: StrategyId,
}

impl StrategyChoice {
    pub fn new(name_tree: NameTreeHandle, default: StrategyId) -> Self {
        Self {
            name_tree,
            entries: HashMap::new(),
            default,
        }
    }

    /// `insert(prefix, strategy)`: set (or replace) the strategy rooted at
    /// `prefix`. Root (`/`) must always have an entry; that invariant is
    /// established by seeding the default strategy at construction time by
    /// the caller (spec.md §4.5 invariant (i)).
    pub fn insert(&mut self, prefix: &Name, strategy: StrategyId) {
        let id = self.name_tree.borrow_mut().lookup(prefix);
        if !self.entries.contains_key(&id) {
            self.name_tree.borrow_mut().attach(id);
        }
        self.entries.insert(id, strategy);
    }

    /// `erase(prefix)`: remove an override, falling back to the ancestor's
    /// choice (or the global default for `/`).
    pub fn erase(&mut self, prefix: &Name) {
        if prefix.is_empty() {
            return; // root always has a strategy
        }
        if let Some(id) = self.name_tree.borrow().get(prefix) {
            if self.entries.remove(&id).is_some() {
                self.name_tree.borrow_mut().detach(id);
            }
        }
    }

    /// `findEffectiveStrategy(name) -> strategy`: longest matching prefix,
    /// falling back to the configured default when nothing matches (should
    /// only happen before root is seeded).
    pub fn find_effective_strategy(&self, name: &Name) -> StrategyId {
        let tree = self.name_tree.borrow();
        tree.find_longest_prefix_match(name, |id| self.entries.contains_key(&id))
            .map(|id| self.entries[&id].clone())
            .unwrap_or_else(|| self.default.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshots every explicit (non-inherited) entry as `(prefix,
    /// strategy)` pairs, for the management `strategy-choice/list` verb.
    pub fn entries(&self) -> Vec<(Name, StrategyId)> {
        let tree = self.name_tree.borrow();
        self.entries
            .iter()
            .map(|(id, strategy)| (tree.name_of(*id).clone(), strategy.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name_tree::NameTree;

    #[test]
    fn falls_back_to_ancestor_strategy() {
        let tree = NameTree::new_handle();
        let mut sc = StrategyChoice::new(tree, StrategyId::new("best-route"));
        sc.insert(&Name::new(), StrategyId::new("best-route"));
        sc.insert(&Name::from_string("/a"), StrategyId::new("multicast"));

        assert_eq!(
            sc.find_effective_strategy(&Name::from_string("/a/b/c")),
            StrategyId::new("multicast")
        );
        assert_eq!(
            sc.find_effective_strategy(&Name::from_string("/x")),
            StrategyId::new("best-route")
        );
    }

    #[test]
    fn erase_falls_back_after_removal() {
        let tree = NameTree::new_handle();
        let mut sc = StrategyChoice::new(tree, StrategyId::new("best-route"));
        sc.insert(&Name::new(), StrategyId::new("best-route"));
        sc.insert(&Name::from_string("/a"), StrategyId::new("multicast"));
        sc.erase(&Name::from_string("/a"));
        assert_eq!(
            sc.find_effective_strategy(&Name::from_string("/a/b")),
            StrategyId::new("best-route")
        );
    }

    #[test]
    fn erase_root_is_a_no_op() {
        let tree = NameTree::new_handle();
        let mut sc = StrategyChoice::new(tree, StrategyId::new("best-route"));
        sc.insert(&Name::new(), StrategyId::new("best-route"));
        sc.erase(&Name::new());
        assert_eq!(
            sc.find_effective_strategy(&Name::from_string("/z")),
            StrategyId::new("best-route")
        );
    }
}

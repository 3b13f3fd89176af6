//! The Routing Information Base (spec.md §4.10): a map `name -> RibEntry`
//! plus the update queue that feeds the [`FibUpdater`](crate::fib_updater::FibUpdater).

use crate::rib_entry::{InheritedRoute, RibEntry};
use crate::rib_update::{RibUpdate, RibUpdateBatch};
use crate::route::{Route, RouteOrigin};
use rust_udcn_common::ndn::Name;
use rust_udcn_common::types::FaceId;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Observable effects of a RIB mutation, corresponding to the `afterInsertEntry`
/// / `afterEraseEntry` / `afterAddRoute` / `beforeRemoveRoute` signals
/// (spec.md §4.10). Returned from the mutating methods rather than emitted
/// through a subscriber-list abstraction — callers that care (the daemon's
/// management dispatcher) inspect the returned events synchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RibEvent {
    EntryInserted(Name),
    EntryErased(Name),
    RouteAdded(Name, FaceId, RouteOrigin),
    RouteRemoved(Name, FaceId, RouteOrigin),
}

pub struct Rib {
    entries: BTreeMap<Name, RibEntry>,
    by_face: HashMap<FaceId, Vec<Name>>,
    queue: VecDeque<RibUpdateBatch>,
}

impl Default for Rib {
    fn default() -> Self {
        Self::new()
    }
}

impl Rib {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            by_face: HashMap::new(),
            queue: VecDeque::new(),
        }
    }

    pub fn get(&self, name: &Name) -> Option<&RibEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &RibEntry)> {
        self.entries.iter()
    }

    fn nearest_strict_prefix_ancestor(&self, name: &Name) -> Option<Name> {
        self.entries
            .keys()
            .filter(|k| *k != name && k.is_prefix_of(name))
            .max_by_key(|k| k.len())
            .cloned()
    }

    /// `insert(name, route)` (spec.md §4.10 "internal"): creates the entry
    /// on first route insert, wiring `parent`/`children` links, and upserts
    /// the route. Returns the events produced.
    pub(crate) fn insert(&mut self, name: &Name, route: Route) -> Vec<RibEvent> {
        let mut events = Vec::new();

        if !self.entries.contains_key(name) {
            let parent = self.nearest_strict_prefix_ancestor(name);
            let mut entry = RibEntry::new(name.clone());
            entry.parent = parent.clone();
            self.entries.insert(name.clone(), entry);

            // Any existing entry whose nearest ancestor was `parent` but is
            // now a descendant of the freshly-inserted `name` must be
            // reparented under it.
            let mut reparented = Vec::new();
            for (other_name, other) in self.entries.iter() {
                if other_name != name && name.is_prefix_of(other_name) && other.parent == parent {
                    reparented.push(other_name.clone());
                }
            }
            for child_name in &reparented {
                if let Some(child) = self.entries.get_mut(child_name) {
                    child.parent = Some(name.clone());
                }
            }
            if let Some(parent_name) = &parent {
                if let Some(parent_entry) = self.entries.get_mut(parent_name) {
                    parent_entry.children.retain(|c| !reparented.contains(c));
                    parent_entry.children.push(name.clone());
                }
            }
            if let Some(entry) = self.entries.get_mut(name) {
                entry.children.extend(reparented);
            }

            events.push(RibEvent::EntryInserted(name.clone()));
        }

        let face_id = route.face_id;
        let origin = route.origin;
        if let Some(entry) = self.entries.get_mut(name) {
            entry.upsert_route(route);
        }
        self.by_face.entry(face_id).or_default();
        if let Some(names) = self.by_face.get_mut(&face_id) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        events.push(RibEvent::RouteAdded(name.clone(), face_id, origin));
        events
    }

    /// `erase(name, route)` (spec.md §4.10 "internal"): removes the route
    /// and destroys the entry once it becomes empty.
    pub(crate) fn erase(&mut self, name: &Name, face_id: FaceId, origin: RouteOrigin) -> Vec<RibEvent> {
        let mut events = Vec::new();
        let Some(entry) = self.entries.get_mut(name) else { return events };
        if entry.remove_route(face_id, origin).is_none() {
            return events;
        }
        events.push(RibEvent::RouteRemoved(name.clone(), face_id, origin));

        if let Some(names) = self.by_face.get_mut(&face_id) {
            let still_has_route = self.entries.get(name).map(|e| e.routes.iter().any(|r| r.face_id == face_id)).unwrap_or(false);
            if !still_has_route {
                names.retain(|n| n != name);
            }
        }

        if self.entries.get(name).map(|e| e.is_empty()).unwrap_or(false) {
            events.push(RibEvent::EntryErased(name.clone()));
            self.destroy_entry(name);
        }
        events
    }

    fn destroy_entry(&mut self, name: &Name) {
        let Some(entry) = self.entries.remove(name) else { return };
        let parent = entry.parent.clone();
        for child_name in &entry.children {
            if let Some(child) = self.entries.get_mut(child_name) {
                child.parent = parent.clone();
            }
        }
        if let Some(parent_name) = &parent {
            if let Some(parent_entry) = self.entries.get_mut(parent_name) {
                parent_entry.children.retain(|c| c != name);
                parent_entry.children.extend(entry.children);
            }
        }
    }

    /// `beginApplyUpdate(update, onSuccess, onFailure)`: enqueues a
    /// single-route update. Draining happens via
    /// [`FibUpdater::drain_one`](crate::fib_updater::FibUpdater::drain_one).
    pub fn begin_apply_update(&mut self, update: RibUpdate) {
        self.queue.push_back(RibUpdateBatch::new(update));
    }

    /// `beginRemoveFace(faceId)`: enqueue REMOVE_FACE for every route on
    /// that face across all entries.
    pub fn begin_remove_face(&mut self, face_id: FaceId) {
        let names = self.by_face.get(&face_id).cloned().unwrap_or_default();
        for name in names {
            let Some(entry) = self.entries.get(&name) else { continue };
            for route in entry.routes.iter().filter(|r| r.face_id == face_id) {
                self.begin_apply_update(RibUpdate::remove_face(name.clone(), route.clone()));
            }
        }
    }

    pub fn pop_next_batch(&mut self) -> Option<RibUpdateBatch> {
        self.queue.pop_front()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// `findLongestPrefix(name, queryRoute)`: exact lookup at `name`; if
    /// absent, search the parent chain for a matching `(faceId, origin)`.
    pub fn find_longest_prefix(&self, name: &Name, query_route: (FaceId, RouteOrigin)) -> Option<(&Name, &Route)> {
        if let Some(entry) = self.entries.get(name) {
            if let Some(route) = entry.find_route(query_route.0, query_route.1) {
                return Some((&entry.name, route));
            }
        }
        let mut current = match self.entries.get(name) {
            Some(entry) => entry.parent.clone(),
            None => self.nearest_strict_prefix_ancestor(name),
        };
        while let Some(ancestor_name) = current {
            let Some(entry) = self.entries.get(&ancestor_name) else { break };
            if let Some(route) = entry.find_route(query_route.0, query_route.1) {
                return Some((&entry.name, route));
            }
            current = entry.parent.clone();
        }
        None
    }

    /// `getAncestorRoutes(name)`: walk up the parent chain collecting
    /// routes whose `child-inherit` flag is set; stop walking after
    /// encountering an entry with capture (inclusive of its
    /// inherited-emitting routes).
    pub fn get_ancestor_routes(&self, name: &Name) -> Vec<InheritedRoute> {
        let mut collected = Vec::new();
        let mut current = match self.entries.get(name) {
            Some(entry) => entry.parent.clone(),
            None => self.nearest_strict_prefix_ancestor(name),
        };
        while let Some(ancestor_name) = current {
            let Some(entry) = self.entries.get(&ancestor_name) else { break };
            for route in entry.routes.iter().filter(|r| r.flags.child_inherit) {
                collected.push(InheritedRoute {
                    face_id: route.face_id,
                    cost: route.cost,
                    from: entry.name.clone(),
                });
            }
            if entry.has_capture() {
                break;
            }
            current = entry.parent.clone();
        }
        collected
    }

    /// Refreshes `entry.inherited_routes` from the current ancestor chain
    /// (spec.md §4.10.2 "emits the inherited-route adjustments back to RIB
    /// entries' `inheritedRoutes` lists"). No-op if `name` has no entry.
    pub(crate) fn recompute_inherited_routes(&mut self, name: &Name) {
        let inherited = self.get_ancestor_routes(name);
        if let Some(entry) = self.entries.get_mut(name) {
            entry.inherited_routes = inherited;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteFlags;

    fn route(face: u16, cost: u64, flags: RouteFlags) -> Route {
        Route::new(FaceId(face), RouteOrigin::Static, cost, flags)
    }

    #[test]
    fn insert_creates_entry_and_wires_parent() {
        let mut rib = Rib::new();
        rib.insert(&Name::from_string("/a"), route(1, 10, RouteFlags::default()));
        rib.insert(&Name::from_string("/a/b"), route(2, 10, RouteFlags::default()));
        let child = rib.get(&Name::from_string("/a/b")).unwrap();
        assert_eq!(child.parent, Some(Name::from_string("/a")));
        let parent = rib.get(&Name::from_string("/a")).unwrap();
        assert!(parent.children.contains(&Name::from_string("/a/b")));
    }

    #[test]
    fn inserting_intermediate_entry_reparents_existing_descendant() {
        let mut rib = Rib::new();
        rib.insert(&Name::from_string("/a"), route(1, 10, RouteFlags::default()));
        rib.insert(&Name::from_string("/a/b/c"), route(2, 10, RouteFlags::default()));
        // /a/b/c's nearest ancestor was /a; now insert /a/b in between.
        rib.insert(&Name::from_string("/a/b"), route(3, 10, RouteFlags::default()));
        let leaf = rib.get(&Name::from_string("/a/b/c")).unwrap();
        assert_eq!(leaf.parent, Some(Name::from_string("/a/b")));
    }

    #[test]
    fn erase_destroys_empty_entry_and_relinks_children() {
        let mut rib = Rib::new();
        rib.insert(&Name::from_string("/a"), route(1, 10, RouteFlags::default()));
        rib.insert(&Name::from_string("/a/b"), route(2, 10, RouteFlags::default()));
        rib.erase(&Name::from_string("/a"), FaceId(1), RouteOrigin::Static);
        assert!(rib.get(&Name::from_string("/a")).is_none());
        let child = rib.get(&Name::from_string("/a/b")).unwrap();
        assert_eq!(child.parent, None);
    }

    #[test]
    fn ancestor_routes_stop_at_capture() {
        let mut rib = Rib::new();
        rib.insert(&Name::from_string("/a"), route(1, 10, RouteFlags::new(true, false)));
        rib.insert(&Name::from_string("/a/b"), route(2, 10, RouteFlags::new(true, true)));
        let ancestors = rib.get_ancestor_routes(&Name::from_string("/a/b/c"));
        assert_eq!(ancestors.len(), 1);
        assert_eq!(ancestors[0].face_id, FaceId(2));
    }

    #[test]
    fn begin_remove_face_enqueues_one_update_per_route() {
        let mut rib = Rib::new();
        rib.insert(&Name::from_string("/a"), route(1, 10, RouteFlags::default()));
        rib.insert(&Name::from_string("/b"), route(1, 20, RouteFlags::default()));
        rib.begin_remove_face(FaceId(1));
        assert_eq!(rib.queue_len(), 2);
    }
}

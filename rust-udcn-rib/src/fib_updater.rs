//! Computes FIB-level `addNextHop`/`removeNextHop` commands from RIB diffs
//! and drives them through a [`FibCommandSink`] (spec.md §4.10.2).

use crate::rib::{Rib, RibEvent};
use crate::rib_update::RibUpdateAction;
use rust_udcn_common::ndn::Name;
use rust_udcn_common::types::FaceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FibUpdateError {
    #[error("fib command failed: {code} {message}")]
    CommandFailed { code: u32, message: String },
    #[error("fib command timed out")]
    Timeout,
}

/// The management-command boundary the `FibUpdater` issues `fib/add-nexthop`
/// and `fib/remove-nexthop` through (spec.md §6.2). Kept as a trait so
/// `rust-udcn-rib` never depends on `rust-udcn-core`'s concrete `Fib` —
/// the daemon wires a concrete sink that calls into the Forwarder's FIB
/// directly, matching spec.md §5's "communicates ... only via the external
/// management protocol" even though, in this single-process daemon, that
/// boundary is an in-process trait object rather than a socket.
pub trait FibCommandSink {
    fn add_next_hop(&mut self, name: &Name, face: FaceId, cost: u64) -> Result<(), FibUpdateError>;
    fn remove_next_hop(&mut self, name: &Name, face: FaceId) -> Result<(), FibUpdateError>;
}

enum FibCommand {
    Add(Name, FaceId, u64),
    Remove(Name, FaceId),
}

pub struct FibUpdater<S: FibCommandSink> {
    sink: S,
}

impl<S: FibCommandSink> FibUpdater<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Every existing RIB entry whose name is a strict descendant of
    /// `name`, found by scanning rather than by walking `name`'s own
    /// `children` list — `name` itself may not yet be a RIB entry at
    /// planning time (its `insert` only happens after commands succeed).
    fn descendants_of(rib: &Rib, name: &Name) -> Vec<Name> {
        rib.iter()
            .filter(|(k, _)| *k != name && name.is_prefix_of(k))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// True if some entry strictly between `descendant` and `name` (exclusive
    /// of `name`) carries capture, which blocks `name`'s contribution from
    /// reaching `descendant` (spec.md §4.10.2 "except those blocked by an
    /// intervening capture ancestor").
    fn blocked_by_capture(rib: &Rib, name: &Name, descendant: &Name) -> bool {
        let mut current = rib.get(descendant).and_then(|e| e.parent.clone());
        while let Some(cur) = current {
            if &cur == name {
                return false;
            }
            let Some(entry) = rib.get(&cur) else { break };
            if entry.has_capture() {
                return true;
            }
            current = entry.parent.clone();
        }
        false
    }

    fn plan_register(rib: &Rib, name: &Name, face: FaceId, cost: u64, child_inherit: bool, capture: bool) -> Vec<FibCommand> {
        let mut cmds = vec![FibCommand::Add(name.clone(), face, cost)];

        // Seed `name` itself with whatever child-inherit routes it should
        // already be receiving from its ancestors (spec.md §4.10.2; spec
        // S5 step 2: registering `/a/b` after `/a` already carries a
        // child-inherit route must produce both next hops at `/a/b`, not
        // just the newly-registered one). `get_ancestor_routes` already
        // stops at the first capturing ancestor, so this naturally respects
        // capture along the path to `name`.
        for ancestor_route in rib.get_ancestor_routes(name) {
            if ancestor_route.face_id == face {
                continue; // covered by the Add above
            }
            let has_own = rib.get(name).map(|e| e.routes.iter().any(|r| r.face_id == ancestor_route.face_id)).unwrap_or(false);
            if !has_own {
                cmds.push(FibCommand::Add(name.clone(), ancestor_route.face_id, ancestor_route.cost));
            }
        }

        if child_inherit {
            for descendant in Self::descendants_of(rib, name) {
                if Self::blocked_by_capture(rib, name, &descendant) {
                    continue;
                }
                let already = rib.get_ancestor_routes(&descendant).iter().any(|r| r.face_id == face);
                if !already {
                    cmds.push(FibCommand::Add(descendant, face, cost));
                }
            }
        }

        if capture {
            for descendant in Self::descendants_of(rib, name) {
                for inherited in rib.get_ancestor_routes(&descendant) {
                    let source_is_strict_ancestor_of_name = inherited.from != *name && inherited.from.is_prefix_of(name);
                    if !source_is_strict_ancestor_of_name {
                        continue;
                    }
                    let has_own = rib
                        .get(&descendant)
                        .map(|e| e.routes.iter().any(|r| r.face_id == inherited.face_id))
                        .unwrap_or(false);
                    if !has_own {
                        cmds.push(FibCommand::Remove(descendant.clone(), inherited.face_id));
                    }
                }
            }
        }

        cmds
    }

    fn plan_unregister(rib: &Rib, name: &Name, face: FaceId, child_inherit: bool, removing_key: (FaceId, crate::route::RouteOrigin)) -> Vec<FibCommand> {
        let mut cmds = Vec::new();
        let remaining_own_use = rib
            .get(name)
            .map(|e| e.routes.iter().any(|r| r.face_id == face && r.key() != removing_key))
            .unwrap_or(false);
        if !remaining_own_use {
            cmds.push(FibCommand::Remove(name.clone(), face));
        }

        if child_inherit {
            for descendant in Self::descendants_of(rib, name) {
                let own_has = rib.get(&descendant).map(|e| e.routes.iter().any(|r| r.face_id == face)).unwrap_or(false);
                let still_inherited_elsewhere = rib
                    .get_ancestor_routes(&descendant)
                    .iter()
                    .any(|r| r.face_id == face && r.from != *name);
                if !own_has && !still_inherited_elsewhere {
                    cmds.push(FibCommand::Remove(descendant, face));
                }
            }
        }
        cmds
    }

    /// Pops one batch off the RIB's queue, computes and issues its FIB
    /// commands, and on success applies the update to the RIB. Returns
    /// `None` if the queue was empty. On command failure the RIB is left
    /// unmutated (spec.md §4.10.2 "partial failure ... the RIB is NOT
    /// mutated").
    pub fn drain_one(&mut self, rib: &mut Rib) -> Option<Result<Vec<RibEvent>, FibUpdateError>> {
        let batch = rib.pop_next_batch()?;
        let update = batch.update;

        let commands = match update.action {
            RibUpdateAction::Register => Self::plan_register(
                rib,
                &update.name,
                update.route.face_id,
                update.route.cost,
                update.route.flags.child_inherit,
                update.route.flags.capture,
            ),
            RibUpdateAction::Unregister | RibUpdateAction::RemoveFace => {
                Self::plan_unregister(rib, &update.name, update.route.face_id, update.route.flags.child_inherit, update.route.key())
            }
        };

        for cmd in commands {
            let result = match cmd {
                FibCommand::Add(name, face, cost) => self.sink.add_next_hop(&name, face, cost),
                FibCommand::Remove(name, face) => self.sink.remove_next_hop(&name, face),
            };
            if let Err(err) = result {
                return Some(Err(err));
            }
        }

        let events = match update.action {
            RibUpdateAction::Register => rib.insert(&update.name, update.route),
            RibUpdateAction::Unregister | RibUpdateAction::RemoveFace => {
                rib.erase(&update.name, update.route.face_id, update.route.origin)
            }
        };

        // Refresh `inheritedRoutes` on `name` and every descendant whose
        // inherited set this update could have changed (spec.md §4.10.2).
        let mut touched = Self::descendants_of(rib, &update.name);
        touched.push(update.name.clone());
        for touched_name in touched {
            rib.recompute_inherited_routes(&touched_name);
        }

        Some(Ok(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rib_update::RibUpdate;
    use crate::route::{Route, RouteFlags, RouteOrigin};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingSink {
        adds: Rc<RefCell<Vec<(Name, FaceId, u64)>>>,
        removes: Rc<RefCell<Vec<(Name, FaceId)>>>,
        fail_next: Rc<RefCell<bool>>,
    }

    impl FibCommandSink for RecordingSink {
        fn add_next_hop(&mut self, name: &Name, face: FaceId, cost: u64) -> Result<(), FibUpdateError> {
            if *self.fail_next.borrow() {
                return Err(FibUpdateError::CommandFailed { code: 500, message: "boom".into() });
            }
            self.adds.borrow_mut().push((name.clone(), face, cost));
            Ok(())
        }
        fn remove_next_hop(&mut self, name: &Name, face: FaceId) -> Result<(), FibUpdateError> {
            self.removes.borrow_mut().push((name.clone(), face));
            Ok(())
        }
    }

    #[test]
    fn register_propagates_to_existing_descendant_with_child_inherit() {
        let mut rib = Rib::new();
        rib.insert(&Name::from_string("/a/b"), Route::new(FaceId(9), RouteOrigin::Static, 1, RouteFlags::default()));

        let sink = RecordingSink::default();
        let mut updater = FibUpdater::new(sink.clone());
        rib.begin_apply_update(RibUpdate::register(
            Name::from_string("/a"),
            Route::new(FaceId(1), RouteOrigin::Static, 10, RouteFlags::new(true, false)),
        ));
        let result = updater.drain_one(&mut rib).unwrap();
        assert!(result.is_ok());
        let adds = sink.adds.borrow();
        assert!(adds.iter().any(|(n, f, _)| n == &Name::from_string("/a") && *f == FaceId(1)));
        assert!(adds.iter().any(|(n, f, _)| n == &Name::from_string("/a/b") && *f == FaceId(1)));

        let descendant = rib.get(&Name::from_string("/a/b")).unwrap();
        assert!(descendant.inherited_routes.iter().any(|r| r.face_id == FaceId(1)));
    }

    /// Spec S5 step 2: registering a descendant after an ancestor already
    /// carries a child-inherit route must seed the descendant's FIB entry
    /// with the ancestor's next hop too, not just the newly-registered one.
    #[test]
    fn register_inherits_existing_ancestor_child_inherit_route() {
        let mut rib = Rib::new();
        rib.insert(&Name::from_string("/a"), Route::new(FaceId(10), RouteOrigin::Static, 5, RouteFlags::new(true, false)));

        let sink = RecordingSink::default();
        let mut updater = FibUpdater::new(sink.clone());
        rib.begin_apply_update(RibUpdate::register(
            Name::from_string("/a/b"),
            Route::new(FaceId(20), RouteOrigin::Static, 3, RouteFlags::default()),
        ));
        updater.drain_one(&mut rib).unwrap().unwrap();

        let adds = sink.adds.borrow();
        assert!(adds.iter().any(|(n, f, c)| n == &Name::from_string("/a/b") && *f == FaceId(20) && *c == 3));
        assert!(adds.iter().any(|(n, f, c)| n == &Name::from_string("/a/b") && *f == FaceId(10) && *c == 5));

        let entry = rib.get(&Name::from_string("/a/b")).unwrap();
        assert!(entry.inherited_routes.iter().any(|r| r.face_id == FaceId(10) && r.cost == 5));
    }

    #[test]
    fn register_propagates_cost_above_u8_range() {
        let mut rib = Rib::new();
        let sink = RecordingSink::default();
        let mut updater = FibUpdater::new(sink.clone());
        rib.begin_apply_update(RibUpdate::register(
            Name::from_string("/a"),
            Route::new(FaceId(1), RouteOrigin::PrefixAnnouncement, 2048, RouteFlags::default()),
        ));
        updater.drain_one(&mut rib).unwrap().unwrap();
        let adds = sink.adds.borrow();
        assert!(adds.iter().any(|(n, f, c)| n == &Name::from_string("/a") && *f == FaceId(1) && *c == 2048));
    }

    #[test]
    fn failed_command_leaves_rib_unmutated() {
        let mut rib = Rib::new();
        let sink = RecordingSink::default();
        *sink.fail_next.borrow_mut() = true;
        let mut updater = FibUpdater::new(sink);
        rib.begin_apply_update(RibUpdate::register(
            Name::from_string("/a"),
            Route::new(FaceId(1), RouteOrigin::Static, 10, RouteFlags::default()),
        ));
        let result = updater.drain_one(&mut rib).unwrap();
        assert!(result.is_err());
        assert!(rib.get(&Name::from_string("/a")).is_none());
    }

    #[test]
    fn unregister_removes_nexthop_when_no_remaining_own_route() {
        let mut rib = Rib::new();
        rib.insert(&Name::from_string("/a"), Route::new(FaceId(1), RouteOrigin::Static, 10, RouteFlags::default()));

        let sink = RecordingSink::default();
        let mut updater = FibUpdater::new(sink.clone());
        rib.begin_apply_update(RibUpdate::unregister(
            Name::from_string("/a"),
            Route::new(FaceId(1), RouteOrigin::Static, 10, RouteFlags::default()),
        ));
        updater.drain_one(&mut rib).unwrap().unwrap();
        assert!(sink.removes.borrow().contains(&(Name::from_string("/a"), FaceId(1))));
    }
}

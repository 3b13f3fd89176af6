//! `RibUpdate` and `RibUpdateBatch` (spec.md §4.10.1): the unit of work the
//! [`Rib`](crate::rib::Rib) enqueues and the
//! [`FibUpdater`](crate::fib_updater::FibUpdater) drains one batch at a time.

use crate::route::Route;
use rust_udcn_common::ndn::Name;
use rust_udcn_common::types::FaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RibUpdateAction {
    Register,
    Unregister,
    RemoveFace,
}

#[derive(Debug, Clone)]
pub struct RibUpdate {
    pub action: RibUpdateAction,
    pub name: Name,
    pub route: Route,
}

impl RibUpdate {
    pub fn register(name: Name, route: Route) -> Self {
        Self { action: RibUpdateAction::Register, name, route }
    }

    pub fn unregister(name: Name, route: Route) -> Self {
        Self { action: RibUpdateAction::Unregister, name, route }
    }

    pub fn remove_face(name: Name, route: Route) -> Self {
        Self { action: RibUpdateAction::RemoveFace, name, route }
    }

    pub fn face_id(&self) -> FaceId {
        self.route.face_id
    }
}

/// `FibUpdater` consumes exactly one update for a single face per batch
/// (spec.md §4.10.2 "Given a `RibUpdateBatch` containing exactly one update
/// for a single face"). The `Rib`'s queue is a sequence of single-update
/// batches rather than a batch spanning multiple updates, matching "Only one
/// batch is in flight at a time; subsequent updates queue."
#[derive(Debug, Clone)]
pub struct RibUpdateBatch {
    pub update: RibUpdate,
}

impl RibUpdateBatch {
    pub fn new(update: RibUpdate) -> Self {
        Self { update }
    }
}

//! `(name, routes, parent, children, inheritedRoutes, nRoutesWithCapture)`
//! (spec.md §3 "RIB entry").

use crate::route::{Route, RouteOrigin};
use rust_udcn_common::ndn::Name;
use rust_udcn_common::types::FaceId;

/// A route an entry inherits from an ancestor's `child-inherit` route,
/// cached here so descendants don't need to re-walk the parent chain on
/// every FIB-relevant query (spec.md §4.10 "emits the inherited-route
/// adjustments back to RIB entries' `inheritedRoutes` lists").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritedRoute {
    pub face_id: FaceId,
    pub cost: u64,
    /// Name of the RIB entry whose own route is the source of this
    /// inherited contribution.
    pub from: Name,
}

pub struct RibEntry {
    pub name: Name,
    pub routes: Vec<Route>,
    pub parent: Option<Name>,
    pub children: Vec<Name>,
    pub inherited_routes: Vec<InheritedRoute>,
    n_routes_with_capture: usize,
}

impl RibEntry {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            routes: Vec::new(),
            parent: None,
            children: Vec::new(),
            inherited_routes: Vec::new(),
            n_routes_with_capture: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Invariant (spec.md §3): `nRoutesWithCapture` equals the number of
    /// own routes with the capture flag set.
    pub fn has_capture(&self) -> bool {
        self.n_routes_with_capture > 0
    }

    pub fn find_route(&self, face_id: FaceId, origin: RouteOrigin) -> Option<&Route> {
        self.routes.iter().find(|r| r.key() == (face_id, origin))
    }

    pub fn find_route_mut(&mut self, face_id: FaceId, origin: RouteOrigin) -> Option<&mut Route> {
        self.routes.iter_mut().find(|r| r.key() == (face_id, origin))
    }

    /// Inserts or replaces the route with the same `(faceId, origin)` key.
    /// Returns the previous route, if any.
    pub fn upsert_route(&mut self, route: Route) -> Option<Route> {
        let key = route.key();
        if let Some(pos) = self.routes.iter().position(|r| r.key() == key) {
            if self.routes[pos].flags.capture {
                self.n_routes_with_capture -= 1;
            }
            if route.flags.capture {
                self.n_routes_with_capture += 1;
            }
            Some(std::mem::replace(&mut self.routes[pos], route))
        } else {
            if route.flags.capture {
                self.n_routes_with_capture += 1;
            }
            self.routes.push(route);
            None
        }
    }

    /// Removes the route identified by `(faceId, origin)`; returns it.
    pub fn remove_route(&mut self, face_id: FaceId, origin: RouteOrigin) -> Option<Route> {
        let pos = self.routes.iter().position(|r| r.key() == (face_id, origin))?;
        let removed = self.routes.remove(pos);
        if removed.flags.capture {
            self.n_routes_with_capture -= 1;
        }
        Some(removed)
    }

    /// Removes every route on `face_id`, regardless of origin (REMOVE_FACE,
    /// spec.md §4.10.1). Returns the removed routes.
    pub fn remove_face(&mut self, face_id: FaceId) -> Vec<Route> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.routes.len() {
            if self.routes[i].face_id == face_id {
                let r = self.routes.remove(i);
                if r.flags.capture {
                    self.n_routes_with_capture -= 1;
                }
                removed.push(r);
            } else {
                i += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteFlags;

    fn route(face: u16, capture: bool) -> Route {
        Route::new(FaceId(face), RouteOrigin::Static, 10, RouteFlags::new(false, capture))
    }

    #[test]
    fn upsert_tracks_capture_count() {
        let mut entry = RibEntry::new(Name::from_string("/a"));
        entry.upsert_route(route(1, true));
        assert!(entry.has_capture());
        entry.upsert_route(route(1, false));
        assert!(!entry.has_capture());
    }

    #[test]
    fn remove_face_clears_all_origins_on_that_face() {
        let mut entry = RibEntry::new(Name::from_string("/a"));
        entry.upsert_route(Route::new(FaceId(1), RouteOrigin::Static, 10, RouteFlags::default()));
        entry.upsert_route(Route::new(FaceId(1), RouteOrigin::App, 20, RouteFlags::default()));
        entry.upsert_route(Route::new(FaceId(2), RouteOrigin::Static, 10, RouteFlags::default()));
        let removed = entry.remove_face(FaceId(1));
        assert_eq!(removed.len(), 2);
        assert_eq!(entry.routes.len(), 1);
    }
}

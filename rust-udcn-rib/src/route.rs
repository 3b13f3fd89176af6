//! A single route entry within a [`RibEntry`](crate::rib_entry::RibEntry)
//! (spec.md §3 "RIB entry").

use rust_udcn_common::types::FaceId;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Where a route came from. Affects nothing structurally — kept so the
/// management surface can report and filter by it (spec.md §6.2 `rib/list`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteOrigin {
    App,
    Static,
    Nlsr,
    Client,
    Autoconf,
    /// A route materialized from a validated `PrefixAnnouncement`
    /// (spec.md §9 Open Question, resolved in DESIGN.md: fixed cost 2048).
    PrefixAnnouncement,
}

/// Bitset of {child-inherit, capture} (spec.md §3). Plain bools rather than
/// a `bitflags` type: only two flags exist and neither combination needs
/// bit-level storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFlags {
    pub child_inherit: bool,
    pub capture: bool,
}

impl RouteFlags {
    pub fn new(child_inherit: bool, capture: bool) -> Self {
        Self { child_inherit, capture }
    }
}

/// `(faceId, origin, cost, flags, expires?, announcement?, annExpires?)`
/// (spec.md §3). Uniquely identified within a [`RibEntry`] by
/// `(face_id, origin)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub face_id: FaceId,
    pub origin: RouteOrigin,
    pub cost: u64,
    pub flags: RouteFlags,
    #[serde(skip, default)]
    pub expires: Option<Instant>,
    pub announcement: Option<String>,
    #[serde(skip, default)]
    pub ann_expires: Option<Instant>,
}

impl Route {
    pub fn new(face_id: FaceId, origin: RouteOrigin, cost: u64, flags: RouteFlags) -> Self {
        Self {
            face_id,
            origin,
            cost,
            flags,
            expires: None,
            announcement: None,
            ann_expires: None,
        }
    }

    pub fn with_expires(mut self, expires: Instant) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Identity key within one [`RibEntry`] (spec.md §3 "uniquely
    /// identified within an entry by `(faceId, origin)`").
    pub fn key(&self) -> (FaceId, RouteOrigin) {
        (self.face_id, self.origin)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires.map(|e| now >= e).unwrap_or(false)
    }
}

//! Management command surface (spec.md §6.2), realized as an in-process
//! `ManagementRequest`/`ControlResponse` pair rather than the real
//! signed-Interest wire format (see DESIGN.md — the TLV codec and
//! command-authentication layer are explicit Non-goals).

use crate::route::{RouteFlags, RouteOrigin};
use rust_udcn_common::ndn::Name;
use rust_udcn_common::types::FaceId;
use serde::{Deserialize, Serialize};

/// Recommended compile-time max FIB name depth (spec.md §6.2); requests
/// naming a longer prefix get `414`.
pub const MAX_FIB_NAME_DEPTH: usize = 64;

pub mod code {
    pub const OK: u32 = 200;
    pub const UNAUTHORIZED: u32 = 403;
    pub const MALFORMED: u32 = 400;
    pub const NAME_TOO_LONG: u32 = 414;
    pub const UNKNOWN_VERB: u32 = 501;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "module", content = "params", rename_all = "kebab-case")]
pub enum ManagementRequest {
    FibAddNextHop { name: Name, face_id: FaceId, cost: u64 },
    FibRemoveNextHop { name: Name, face_id: FaceId },
    CsConfig { capacity: Option<usize>, admit: Option<bool>, serve: Option<bool> },
    CsErase { name: Name, count: Option<usize> },
    StrategyChoiceSet { name: Name, strategy: String },
    StrategyChoiceUnset { name: Name },
    RibRegister {
        name: Name,
        /// `0` means "substitute the face the command Interest arrived on"
        /// (spec.md §6.2 self-registration rule).
        face_id: FaceId,
        origin: RouteOrigin,
        cost: u64,
        flags: RouteFlags,
        expiration_period_ms: Option<u64>,
    },
    RibUnregister { name: Name, face_id: FaceId, origin: RouteOrigin },
    RibAnnounce { announcement: PrefixAnnouncement },
    StatusGeneral,
    FibList,
    CsInfo,
    StrategyChoiceList,
    RibList,
    FacesList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlResponse {
    pub code: u32,
    pub text: String,
    pub body: Option<serde_json::Value>,
}

impl ControlResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self { code: code::OK, text: text.into(), body: None }
    }

    pub fn ok_with_body(text: impl Into<String>, body: serde_json::Value) -> Self {
        Self { code: code::OK, text: text.into(), body: Some(body) }
    }

    pub fn error(code: u32, text: impl Into<String>) -> Self {
        Self { code, text: text.into(), body: None }
    }
}

/// Applies spec.md §6.2's self-registration rule: a `faceId` of `0` in
/// `rib register` / `rib unregister` is replaced with the id of the face
/// the command Interest was tagged with.
pub fn resolve_self_registration(requested: FaceId, incoming_face: FaceId) -> FaceId {
    if requested.0 == 0 {
        incoming_face
    } else {
        requested
    }
}

/// Rejects names deeper than [`MAX_FIB_NAME_DEPTH`] with a `414` response.
pub fn check_name_depth(name: &Name) -> Result<(), ControlResponse> {
    if name.len() > MAX_FIB_NAME_DEPTH {
        Err(ControlResponse::error(code::NAME_TOO_LONG, "name exceeds max FIB depth"))
    } else {
        Ok(())
    }
}

/// A prefix announcement carried as `ControlParameters` app-parameters
/// (spec.md §6.2 `rib announce`). Validated and converted into a `Route`
/// with a fixed cost per DESIGN.md's resolution of spec.md §9 Open
/// Question 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixAnnouncement {
    pub name: Name,
    pub expiration_period_ms: u64,
}

/// Fixed cost used for routes materialized from a `PrefixAnnouncement`
/// (spec.md §9 Open Question 2, resolved in DESIGN.md).
pub const PREFIX_ANNOUNCEMENT_COST: u64 = 2048;

impl PrefixAnnouncement {
    /// Validates the announcement and converts it into the route that
    /// would be inserted on success. The only validation performed here is
    /// structural (non-empty name, nonzero expiration); signature/ownership
    /// validation is part of the out-of-scope command-authentication layer.
    pub fn validate(&self) -> Result<(Name, u64), String> {
        if self.name.is_empty() {
            return Err("empty name".to_string());
        }
        if self.expiration_period_ms == 0 {
            return Err("zero expiration period".to_string());
        }
        Ok((self.name.clone(), self.expiration_period_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_registration_substitutes_incoming_face() {
        assert_eq!(resolve_self_registration(FaceId(0), FaceId(42)), FaceId(42));
        assert_eq!(resolve_self_registration(FaceId(7), FaceId(42)), FaceId(7));
    }

    #[test]
    fn name_depth_over_limit_is_rejected() {
        let mut name = Name::new();
        for i in 0..(MAX_FIB_NAME_DEPTH + 1) {
            name.push(rust_udcn_common::ndn::NameComponent::new(format!("c{i}").into_bytes()));
        }
        assert!(check_name_depth(&name).is_err());
    }

    #[test]
    fn announcement_rejects_zero_expiration() {
        let ann = PrefixAnnouncement { name: Name::from_string("/a"), expiration_period_ms: 0 };
        assert!(ann.validate().is_err());
    }
}

//! Scope control for `/localhost` and `/localhop` prefixes: packets under
//! these prefixes must never cross a non-local face.

use crate::face::FaceScope;
use rust_udcn_common::ndn::Name;

const LOCALHOST: &str = "localhost";
const LOCALHOP: &str = "localhop";

fn first_component_is(name: &Name, s: &str) -> bool {
    name.at(0).map(|c| c.to_string() == s).unwrap_or(false)
}

pub fn is_localhost(name: &Name) -> bool {
    first_component_is(name, LOCALHOST)
}

pub fn is_localhop(name: &Name) -> bool {
    first_component_is(name, LOCALHOP)
}

pub fn is_scoped(name: &Name) -> bool {
    is_localhost(name) || is_localhop(name)
}

/// Whether forwarding `name` out (or in from) a face of the given scope
/// would violate NDN scope control.
///
/// `/localhost` packets may only traverse local faces. `/localhop` packets
/// may traverse any face but are restricted to a single hop in the real
/// protocol; that hop-count enforcement belongs to the management dispatch
/// layer (out of scope here per spec.md §1), so this helper only enforces
/// the `/localhost` restriction.
pub fn violates_scope(name: &Name, face_scope: FaceScope) -> bool {
    is_localhost(name) && face_scope != FaceScope::Local
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_detection() {
        assert!(is_localhost(&Name::from_string("/localhost/nfd/fib")));
        assert!(!is_localhost(&Name::from_string("/example/data")));
    }

    #[test]
    fn localhost_blocked_on_non_local_face() {
        assert!(violates_scope(&Name::from_string("/localhost/nfd/fib"), FaceScope::NonLocal));
        assert!(!violates_scope(&Name::from_string("/localhost/nfd/fib"), FaceScope::Local));
    }

    #[test]
    fn localhop_allowed_on_any_face() {
        assert!(!violates_scope(&Name::from_string("/localhop/nfd/fib"), FaceScope::NonLocal));
    }

    #[test]
    fn ordinary_names_unscoped() {
        assert!(!is_scoped(&Name::from_string("/example/data")));
    }
}

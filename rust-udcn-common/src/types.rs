//! Small identifier types shared across the userspace components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interface identifier type used for identifying network interfaces.
pub type InterfaceId = u32;

/// Maximum length of a face name string.
pub const MAX_FACE_NAME_LEN: usize = 64;

/// Unique identifier for a face. `0` is reserved as the invalid id; `1..=255`
/// are reserved for well-known faces (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId(pub u16);

impl FaceId {
    pub const INVALID: FaceId = FaceId(0);
    pub const INTERNAL_MANAGEMENT: FaceId = FaceId(1);
    pub const CONTENT_STORE: FaceId = FaceId(254);
    pub const NULL: FaceId = FaceId(255);

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Whether this id falls in the reserved (well-known) range `1..=255`.
    pub fn is_reserved(&self) -> bool {
        self.0 != 0 && self.0 <= 255
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Face type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceType {
    /// Physical network interface.
    NetDevice,
    /// Internal app face.
    App,
    /// QUIC connection.
    Quic,
}

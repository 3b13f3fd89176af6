//! NDN packet types and structures.
//!
//! This module provides the core data structures that represent NDN packets
//! in the µDCN implementation.

use crate::error::Error;
use crate::tlv::{self, TlvElement};
use bytes::{Buf, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::{Duration, Instant};

/// Maximum length of an NDN name component.
pub const MAX_NAME_COMPONENT_LENGTH: usize = 255;
/// Maximum number of components in an NDN name.
pub const MAX_NAME_COMPONENTS: usize = 16;
/// Maximum size of an NDN packet.
pub const MAX_NDN_PACKET_SIZE: usize = 8800;
/// Default Interest lifetime, per spec.md §3.
pub const DEFAULT_INTEREST_LIFETIME_MS: u32 = 4000;

/* ---------------------------------------------------------------- *\
 * Name and NameComponent
\* ---------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameComponent(pub Bytes);

impl NameComponent {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn to_tlv(&self) -> TlvElement {
        TlvElement::new(tlv::TLV_COMPONENT, self.0.clone())
    }

    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_COMPONENT {
            return Err(Error::NdnPacket(format!(
                "Expected name component TLV type {}, got {}",
                tlv::TLV_COMPONENT,
                element.tlv_type
            )));
        }
        Ok(Self(element.value.clone()))
    }
}

impl PartialOrd for NameComponent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NameComponent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Component-wise lexical comparison, NDN canonical order: shorter
        // components sort before longer ones that share the shorter's prefix.
        self.0.len().cmp(&other.0.len()).then_with(|| self.0.cmp(&other.0))
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let printable = self.0.iter().all(|&b| (b.is_ascii_graphic() || b == b' '));
        if printable {
            write!(f, "{}", String::from_utf8_lossy(&self.0))
        } else {
            write!(f, "0x")?;
            for &b in &self.0 {
                write!(f, "{:02x}", b)?;
            }
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    pub fn from_string(s: &str) -> Self {
        let components = s
            .split('/')
            .filter(|comp| !comp.is_empty())
            .map(|comp| NameComponent::new(comp.as_bytes().to_vec()))
            .collect();
        Self { components }
    }

    pub fn push(&mut self, component: NameComponent) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Returns a new name with `component` appended (spec.md §3 `append`).
    pub fn append(&self, component: NameComponent) -> Self {
        let mut components = self.components.clone();
        components.push(component);
        Self { components }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> impl Iterator<Item = &NameComponent> {
        self.components.iter()
    }

    /// `at(i)` per spec.md §3.
    pub fn at(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    /// Alias kept for call-site readability; same as [`Name::at`].
    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.at(index)
    }

    /// `getPrefix(n)` per spec.md §3: keep the first `n` components.
    pub fn get_prefix(&self, n: usize) -> Self {
        Self {
            components: self.components.iter().take(n).cloned().collect(),
        }
    }

    /// Alias for [`Name::get_prefix`].
    pub fn prefix(&self, len: usize) -> Self {
        self.get_prefix(len)
    }

    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.components.len() > other.components.len() {
            return false;
        }
        self.components
            .iter()
            .zip(other.components.iter())
            .all(|(a, b)| a == b)
    }

    pub fn to_tlv(&self) -> Result<TlvElement, Error> {
        let mut buf = BytesMut::new();
        for component in &self.components {
            component.to_tlv().encode(&mut buf);
        }
        Ok(TlvElement::new(tlv::TLV_NAME, buf.freeze()))
    }

    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_NAME {
            return Err(Error::NdnPacket(format!(
                "Expected name TLV type {}, got {}",
                tlv::TLV_NAME,
                element.tlv_type
            )));
        }

        let mut components = Vec::new();
        let mut buf = element.value.clone();
        while buf.has_remaining() {
            let e = TlvElement::decode(&mut buf)?;
            components.push(NameComponent::from_tlv(&e)?);
        }
        Ok(Self { components })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

/* ---------------------------------------------------------------- *\
 * Forwarding hint
\* ---------------------------------------------------------------- */

/// One entry of a forwarding hint: an ordered `(preference, name)` pair,
/// per spec.md §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub preference: u32,
    pub name: Name,
}

impl Delegation {
    pub fn new(preference: u32, name: Name) -> Self {
        Self { preference, name }
    }
}

/* ---------------------------------------------------------------- *\
 * Interest
\* ---------------------------------------------------------------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interest {
    pub name: Name,
    pub nonce: u32,
    pub lifetime_ms: u32,
    pub hop_limit: Option<u8>,
    pub can_be_prefix: bool,
    pub must_be_fresh: bool,
    /// Ordered list of delegations, per spec.md §3. Empty if the Interest
    /// carries no forwarding hint.
    pub forwarding_hint: Vec<Delegation>,
    /// Which delegation is currently being forwarded, set by the forwarding
    /// hint resolution algorithm (spec.md §4.8.1).
    pub selected_delegation: Option<usize>,
    /// Tagged by the incoming-Interest pipeline (spec.md §4.8 step 1); not
    /// part of the wire format (NDNLPv2 `IncomingFaceIdTag`).
    #[serde(skip)]
    pub incoming_face_id: Option<u16>,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0));
        let nonce = (now.as_millis() % u32::MAX as u128) as u32;

        Self {
            name,
            nonce,
            lifetime_ms: DEFAULT_INTEREST_LIFETIME_MS,
            hop_limit: Some(32),
            can_be_prefix: false,
            must_be_fresh: true,
            forwarding_hint: Vec::new(),
            selected_delegation: None,
            incoming_face_id: None,
        }
    }

    pub fn with_lifetime(mut self, lifetime_ms: u32) -> Self {
        self.lifetime_ms = lifetime_ms;
        self
    }
    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }
    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }
    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }
    pub fn with_forwarding_hint(mut self, hint: Vec<Delegation>) -> Self {
        self.forwarding_hint = hint;
        self
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms as u64)
    }

    /// The selector set used for PIT aggregation matching (spec.md §4.4):
    /// two Interests with equal name and equal selector set share a PIT
    /// entry.
    pub fn selector_key(&self) -> SelectorKey {
        SelectorKey {
            can_be_prefix: self.can_be_prefix,
            must_be_fresh: self.must_be_fresh,
        }
    }

    pub fn wire_size(&self) -> Result<usize, Error> {
        Ok(self.name.to_tlv()?.len() + 20) // rough estimate
    }
}

/// The selector subset that determines PIT-entry identity, per spec.md
/// §4.4's `(name, selectors)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectorKey {
    pub can_be_prefix: bool,
    pub must_be_fresh: bool,
}

/* ---------------------------------------------------------------- *\
 * Data
\* ---------------------------------------------------------------- */

/// Helper used only for deserialisation of `Data`.
#[derive(Deserialize)]
struct DataHelper {
    name: Name,
    content: Bytes,
    freshness_period_ms: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Data {
    pub name: Name,
    pub content: Bytes,
    /// `None` means the Data has no freshness period and is never fresh
    /// (spec.md §4.3).
    pub freshness_period_ms: Option<u32>,

    /// Creation timestamp – not serialised, regenerated on deserialisation.
    #[serde(skip_serializing)]
    pub creation_time: Instant,
}

impl<'de> Deserialize<'de> for Data {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let helper = DataHelper::deserialize(deserializer)?;
        Ok(Self {
            name: helper.name,
            content: helper.content,
            freshness_period_ms: helper.freshness_period_ms,
            creation_time: Instant::now(), // fresh timestamp
        })
    }
}

impl Data {
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            content: content.into(),
            freshness_period_ms: None,
            creation_time: Instant::now(),
        }
    }

    pub fn with_freshness_period(mut self, freshness_period_ms: u32) -> Self {
        self.freshness_period_ms = Some(freshness_period_ms);
        self
    }

    /// Whether this Data is still fresh at `now`, per spec.md §4.3:
    /// `now - insertionTime < freshnessPeriod`.
    pub fn is_fresh_at(&self, insertion_time: Instant, now: Instant) -> bool {
        match self.freshness_period_ms {
            None => false,
            Some(fp) => {
                now.saturating_duration_since(insertion_time) < Duration::from_millis(fp as u64)
            }
        }
    }

    pub fn wire_size(&self) -> Result<usize, Error> {
        Ok(self.name.to_tlv()?.len() + self.content.len() + 20)
    }
}

/* ---------------------------------------------------------------- *\
 * Nack
\* ---------------------------------------------------------------- */

/// Reason an upstream could not satisfy an Interest, per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NackReason {
    Congestion,
    Duplicate,
    NoRoute,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nack {
    pub interest: Interest,
    pub reason: NackReason,
}

impl Nack {
    pub fn new(interest: Interest, reason: NackReason) -> Self {
        Self { interest, reason }
    }
}

/* ---------------------------------------------------------------- *\
 * Misc
\* ---------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub enum InterestResult {
    Forwarded,
    SatisfiedByCs(Data),
    Aggregated,
    Dropped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trips_through_string() {
        let name = Name::from_string("/test/data/1");
        assert_eq!(name.len(), 3);
        assert_eq!(name.to_string(), "/test/data/1");
        assert_eq!(Name::new().to_string(), "/");
    }

    #[test]
    fn name_prefix_and_ordering() {
        let a = Name::from_string("/a/b/c");
        let b = Name::from_string("/a/b/c");
        let c = Name::from_string("/a/b/d");
        let prefix = Name::from_string("/a/b");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(prefix.is_prefix_of(&a));
        assert!(!a.is_prefix_of(&prefix));
        assert!(!c.is_prefix_of(&a));
        assert!(prefix < a);
        assert_eq!(a.get_prefix(2), prefix);
    }

    #[test]
    fn interest_builders_set_selector_key() {
        let interest = Interest::new(Name::from_string("/a"))
            .with_can_be_prefix(true)
            .with_must_be_fresh(false);
        assert!(interest.can_be_prefix);
        assert!(!interest.must_be_fresh);
        assert_eq!(
            interest.selector_key(),
            SelectorKey {
                can_be_prefix: true,
                must_be_fresh: false
            }
        );
    }

    #[test]
    fn data_freshness_window() {
        let data =
            Data::new(Name::from_string("/a"), Bytes::from_static(b"x")).with_freshness_period(100);
        let t0 = Instant::now();
        assert!(data.is_fresh_at(t0, t0));
        assert!(!data.is_fresh_at(t0, t0 + Duration::from_millis(200)));

        let never_fresh = Data::new(Name::from_string("/a"), Bytes::from_static(b"x"));
        assert!(!never_fresh.is_fresh_at(t0, t0));
    }
}

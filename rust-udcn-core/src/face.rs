//! The Face contract (spec.md §6.1): the Forwarder's only window onto the
//! outside world. Concrete transports (QUIC, Unix, app faces) implement
//! this trait; the core never depends on a transport directly.

use async_trait::async_trait;
use rust_udcn_common::error::Error;
use rust_udcn_common::ndn::{Data, Interest, Nack};
use rust_udcn_common::types::FaceId;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceScope {
    Local,
    NonLocal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    PointToPoint,
    MultiAccess,
    AdHoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistency {
    OnDemand,
    Persistent,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceState {
    Up,
    Down,
    Closing,
    Failed,
    Closed,
}

/// Per-face packet counters, maintained by the face implementation and
/// read by the management layer (spec.md §6.1).
#[derive(Default)]
pub struct FaceCounters {
    pub n_in_interests: AtomicU64,
    pub n_in_data: AtomicU64,
    pub n_in_nacks: AtomicU64,
    pub n_out_interests: AtomicU64,
    pub n_out_data: AtomicU64,
    pub n_out_nacks: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FaceCounterSnapshot {
    pub n_in_interests: u64,
    pub n_in_data: u64,
    pub n_in_nacks: u64,
    pub n_out_interests: u64,
    pub n_out_data: u64,
    pub n_out_nacks: u64,
}

impl FaceCounters {
    pub fn snapshot(&self) -> FaceCounterSnapshot {
        FaceCounterSnapshot {
            n_in_interests: self.n_in_interests.load(Ordering::Relaxed),
            n_in_data: self.n_in_data.load(Ordering::Relaxed),
            n_in_nacks: self.n_in_nacks.load(Ordering::Relaxed),
            n_out_interests: self.n_out_interests.load(Ordering::Relaxed),
            n_out_data: self.n_out_data.load(Ordering::Relaxed),
            n_out_nacks: self.n_out_nacks.load(Ordering::Relaxed),
        }
    }
}

/// A bidirectional channel the Forwarder sends packets on (spec.md §6.1).
/// Receive events aren't modeled as trait methods: a concrete face pushes
/// received packets into the Forwarder's incoming-packet channel itself,
/// since the Forwarder lives on its own non-`Send` event loop while faces
/// run on ordinary Tokio tasks.
#[async_trait(?Send)]
pub trait Face {
    fn id(&self) -> FaceId;
    fn scope(&self) -> FaceScope;
    fn link_type(&self) -> LinkType;
    fn persistency(&self) -> Persistency;
    fn state(&self) -> FaceState;
    fn remote_uri(&self) -> String;
    fn local_uri(&self) -> String;
    fn counters(&self) -> &FaceCounters;

    fn is_local(&self) -> bool {
        self.scope() == FaceScope::Local
    }

    async fn send_interest(&self, interest: &Interest) -> Result<(), Error>;
    async fn send_data(&self, data: &Data) -> Result<(), Error>;
    async fn send_nack(&self, nack: &Nack) -> Result<(), Error>;

    /// Begin teardown; the face eventually transitions to `Closed`.
    async fn close(&self) -> Result<(), Error>;
}

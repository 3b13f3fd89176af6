//! Strategy interface (spec.md §4.5): forwarding decisions are polymorphic
//! over a small trigger set; the Forwarder invokes triggers, the strategy
//! calls back into the Forwarder through [`StrategyActions`].

mod access;
mod best_route;
mod multicast;

pub use access::AccessStrategy;
pub use best_route::BestRouteStrategy;
pub use multicast::MulticastStrategy;

use crate::fib::FibEntry;
use crate::pit::PitKey;
use rust_udcn_common::ndn::{Data, Nack, NackReason};
use rust_udcn_common::types::FaceId;

/// The callback surface a [`Strategy`] may invoke on the Forwarder during a
/// trigger (spec.md §4.5 "Helpers the strategy may invoke").
pub trait StrategyActions {
    /// `sendInterest(pitEntry, outFace, wantNewNonce?)`.
    fn send_interest(&mut self, pit_entry: PitKey, out_face: FaceId, want_new_nonce: bool);
    /// `sendData(pitEntry, data, outFace)`.
    fn send_data(&mut self, pit_entry: PitKey, data: &Data, out_face: FaceId);
    /// `sendNack(pitEntry, outFace, reason)`.
    fn send_nack(&mut self, pit_entry: PitKey, out_face: FaceId, reason: NackReason);
    /// `sendNacks(pitEntry, reason, exceptFaces)`.
    fn send_nacks(&mut self, pit_entry: PitKey, reason: NackReason, except: &[FaceId]);
    /// `rejectPendingInterest(pitEntry)`.
    fn reject_pending_interest(&mut self, pit_entry: PitKey);
    /// `lookupFib(pitEntry)`.
    fn lookup_fib(&self, pit_entry: PitKey) -> FibEntry;
}

/// A forwarding strategy, installed per-prefix via `StrategyChoice`
/// (spec.md §4.5).
pub trait Strategy {
    fn name(&self) -> &str;

    fn after_receive_interest(
        &mut self,
        actions: &mut dyn StrategyActions,
        in_face: FaceId,
        pit_entry: PitKey,
    );

    /// Default: send Data back on `in_face` (spec.md §4.5).
    fn after_content_store_hit(
        &mut self,
        actions: &mut dyn StrategyActions,
        in_face: FaceId,
        pit_entry: PitKey,
        data: &Data,
    ) {
        actions.send_data(pit_entry, data, in_face);
    }

    fn after_receive_nack(
        &mut self,
        actions: &mut dyn StrategyActions,
        in_face: FaceId,
        nack: &Nack,
        pit_entry: PitKey,
    );

    fn before_satisfy_interest(
        &mut self,
        actions: &mut dyn StrategyActions,
        pit_entry: PitKey,
        in_face: FaceId,
        data: &Data,
    ) {
        let _ = (actions, pit_entry, in_face, data);
    }

    fn before_expire_pending_interest(&mut self, actions: &mut dyn StrategyActions, pit_entry: PitKey) {
        let _ = (actions, pit_entry);
    }
}

//! Best-route strategy: forward to the lowest-cost next hop, falling back
//! to the next cheapest on Nack or expiry (spec.md §4.5).

use super::{Strategy, StrategyActions};
use rust_udcn_common::ndn::{Data, Nack, NackReason};
use rust_udcn_common::types::FaceId;

pub struct BestRouteStrategy;

impl Default for BestRouteStrategy {
    fn default() -> Self {
        Self
    }
}

impl Strategy for BestRouteStrategy {
    fn name(&self) -> &str {
        "best-route"
    }

    fn after_receive_interest(
        &mut self,
        actions: &mut dyn StrategyActions,
        in_face: FaceId,
        pit_entry: crate::pit::PitKey,
    ) {
        let fib_entry = actions.lookup_fib(pit_entry);
        match fib_entry.next_hops.iter().find(|h| h.face != in_face) {
            Some(hop) => actions.send_interest(pit_entry, hop.face, false),
            None => actions.reject_pending_interest(pit_entry),
        }
    }

    fn after_receive_nack(
        &mut self,
        actions: &mut dyn StrategyActions,
        in_face: FaceId,
        nack: &Nack,
        pit_entry: crate::pit::PitKey,
    ) {
        if nack.reason == NackReason::Duplicate {
            actions.send_nack(pit_entry, in_face, NackReason::Duplicate);
            return;
        }
        // Try the next-cheapest untried hop; give up with a Nack otherwise.
        let fib_entry = actions.lookup_fib(pit_entry);
        match fib_entry.next_hops.iter().find(|h| h.face != in_face) {
            Some(hop) => actions.send_interest(pit_entry, hop.face, true),
            None => actions.send_nacks(pit_entry, NackReason::NoRoute, &[]),
        }
    }

    fn before_expire_pending_interest(&mut self, _actions: &mut dyn StrategyActions, _pit_entry: crate::pit::PitKey) {
        // Best-route has nothing left to try by the time the straggler
        // timer elapses; the Forwarder's Interest-Finalize pipeline handles
        // the cleanup itself.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fib::Fib;
    use crate::name_tree::NameTree;
    use crate::pit::PitKey;
    use rust_udcn_common::ndn::Name;
    use std::rc::Rc;

    struct RecordingActions {
        fib: Fib,
        sent: Vec<(PitKey, FaceId)>,
        rejected: Vec<PitKey>,
    }

    impl StrategyActions for RecordingActions {
        fn send_interest(&mut self, pit_entry: PitKey, out_face: FaceId, _want_new_nonce: bool) {
            self.sent.push((pit_entry, out_face));
        }
        fn send_data(&mut self, _pit_entry: PitKey, _data: &Data, _out_face: FaceId) {}
        fn send_nack(&mut self, _pit_entry: PitKey, _out_face: FaceId, _reason: NackReason) {}
        fn send_nacks(&mut self, _pit_entry: PitKey, _reason: NackReason, _except: &[FaceId]) {}
        fn reject_pending_interest(&mut self, pit_entry: PitKey) {
            self.rejected.push(pit_entry);
        }
        fn lookup_fib(&self, _pit_entry: PitKey) -> crate::fib::FibEntry {
            self.fib.find_longest_prefix_match(&Name::from_string("/a"))
        }
    }

    #[test]
    fn picks_lowest_cost_hop_excluding_in_face() {
        let name_tree = NameTree::new_handle();
        let mut fib = Fib::new(Rc::clone(&name_tree));
        fib.add_next_hop(&Name::from_string("/a"), FaceId(300), 10);
        fib.add_next_hop(&Name::from_string("/a"), FaceId(301), 5);

        let mut actions = RecordingActions {
            fib,
            sent: Vec::new(),
            rejected: Vec::new(),
        };
        let mut strategy = BestRouteStrategy;
        strategy.after_receive_interest(&mut actions, FaceId(1), PitKey(1));

        assert_eq!(actions.sent, vec![(PitKey(1), FaceId(301))]);
    }

    #[test]
    fn rejects_when_only_hop_is_incoming_face() {
        let name_tree = NameTree::new_handle();
        let mut fib = Fib::new(Rc::clone(&name_tree));
        fib.add_next_hop(&Name::from_string("/a"), FaceId(300), 10);

        let mut actions = RecordingActions {
            fib,
            sent: Vec::new(),
            rejected: Vec::new(),
        };
        let mut strategy = BestRouteStrategy;
        strategy.after_receive_interest(&mut actions, FaceId(300), PitKey(1));

        assert!(actions.sent.is_empty());
        assert_eq!(actions.rejected, vec![PitKey(1)]);
    }
}

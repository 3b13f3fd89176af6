//! Access strategy: unicast to the best next hop on the first try, then
//! fall back to multicasting the remaining hops on Nack — suited to access
//! routers where the first hop is usually right but retransmissions
//! shouldn't wait out a full best-route retry chain (spec.md §4.5
//! built-ins).

use super::{Strategy, StrategyActions};
use rust_udcn_common::ndn::{Nack, NackReason};
use rust_udcn_common::types::FaceId;

pub struct AccessStrategy;

impl Default for AccessStrategy {
    fn default() -> Self {
        Self
    }
}

impl Strategy for AccessStrategy {
    fn name(&self) -> &str {
        "access"
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
        let fib_entry = actions.lookup_fib(pit_entry);
        let mut sent = false;
        for hop in &fib_entry.next_hops {
            if hop.face != in_face {
                actions.send_interest(pit_entry, hop.face, true);
                sent = true;
            }
        }
        if !sent {
            actions.send_nacks(pit_entry, NackReason::NoRoute, &[]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fib::Fib;
    use crate::name_tree::NameTree;
    use crate::pit::PitKey;
    use rust_udcn_common::ndn::{Data, Name, NackReason};
    use std::rc::Rc;

    struct RecordingActions {
        fib: Fib,
        sent: Vec<FaceId>,
        nacked_no_route: bool,
    }

    impl StrategyActions for RecordingActions {
        fn send_interest(&mut self, _pit_entry: PitKey, out_face: FaceId, _want_new_nonce: bool) {
            self.sent.push(out_face);
        }
        fn send_data(&mut self, _pit_entry: PitKey, _data: &Data, _out_face: FaceId) {}
        fn send_nack(&mut self, _pit_entry: PitKey, _out_face: FaceId, _reason: NackReason) {}
        fn send_nacks(&mut self, _pit_entry: PitKey, reason: NackReason, _except: &[FaceId]) {
            if reason == NackReason::NoRoute {
                self.nacked_no_route = true;
            }
        }
        fn reject_pending_interest(&mut self, _pit_entry: PitKey) {}
        fn lookup_fib(&self, _pit_entry: PitKey) -> crate::fib::FibEntry {
            self.fib.find_longest_prefix_match(&Name::from_string("/a"))
        }
    }

    #[test]
    fn first_try_is_unicast() {
        let name_tree = NameTree::new_handle();
        let mut fib = Fib::new(Rc::clone(&name_tree));
        fib.add_next_hop(&Name::from_string("/a"), FaceId(300), 1);
        fib.add_next_hop(&Name::from_string("/a"), FaceId(301), 2);

        let mut actions = RecordingActions {
            fib,
            sent: Vec::new(),
            nacked_no_route: false,
        };
        let mut strategy = AccessStrategy;
        strategy.after_receive_interest(&mut actions, FaceId(1), PitKey(1));
        assert_eq!(actions.sent, vec![FaceId(300)]);
    }

    #[test]
    fn nack_triggers_fallback_multicast() {
        use rust_udcn_common::ndn::{Interest, NackReason};

        let name_tree = NameTree::new_handle();
        let mut fib = Fib::new(Rc::clone(&name_tree));
        fib.add_next_hop(&Name::from_string("/a"), FaceId(300), 1);
        fib.add_next_hop(&Name::from_string("/a"), FaceId(301), 2);

        let mut actions = RecordingActions {
            fib,
            sent: Vec::new(),
            nacked_no_route: false,
        };
        let mut strategy = AccessStrategy;
        let nack = Nack::new(Interest::new(Name::from_string("/a")), NackReason::NoRoute);
        strategy.after_receive_nack(&mut actions, FaceId(300), &nack, PitKey(1));
        assert_eq!(actions.sent, vec![FaceId(301)]);
        assert!(!actions.nacked_no_route);
    }
}

//! Multicast strategy: forward to every FIB next hop other than the
//! incoming face (spec.md §4.5 built-ins).

use super::{Strategy, StrategyActions};
use rust_udcn_common::ndn::{Nack, NackReason};
use rust_udcn_common::types::FaceId;

pub struct MulticastStrategy;

impl Default for MulticastStrategy {
    fn default() -> Self {
        Self
    }
}

impl Strategy for MulticastStrategy {
    fn name(&self) -> &str {
        "multicast"
    }

    fn after_receive_interest(
        &mut self,
        actions: &mut dyn StrategyActions,
        in_face: FaceId,
        pit_entry: crate::pit::PitKey,
    ) {
        let fib_entry = actions.lookup_fib(pit_entry);
        let mut sent = false;
        for hop in &fib_entry.next_hops {
            if hop.face != in_face {
                actions.send_interest(pit_entry, hop.face, false);
                sent = true;
            }
        }
        if !sent {
            actions.reject_pending_interest(pit_entry);
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
        }
        // Other Nacks are ignored: other branches of the multicast tree may
        // still satisfy the Interest.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fib::Fib;
    use crate::name_tree::NameTree;
    use crate::pit::PitKey;
    use rust_udcn_common::ndn::{Data, Name};
    use std::rc::Rc;

    struct RecordingActions {
        fib: Fib,
        sent: Vec<FaceId>,
        rejected: bool,
    }

    impl StrategyActions for RecordingActions {
        fn send_interest(&mut self, _pit_entry: PitKey, out_face: FaceId, _want_new_nonce: bool) {
            self.sent.push(out_face);
        }
        fn send_data(&mut self, _pit_entry: PitKey, _data: &Data, _out_face: FaceId) {}
        fn send_nack(&mut self, _pit_entry: PitKey, _out_face: FaceId, _reason: NackReason) {}
        fn send_nacks(&mut self, _pit_entry: PitKey, _reason: NackReason, _except: &[FaceId]) {}
        fn reject_pending_interest(&mut self, _pit_entry: PitKey) {
            self.rejected = true;
        }
        fn lookup_fib(&self, _pit_entry: PitKey) -> crate::fib::FibEntry {
            self.fib.find_longest_prefix_match(&Name::from_string("/a"))
        }
    }

    #[test]
    fn fans_out_to_every_hop_but_incoming_face() {
        let name_tree = NameTree::new_handle();
        let mut fib = Fib::new(Rc::clone(&name_tree));
        fib.add_next_hop(&Name::from_string("/a"), FaceId(300), 1);
        fib.add_next_hop(&Name::from_string("/a"), FaceId(301), 1);
        fib.add_next_hop(&Name::from_string("/a"), FaceId(302), 1);

        let mut actions = RecordingActions {
            fib,
            sent: Vec::new(),
            rejected: false,
        };
        let mut strategy = MulticastStrategy;
        strategy.after_receive_interest(&mut actions, FaceId(301), PitKey(1));

        assert_eq!(actions.sent, vec![FaceId(300), FaceId(302)]);
        assert!(!actions.rejected);
    }
}

//! Adapts the Forwarder's `Fib` to `rust_udcn_rib::FibCommandSink`, closing
//! the loop described in `rust-udcn-rib`'s own doc comment: the daemon is
//! the concrete sink the `FibUpdater` issues `fib/add-nexthop` and
//! `fib/remove-nexthop` through.

use rust_udcn_common::ndn::Name;
use rust_udcn_common::types::FaceId;
use rust_udcn_core::ForwarderHandle;
use rust_udcn_rib::{FibCommandSink, FibUpdateError};

pub struct ForwarderFibSink {
    forwarder: ForwarderHandle,
}

impl ForwarderFibSink {
    pub fn new(forwarder: ForwarderHandle) -> Self {
        Self { forwarder }
    }
}

impl FibCommandSink for ForwarderFibSink {
    fn add_next_hop(&mut self, name: &Name, face: FaceId, cost: u64) -> Result<(), FibUpdateError> {
        self.forwarder.borrow_mut().fib_mut().add_next_hop(name, face, cost);
        Ok(())
    }

    fn remove_next_hop(&mut self, name: &Name, face: FaceId) -> Result<(), FibUpdateError> {
        self.forwarder.borrow_mut().fib_mut().remove_next_hop(name, face);
        Ok(())
    }
}

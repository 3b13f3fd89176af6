//! Routing Information Base: route storage with origin/inheritance/capture
//! semantics, the FIB updater that computes minimal next-hop diffs from RIB
//! changes, and the management command surface that drives both
//! (spec.md §4.10, §6.2).

pub mod fib_updater;
pub mod management;
pub mod rib;
pub mod rib_entry;
pub mod rib_update;
pub mod route;

pub use fib_updater::{FibCommandSink, FibUpdateError, FibUpdater};
pub use rib::{Rib, RibEvent};
pub use rib_update::{RibUpdate, RibUpdateAction, RibUpdateBatch};
pub use route::{Route, RouteFlags, RouteOrigin};

//! Common types and utilities for the micro Data-Centric Networking (μDCN) implementation.
//!
//! This crate provides the wire-level packet types (`Name`, `Interest`,
//! `Data`, `Nack`), the TLV codec, shared error type, and metrics primitives
//! used by every other `rust-udcn-*` crate.

pub mod ndn;
pub mod tlv;
pub mod metrics;
pub mod types;
pub mod error;

/// Reexport of common types
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

//! NDN packet encoding/decoding for QUIC transport.
//!
//! This module provides utilities for encoding and decoding NDN packets
//! for transmission over QUIC. The wire format itself (TLV) is out of
//! scope for this workspace (spec.md §1 "consumed as an external
//! library"); packets are framed with `bincode` over the `Name`/
//! `Interest`/`Data`/`Nack` `serde` types instead.

use anyhow::{anyhow, Result};
use bytes::{Bytes, BytesMut};
use rust_udcn_common::ndn::{Data, Interest, Nack};

/// Packet types, kept as a one-byte discriminant ahead of the bincode
/// payload so a receiver can dispatch without speculatively decoding.
const PACKET_TYPE_INTEREST: u8 = 0x05;
const PACKET_TYPE_DATA: u8 = 0x06;
const PACKET_TYPE_NACK: u8 = 0x03;

/// An NDN packet that can be sent over QUIC.
#[derive(Debug, Clone)]
pub enum NdnPacket {
    Interest(Interest),
    Data(Data),
    Nack(Nack),
}

impl NdnPacket {
    /// Create a new packet from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(anyhow!("empty packet"));
        }
        let payload = &bytes[1..];
        match bytes[0] {
            PACKET_TYPE_INTEREST => Ok(NdnPacket::Interest(bincode::deserialize(payload)?)),
            PACKET_TYPE_DATA => Ok(NdnPacket::Data(bincode::deserialize(payload)?)),
            PACKET_TYPE_NACK => Ok(NdnPacket::Nack(bincode::deserialize(payload)?)),
            other => Err(anyhow!("unknown packet type: {}", other)),
        }
    }

    /// Convert the packet to bytes for transmission.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        match self {
            NdnPacket::Interest(interest) => {
                buffer.extend_from_slice(&[PACKET_TYPE_INTEREST]);
                buffer.extend_from_slice(&bincode::serialize(interest)?);
            }
            NdnPacket::Data(data) => {
                buffer.extend_from_slice(&[PACKET_TYPE_DATA]);
                buffer.extend_from_slice(&bincode::serialize(data)?);
            }
            NdnPacket::Nack(nack) => {
                buffer.extend_from_slice(&[PACKET_TYPE_NACK]);
                buffer.extend_from_slice(&bincode::serialize(nack)?);
            }
        }
        Ok(buffer.freeze())
    }

    /// Get the name carried by the packet (a Nack's name is its Interest's).
    pub fn name(&self) -> String {
        match self {
            NdnPacket::Interest(interest) => interest.name.to_string(),
            NdnPacket::Data(data) => data.name.to_string(),
            NdnPacket::Nack(nack) => nack.interest.name.to_string(),
        }
    }

    pub fn packet_type(&self) -> &'static str {
        match self {
            NdnPacket::Interest(_) => "Interest",
            NdnPacket::Data(_) => "Data",
            NdnPacket::Nack(_) => "Nack",
        }
    }

    pub fn size(&self) -> Result<usize> {
        Ok(self.to_bytes()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes as BytesT;
    use rust_udcn_common::ndn::Name;

    #[test]
    fn interest_round_trips() {
        let interest = Interest::new(Name::from_string("/a/b")).with_nonce(42);
        let packet = NdnPacket::Interest(interest);
        let bytes = packet.to_bytes().unwrap();
        let decoded = NdnPacket::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.name(), "/a/b");
        assert_eq!(decoded.packet_type(), "Interest");
    }

    #[test]
    fn data_round_trips() {
        let data = Data::new(Name::from_string("/a/b"), BytesT::from_static(b"hello"));
        let packet = NdnPacket::Data(data);
        let bytes = packet.to_bytes().unwrap();
        let decoded = NdnPacket::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.name(), "/a/b");
        assert_eq!(decoded.packet_type(), "Data");
    }

    #[test]
    fn empty_packet_is_rejected() {
        assert!(NdnPacket::from_bytes(&[]).is_err());
    }
}

//! Ethernet frame view.
//!
//! A [`Frame`] borrows the caller's bytes for the duration of one forwarding
//! decision. Destination address sits at offset 0, source at offset 6, and
//! the EtherType (when present) at offset 12.

use std::fmt;
use vsw_types::MacAddress;

use crate::error::{Result, SwitchError};

/// Offset of the destination address.
pub const DEST_OFFSET: usize = 0;
/// Offset of the source address.
pub const SRC_OFFSET: usize = 6;
/// Offset of the EtherType field.
pub const ETHERTYPE_OFFSET: usize = 12;
/// Bytes needed to carry both address fields.
pub const MIN_ADDRESSED_LEN: usize = 12;

/// Borrowed view over frame bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Returns the frame bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Total frame length.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Extracts both addresses, rejecting frames too short to carry them.
    pub fn addresses(&self) -> Result<(MacAddress, MacAddress)> {
        match (self.source(), self.destination()) {
            (Some(src), Some(dst)) => Ok((src, dst)),
            _ => Err(SwitchError::MalformedFrame { len: self.len() }),
        }
    }

    pub fn destination(&self) -> Option<MacAddress> {
        self.bytes
            .get(DEST_OFFSET..)
            .and_then(MacAddress::from_slice)
    }

    pub fn source(&self) -> Option<MacAddress> {
        self.bytes.get(SRC_OFFSET..).and_then(MacAddress::from_slice)
    }

    /// EtherType / length field, when the frame is long enough.
    pub fn ether_type(&self) -> Option<u16> {
        let raw = self.bytes.get(ETHERTYPE_OFFSET..ETHERTYPE_OFFSET + 2)?;
        Some(u16::from_be_bytes([raw[0], raw[1]]))
    }

    /// One-line summary: `dst=.. src=.. type=0x.... len=..`.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.destination(), self.source()) {
            (Some(dst), Some(src)) => write!(f, "dst={} src={}", dst, src)?,
            _ => write!(f, "truncated")?,
        }
        if let Some(ether_type) = self.ether_type() {
            write!(f, " type={:#06x}", ether_type)?;
        }
        write!(f, " len={}", self.len())
    }
}

impl fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("destination", &self.destination())
            .field("source", &self.source())
            .field("ether_type", &self.ether_type())
            .field("len", &self.len())
            .finish()
    }
}

/// Builds frame bytes from addresses, EtherType and payload.
pub fn build_frame(dst: MacAddress, src: MacAddress, ether_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(14 + payload.len());
    bytes.extend_from_slice(dst.as_bytes());
    bytes.extend_from_slice(src.as_bytes());
    bytes.extend_from_slice(&ether_type.to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

//! Test fixtures for common switch traffic
//!
//! Provides reusable addresses and frame builders

use vsw_switch::{build_frame, DriverConfig, Transaction};
use vsw_types::MacAddress;

/// Locally administered unicast address ending in `last`
pub fn mac(last: u8) -> MacAddress {
    MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, last])
}

/// Describes a frame to inject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    /// Source address (learned by the switch)
    pub src: MacAddress,
    /// Destination address (looked up by the switch)
    pub dst: MacAddress,
    /// EtherType field
    pub ether_type: u16,
    /// Payload bytes after the header
    pub payload: Vec<u8>,
}

impl FrameSpec {
    /// IPv4 frame with a minimum-size zero payload
    pub fn new(src: MacAddress, dst: MacAddress) -> Self {
        Self {
            src,
            dst,
            ether_type: 0x0800,
            payload: vec![0; 46],
        }
    }

    /// Set the EtherType
    pub fn with_ether_type(mut self, ether_type: u16) -> Self {
        self.ether_type = ether_type;
        self
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Encoded frame bytes
    pub fn bytes(&self) -> Vec<u8> {
        build_frame(self.dst, self.src, self.ether_type, &self.payload)
    }

    /// Data transaction carrying this frame
    pub fn transaction(&self) -> Transaction {
        Transaction::data(self.bytes())
    }
}

/// Data transaction for a frame from `src` to `dst`
pub fn frame(src: MacAddress, dst: MacAddress) -> Transaction {
    FrameSpec::new(src, dst).transaction()
}

/// Configuration-only transaction for a downstream driver
pub fn driver_config() -> Transaction {
    Transaction::driver_config(
        DriverConfig::new()
            .with_setting("link_speed", "1000")
            .with_setting("duplex", "full"),
    )
}

/// Address fixtures with known fingerprint properties
pub mod mac_fixtures {
    use super::*;

    /// Station addresses used by the walkthrough scenarios
    pub fn station(n: u8) -> MacAddress {
        mac(n)
    }

    /// Two distinct addresses with the same fingerprint.
    ///
    /// The fold adds the last two bytes, so `..:00:01` and `..:01:00` collide.
    pub fn colliding_pair() -> (MacAddress, MacAddress) {
        (
            MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]),
            MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x01, 0x00]),
        )
    }

    /// Multicast destination, never learned as a source in practice
    pub fn multicast() -> MacAddress {
        MacAddress::new([0x01, 0x00, 0x5e, 0x00, 0x00, 0x01])
    }
}

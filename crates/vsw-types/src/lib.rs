//! Common types for the virtual Ethernet switch.
//!
//! This crate provides type-safe representations of the primitives shared by
//! the switch core, its test infrastructure and the `vswd` binary:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`MacFingerprint`]: the reduced 32-bit learning-table key of an address
//! - [`PortIndex`]: zero-based switch port identity with derived symbolic names

mod mac;
mod port;

pub use mac::{MacAddress, MacFingerprint};
pub use port::{PortDirection, PortIndex};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid port index: {0}")]
    InvalidPortIndex(String),
}

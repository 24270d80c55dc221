//! Error types for switch operations.
//!
//! All errors implement `std::error::Error` via `thiserror`.

use std::io;
use thiserror::Error;
use vsw_types::{MacAddress, MacFingerprint, ParseError, PortIndex};

use crate::transport::ResponseStatus;

/// Result type alias for switch operations.
pub type Result<T> = std::result::Result<T, SwitchError>;

/// Errors that can occur while configuring or driving the switch.
#[derive(Debug, Error)]
pub enum SwitchError {
    /// A learned address showed up as a source on a different port.
    ///
    /// Either two stations share a fingerprint or the same address is
    /// duplicated on the simulated network.
    #[error(
        "Routing inconsistency: fingerprint {fingerprint}{} learned on port {learned_port}, seen again on port {arrival_port}",
        address_suffix(.address)
    )]
    RoutingInconsistency {
        /// The conflicting table key.
        fingerprint: MacFingerprint,
        /// Port the fingerprint is bound to.
        learned_port: PortIndex,
        /// Port the conflicting frame arrived on.
        arrival_port: PortIndex,
        /// Source address of the conflicting frame, when known.
        address: Option<MacAddress>,
    },

    /// A destination port reported a non-OK transfer status.
    #[error("Downstream failure on port {port}: {status}")]
    DownstreamFailure {
        /// The port whose transfer failed.
        port: PortIndex,
        /// The status it reported.
        status: ResponseStatus,
    },

    /// Port index outside `0..num_ports`.
    #[error("Invalid port {port}: switch has {num_ports} ports")]
    InvalidPort {
        /// The requested index.
        port: usize,
        /// Number of ports on the switch.
        num_ports: usize,
    },

    /// A transmit port was never bound to a downstream node.
    #[error("Port {0} has no downstream node bound")]
    UnboundPort(PortIndex),

    /// Frame too short to carry both address fields.
    #[error("Malformed frame: {len} bytes, need at least 12")]
    MalformedFrame {
        /// Length of the rejected frame.
        len: usize,
    },

    /// Configuration validation or parse error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Address or port parse error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SwitchError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an invalid port error.
    pub fn invalid_port(port: usize, num_ports: usize) -> Self {
        Self::InvalidPort { port, num_ports }
    }

    /// Attaches the offending source address to a routing inconsistency.
    ///
    /// Other variants are returned unchanged.
    pub fn with_address(self, mac: MacAddress) -> Self {
        match self {
            Self::RoutingInconsistency {
                fingerprint,
                learned_port,
                arrival_port,
                ..
            } => Self::RoutingInconsistency {
                fingerprint,
                learned_port,
                arrival_port,
                address: Some(mac),
            },
            other => other,
        }
    }

    /// Returns true if this error should end the test run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SwitchError::RoutingInconsistency { .. }
                | SwitchError::Configuration(_)
                | SwitchError::UnboundPort(_)
        )
    }
}

fn address_suffix(address: &Option<MacAddress>) -> String {
    match address {
        Some(mac) => format!(" (address {mac})"),
        None => String::new(),
    }
}

/// Failure while writing to a monitoring tap.
///
/// Never propagated as a delivery failure.
#[derive(Debug, Clone, Error)]
pub enum MonitorError {
    #[error("Monitor tap rejected record: {0}")]
    Rejected(String),

    #[error("Monitor tap unavailable")]
    Unavailable,
}

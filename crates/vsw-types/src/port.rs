//! Switch port identity.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Zero-based index of a switch port.
///
/// Indices are assigned at construction and stay fixed for the lifetime of
/// the switch. Each index names a receive/transmit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortIndex(usize);

impl PortIndex {
    /// Creates a port index.
    pub const fn new(index: usize) -> Self {
        PortIndex(index)
    }

    /// Returns the raw index.
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Symbolic name of the receive side, e.g. `rxPort3`.
    pub fn rx_name(&self) -> String {
        PortDirection::Rx.port_name(*self)
    }

    /// Symbolic name of the transmit side, e.g. `txPort3`.
    pub fn tx_name(&self) -> String {
        PortDirection::Tx.port_name(*self)
    }
}

impl fmt::Display for PortIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for PortIndex {
    fn from(index: usize) -> Self {
        PortIndex(index)
    }
}

impl From<PortIndex> for usize {
    fn from(port: PortIndex) -> usize {
        port.0
    }
}

impl FromStr for PortIndex {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("rxPort")
            .or_else(|| s.strip_prefix("txPort"))
            .unwrap_or(s);
        digits
            .parse::<usize>()
            .map(PortIndex)
            .map_err(|_| ParseError::InvalidPortIndex(s.to_string()))
    }
}

/// Side of a port a frame is observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// Frame entering the switch.
    Rx,
    /// Frame leaving the switch.
    Tx,
}

impl PortDirection {
    /// Returns the symbolic prefix (`rxPort` or `txPort`).
    pub const fn prefix(&self) -> &'static str {
        match self {
            PortDirection::Rx => "rxPort",
            PortDirection::Tx => "txPort",
        }
    }

    /// Derives the symbolic name of `port` on this side.
    pub fn port_name(&self, port: PortIndex) -> String {
        format!("{}{}", self.prefix(), port.get())
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Rx => write!(f, "rx"),
            PortDirection::Tx => write!(f, "tx"),
        }
    }
}

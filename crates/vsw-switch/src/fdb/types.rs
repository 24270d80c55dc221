//! FDB (Forwarding Database) types.

use vsw_types::{MacAddress, PortIndex};

/// Result of a successful learn call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnOutcome {
    /// A new entry was inserted.
    Learned,
    /// The entry already existed on the same port; nothing changed.
    AlreadyKnown,
}

/// A learned binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdbEntry {
    /// Port the fingerprint is bound to.
    pub port: PortIndex,
    /// First source address that produced this fingerprint.
    ///
    /// Other addresses folding to the same fingerprint share the entry.
    pub address: Option<MacAddress>,
}

impl FdbEntry {
    pub fn new(port: PortIndex) -> Self {
        Self {
            port,
            address: None,
        }
    }

    pub fn with_address(mut self, address: MacAddress) -> Self {
        self.address = Some(address);
        self
    }
}

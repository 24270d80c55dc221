//! MAC learning table.

use std::collections::HashMap;
use tracing::{error, info};
use vsw_types::{MacAddress, MacFingerprint, PortIndex};

use super::types::{FdbEntry, LearnOutcome};
use crate::error::{Result, SwitchError};

/// Mapping from address fingerprint to the port it was learned on.
///
/// No locking of its own; callers serialize mutation.
#[derive(Debug, Clone, Default)]
pub struct MacLearningTable {
    entries: HashMap<MacFingerprint, FdbEntry>,
}

impl MacLearningTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the port bound to `fingerprint`, if any.
    pub fn lookup(&self, fingerprint: MacFingerprint) -> Option<PortIndex> {
        self.entries.get(&fingerprint).map(|entry| entry.port)
    }

    /// Returns the port an address resolves to, if its fingerprint is known.
    pub fn port_of(&self, mac: &MacAddress) -> Option<PortIndex> {
        self.lookup(mac.fingerprint())
    }

    /// Binds `fingerprint` to `port`.
    ///
    /// Re-learning the same binding is a no-op. A binding to a different
    /// port fails with [`SwitchError::RoutingInconsistency`] and leaves the
    /// table untouched.
    pub fn learn(&mut self, fingerprint: MacFingerprint, port: PortIndex) -> Result<LearnOutcome> {
        self.bind(fingerprint, FdbEntry::new(port))
    }

    /// Like [`learn`](Self::learn), keyed by the fingerprint of `mac`.
    ///
    /// The address is recorded on new entries and reported on conflicts.
    pub fn learn_address(&mut self, mac: MacAddress, port: PortIndex) -> Result<LearnOutcome> {
        self.bind(mac.fingerprint(), FdbEntry::new(port).with_address(mac))
            .map_err(|e| e.with_address(mac))
    }

    fn bind(&mut self, fingerprint: MacFingerprint, entry: FdbEntry) -> Result<LearnOutcome> {
        match self.entries.get(&fingerprint) {
            Some(existing) if existing.port == entry.port => Ok(LearnOutcome::AlreadyKnown),
            Some(existing) => {
                error!(
                    "fingerprint {} bound to port {} presented on port {}",
                    fingerprint, existing.port, entry.port
                );
                Err(SwitchError::RoutingInconsistency {
                    fingerprint,
                    learned_port: existing.port,
                    arrival_port: entry.port,
                    address: None,
                })
            }
            None => {
                info!(
                    "learned fingerprint {} on port {}{}",
                    fingerprint,
                    entry.port,
                    entry
                        .address
                        .map(|a| format!(" ({})", a))
                        .unwrap_or_default()
                );
                self.entries.insert(fingerprint, entry);
                Ok(LearnOutcome::Learned)
            }
        }
    }

    pub fn get(&self, fingerprint: MacFingerprint) -> Option<&FdbEntry> {
        self.entries.get(&fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&MacFingerprint, &FdbEntry)> {
        self.entries.iter()
    }

    /// Entries in fingerprint order.
    pub fn entries(&self) -> Vec<(MacFingerprint, FdbEntry)> {
        let mut out: Vec<_> = self
            .entries
            .iter()
            .map(|(fp, entry)| (*fp, entry.clone()))
            .collect();
        out.sort_by_key(|(fp, _)| *fp);
        out
    }
}

//! Learning-bridge forwarding decision.
//!
//! For every frame the engine learns the source address against the
//! arrival port, then resolves the destination:
//!
//! 1. learn `fingerprint(src) -> arrival`
//! 2. look up `fingerprint(dst)`
//! 3. known: [`RoutingDecision::Unicast`] to that port
//! 4. unknown: [`RoutingDecision::Flood`] to every port except the arrival port
//!
//! There is no loop detection. The switch assumes a tree topology without
//! redundant links.

use parking_lot::Mutex;
use tracing::debug;
use vsw_types::{MacAddress, PortIndex};

use crate::error::Result;
use crate::fdb::{LearnOutcome, MacLearningTable};
use crate::frame::Frame;

/// Where a frame goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Destination learned: exactly one egress port.
    Unicast(PortIndex),
    /// Destination unknown: these ports, ascending, arrival port excluded.
    Flood(Vec<PortIndex>),
}

impl RoutingDecision {
    /// Egress ports in send order.
    pub fn egress_ports(&self) -> &[PortIndex] {
        match self {
            RoutingDecision::Unicast(port) => std::slice::from_ref(port),
            RoutingDecision::Flood(ports) => ports,
        }
    }

    pub fn is_flood(&self) -> bool {
        matches!(self, RoutingDecision::Flood(_))
    }
}

/// Forwarding engine owning the learning table.
///
/// The table lock is held only for the learn/lookup pair of one frame, never
/// across a downstream call.
#[derive(Debug)]
pub struct ForwardingEngine {
    num_ports: usize,
    table: Mutex<MacLearningTable>,
}

impl ForwardingEngine {
    pub fn new(num_ports: usize) -> Self {
        Self {
            num_ports,
            table: Mutex::new(MacLearningTable::new()),
        }
    }

    pub fn num_ports(&self) -> usize {
        self.num_ports
    }

    /// Decides the egress port(s) for `frame` arriving on `arrival`.
    ///
    /// Fails with `MalformedFrame` for frames without both address fields and
    /// with `RoutingInconsistency` when the source is bound to another port.
    /// In both cases nothing is forwarded and the table is unchanged.
    pub fn route(&self, frame: &Frame<'_>, arrival: PortIndex) -> Result<RoutedFrame> {
        let (src, dst) = frame.addresses()?;

        let (learned, found) = {
            let mut table = self.table.lock();
            let learned = table.learn_address(src, arrival)?;
            (learned, table.lookup(dst.fingerprint()))
        };

        let decision = match found {
            Some(port) => RoutingDecision::Unicast(port),
            None => RoutingDecision::Flood(self.flood_set(arrival)),
        };
        debug!("{} on port {} -> {:?}", frame, arrival, decision);

        Ok(RoutedFrame {
            source: src,
            destination: dst,
            learned: learned == LearnOutcome::Learned,
            decision,
        })
    }

    /// All ports except `arrival`, ascending.
    pub fn flood_set(&self, arrival: PortIndex) -> Vec<PortIndex> {
        (0..self.num_ports)
            .map(PortIndex::new)
            .filter(|port| *port != arrival)
            .collect()
    }

    /// Current binding of `mac`, if learned.
    pub fn port_of(&self, mac: &MacAddress) -> Option<PortIndex> {
        self.table.lock().port_of(mac)
    }

    /// Copy of the table for inspection.
    pub fn table_snapshot(&self) -> MacLearningTable {
        self.table.lock().clone()
    }
}

/// A routing decision together with what was learned on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedFrame {
    pub source: MacAddress,
    pub destination: MacAddress,
    /// True if the source address created a new table entry.
    pub learned: bool,
    pub decision: RoutingDecision,
}

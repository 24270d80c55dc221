//! State shared by both delivery disciplines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use vsw_types::{PortDirection, PortIndex};

use crate::clock::TimeSource;
use crate::error::{Result, SwitchError};
use crate::forwarding::{ForwardingEngine, RoutedFrame};
use crate::frame::Frame;
use crate::monitor::{self, MonitorRecord, TransportKind};
use crate::port::PortSet;
use crate::stats::SwitchCounters;
use crate::transport::Transaction;

/// Ports, forwarding engine, time source and counters of one switch.
pub struct Fabric {
    pub(crate) ports: PortSet,
    pub(crate) engine: ForwardingEngine,
    pub(crate) clock: Arc<dyn TimeSource>,
    pub(crate) counters: SwitchCounters,
    monitoring: AtomicBool,
}

impl Fabric {
    pub(crate) fn new(ports: PortSet, clock: Arc<dyn TimeSource>, monitoring: bool) -> Self {
        Self {
            engine: ForwardingEngine::new(ports.len()),
            ports,
            clock,
            counters: SwitchCounters::default(),
            monitoring: AtomicBool::new(monitoring),
        }
    }

    pub(crate) fn monitoring_enabled(&self) -> bool {
        self.monitoring.load(Ordering::Relaxed)
    }

    pub(crate) fn set_monitoring(&self, enabled: bool) {
        self.monitoring.store(enabled, Ordering::Relaxed);
    }

    /// Emits a monitor record for `trans` on one side of `port`.
    ///
    /// No-op when monitoring is off or the side has no tap; the clock is
    /// not read in that case.
    pub(crate) fn observe(
        &self,
        direction: PortDirection,
        port: PortIndex,
        kind: TransportKind,
        trans: &Transaction,
    ) {
        if !self.monitoring_enabled() {
            return;
        }
        let Some(tap) = self.ports.tap(port, direction) else {
            return;
        };
        let bytes = trans.data_bytes().unwrap_or_default();
        let record = MonitorRecord::new(direction, port, kind, self.clock.now_ns(), bytes);
        if !monitor::emit(tap.as_ref(), &record) {
            self.counters.monitor_failure();
        }
    }

    /// Learns the source and resolves the destination of a data transaction.
    pub(crate) fn route(&self, trans: &Transaction, arrival: PortIndex) -> Result<RoutedFrame> {
        let bytes = trans
            .data_bytes()
            .ok_or(SwitchError::MalformedFrame { len: 0 })?;
        let routed = self.engine.route(&Frame::new(bytes), arrival);
        match &routed {
            Ok(r) => self.counters.routed(&r.decision, r.learned),
            Err(_) => self.counters.routing_error(),
        }
        routed
    }
}

impl std::fmt::Debug for Fabric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fabric")
            .field("ports", &self.ports)
            .field("monitoring", &self.monitoring_enabled())
            .finish()
    }
}

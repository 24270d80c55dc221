//! The virtual Ethernet learning switch.
//!
//! [`EthSoftSwitch`] ties the port set, the forwarding engine and the two
//! delivery disciplines together. Frames enter through a port index (either
//! directly or via an [`RxPort`] handle) and leave through the transmit side
//! of the chosen port(s).
//!
//! # Example
//!
//! ```ignore
//! let switch = EthSoftSwitch::builder(3)
//!     .bind(0, node_a)?
//!     .bind(1, node_b)?
//!     .bind(2, node_c)?
//!     .build()?;
//!
//! let mut trans = Transaction::data(frame_bytes);
//! switch.blocking_transfer(0, &mut trans, &mut Duration::ZERO).await?;
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{error, info, warn};
use vsw_types::{MacAddress, PortDirection, PortIndex};

use crate::arbiter::TransportArbiter;
use crate::clock::{ManualClock, TickClock, TimeSource};
use crate::config::SwitchConfig;
use crate::error::{Result, SwitchError};
use crate::fabric::Fabric;
use crate::fdb::MacLearningTable;
use crate::monitor::MonitorTap;
use crate::phase::AsyncPhaseController;
use crate::port::{PortSet, PortSetBuilder, TransmitPort};
use crate::stats::SwitchStats;
use crate::transport::{Phase, ResponseStatus, SyncResult, Transaction};

/// Builder for [`EthSoftSwitch`].
pub struct SwitchBuilder {
    name: String,
    monitoring: bool,
    clock: Arc<dyn TimeSource>,
    ports: PortSetBuilder,
}

impl SwitchBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn monitoring(mut self, enabled: bool) -> Self {
        self.monitoring = enabled;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Binds the transmit side of `port` to a downstream target.
    pub fn bind(mut self, port: usize, target: Arc<dyn TransmitPort>) -> Result<Self> {
        self.ports.bind(port, target)?;
        Ok(self)
    }

    /// Attaches a monitoring tap to one side of `port`.
    pub fn tap(
        mut self,
        port: usize,
        direction: PortDirection,
        tap: Arc<dyn MonitorTap>,
    ) -> Result<Self> {
        self.ports.tap(port, direction, tap)?;
        Ok(self)
    }

    /// Attaches `tap` to both sides of every port.
    pub fn tap_all(mut self, tap: Arc<dyn MonitorTap>) -> Self {
        self.ports.tap_all(tap);
        self
    }

    pub fn build(self) -> Result<EthSoftSwitch> {
        let ports = self.ports.build()?;
        if ports.is_empty() {
            return Err(SwitchError::configuration("switch needs at least one port"));
        }
        info!(
            "switch {} up with {} ports, monitoring {}",
            self.name,
            ports.len(),
            if self.monitoring { "on" } else { "off" }
        );
        Ok(EthSoftSwitch {
            name: self.name,
            fabric: Fabric::new(ports, self.clock, self.monitoring),
            arbiter: TransportArbiter::new(),
            phases: AsyncPhaseController::new(),
        })
    }
}

/// Virtual Ethernet learning switch with N bidirectional ports.
#[derive(Debug)]
pub struct EthSoftSwitch {
    name: String,
    fabric: Fabric,
    arbiter: TransportArbiter,
    phases: AsyncPhaseController,
}

impl EthSoftSwitch {
    /// Starts building a switch with `num_ports` ports.
    pub fn builder(num_ports: usize) -> SwitchBuilder {
        SwitchBuilder {
            name: "ethsw".to_string(),
            monitoring: false,
            clock: Arc::new(ManualClock::default()),
            ports: PortSet::builder(num_ports),
        }
    }

    /// Starts a builder from configuration; the clock ticks at the
    /// configured precision.
    ///
    /// Returns the clock alongside so the harness can advance it.
    pub fn from_config(config: &SwitchConfig) -> Result<(SwitchBuilder, Arc<TickClock>)> {
        config.validate()?;
        let clock = Arc::new(TickClock::new(config.precision()?));
        let builder = Self::builder(config.switch.num_ports)
            .name(config.switch.name.clone())
            .monitoring(config.switch.monitoring_enabled)
            .clock(clock.clone());
        Ok((builder, clock))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_ports(&self) -> usize {
        self.fabric.ports.len()
    }

    /// Blocking transfer of `trans` into receive port `port`.
    ///
    /// A non-OK downstream status surfaces as
    /// [`SwitchError::DownstreamFailure`]; the status also stays on the
    /// transaction.
    pub async fn blocking_transfer(
        &self,
        port: usize,
        trans: &mut Transaction,
        delay: &mut Duration,
    ) -> Result<()> {
        let arrival = self.fabric.ports.index(port)?;
        self.arbiter
            .deliver_blocking(&self.fabric, arrival, trans, delay)
            .await
    }

    /// Non-blocking transfer of `trans` into receive port `port`.
    ///
    /// The outgoing phase is always begin-request.
    pub fn non_blocking_transfer(
        &self,
        port: usize,
        trans: &mut Transaction,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> Result<SyncResult> {
        let arrival = self.fabric.ports.index(port)?;
        self.phases
            .deliver_non_blocking(&self.fabric, arrival, trans, phase, delay)
    }

    /// Handle for driving receive port `port` as a [`TransmitPort`].
    pub fn rx_port(self: &Arc<Self>, port: usize) -> Result<RxPort> {
        let index = self.fabric.ports.index(port)?;
        Ok(RxPort {
            switch: Arc::clone(self),
            index,
        })
    }

    /// Handles for every receive port, ascending.
    pub fn rx_ports(self: &Arc<Self>) -> Vec<RxPort> {
        self.fabric
            .ports
            .indices()
            .map(|index| RxPort {
                switch: Arc::clone(self),
                index,
            })
            .collect()
    }

    pub fn set_monitoring(&self, enabled: bool) {
        self.fabric.set_monitoring(enabled);
    }

    pub fn is_monitoring_enabled(&self) -> bool {
        self.fabric.monitoring_enabled()
    }

    /// Port `mac` is currently bound to, if learned.
    pub fn port_of(&self, mac: &MacAddress) -> Option<PortIndex> {
        self.fabric.engine.port_of(mac)
    }

    /// Copy of the learning table.
    pub fn table(&self) -> MacLearningTable {
        self.fabric.engine.table_snapshot()
    }

    pub fn stats(&self) -> SwitchStats {
        self.fabric.counters.snapshot()
    }
}

/// One receive port of a shared switch.
///
/// Lets a node, a transactor, or another switch send into the switch through
/// the same trait the switch uses downstream. Switch errors are reported as
/// a failed response status and logged.
///
/// The handle owns its switch. Two switches bound to each other's `RxPort`
/// keep each other alive through their port sets and are never freed; bind
/// at least one direction of such a link with [`RxPort::downgrade`].
#[derive(Debug, Clone)]
pub struct RxPort {
    switch: Arc<EthSoftSwitch>,
    index: PortIndex,
}

impl RxPort {
    pub fn index(&self) -> PortIndex {
        self.index
    }

    pub fn name(&self) -> String {
        self.index.rx_name()
    }

    pub fn switch(&self) -> &Arc<EthSoftSwitch> {
        &self.switch
    }

    /// Non-owning handle to the same port.
    pub fn downgrade(&self) -> WeakRxPort {
        WeakRxPort {
            switch: Arc::downgrade(&self.switch),
            index: self.index,
        }
    }

    fn report(&self, trans: &mut Transaction, err: &SwitchError) {
        if !matches!(err, SwitchError::DownstreamFailure { .. }) {
            trans.set_response_status(ResponseStatus::GenericError);
        }
        error!("{} on {}: {}", self.switch.name(), self.name(), err);
    }
}

#[async_trait]
impl TransmitPort for RxPort {
    async fn blocking_transfer(&self, trans: &mut Transaction, delay: &mut Duration) {
        if let Err(e) = self
            .switch
            .blocking_transfer(self.index.get(), trans, delay)
            .await
        {
            self.report(trans, &e);
        }
    }

    fn non_blocking_transfer(
        &self,
        trans: &mut Transaction,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> SyncResult {
        match self
            .switch
            .non_blocking_transfer(self.index.get(), trans, phase, delay)
        {
            Ok(result) => result,
            Err(e) => {
                self.report(trans, &e);
                SyncResult::Completed
            }
        }
    }
}

/// [`RxPort`] that does not keep its switch alive.
///
/// Sends after the switch has been dropped fail with a generic-error status.
#[derive(Debug, Clone)]
pub struct WeakRxPort {
    switch: Weak<EthSoftSwitch>,
    index: PortIndex,
}

impl WeakRxPort {
    pub fn index(&self) -> PortIndex {
        self.index
    }

    pub fn upgrade(&self) -> Option<RxPort> {
        self.switch.upgrade().map(|switch| RxPort {
            switch,
            index: self.index,
        })
    }

    fn dropped(&self, trans: &mut Transaction) {
        trans.set_response_status(ResponseStatus::GenericError);
        warn!("{}: switch no longer exists", self.index.rx_name());
    }
}

#[async_trait]
impl TransmitPort for WeakRxPort {
    async fn blocking_transfer(&self, trans: &mut Transaction, delay: &mut Duration) {
        match self.upgrade() {
            Some(port) => port.blocking_transfer(trans, delay).await,
            None => self.dropped(trans),
        }
    }

    fn non_blocking_transfer(
        &self,
        trans: &mut Transaction,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> SyncResult {
        match self.upgrade() {
            Some(port) => port.non_blocking_transfer(trans, phase, delay),
            None => {
                self.dropped(trans);
                SyncResult::Completed
            }
        }
    }
}

//! Switch under test with scripted ports and monitoring doubles attached.

use std::sync::Arc;
use vsw_switch::{EthSoftSwitch, MonitorTap, Result, SwitchBuilder};

use crate::ports::{CallLog, ScriptedPort};
use crate::taps::{CaptureTap, CountingClock};

/// A switch whose every port is a [`ScriptedPort`] logging to one [`CallLog`].
pub struct TestSwitch {
    pub switch: Arc<EthSoftSwitch>,
    pub ports: Vec<Arc<ScriptedPort>>,
    pub log: CallLog,
    pub capture: Arc<CaptureTap>,
    pub clock: Arc<CountingClock>,
}

impl TestSwitch {
    /// `num_ports` OK/Completed ports, monitoring off, capture tap on every
    /// port side.
    pub fn new(num_ports: usize) -> Self {
        Self::with_ports(num_ports, |port| port)
    }

    /// Like [`new`](Self::new) with monitoring switched on.
    pub fn monitored(num_ports: usize) -> Self {
        let harness = Self::new(num_ports);
        harness.switch.set_monitoring(true);
        harness
    }

    /// Builds the switch, letting `script` customise each port first.
    pub fn with_ports(num_ports: usize, script: impl Fn(ScriptedPort) -> ScriptedPort) -> Self {
        Self::build(num_ports, script, |builder| Ok(builder))
            .unwrap_or_else(|e| panic!("failed to build test switch: {}", e))
    }

    /// Full control: `script` customises each port, `customise` the builder.
    pub fn build(
        num_ports: usize,
        script: impl Fn(ScriptedPort) -> ScriptedPort,
        customise: impl FnOnce(SwitchBuilder) -> Result<SwitchBuilder>,
    ) -> Result<Self> {
        let log = CallLog::new();
        let capture = Arc::new(CaptureTap::new());
        let clock = Arc::new(CountingClock::new(0));

        let ports: Vec<Arc<ScriptedPort>> = (0..num_ports)
            .map(|i| Arc::new(script(ScriptedPort::new(i, log.clone()))))
            .collect();

        let mut builder = EthSoftSwitch::builder(num_ports)
            .name("dut")
            .clock(clock.clone())
            .tap_all(capture.clone() as Arc<dyn MonitorTap>);
        for (i, port) in ports.iter().enumerate() {
            builder = builder.bind(i, port.clone())?;
        }
        let switch = Arc::new(customise(builder)?.build()?);

        Ok(Self {
            switch,
            ports,
            log,
            capture,
            clock,
        })
    }

    /// Port `i`'s scripted target.
    pub fn port(&self, i: usize) -> &ScriptedPort {
        &self.ports[i]
    }
}

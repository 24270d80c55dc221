//! Scenario replay.
//!
//! A scenario is a TOML list of frames injected into the switch in order:
//!
//! ```toml
//! [[frame]]
//! port = 0
//! src = "02:00:00:00:00:01"
//! dst = "02:00:00:00:00:02"
//! mode = "blocking"
//!
//! [[frame]]
//! port = 1
//! src = "02:00:00:00:00:02"
//! dst = "02:00:00:00:00:01"
//! mode = "non-blocking"
//! ethertype = 0x86dd
//! payload_len = 64
//! gap_ns = 250
//! ```
//!
//! When replayed against a [`TickClock`], the clock advances by each frame's
//! `gap_ns` before the frame is injected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use vsw_types::MacAddress;

use crate::error::{Result, SwitchError};
use crate::frame::build_frame;
use crate::clock::{TickClock, TimeSource};
use crate::switch::EthSoftSwitch;
use crate::transport::{DeliveryOutcome, DriverConfig, Phase, ResponseStatus, SyncResult, Transaction};

/// Delivery discipline of one scenario frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferMode {
    #[default]
    Blocking,
    NonBlocking,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferMode::Blocking => write!(f, "blocking"),
            TransferMode::NonBlocking => write!(f, "non-blocking"),
        }
    }
}

/// One `[[frame]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFrame {
    /// Receive port the frame enters on
    pub port: usize,
    pub src: MacAddress,
    pub dst: MacAddress,
    #[serde(default)]
    pub mode: TransferMode,
    #[serde(default = "default_ethertype")]
    pub ethertype: u16,
    #[serde(default = "default_payload_len")]
    pub payload_len: usize,
    /// Send a configuration-only payload instead of a frame
    #[serde(default)]
    pub driver_config: bool,
    /// Simulated time between the previous frame and this one
    #[serde(default = "default_gap_ns")]
    pub gap_ns: u64,
}

fn default_ethertype() -> u16 {
    0x0800
}

fn default_payload_len() -> usize {
    46
}

fn default_gap_ns() -> u64 {
    1_000
}

impl ScenarioFrame {
    /// Builds the transaction this entry injects.
    pub fn transaction(&self) -> Transaction {
        if self.driver_config {
            return Transaction::driver_config(
                DriverConfig::new().with_setting("source", self.src.to_string()),
            );
        }
        let payload = vec![0u8; self.payload_len];
        Transaction::data(build_frame(self.dst, self.src, self.ethertype, &payload))
    }
}

/// What happened to one replayed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayStep {
    pub index: usize,
    pub port: usize,
    pub mode: TransferMode,
    pub status: ResponseStatus,
    /// Sync result, for non-blocking steps that reached the switch core
    pub sync: Option<SyncResult>,
    /// Non-fatal error reported by the switch
    pub error: Option<String>,
}

impl ReplayStep {
    pub fn outcome(&self) -> DeliveryOutcome {
        DeliveryOutcome::from_sync(self.sync.unwrap_or(SyncResult::Completed), self.status)
    }
}

/// Ordered list of frames to replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, rename = "frame")]
    pub frames: Vec<ScenarioFrame>,
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SwitchError::configuration(format!("failed to parse scenario: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            SwitchError::configuration(format!(
                "failed to parse scenario file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Injects every frame in order.
    ///
    /// Downstream failures and invalid ports are recorded on the step and
    /// replay continues. A fatal error (see [`SwitchError::is_fatal`]) stops
    /// the replay and is returned.
    pub async fn replay(&self, switch: &EthSoftSwitch) -> Result<Vec<ReplayStep>> {
        self.replay_inner(switch, None).await
    }

    /// Like [`Scenario::replay`], advancing `clock` by each frame's gap
    /// first so monitoring banners carry distinct times.
    pub async fn replay_clocked(
        &self,
        switch: &EthSoftSwitch,
        clock: &TickClock,
    ) -> Result<Vec<ReplayStep>> {
        self.replay_inner(switch, Some(clock)).await
    }

    async fn replay_inner(
        &self,
        switch: &EthSoftSwitch,
        clock: Option<&TickClock>,
    ) -> Result<Vec<ReplayStep>> {
        let mut steps = Vec::with_capacity(self.frames.len());

        for (index, entry) in self.frames.iter().enumerate() {
            if let Some(clock) = clock {
                clock.advance_ticks(clock.precision().ns_to_ticks(entry.gap_ns));
                debug!("frame {} at {} ns", index, clock.now_ns());
            }
            let mut trans = entry.transaction();
            let mut delay = Duration::ZERO;

            let (sync, result) = match entry.mode {
                TransferMode::Blocking => (
                    None,
                    switch.blocking_transfer(entry.port, &mut trans, &mut delay).await,
                ),
                TransferMode::NonBlocking => {
                    let mut phase = Phase::BeginRequest;
                    match switch.non_blocking_transfer(entry.port, &mut trans, &mut phase, &mut delay) {
                        Ok(sync) => (Some(sync), Ok(())),
                        Err(e) => (None, Err(e)),
                    }
                }
            };

            let error = match result {
                Ok(()) => None,
                Err(e) if e.is_fatal() => {
                    error!("frame {} ({} on port {}) failed: {}", index, entry.mode, entry.port, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("frame {} ({} on port {}) failed: {}", index, entry.mode, entry.port, e);
                    Some(e.to_string())
                }
            };

            steps.push(ReplayStep {
                index,
                port: entry.port,
                mode: entry.mode,
                status: trans.response_status(),
                sync,
                error,
            });
        }

        info!("replayed {} frames", steps.len());
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::VirtualNode;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use vsw_types::PortIndex;

    const SCENARIO: &str = r#"
[[frame]]
port = 0
src = "02:00:00:00:00:01"
dst = "02:00:00:00:00:02"

[[frame]]
port = 1
src = "02:00:00:00:00:02"
dst = "02:00:00:00:00:01"
mode = "non-blocking"
ethertype = 0x86dd
payload_len = 64

[[frame]]
port = 2
src = "02:00:00:00:00:03"
dst = "02:00:00:00:00:01"
mode = "non-blocking"
driver_config = true
"#;

    fn switch(num_ports: usize) -> (EthSoftSwitch, Vec<Arc<VirtualNode>>) {
        let nodes: Vec<_> = (0..num_ports)
            .map(|i| Arc::new(VirtualNode::new(format!("node{}", i))))
            .collect();
        let mut builder = EthSoftSwitch::builder(num_ports);
        for (i, node) in nodes.iter().enumerate() {
            builder = builder.bind(i, node.clone()).unwrap();
        }
        (builder.build().unwrap(), nodes)
    }

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();
        assert_eq!(scenario.len(), 3);

        let first = &scenario.frames[0];
        assert_eq!(first.mode, TransferMode::Blocking);
        assert_eq!(first.ethertype, 0x0800);
        assert_eq!(first.payload_len, 46);
        assert_eq!(first.transaction().data_bytes().map(<[u8]>::len), Some(60));

        assert_eq!(scenario.frames[1].mode, TransferMode::NonBlocking);
        assert_eq!(scenario.frames[1].ethertype, 0x86dd);
        assert!(scenario.frames[2].transaction().is_driver_config());
    }

    #[test]
    fn test_parse_rejects_bad_mode() {
        let err = Scenario::from_toml(
            "[[frame]]\nport = 0\nsrc = \"02:00:00:00:00:01\"\ndst = \"02:00:00:00:00:02\"\nmode = \"sometimes\"\n",
        );
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_replay() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();
        let (switch, nodes) = switch(3);

        let steps = scenario.replay(&switch).await.unwrap();
        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|s| s.error.is_none()));
        assert_eq!(steps[1].sync, Some(SyncResult::Completed));
        assert_eq!(steps[1].outcome(), DeliveryOutcome::CompletedOk);

        // Flood to 1 and 2, then unicast back to 0; the config payload goes nowhere.
        assert_eq!(nodes[0].received_count(), 1);
        assert_eq!(nodes[1].received_count(), 1);
        assert_eq!(nodes[2].received_count(), 1);
        assert_eq!(switch.table().len(), 2);
        assert_eq!(switch.stats().bypassed, 1);

        let mac1: MacAddress = "02:00:00:00:00:01".parse().unwrap();
        assert_eq!(switch.port_of(&mac1), Some(PortIndex::new(0)));
    }

    #[tokio::test]
    async fn test_replay_stops_on_conflict() {
        let scenario = Scenario::from_toml(
            r#"
[[frame]]
port = 5
src = "02:00:00:00:00:01"
dst = "02:00:00:00:00:02"

[[frame]]
port = 0
src = "02:00:00:00:00:01"
dst = "02:00:00:00:00:02"

[[frame]]
port = 1
src = "02:00:00:00:00:01"
dst = "02:00:00:00:00:02"
"#,
        )
        .unwrap();
        let (switch, _nodes) = switch(2);

        let err = scenario.replay(&switch).await.unwrap_err();
        assert!(matches!(err, SwitchError::RoutingInconsistency { .. }));
        assert_eq!(switch.stats().blocking_received, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Scenario::load("/nonexistent/scenario.toml").unwrap_err();
        assert!(matches!(err, SwitchError::Io(_)));
    }

    #[derive(Default)]
    struct Banners(parking_lot::Mutex<Vec<String>>);

    impl crate::monitor::MonitorTap for Banners {
        fn write(
            &self,
            record: &crate::monitor::MonitorRecord<'_>,
        ) -> std::result::Result<(), crate::error::MonitorError> {
            self.0.lock().push(record.banner.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_clocked_replay_stamps_banners() {
        let scenario = Scenario::from_toml(
            r#"
[[frame]]
port = 0
src = "02:00:00:00:00:01"
dst = "02:00:00:00:00:02"

[[frame]]
port = 1
src = "02:00:00:00:00:02"
dst = "02:00:00:00:00:01"
mode = "non-blocking"
gap_ns = 250
"#,
        )
        .unwrap();
        assert_eq!(scenario.frames[0].gap_ns, 1_000);

        let clock = Arc::new(TickClock::new(crate::clock::TimePrecision::PS));
        let banners = Arc::new(Banners::default());
        let switch = EthSoftSwitch::builder(2)
            .bind(0, Arc::new(VirtualNode::new("node0")))
            .unwrap()
            .bind(1, Arc::new(VirtualNode::new("node1")))
            .unwrap()
            .monitoring(true)
            .clock(clock.clone())
            .tap_all(banners.clone())
            .build()
            .unwrap();

        scenario.replay_clocked(&switch, &clock).await.unwrap();

        assert_eq!(clock.ticks(), 1_250_000);
        assert_eq!(
            *banners.0.lock(),
            vec![
                "@1000 ns INFO blocking RECEIVED on rxPortId=0 name=rxPort0".to_string(),
                "@1000 ns INFO blocking SENDING on txPortId=1 name=txPort1 ...".to_string(),
                "@1250 ns INFO non-blocking RECEIVED on rxPortId=1 name=rxPort1".to_string(),
                "@1250 ns INFO non-blocking SENDING on txPortId=0 name=txPort0 ...".to_string(),
            ]
        );
    }
}

//! Monitoring taps.
//!
//! When monitoring is enabled every hop through the switch produces a
//! [`MonitorRecord`]: the frame bytes, the port and direction it was seen on,
//! the transport discipline, and a human-readable banner stamped with the
//! current simulated time. Taps are best-effort; a failing tap never affects
//! delivery.

use std::fmt;
use tracing::{info, warn};
use vsw_types::{PortDirection, PortIndex};

use crate::error::MonitorError;
use crate::frame::Frame;

/// Delivery discipline a record was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Blocking,
    NonBlocking,
}

impl TransportKind {
    /// Operation name used in banners.
    pub const fn operation(&self) -> &'static str {
        match self {
            TransportKind::Blocking => "blocking",
            TransportKind::NonBlocking => "non-blocking",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation())
    }
}

/// One observation of a frame at a port.
///
/// Borrows the frame only for the duration of the tap write.
#[derive(Debug, Clone)]
pub struct MonitorRecord<'a> {
    pub direction: PortDirection,
    pub port: PortIndex,
    pub port_name: String,
    pub kind: TransportKind,
    pub banner: String,
    pub frame: &'a [u8],
}

impl<'a> MonitorRecord<'a> {
    /// Builds a record and its banner.
    ///
    /// Receive banners read
    /// `@<ns> ns INFO <op> RECEIVED on rxPortId=<i> name=rxPort<i>`,
    /// transmit banners
    /// `@<ns> ns INFO <op> SENDING on txPortId=<i> name=txPort<i> ...`.
    pub fn new(
        direction: PortDirection,
        port: PortIndex,
        kind: TransportKind,
        time_ns: u64,
        frame: &'a [u8],
    ) -> Self {
        let port_name = direction.port_name(port);
        let banner = match direction {
            PortDirection::Rx => format!(
                "@{} ns INFO {} RECEIVED on rxPortId={} name={}",
                time_ns,
                kind.operation(),
                port,
                port_name
            ),
            PortDirection::Tx => format!(
                "@{} ns INFO {} SENDING on txPortId={} name={} ...",
                time_ns,
                kind.operation(),
                port,
                port_name
            ),
        };
        Self {
            direction,
            port,
            port_name,
            kind,
            banner,
            frame,
        }
    }

    pub fn frame(&self) -> Frame<'a> {
        Frame::new(self.frame)
    }
}

/// Receiver of monitor records for one port side.
pub trait MonitorTap: Send + Sync {
    fn write(&self, record: &MonitorRecord<'_>) -> Result<(), MonitorError>;
}

/// Tap that turns each record into a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTap;

impl MonitorTap for TracingTap {
    fn write(&self, record: &MonitorRecord<'_>) -> Result<(), MonitorError> {
        info!(
            target: "vsw::monitor",
            direction = %record.direction,
            port = record.port.get(),
            kind = %record.kind,
            "{} [{}]",
            record.banner,
            record.frame()
        );
        Ok(())
    }
}

/// Writes `record` to `tap`, logging and swallowing any failure.
///
/// Returns true if the tap accepted the record.
pub(crate) fn emit(tap: &dyn MonitorTap, record: &MonitorRecord<'_>) -> bool {
    match tap.write(record) {
        Ok(()) => true,
        Err(e) => {
            warn!("monitor tap on {} failed: {}", record.port_name, e);
            false
        }
    }
}

//! Virtual Ethernet learning switch for transaction-level testbenches.
//!
//! This crate provides the switch core and the pieces around it:
//!
//! - [`EthSoftSwitch`]: N-port learning switch with blocking and
//!   non-blocking delivery
//! - [`MacLearningTable`]: fingerprint to port bindings, never aged
//! - [`ForwardingEngine`]: learn-then-lookup routing decision
//! - [`TransportArbiter`]: switch-wide exclusion for blocking delivery
//! - [`AsyncPhaseController`]: the non-blocking phase protocol
//! - [`PortSet`] and [`MonitorTap`]: port bindings and diagnostic taps
//!
//! # Forwarding
//!
//! For every data frame:
//!
//! 1. The source address is learned on the arrival port
//! 2. The destination address is looked up
//! 3. A known destination is sent to its port only
//! 4. An unknown destination is flooded to every other port, ascending
//!
//! A source already bound to another port is reported as
//! [`SwitchError::RoutingInconsistency`] before anything is forwarded.
//!
//! # Example
//!
//! ```ignore
//! use vsw_switch::{EthSoftSwitch, Transaction, VirtualNode};
//!
//! let switch = EthSoftSwitch::builder(2)
//!     .bind(0, Arc::new(VirtualNode::new("a")))?
//!     .bind(1, Arc::new(VirtualNode::new("b")))?
//!     .monitoring(true)
//!     .tap_all(Arc::new(TracingTap))
//!     .build()?;
//!
//! let mut trans = Transaction::data(frame);
//! switch.blocking_transfer(0, &mut trans, &mut Duration::ZERO).await?;
//! ```

mod arbiter;
mod clock;
mod config;
mod error;
mod fabric;
mod fdb;
mod forwarding;
mod frame;
mod monitor;
mod node;
mod phase;
mod port;
mod scenario;
mod stats;
mod switch;
mod transport;

pub use arbiter::TransportArbiter;
pub use clock::{ManualClock, TickClock, TimePrecision, TimeSource, TokioClock};
pub use config::{ClockSection, SwitchConfig, SwitchSection};
pub use error::{MonitorError, Result, SwitchError};
pub use fabric::Fabric;
pub use fdb::{FdbEntry, LearnOutcome, MacLearningTable};
pub use forwarding::{ForwardingEngine, RoutedFrame, RoutingDecision};
pub use frame::{build_frame, Frame};
pub use monitor::{MonitorRecord, MonitorTap, TracingTap, TransportKind};
pub use node::{ReceivedFrame, VirtualNode};
pub use phase::AsyncPhaseController;
pub use port::{PortSet, PortSetBuilder, TransmitPort};
pub use scenario::{ReplayStep, Scenario, ScenarioFrame, TransferMode};
pub use stats::{SwitchCounters, SwitchStats};
pub use switch::{EthSoftSwitch, RxPort, SwitchBuilder, WeakRxPort};
pub use transport::{
    DeliveryOutcome, DriverConfig, Payload, Phase, ResponseStatus, SyncResult, Transaction,
};

pub use vsw_types::{MacAddress, MacFingerprint, PortDirection, PortIndex};

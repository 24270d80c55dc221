//! Integration test infrastructure for the virtual Ethernet switch
//!
//! Provides:
//! - MAC address and frame fixtures
//! - Scripted downstream ports with a shared, ordered call log
//! - Capturing and failing monitor taps, and a clock that counts its reads
//! - A ready-made switch harness
//! - Table and delivery verification helpers

pub mod fixtures;
mod harness;
mod ports;
mod taps;
mod verification;

pub use fixtures::*;
pub use harness::TestSwitch;
pub use ports::{Call, CallLog, ConcurrencyProbe, ScriptedPort};
pub use taps::{CaptureTap, CapturedRecord, CountingClock, FailingTap};
pub use verification::*;

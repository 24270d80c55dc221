//! Monitoring doubles
//!
//! - [`CaptureTap`] keeps an owned copy of every record it receives
//! - [`FailingTap`] rejects every record
//! - [`CountingClock`] counts how often the switch asked for the time

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use vsw_switch::{MonitorError, MonitorRecord, MonitorTap, TimeSource, TransportKind};
use vsw_types::{PortDirection, PortIndex};

/// Owned copy of a monitor record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    pub direction: PortDirection,
    pub port: PortIndex,
    pub port_name: String,
    pub kind: TransportKind,
    pub banner: String,
    pub frame: Vec<u8>,
}

/// Tap that captures every record, shared by all port sides
#[derive(Debug, Default)]
pub struct CaptureTap {
    records: Mutex<Vec<CapturedRecord>>,
}

impl CaptureTap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records.lock().clone()
    }

    /// Banners in capture order
    pub fn banners(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.banner.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl MonitorTap for CaptureTap {
    fn write(&self, record: &MonitorRecord<'_>) -> Result<(), MonitorError> {
        self.records.lock().push(CapturedRecord {
            direction: record.direction,
            port: record.port,
            port_name: record.port_name.clone(),
            kind: record.kind,
            banner: record.banner.clone(),
            frame: record.frame.to_vec(),
        });
        Ok(())
    }
}

/// Tap that fails every write
#[derive(Debug, Default)]
pub struct FailingTap {
    attempts: AtomicUsize,
}

impl FailingTap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes attempted
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl MonitorTap for FailingTap {
    fn write(&self, record: &MonitorRecord<'_>) -> Result<(), MonitorError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MonitorError::Rejected(format!("{} is closed", record.port_name)))
    }
}

/// Fixed-time clock counting its reads
#[derive(Debug, Default)]
pub struct CountingClock {
    now_ns: AtomicU64,
    reads: AtomicUsize,
}

impl CountingClock {
    pub fn new(now_ns: u64) -> Self {
        Self {
            now_ns: AtomicU64::new(now_ns),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, ns: u64) {
        self.now_ns.store(ns, Ordering::SeqCst);
    }

    /// Number of times the time was read
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TimeSource for CountingClock {
    fn now_ns(&self) -> u64 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.now_ns.load(Ordering::SeqCst)
    }
}

//! Simulated time sources.
//!
//! The switch reads the current time only to stamp monitor banners. It never
//! influences forwarding.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;

use crate::error::{Result, SwitchError};

/// Provider of the current simulated time.
pub trait TimeSource: Send + Sync {
    /// Current simulated time in nanoseconds.
    fn now_ns(&self) -> u64;
}

/// Simulator time precision as a power-of-ten exponent of one second.
///
/// `0` is 1 s, `-9` is 1 ns, `-12` is 1 ps, `-15` is 1 fs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePrecision(i8);

impl TimePrecision {
    pub const NS: TimePrecision = TimePrecision(-9);
    pub const PS: TimePrecision = TimePrecision(-12);
    pub const FS: TimePrecision = TimePrecision(-15);

    pub fn new(exponent: i8) -> Result<Self> {
        if (-15..=0).contains(&exponent) {
            Ok(TimePrecision(exponent))
        } else {
            Err(SwitchError::configuration(format!(
                "time precision {} out of range (0 to -15)",
                exponent
            )))
        }
    }

    pub fn exponent(&self) -> i8 {
        self.0
    }

    /// Femtoseconds in one tick of this precision.
    pub fn femtos_per_tick(&self) -> u128 {
        10u128.pow((15 + i32::from(self.0)) as u32)
    }

    /// Converts a raw tick count to nanoseconds, truncating.
    pub fn ticks_to_ns(&self, ticks: u64) -> u64 {
        let ns = u128::from(ticks) * self.femtos_per_tick() / 1_000_000;
        u64::try_from(ns).unwrap_or(u64::MAX)
    }

    /// Converts nanoseconds to whole ticks, truncating.
    pub fn ns_to_ticks(&self, ns: u64) -> u64 {
        let ticks = u128::from(ns) * 1_000_000 / self.femtos_per_tick();
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }
}

impl Default for TimePrecision {
    fn default() -> Self {
        TimePrecision::PS
    }
}

/// Clock advanced explicitly by the test harness, in nanoseconds.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ns: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ns: u64) -> Self {
        Self {
            now_ns: AtomicU64::new(start_ns),
        }
    }

    pub fn advance(&self, ns: u64) {
        self.now_ns.fetch_add(ns, Ordering::Relaxed);
    }

    pub fn set(&self, ns: u64) {
        self.now_ns.store(ns, Ordering::Relaxed);
    }
}

impl TimeSource for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::Relaxed)
    }
}

/// Raw simulator ticks at a fixed precision, converted on read.
#[derive(Debug)]
pub struct TickClock {
    precision: TimePrecision,
    ticks: AtomicU64,
}

impl TickClock {
    pub fn new(precision: TimePrecision) -> Self {
        Self {
            precision,
            ticks: AtomicU64::new(0),
        }
    }

    pub fn precision(&self) -> TimePrecision {
        self.precision
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn advance_ticks(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::Relaxed);
    }

    pub fn set_ticks(&self, ticks: u64) {
        self.ticks.store(ticks, Ordering::Relaxed);
    }
}

impl TimeSource for TickClock {
    fn now_ns(&self) -> u64 {
        self.precision.ticks_to_ns(self.ticks())
    }
}

/// Time elapsed on the tokio clock since construction.
///
/// Under `tokio::time::pause()` this follows the runtime's virtual time.
#[derive(Debug)]
pub struct TokioClock {
    start: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for TokioClock {
    fn now_ns(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

//! Switch traffic counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::forwarding::RoutingDecision;
use crate::monitor::TransportKind;

/// Live counters, updated with relaxed atomics.
#[derive(Debug, Default)]
pub struct SwitchCounters {
    blocking_received: AtomicU64,
    non_blocking_received: AtomicU64,
    unicast: AtomicU64,
    flooded: AtomicU64,
    learned: AtomicU64,
    bypassed: AtomicU64,
    downstream_failures: AtomicU64,
    routing_errors: AtomicU64,
    monitor_failures: AtomicU64,
}

impl SwitchCounters {
    pub(crate) fn received(&self, kind: TransportKind) {
        match kind {
            TransportKind::Blocking => &self.blocking_received,
            TransportKind::NonBlocking => &self.non_blocking_received,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn routed(&self, decision: &RoutingDecision, learned: bool) {
        match decision {
            RoutingDecision::Unicast(_) => &self.unicast,
            RoutingDecision::Flood(_) => &self.flooded,
        }
        .fetch_add(1, Ordering::Relaxed);
        if learned {
            self.learned.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn bypassed(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn downstream_failure(&self) {
        self.downstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn routing_error(&self) {
        self.routing_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn monitor_failure(&self) {
        self.monitor_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SwitchStats {
        SwitchStats {
            blocking_received: self.blocking_received.load(Ordering::Relaxed),
            non_blocking_received: self.non_blocking_received.load(Ordering::Relaxed),
            unicast: self.unicast.load(Ordering::Relaxed),
            flooded: self.flooded.load(Ordering::Relaxed),
            learned: self.learned.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            downstream_failures: self.downstream_failures.load(Ordering::Relaxed),
            routing_errors: self.routing_errors.load(Ordering::Relaxed),
            monitor_failures: self.monitor_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchStats {
    pub blocking_received: u64,
    pub non_blocking_received: u64,
    pub unicast: u64,
    pub flooded: u64,
    pub learned: u64,
    /// Configuration-only transactions passed over without routing.
    pub bypassed: u64,
    pub downstream_failures: u64,
    pub routing_errors: u64,
    pub monitor_failures: u64,
}

impl SwitchStats {
    pub fn total_received(&self) -> u64 {
        self.blocking_received + self.non_blocking_received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsw_types::PortIndex;

    #[test]
    fn test_snapshot_defaults() {
        let counters = SwitchCounters::default();
        assert_eq!(counters.snapshot(), SwitchStats::default());
    }

    #[test]
    fn test_counting() {
        let counters = SwitchCounters::default();
        counters.received(TransportKind::Blocking);
        counters.received(TransportKind::NonBlocking);
        counters.routed(&RoutingDecision::Flood(vec![PortIndex::new(1)]), true);
        counters.routed(&RoutingDecision::Unicast(PortIndex::new(0)), false);
        counters.bypassed();

        let stats = counters.snapshot();
        assert_eq!(stats.total_received(), 2);
        assert_eq!(stats.flooded, 1);
        assert_eq!(stats.unicast, 1);
        assert_eq!(stats.learned, 1);
        assert_eq!(stats.bypassed, 1);
    }
}

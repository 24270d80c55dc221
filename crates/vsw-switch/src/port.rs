//! Switch ports.
//!
//! A [`PortSet`] is the ordered collection of N receive/transmit pairs. Each
//! transmit side is bound to a downstream [`TransmitPort`]; each side may
//! carry a monitoring tap. The set holds identity and capability only; the
//! routing lives in [`crate::forwarding`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use vsw_types::{PortDirection, PortIndex};

use crate::error::{Result, SwitchError};
use crate::monitor::MonitorTap;
use crate::transport::{Phase, SyncResult, Transaction};

/// A transport target: a virtual node, a transactor, or another switch port.
///
/// Both disciplines must be supported so drivers can pick either.
#[async_trait]
pub trait TransmitPort: Send + Sync {
    /// Transfers `trans` to completion within the call.
    ///
    /// The target reports the result through the transaction's response
    /// status.
    async fn blocking_transfer(&self, trans: &mut Transaction, delay: &mut Duration);

    /// Forward path of the non-blocking discipline. Never suspends.
    fn non_blocking_transfer(
        &self,
        trans: &mut Transaction,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> SyncResult;
}

struct PortSlot {
    target: Arc<dyn TransmitPort>,
    rx_tap: Option<Arc<dyn MonitorTap>>,
    tx_tap: Option<Arc<dyn MonitorTap>>,
}

/// Ordered receive/transmit port pairs.
pub struct PortSet {
    slots: Vec<PortSlot>,
}

impl PortSet {
    /// Starts a set of `num_ports` unbound ports.
    pub fn builder(num_ports: usize) -> PortSetBuilder {
        PortSetBuilder {
            targets: vec![None; num_ports],
            rx_taps: vec![None; num_ports],
            tx_taps: vec![None; num_ports],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Validates a raw index against the set size.
    pub fn index(&self, port: usize) -> Result<PortIndex> {
        if port < self.slots.len() {
            Ok(PortIndex::new(port))
        } else {
            Err(SwitchError::invalid_port(port, self.slots.len()))
        }
    }

    fn slot(&self, port: PortIndex) -> Result<&PortSlot> {
        self.slots
            .get(port.get())
            .ok_or_else(|| SwitchError::invalid_port(port.get(), self.slots.len()))
    }

    /// Downstream target of `port`'s transmit side.
    pub fn target(&self, port: PortIndex) -> Result<&Arc<dyn TransmitPort>> {
        self.slot(port).map(|slot| &slot.target)
    }

    /// Monitoring tap of one side of `port`, if attached.
    pub fn tap(&self, port: PortIndex, direction: PortDirection) -> Option<&Arc<dyn MonitorTap>> {
        let slot = self.slots.get(port.get())?;
        match direction {
            PortDirection::Rx => slot.rx_tap.as_ref(),
            PortDirection::Tx => slot.tx_tap.as_ref(),
        }
    }

    /// All port indices, ascending.
    pub fn indices(&self) -> impl Iterator<Item = PortIndex> {
        (0..self.slots.len()).map(PortIndex::new)
    }
}

impl std::fmt::Debug for PortSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortSet")
            .field("ports", &self.slots.len())
            .field(
                "taps",
                &self
                    .slots
                    .iter()
                    .map(|s| (s.rx_tap.is_some(), s.tx_tap.is_some()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Binds targets and taps before the port set is frozen.
pub struct PortSetBuilder {
    targets: Vec<Option<Arc<dyn TransmitPort>>>,
    rx_taps: Vec<Option<Arc<dyn MonitorTap>>>,
    tx_taps: Vec<Option<Arc<dyn MonitorTap>>>,
}

impl PortSetBuilder {
    fn check(&self, port: usize) -> Result<()> {
        if port < self.targets.len() {
            Ok(())
        } else {
            Err(SwitchError::invalid_port(port, self.targets.len()))
        }
    }

    /// Binds the transmit side of `port` to `target`.
    pub fn bind(&mut self, port: usize, target: Arc<dyn TransmitPort>) -> Result<&mut Self> {
        self.check(port)?;
        self.targets[port] = Some(target);
        Ok(self)
    }

    /// Attaches a tap to one side of `port`.
    pub fn tap(
        &mut self,
        port: usize,
        direction: PortDirection,
        tap: Arc<dyn MonitorTap>,
    ) -> Result<&mut Self> {
        self.check(port)?;
        match direction {
            PortDirection::Rx => self.rx_taps[port] = Some(tap),
            PortDirection::Tx => self.tx_taps[port] = Some(tap),
        }
        Ok(self)
    }

    /// Attaches `tap` to both sides of every port.
    pub fn tap_all(&mut self, tap: Arc<dyn MonitorTap>) -> &mut Self {
        for slot in self.rx_taps.iter_mut().chain(self.tx_taps.iter_mut()) {
            *slot = Some(Arc::clone(&tap));
        }
        self
    }

    /// Freezes the set. Every port must be bound.
    pub fn build(self) -> Result<PortSet> {
        let mut slots = Vec::with_capacity(self.targets.len());
        let sides = self.rx_taps.into_iter().zip(self.tx_taps);
        for (i, (target, (rx_tap, tx_tap))) in self.targets.into_iter().zip(sides).enumerate() {
            let target = target.ok_or(SwitchError::UnboundPort(PortIndex::new(i)))?;
            slots.push(PortSlot {
                target,
                rx_tap,
                tx_tap,
            });
        }
        Ok(PortSet { slots })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::TracingTap;

    struct Sink;

    #[async_trait]
    impl TransmitPort for Sink {
        async fn blocking_transfer(&self, trans: &mut Transaction, _delay: &mut Duration) {
            trans.set_response_status(crate::transport::ResponseStatus::Ok);
        }

        fn non_blocking_transfer(
            &self,
            _trans: &mut Transaction,
            _phase: &mut Phase,
            _delay: &mut Duration,
        ) -> SyncResult {
            SyncResult::Completed
        }
    }

    #[test]
    fn test_build_requires_every_port_bound() {
        let mut builder = PortSet::builder(3);
        builder.bind(0, Arc::new(Sink)).unwrap();
        builder.bind(2, Arc::new(Sink)).unwrap();

        let err = builder.build().unwrap_err();
        assert!(matches!(err, SwitchError::UnboundPort(p) if p == PortIndex::new(1)));
    }

    #[test]
    fn test_bind_out_of_range() {
        let mut builder = PortSet::builder(2);
        assert!(matches!(
            builder.bind(2, Arc::new(Sink)),
            Err(SwitchError::InvalidPort { port: 2, num_ports: 2 })
        ));
    }

    #[test]
    fn test_taps_per_side() {
        let mut builder = PortSet::builder(2);
        builder.bind(0, Arc::new(Sink)).unwrap();
        builder.bind(1, Arc::new(Sink)).unwrap();
        builder
            .tap(1, PortDirection::Tx, Arc::new(TracingTap))
            .unwrap();
        let set = builder.build().unwrap();

        assert_eq!(set.len(), 2);
        assert!(set.tap(PortIndex::new(1), PortDirection::Tx).is_some());
        assert!(set.tap(PortIndex::new(1), PortDirection::Rx).is_none());
        assert!(set.tap(PortIndex::new(0), PortDirection::Tx).is_none());
        assert!(set.index(5).is_err());
        assert_eq!(set.indices().count(), 2);
    }

    #[test]
    fn test_tap_all() {
        let mut builder = PortSet::builder(2);
        builder.bind(0, Arc::new(Sink)).unwrap();
        builder.bind(1, Arc::new(Sink)).unwrap();
        builder.tap_all(Arc::new(TracingTap));
        let set = builder.build().unwrap();

        for port in set.indices() {
            assert!(set.tap(port, PortDirection::Rx).is_some());
            assert!(set.tap(port, PortDirection::Tx).is_some());
        }
    }
}

//! Blocking delivery and its arbitration.
//!
//! Every blocking delivery runs under one switch-wide critical section: the
//! routing decision, the table mutation and the whole downstream fan-out of a
//! frame complete before the next blocking delivery starts. The lock is
//! FIFO-fair. After release the caller yields once so that deliveries already
//! queued on the lock go ahead of a caller that immediately re-enters.
//!
//! A downstream target that calls back into the same switch from the same
//! task before returning deadlocks, as it would on the simulator mutex.
//!
//! Linked switches can deadlock the same way. Each switch holds its own lock
//! for the whole fan-out, so when blocking floods enter two linked switches
//! at once from opposite ends, each holds its lock while the link waits on
//! the other's. This applies to a plain two-switch tree as well. Drive
//! blocking traffic into linked switches from one task at a time, or use the
//! non-blocking path, which takes no switch-wide lock.

use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use vsw_types::{PortDirection, PortIndex};

use crate::error::{Result, SwitchError};
use crate::fabric::Fabric;
use crate::monitor::TransportKind;
use crate::transport::{ResponseStatus, Transaction};

/// Serializes blocking deliveries across all ports.
#[derive(Debug, Default)]
pub struct TransportArbiter {
    lock: Mutex<()>,
}

impl TransportArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `trans` arriving on `arrival`.
    ///
    /// Unicast sends exactly once. Flood sends to every other port in
    /// ascending order and stops at the first non-OK status, which becomes
    /// the result.
    #[instrument(skip_all, fields(arrival = %arrival))]
    pub async fn deliver_blocking(
        &self,
        fabric: &Fabric,
        arrival: PortIndex,
        trans: &mut Transaction,
        delay: &mut Duration,
    ) -> Result<()> {
        let result = {
            let _guard = self.lock.lock().await;
            Self::deliver_locked(fabric, arrival, trans, delay).await
        };

        // Zero-time yield: queued callers take the lock first.
        tokio::task::yield_now().await;
        result
    }

    async fn deliver_locked(
        fabric: &Fabric,
        arrival: PortIndex,
        trans: &mut Transaction,
        delay: &mut Duration,
    ) -> Result<()> {
        if trans.is_driver_config() {
            debug!("configuration payload on port {} ignored", arrival);
            fabric.counters.bypassed();
            trans.set_response_status(ResponseStatus::Ok);
            return Ok(());
        }

        fabric.counters.received(TransportKind::Blocking);
        fabric.observe(PortDirection::Rx, arrival, TransportKind::Blocking, trans);

        let routed = fabric.route(trans, arrival).inspect_err(|_| {
            trans.set_response_status(ResponseStatus::GenericError);
        })?;

        let egress = routed.decision.egress_ports();
        if egress.is_empty() {
            trans.set_response_status(ResponseStatus::Ok);
            return Ok(());
        }

        for &port in egress {
            fabric.observe(PortDirection::Tx, port, TransportKind::Blocking, trans);
            fabric
                .ports
                .target(port)?
                .blocking_transfer(trans, delay)
                .await;

            let status = trans.response_status();
            if !status.is_ok() {
                warn!("blocking send on {} returned {}", port.tx_name(), status);
                fabric.counters.downstream_failure();
                return Err(SwitchError::DownstreamFailure { port, status });
            }
        }
        Ok(())
    }
}

//! Non-blocking delivery.
//!
//! Call-scoped and fire-and-forget: the switch only ever issues a
//! begin-request phase downstream and reports the sync result the immediate
//! downstream port returns. The controller never suspends. The learning
//! table is still serialized by the forwarding engine's lock, so concurrent
//! non-blocking callers on a multi-threaded runtime cannot corrupt it.

use std::time::Duration;
use tracing::{debug, instrument, trace};
use vsw_types::{PortDirection, PortIndex};

use crate::error::Result;
use crate::fabric::Fabric;
use crate::forwarding::RoutingDecision;
use crate::monitor::TransportKind;
use crate::transport::{Phase, ResponseStatus, SyncResult, Transaction};

/// Drives the non-blocking phase protocol for one call at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsyncPhaseController;

impl AsyncPhaseController {
    pub fn new() -> Self {
        Self
    }

    /// Delivers `trans` arriving on `arrival`.
    ///
    /// A configuration-only transaction completes immediately without
    /// touching the table or any port. Otherwise the transaction status is
    /// reset to OK and the frame is routed:
    ///
    /// - unicast: the result is the destination's sync result
    /// - flood: ports are called in ascending order; a non-`Completed`
    ///   result stops the fan-out and becomes the result, a non-OK status
    ///   also stops it but the result stays `Completed`
    #[instrument(skip_all, fields(arrival = %arrival))]
    pub fn deliver_non_blocking(
        &self,
        fabric: &Fabric,
        arrival: PortIndex,
        trans: &mut Transaction,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> Result<SyncResult> {
        if trans.is_driver_config() {
            debug!("configuration payload on port {} ignored", arrival);
            fabric.counters.bypassed();
            return Ok(SyncResult::Completed);
        }
        trace!("incoming phase {}", phase);

        trans.set_response_status(ResponseStatus::Ok);
        fabric.counters.received(TransportKind::NonBlocking);
        fabric.observe(PortDirection::Rx, arrival, TransportKind::NonBlocking, trans);

        let routed = fabric.route(trans, arrival).inspect_err(|_| {
            trans.set_response_status(ResponseStatus::GenericError);
        })?;

        let result = match &routed.decision {
            RoutingDecision::Unicast(port) => Self::send(fabric, *port, trans, phase, delay)?,
            RoutingDecision::Flood(ports) => {
                let mut result = SyncResult::Completed;
                for &port in ports {
                    let port_result = Self::send(fabric, port, trans, phase, delay)?;
                    if port_result != SyncResult::Completed {
                        result = port_result;
                        break;
                    }
                    if !trans.response_status().is_ok() {
                        break;
                    }
                }
                result
            }
        };

        if !trans.response_status().is_ok() {
            debug!("non-blocking delivery ended with {}", trans.response_status());
            fabric.counters.downstream_failure();
        }
        Ok(result)
    }

    fn send(
        fabric: &Fabric,
        port: PortIndex,
        trans: &mut Transaction,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> Result<SyncResult> {
        fabric.observe(PortDirection::Tx, port, TransportKind::NonBlocking, trans);
        *phase = Phase::BeginRequest;
        let result = fabric
            .ports
            .target(port)?
            .non_blocking_transfer(trans, phase, delay);
        trace!("{} returned {:?} in phase {}", port.tx_name(), result, phase);
        Ok(result)
    }
}

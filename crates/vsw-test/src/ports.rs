//! Scripted downstream ports
//!
//! A [`ScriptedPort`] answers every transfer with a configurable status and
//! sync result and appends the call to a [`CallLog`] shared by all ports of a
//! switch, so tests can check exactly which ports were called and in what
//! order.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vsw_switch::{Frame, Phase, ResponseStatus, SyncResult, Transaction, TransmitPort, TransportKind};
use vsw_types::MacAddress;

/// One downstream call as seen by a scripted port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Port that was called
    pub port: usize,
    /// Discipline the call used
    pub kind: TransportKind,
    /// Phase the switch passed in (non-blocking only)
    pub phase: Option<Phase>,
    /// Annotated delay as received
    pub delay: Duration,
    /// Frame bytes at the time of the call
    pub frame: Vec<u8>,
}

impl Call {
    /// Source address of the delivered frame
    pub fn source(&self) -> Option<MacAddress> {
        Frame::new(&self.frame).source()
    }
}

/// Ordered log of downstream calls, shared between ports
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.calls.lock().push(call);
    }

    /// All calls so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Ports called so far, in call order
    pub fn ports(&self) -> Vec<usize> {
        self.calls.lock().iter().map(|c| c.port).collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    /// Forget all calls
    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// Tracks how many blocking transfers are inside downstream ports at once
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    /// Highest number of overlapping transfers observed
    pub fn max_in_flight(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

/// Downstream port with scripted answers
#[derive(Debug)]
pub struct ScriptedPort {
    id: usize,
    log: CallLog,
    status: Mutex<ResponseStatus>,
    sync: Mutex<SyncResult>,
    hold: Option<(Duration, Arc<ConcurrencyProbe>)>,
}

impl ScriptedPort {
    /// Port answering OK / Completed
    pub fn new(id: usize, log: CallLog) -> Self {
        Self {
            id,
            log,
            status: Mutex::new(ResponseStatus::Ok),
            sync: Mutex::new(SyncResult::Completed),
            hold: None,
        }
    }

    /// Answer with `status` instead of OK
    pub fn with_status(self, status: ResponseStatus) -> Self {
        *self.status.lock() = status;
        self
    }

    /// Return `sync` from non-blocking transfers
    pub fn with_sync(self, sync: SyncResult) -> Self {
        *self.sync.lock() = sync;
        self
    }

    /// Sleep for `hold` inside every blocking transfer, reporting to `probe`
    pub fn with_hold(mut self, hold: Duration, probe: Arc<ConcurrencyProbe>) -> Self {
        self.hold = Some((hold, probe));
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Change the status answered from now on
    pub fn set_status(&self, status: ResponseStatus) {
        *self.status.lock() = status;
    }

    /// Change the sync result answered from now on
    pub fn set_sync(&self, sync: SyncResult) {
        *self.sync.lock() = sync;
    }

    fn record(&self, trans: &Transaction, kind: TransportKind, phase: Option<Phase>, delay: Duration) {
        self.log.push(Call {
            port: self.id,
            kind,
            phase,
            delay,
            frame: trans.data_bytes().unwrap_or_default().to_vec(),
        });
    }
}

#[async_trait]
impl TransmitPort for ScriptedPort {
    async fn blocking_transfer(&self, trans: &mut Transaction, delay: &mut Duration) {
        self.record(trans, TransportKind::Blocking, None, *delay);
        if let Some((hold, probe)) = &self.hold {
            probe.enter();
            tokio::time::sleep(*hold).await;
            probe.exit();
        }
        trans.set_response_status(*self.status.lock());
    }

    fn non_blocking_transfer(
        &self,
        trans: &mut Transaction,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> SyncResult {
        self.record(trans, TransportKind::NonBlocking, Some(*phase), *delay);
        trans.set_response_status(*self.status.lock());
        let sync = *self.sync.lock();
        if sync == SyncResult::Updated {
            *phase = Phase::EndRequest;
        }
        sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{frame, mac};

    #[tokio::test]
    async fn test_scripted_answers() {
        let log = CallLog::new();
        let port = ScriptedPort::new(3, log.clone())
            .with_status(ResponseStatus::AddressError)
            .with_sync(SyncResult::Accepted);

        let mut trans = frame(mac(1), mac(2));
        port.blocking_transfer(&mut trans, &mut Duration::ZERO).await;
        assert_eq!(trans.response_status(), ResponseStatus::AddressError);

        let mut phase = Phase::BeginRequest;
        let sync = port.non_blocking_transfer(&mut trans, &mut phase, &mut Duration::ZERO);
        assert_eq!(sync, SyncResult::Accepted);

        assert_eq!(log.ports(), vec![3, 3]);
        assert_eq!(log.calls()[1].phase, Some(Phase::BeginRequest));
        assert_eq!(log.calls()[0].source(), Some(mac(1)));
    }
}

//! Switches chained through receive-port handles
//!
//! Two 3-port switches joined by one link:
//!
//! ```text
//!   a0  a1          b1  b2
//!    \  |            |  /
//!    [ A ]---a2==b0---[ B ]
//! ```

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use vsw_switch::{
    EthSoftSwitch, Phase, ResponseStatus, SwitchError, SyncResult, Transaction, TransmitPort,
    WeakRxPort,
};
use vsw_test::{fixtures::{frame, mac}, CallLog, ConcurrencyProbe, ScriptedPort, TableVerifier};
use vsw_types::PortIndex;

/// Link end bound after both switches exist. Holds the far port weakly so
/// the two switches do not own each other.
#[derive(Default)]
struct Link(OnceLock<WeakRxPort>);

impl Link {
    fn peer(&self) -> &WeakRxPort {
        self.0.get().expect("link not connected")
    }
}

#[async_trait]
impl TransmitPort for Link {
    async fn blocking_transfer(&self, trans: &mut Transaction, delay: &mut Duration) {
        self.peer().blocking_transfer(trans, delay).await;
    }

    fn non_blocking_transfer(
        &self,
        trans: &mut Transaction,
        phase: &mut Phase,
        delay: &mut Duration,
    ) -> SyncResult {
        self.peer().non_blocking_transfer(trans, phase, delay)
    }
}

struct Topology {
    a: Arc<EthSoftSwitch>,
    b: Arc<EthSoftSwitch>,
    log: CallLog,
}

fn topology() -> Topology {
    linked(|port| port)
}

/// Node ids: A's nodes are 0 and 1, B's are 11 and 12.
fn linked(script: impl Fn(ScriptedPort) -> ScriptedPort) -> Topology {
    let log = CallLog::new();
    let a_uplink = Arc::new(Link::default());
    let b_uplink = Arc::new(Link::default());

    let a = Arc::new(
        EthSoftSwitch::builder(3)
            .name("a")
            .bind(0, Arc::new(script(ScriptedPort::new(0, log.clone()))))
            .unwrap()
            .bind(1, Arc::new(script(ScriptedPort::new(1, log.clone()))))
            .unwrap()
            .bind(2, a_uplink.clone())
            .unwrap()
            .build()
            .unwrap(),
    );
    let b = Arc::new(
        EthSoftSwitch::builder(3)
            .name("b")
            .bind(0, b_uplink.clone())
            .unwrap()
            .bind(1, Arc::new(script(ScriptedPort::new(11, log.clone()))))
            .unwrap()
            .bind(2, Arc::new(script(ScriptedPort::new(12, log.clone()))))
            .unwrap()
            .build()
            .unwrap(),
    );

    assert!(a_uplink.0.set(b.rx_port(0).unwrap().downgrade()).is_ok());
    assert!(b_uplink.0.set(a.rx_port(2).unwrap().downgrade()).is_ok());
    Topology { a, b, log }
}

#[tokio::test]
async fn test_flood_crosses_link_then_reply_is_unicast() {
    let t = topology();
    let mut delay = Duration::ZERO;

    // a0 -> b2: unknown everywhere, flooded through both switches.
    let mut request = frame(mac(1), mac(12));
    t.a.blocking_transfer(0, &mut request, &mut delay).await.unwrap();
    assert_eq!(t.log.ports(), vec![1, 11, 12]);
    assert_eq!(request.response_status(), ResponseStatus::Ok);

    // b2 -> a0: both switches know where mac(1) lives.
    t.log.clear();
    let mut reply = frame(mac(12), mac(1));
    t.b.blocking_transfer(2, &mut reply, &mut delay).await.unwrap();
    assert_eq!(t.log.ports(), vec![0]);

    TableVerifier::new(&t.a).assert_learned(mac(1), 0).unwrap();
    TableVerifier::new(&t.a).assert_learned(mac(12), 2).unwrap();
    TableVerifier::new(&t.b).assert_learned(mac(1), 0).unwrap();
    TableVerifier::new(&t.b).assert_learned(mac(12), 2).unwrap();
}

#[test]
fn test_non_blocking_across_link() {
    let t = topology();
    let mut phase = Phase::BeginRequest;

    let result = t
        .a
        .non_blocking_transfer(1, &mut frame(mac(2), mac(11)), &mut phase, &mut Duration::ZERO)
        .unwrap();

    assert_eq!(result, SyncResult::Completed);
    assert_eq!(t.log.ports(), vec![0, 11, 12]);
    assert_eq!(t.b.stats().non_blocking_received, 1);
}

/// A conflict inside the far switch shows up as a failed status on the near
/// switch's delivery.
#[tokio::test]
async fn test_far_conflict_reported_as_status() {
    let t = topology();
    let mut delay = Duration::ZERO;

    // mac(6) known on B's port 2, so mac(5)'s frame to it stays inside B.
    t.b.blocking_transfer(2, &mut frame(mac(6), mac(99)), &mut delay)
        .await
        .unwrap();
    t.b.blocking_transfer(1, &mut frame(mac(5), mac(6)), &mut delay)
        .await
        .unwrap();
    assert_eq!(t.a.port_of(&mac(5)), None);

    // mac(5) now claims to be behind A: B sees it on the link port.
    let mut moved = frame(mac(5), mac(98));
    let result = t.a.blocking_transfer(0, &mut moved, &mut delay).await;

    assert!(matches!(
        result,
        Err(SwitchError::DownstreamFailure { status: ResponseStatus::GenericError, .. })
    ));
    assert_eq!(moved.response_status(), ResponseStatus::GenericError);
    assert_eq!(t.a.stats().routing_errors, 0);
    assert_eq!(t.b.stats().routing_errors, 1);
}

#[test]
fn test_rx_port_handles() {
    let t = topology();
    let handles = t.a.rx_ports();
    assert_eq!(handles.len(), 3);
    assert_eq!(handles[1].name(), "rxPort1");
    assert!(t.a.rx_port(3).is_err());
}

/// Weakly linked switches are freed once their owners let go, and a link
/// into a dropped switch reports a failed delivery.
#[tokio::test]
async fn test_weak_link_releases_switches() {
    let Topology { a, b, log } = topology();
    let a_weak = Arc::downgrade(&a);
    let b_weak = Arc::downgrade(&b);

    drop(a);
    assert!(a_weak.upgrade().is_none());

    // The flood from b1 reaches the dead uplink first and stops there.
    let mut trans = frame(mac(11), mac(77));
    let result = b.blocking_transfer(1, &mut trans, &mut Duration::ZERO).await;
    assert!(matches!(
        result,
        Err(SwitchError::DownstreamFailure { port, status: ResponseStatus::GenericError })
            if port == PortIndex::new(0)
    ));
    assert!(log.is_empty());

    drop(b);
    assert!(b_weak.upgrade().is_none());
}

/// Blocking floods entering both ends of a link at once each hold their own
/// switch and wait on the other one.
#[tokio::test(start_paused = true)]
async fn test_opposite_blocking_floods_deadlock() {
    let probe = ConcurrencyProbe::new();
    let t = linked(|port| port.with_hold(Duration::from_millis(1), probe.clone()));

    // A is held while a1 sleeps; B then floods out of b0 into A first.
    let from_a = {
        let a = t.a.clone();
        tokio::spawn(async move {
            let _ = a
                .blocking_transfer(0, &mut frame(mac(1), mac(0xee)), &mut Duration::ZERO)
                .await;
        })
    };
    let from_b = {
        let b = t.b.clone();
        tokio::spawn(async move {
            let _ = b
                .blocking_transfer(2, &mut frame(mac(12), mac(0xef)), &mut Duration::ZERO)
                .await;
        })
    };

    let both = async {
        let _ = from_a.await;
        let _ = from_b.await;
    };
    assert!(tokio::time::timeout(Duration::from_secs(1), both).await.is_err());
    assert_eq!(t.log.ports(), vec![1]);
}

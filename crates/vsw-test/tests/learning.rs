//! Learning-bridge behaviour
//!
//! Source learning, lookup, idempotence and table conflicts, driven through
//! the blocking path.

use pretty_assertions::assert_eq;
use std::time::Duration;
use vsw_switch::{MacLearningTable, ResponseStatus, SwitchError};
use vsw_test::{
    fixtures::{frame, mac, mac_fixtures},
    DeliveryVerifier, TableVerifier, TestSwitch,
};
use vsw_types::PortIndex;

/// Walkthrough on a 3-port switch
///
/// Scenario:
/// 1. Frame A: MAC1 -> MAC2 on port 0, MAC2 unknown, flooded to 1 and 2
/// 2. Frame B: MAC2 -> MAC1 on port 1, MAC1 known, unicast to 0 only
/// 3. Frame C: MAC1 on port 2, rejected before forwarding
#[tokio::test]
async fn test_three_port_walkthrough() {
    let h = TestSwitch::new(3);
    let table = TableVerifier::new(&h.switch);
    let delivery = DeliveryVerifier::new(&h.log);
    let mut delay = Duration::ZERO;

    // Frame A
    let mut a = frame(mac(1), mac(2));
    h.switch.blocking_transfer(0, &mut a, &mut delay).await.unwrap();
    table.assert_learned(mac(1), 0).unwrap();
    table.assert_not_learned(mac(2)).unwrap();
    delivery.assert_delivered_to(&[1, 2]).unwrap();
    assert_eq!(a.response_status(), ResponseStatus::Ok);

    // Frame B
    h.log.clear();
    let mut b = frame(mac(2), mac(1));
    h.switch.blocking_transfer(1, &mut b, &mut delay).await.unwrap();
    table.assert_learned(mac(2), 1).unwrap();
    delivery.assert_delivered_to(&[0]).unwrap();

    // Frame C
    h.log.clear();
    let mut c = frame(mac(1), mac(2));
    let err = h
        .switch
        .blocking_transfer(2, &mut c, &mut delay)
        .await
        .unwrap_err();
    match err {
        SwitchError::RoutingInconsistency {
            fingerprint,
            learned_port,
            arrival_port,
            address,
        } => {
            assert_eq!(fingerprint, mac(1).fingerprint());
            assert_eq!(learned_port, PortIndex::new(0));
            assert_eq!(arrival_port, PortIndex::new(2));
            assert_eq!(address, Some(mac(1)));
        }
        other => panic!("expected routing inconsistency, got {other}"),
    }
    delivery.assert_nothing_delivered().unwrap();
    table.assert_learned(mac(1), 0).unwrap();
    table.assert_len(2).unwrap();
    assert_eq!(c.response_status(), ResponseStatus::GenericError);
}

/// Distinct sources are each learned on their arrival port, and traffic to a
/// learned address is never flooded again.
#[tokio::test]
async fn test_learned_destinations_are_unicast() {
    let h = TestSwitch::new(4);
    let table = TableVerifier::new(&h.switch);
    let mut delay = Duration::ZERO;

    for (station, port) in [(10u8, 0usize), (11, 1), (12, 2), (13, 3)] {
        let mut trans = frame(mac(station), mac_fixtures::multicast());
        h.switch
            .blocking_transfer(port, &mut trans, &mut delay)
            .await
            .unwrap();
        table.assert_learned(mac(station), port).unwrap();
    }
    table.assert_len(4).unwrap();

    // Station on port `port` is addressed by its neighbour on the next port.
    for port in 0..4usize {
        h.log.clear();
        let sender = (port + 1) % 4;
        let mut trans = frame(mac(10 + sender as u8), mac(10 + port as u8));
        h.switch
            .blocking_transfer(sender, &mut trans, &mut delay)
            .await
            .unwrap();
        assert_eq!(h.log.ports(), vec![port]);
    }

    let stats = h.switch.stats();
    assert_eq!(stats.flooded, 4);
    assert_eq!(stats.unicast, 4);
    assert_eq!(stats.learned, 4);
}

/// Re-presenting a source on its own port never errors and never changes
/// the table.
#[tokio::test]
async fn test_relearning_is_idempotent() {
    let h = TestSwitch::new(2);
    let mut delay = Duration::ZERO;

    for _ in 0..5 {
        let mut trans = frame(mac(1), mac(2));
        h.switch
            .blocking_transfer(0, &mut trans, &mut delay)
            .await
            .unwrap();
    }

    let entries = h.switch.table().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, mac(1).fingerprint());
    assert_eq!(entries[0].1.port, PortIndex::new(0));
    assert_eq!(h.switch.stats().learned, 1);
    assert_eq!(h.switch.stats().routing_errors, 0);
}

#[test]
fn test_table_learn_same_port_twice() {
    let mut table = MacLearningTable::new();
    let fp = mac(7).fingerprint();

    table.learn(fp, PortIndex::new(3)).unwrap();
    let before = table.entries();
    table.learn(fp, PortIndex::new(3)).unwrap();
    table.learn(fp, PortIndex::new(3)).unwrap();

    assert_eq!(table.entries(), before);
    assert_eq!(table.lookup(fp), Some(PortIndex::new(3)));
}

/// Two addresses folding to the same fingerprint share one entry.
#[tokio::test]
async fn test_fingerprint_collision_aliases() {
    let (first, second) = mac_fixtures::colliding_pair();
    let h = TestSwitch::new(3);
    let mut delay = Duration::ZERO;

    let mut learn = frame(first, mac(50));
    h.switch
        .blocking_transfer(0, &mut learn, &mut delay)
        .await
        .unwrap();

    // The alias resolves to the same port without ever being seen.
    TableVerifier::new(&h.switch).assert_learned(second, 0).unwrap();

    // Presenting the alias from another port is a conflict.
    let mut alias = frame(second, mac(50));
    let err = h
        .switch
        .blocking_transfer(1, &mut alias, &mut delay)
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        SwitchError::RoutingInconsistency { address: Some(a), .. } if a == second
    ));
}

#[tokio::test]
async fn test_truncated_frame_rejected() {
    let h = TestSwitch::new(3);
    let mut trans = vsw_switch::Transaction::data(vec![0x02; 11]);

    let err = h
        .switch
        .blocking_transfer(0, &mut trans, &mut Duration::ZERO)
        .await
        .unwrap_err();

    assert!(matches!(err, SwitchError::MalformedFrame { len: 11 }));
    assert!(h.log.is_empty());
    assert!(h.switch.table().is_empty());
}

#[tokio::test]
async fn test_conflict_message_names_ports_and_address() {
    let h = TestSwitch::new(3);
    let mut delay = Duration::ZERO;

    h.switch
        .blocking_transfer(0, &mut frame(mac(1), mac(2)), &mut delay)
        .await
        .unwrap();
    let err = h
        .switch
        .blocking_transfer(2, &mut frame(mac(1), mac(2)), &mut delay)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("port 0"), "{message}");
    assert!(message.contains("port 2"), "{message}");
    assert!(message.contains("02:00:00:00:00:01"), "{message}");
}

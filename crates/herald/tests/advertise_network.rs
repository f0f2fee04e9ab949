// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! End-to-end advertisement scenario over real UDP multicast.
//!
//! Covers the externally observable protocol properties: first beacon
//! within one tick window at sequence 1, periodic re-announcement,
//! status-change fast path, and the drain ordering (403, then 410, then
//! the group is left).

use herald::{
    parse_beacon, AdvertiseConfig, AdvertiseMode, Advertiser, AdvertiserState, ParsedBeacon,
    STATUS_AVAILABLE, STATUS_DRAINING, STATUS_GONE,
};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

/// Listener socket joined to the advertisement group.
///
/// Reuse-address so it can share the group port with the advertiser's
/// own bound socket on the same host.
fn join_listener(group: Ipv4Addr, port: u16) -> UdpSocket {
    let raw = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .expect("listener socket creation");
    raw.set_reuse_address(true).expect("listener reuse-address");
    let bind: SocketAddr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    raw.bind(&bind.into()).expect("listener bind");
    let socket: UdpSocket = raw.into();
    socket
        .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
        .expect("listener group join");
    socket
        .set_read_timeout(Some(Duration::from_millis(200)))
        .expect("listener read timeout");
    socket
}

/// Receive beacons until `deadline`, returning them in arrival order.
fn drain_beacons(socket: &UdpSocket, deadline: Instant) -> Vec<ParsedBeacon> {
    let mut beacons = Vec::new();
    let mut buf = [0u8; 1024];
    while Instant::now() < deadline {
        match socket.recv(&mut buf) {
            Ok(len) => {
                let beacon = parse_beacon(&buf[..len]).expect("every datagram parses");
                beacons.push(beacon);
            }
            Err(_) => {} // timeout tick, keep polling
        }
    }
    beacons
}

/// Wait for the next beacon matching `pred`.
fn wait_for(
    socket: &UdpSocket,
    timeout: Duration,
    pred: impl Fn(&ParsedBeacon) -> bool,
) -> Option<ParsedBeacon> {
    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; 1024];
    while Instant::now() < deadline {
        if let Ok(len) = socket.recv(&mut buf) {
            let beacon = parse_beacon(&buf[..len]).expect("every datagram parses");
            if pred(&beacon) {
                return Some(beacon);
            }
        }
    }
    None
}

#[test]
#[ignore] // Ignore by default (requires UDP multicast permissions)
fn full_advertisement_scenario() {
    let group = Ipv4Addr::new(224, 0, 1, 105);
    let port = 23400 + fastrand::u16(..2000);
    let listener = join_listener(group, port);

    let mut config = AdvertiseConfig::default();
    config.mode = AdvertiseMode::On;
    config.group_address = IpAddr::V4(group);
    config.group_port = port;
    config.frequency = Duration::from_millis(500);
    config.security_key = Some("secret".to_string());
    config.server_address = Some("192.0.2.10".to_string());
    config.server_port = 8080;

    // Listener-side copy of the digest salt: md5("secret").
    let salt: [u8; 16] = [
        0x5e, 0xbe, 0x22, 0x94, 0xec, 0xd0, 0xe0, 0xf0, 0x8e, 0xab, 0x76, 0x90, 0xd2, 0xa6, 0xee,
        0x69,
    ];

    let mut advertiser = Advertiser::validate(config).expect("config validates");
    advertiser.activate().expect("activation over real multicast");
    assert_eq!(advertiser.state(), AdvertiserState::Active);
    let snapshot = advertiser.snapshot();
    assert!(snapshot.active);
    assert_eq!(snapshot.advertised_url, "http://192.0.2.10:8080");

    // --- First beacon: within one tick window, sequence 1 ---------------
    let first = wait_for(&listener, Duration::from_secs(2), |_| true)
        .expect("first beacon within the first tick window");
    assert_eq!(first.sequence, 1, "initial beacon carries sequence 1");
    assert_eq!(first.status, STATUS_AVAILABLE);
    assert!(first.verify(&salt), "digest verifies against the shared key");
    let manager = first.manager.as_ref().expect("server beacon carries manager fields");
    assert_eq!(manager.address, "192.0.2.10:8080");
    assert_eq!(manager.protocol, "http");
    assert_eq!(manager.host, "192.0.2.10");
    assert_eq!(
        advertiser.instance_id().expect("active advertiser has an identity"),
        first.instance_id
    );
    println!("[OK] first beacon seq=1 within one tick window");

    // --- Periodic re-announcement: sequence strictly increases ----------
    let second = wait_for(&listener, Duration::from_secs(2), |b| b.sequence > 1)
        .expect("periodic beacon after one frequency interval");
    assert_eq!(second.sequence, 2, "sequence increases by one per beacon");
    assert_eq!(second.status, STATUS_AVAILABLE);
    assert!(second.verify(&salt));
    println!("[OK] periodic beacon seq=2");

    // --- Status change beacons before the next periodic send ------------
    advertiser.set_status(STATUS_DRAINING);
    let changed = wait_for(&listener, Duration::from_millis(400), |b| b.status != 200)
        .expect("status change must beacon before the next periodic boundary");
    assert_eq!(changed.status, STATUS_DRAINING);
    assert!(changed.sequence > second.sequence);
    println!("[OK] out-of-cycle beacon fired for the status change");

    // --- Drain: 403 then 410, both status-only, then the group is left --
    advertiser.drain();
    assert_eq!(advertiser.state(), AdvertiserState::Stopped);
    assert!(!advertiser.snapshot().active);

    let tail = drain_beacons(&listener, Instant::now() + Duration::from_secs(1));
    // Periodic server beacons may interleave with the first terminal
    // beacon; the terminal pair itself is status-only (no manager block).
    let terminal: Vec<&ParsedBeacon> = tail.iter().filter(|b| b.manager.is_none()).collect();
    assert_eq!(
        terminal.len(),
        2,
        "drain emits exactly two status-only beacons, got {:?}",
        terminal
    );
    assert_eq!(terminal[0].status, STATUS_DRAINING);
    assert_eq!(terminal[1].status, STATUS_GONE);
    assert!(
        terminal[0].sequence < terminal[1].sequence,
        "terminal beacons continue the sequence series"
    );
    for beacon in &tail {
        assert!(beacon.verify(&salt), "terminal beacons are signed too");
    }
    println!("[OK] drain emitted 403 then 410");

    // --- After drain: silence ------------------------------------------
    let after = drain_beacons(&listener, Instant::now() + Duration::from_secs(1));
    assert!(
        after.is_empty(),
        "no beacons may follow the terminal pair, got {:?}",
        after
    );
    println!("[OK] silence after drain");

    // Sequence monotonicity across everything we observed.
    let mut all = vec![first.sequence, second.sequence, changed.sequence];
    all.extend(tail.iter().map(|b| b.sequence));
    for window in all.windows(2) {
        assert!(window[0] < window[1], "sequence regressed: {:?}", all);
    }
}

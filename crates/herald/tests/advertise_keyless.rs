// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Keyless deployments still sign beacons - over the all-zero salt - so
//! the wire format stays compatible with listeners that do not enforce
//! authentication. Lives in its own binary because the advertiser slot
//! is process-wide.

use herald::{parse_beacon, AdvertiseConfig, AdvertiseMode, Advertiser};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

#[test]
#[ignore] // Ignore by default (requires UDP multicast permissions)
fn keyless_beacons_sign_over_zero_salt() {
    let group = Ipv4Addr::new(224, 0, 1, 106);
    let port = 23400 + fastrand::u16(..2000);

    let raw = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .expect("listener socket creation");
    raw.set_reuse_address(true).expect("listener reuse-address");
    let bind: SocketAddr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    raw.bind(&bind.into()).expect("listener bind");
    let listener: UdpSocket = raw.into();
    listener
        .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
        .expect("listener group join");
    listener
        .set_read_timeout(Some(Duration::from_millis(200)))
        .expect("listener read timeout");

    let mut config = AdvertiseConfig::default();
    config.mode = AdvertiseMode::On;
    config.group_address = IpAddr::V4(group);
    config.group_port = port;
    config.frequency = Duration::from_millis(500);
    config.server_address = Some("192.0.2.11".to_string());

    let mut advertiser = Advertiser::validate(config).expect("config validates");
    advertiser.activate().expect("activation over real multicast");

    let deadline = Instant::now() + Duration::from_secs(2);
    let mut buf = [0u8; 1024];
    let mut verified = false;
    while Instant::now() < deadline {
        if let Ok(len) = listener.recv(&mut buf) {
            let beacon = parse_beacon(&buf[..len]).expect("every datagram parses");
            assert!(
                beacon.verify(&[0u8; 16]),
                "keyless beacons verify against the all-zero salt"
            );
            verified = true;
            break;
        }
    }
    assert!(verified, "no beacon arrived within the deadline");
    advertiser.drain();
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Beacon Construction Benchmark
//!
//! Measures sign + encode for one Server beacon - the per-tick cost of
//! the announcer's hot path (the UDP send itself is excluded).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use herald::beacon::{build_server_beacon, digest, ManagerInfo};

fn bench_sign_and_encode(c: &mut Criterion) {
    let salt = [0x5eu8; 16];
    let date = "Thu, 06 Aug 2026 12:34:56 GMT";
    let instance = "8f0bd2c6-3f31-4e62-9c5e-6b1f2c1f9d10";
    let manager = ManagerInfo {
        address: "192.168.1.20:8080".to_string(),
        url: "http://192.168.1.20:8080".to_string(),
        protocol: "http".to_string(),
        host: "192.168.1.20".to_string(),
    };

    c.bench_function("beacon_sign", |b| {
        let mut sequence = 0i64;
        b.iter(|| {
            sequence += 1;
            black_box(digest::sign(&salt, date, sequence, instance))
        });
    });

    c.bench_function("beacon_sign_and_encode", |b| {
        let mut sequence = 0i64;
        b.iter(|| {
            sequence += 1;
            let digest = digest::sign(&salt, date, sequence, instance);
            black_box(build_server_beacon(
                200, date, sequence, &digest, instance, &manager,
            ))
        });
    });
}

criterion_group!(benches, bench_sign_and_encode);
criterion_main!(benches);

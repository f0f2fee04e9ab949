// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Beacon digest signing.
//!
//! The digest authenticates beacon origin to cooperating listeners; it
//! is not a cryptographically strong channel. Listeners that know the
//! shared key recompute the digest from the beacon's own fields and drop
//! datagrams that do not match.

use md5::{Digest, Md5};

/// Sign one beacon's fields.
///
/// The digest covers the salt bytes, the formatted date string, the
/// decimal sequence number, and the bare instance id, concatenated in
/// that order. Output is always 32 lowercase hex characters.
/// Deterministic and side-effect free; a keyless configuration signs
/// over the all-zero salt.
#[must_use]
pub fn sign(salt: &[u8; 16], date: &str, sequence: i64, instance_id: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(salt);
    hasher.update(date.as_bytes());
    hasher.update(sequence.to_string().as_bytes());
    hasher.update(instance_id.as_bytes());
    let out = hasher.finalize();

    use std::fmt::Write;
    let mut hex = String::with_capacity(32);
    for byte in out.iter() {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

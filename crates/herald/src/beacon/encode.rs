// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Wire encoding for advertisement datagrams.
//!
//! Beacons use a minimal HTTP-response-like framing so generic listeners
//! can parse them with a plain header scanner: one status line, a
//! handful of headers, and a blank-line terminator. Two kinds exist on
//! the wire: the full Server beacon sent periodically, and the
//! Status-only beacon sent at state transitions.

use super::reason;
use std::fmt::Write;

/// Manager identity echoed in full Server beacons.
///
/// Listeners use these fields to contact the announcing instance; the
/// Status-only beacon omits them.
#[derive(Debug, Clone)]
pub struct ManagerInfo {
    /// `host:port` listeners should contact.
    pub address: String,
    /// Management URL.
    pub url: String,
    /// URL scheme (`http`, `https`, ...).
    pub protocol: String,
    /// Advertised hostname.
    pub host: String,
}

/// Build a full Server beacon (periodic announcement).
#[must_use]
pub fn build_server_beacon(
    status: u16,
    date: &str,
    sequence: i64,
    digest: &str,
    instance_id: &str,
    manager: &ManagerInfo,
) -> Vec<u8> {
    let mut out = String::with_capacity(320);
    push_common(&mut out, status, date, sequence, digest, instance_id);
    let _ = write!(out, "X-Manager-Address: {}\r\n", manager.address);
    let _ = write!(out, "X-Manager-Url: {}\r\n", manager.url);
    let _ = write!(out, "X-Manager-Protocol: {}\r\n", manager.protocol);
    let _ = write!(out, "X-Manager-Host: {}\r\n", manager.host);
    out.push_str("\r\n");
    out.into_bytes()
}

/// Build a Status-only beacon (state-transition announcement).
#[must_use]
pub fn build_status_beacon(
    status: u16,
    date: &str,
    sequence: i64,
    digest: &str,
    instance_id: &str,
) -> Vec<u8> {
    let mut out = String::with_capacity(192);
    push_common(&mut out, status, date, sequence, digest, instance_id);
    out.push_str("\r\n");
    out.into_bytes()
}

/// Headers common to both beacon kinds.
fn push_common(
    out: &mut String,
    status: u16,
    date: &str,
    sequence: i64,
    digest: &str,
    instance_id: &str,
) {
    let _ = write!(out, "HTTP/1.0 {} {}\r\n", status, reason(status));
    let _ = write!(out, "Date: {}\r\n", date);
    let _ = write!(out, "Sequence: {}\r\n", sequence);
    let _ = write!(out, "Digest: {}\r\n", digest);
    let _ = write!(out, "Server: {}\r\n", instance_id);
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Beacon construction and parsing: status codes, digest signing, wire
//! encoding, and the header scanner used by listeners.

pub mod digest;
mod encode;
mod parse;

pub use encode::{build_server_beacon, build_status_beacon, ManagerInfo};
pub use parse::{parse_beacon, ParseError, ParsedBeacon};

/// Status code for an instance accepting traffic.
pub const STATUS_AVAILABLE: u16 = 200;

/// Status code announced while draining before shutdown.
pub const STATUS_DRAINING: u16 = 403;

/// Terminal status code announced just before leaving the group.
pub const STATUS_GONE: u16 = 410;

/// Reason phrase for a beacon status line.
#[must_use]
pub fn reason(status: u16) -> &'static str {
    match status {
        STATUS_AVAILABLE => "OK",
        STATUS_DRAINING => "FORBIDDEN",
        STATUS_GONE => "GONE",
        _ => "UNKNOWN",
    }
}

/// RFC-822 style GMT date used in the `Date:` header and signed into the
/// digest.
#[must_use]
pub fn http_date_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

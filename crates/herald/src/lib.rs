// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! # herald - signed multicast advertisement broadcaster
//!
//! A server process embeds herald to periodically announce its address
//! and health status over a UDP multicast group, so management consoles
//! and load-balancing front-ends can discover and monitor fleet members
//! without a central registry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use herald::{Advertiser, AdvertiseConfig, AdvertiseMode};
//!
//! fn main() -> herald::Result<()> {
//!     let mut config = AdvertiseConfig::default();
//!     config.mode = AdvertiseMode::On;
//!     config.security_key = Some("secret".to_string());
//!     config.server_port = 8080;
//!
//!     // First pass: the configuration may still be discarded.
//!     let mut advertiser = Advertiser::validate(config)?;
//!     // Second pass: the configuration took effect.
//!     advertiser.activate()?;
//!
//!     // ... serve traffic; on shutdown:
//!     advertiser.drain();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                        Host process                          |
//! |   validate -> activate -> set_status -> drain                |
//! +--------------------------------------------------------------+
//! |                     Lifecycle Manager                        |
//! |   one advertiser per process | ordered teardown | snapshot   |
//! +--------------------------------------------------------------+
//! |                    Broadcast Scheduler                       |
//! |   tick thread | status fast path | cooperative stop          |
//! +--------------------------------------------------------------+
//! |     Beacon (encode + digest)     |     Multicast Channel     |
//! |   HTTP-like framing, keyed MD5   |   join / hop limit / send |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Wire format
//!
//! One UDP datagram per beacon, HTTP-response-like framing terminated by
//! a blank line. Periodic Server beacons carry the `X-Manager-*` contact
//! fields; Status-only beacons (sent at state transitions, e.g. 403
//! draining / 410 gone during shutdown) carry just the signed core.
//!
//! Nothing herald does is fatal to the host: configuration errors abort
//! one configuration, transport failures disable broadcasting for the
//! process and surface through [`Advertiser::snapshot`].

/// Broadcast scheduler (tick thread, stop handshake).
pub mod announcer;
/// Beacon construction and parsing (status codes, digest, wire format).
pub mod beacon;
/// Advertisement configuration: defaults, validation, directive parsing.
pub mod config;
/// Error taxonomy for validation, activation and transport.
pub mod error;
/// Per-process identity (digest salt, instance id).
pub mod identity;
/// Advertiser lifecycle (validate/activate/drain, diagnostics snapshot).
pub mod lifecycle;
/// Wrap-safe beacon sequence numbers.
pub mod sequence;
/// UDP multicast transport.
pub mod transport;

pub use beacon::{
    build_server_beacon, build_status_beacon, parse_beacon, ManagerInfo, ParseError, ParsedBeacon,
    STATUS_AVAILABLE, STATUS_DRAINING, STATUS_GONE,
};
pub use config::{
    parse_advertise_directive, AdvertiseConfig, AdvertiseMode, DEFAULT_FREQUENCY,
    DEFAULT_GROUP_ADDRESS, DEFAULT_GROUP_PORT, DEFAULT_HOP_LIMIT,
};
pub use error::{Error, Result};
pub use identity::Identity;
pub use lifecycle::{AdvertiseSnapshot, Advertiser, AdvertiserState};
pub use transport::{ChannelOptions, MulticastChannel};

/// herald version string.
pub const VERSION: &str = "0.3.2";

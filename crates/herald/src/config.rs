// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Advertisement configuration - single source of truth.
//!
//! Defaults live here as constants; everything else in the crate takes a
//! validated [`AdvertiseConfig`] and never re-derives them.
//!
//! # Environment Variables
//!
//! `HERALD_HOPS=<1-255>` - override the configured multicast hop limit
//! `HERALD_MULTICAST_IF=<ipv4>` - force the interface used for the group
//! join (testing/debugging; see the transport module)

use crate::error::{Error, Result};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default advertisement multicast group.
///
/// 224.0.1.105 is the group registered for server advertisement by the
/// original protocol; listeners ship with the same default.
pub const DEFAULT_GROUP_ADDRESS: Ipv4Addr = Ipv4Addr::new(224, 0, 1, 105);

/// Default advertisement port.
pub const DEFAULT_GROUP_PORT: u16 = 23364;

/// Default inter-beacon interval.
pub const DEFAULT_FREQUENCY: Duration = Duration::from_secs(10);

/// Default multicast hop limit for beacons.
///
/// 10 hops reaches listeners across routed site networks without
/// leaking advertisement traffic to the wider internet.
pub const DEFAULT_HOP_LIMIT: u32 = 10;

/// Whether broadcasting is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseMode {
    /// No beacons; validation still applies.
    Off,
    /// Periodic beacons to the configured group.
    On,
}

/// Advertisement configuration record.
///
/// Provided once by the host and immutable for the process lifetime
/// after validation. Field defaults match the wire protocol's registered
/// group and port.
#[derive(Debug, Clone)]
pub struct AdvertiseConfig {
    /// Whether broadcasting is enabled.
    pub mode: AdvertiseMode,
    /// Multicast destination address (IPv4 multicast).
    pub group_address: IpAddr,
    /// Multicast destination port.
    pub group_port: u16,
    /// Local interface address to bind for receive/send symmetry.
    pub bind_address: IpAddr,
    /// Local bind port; 0 means "use the group port".
    pub bind_port: u16,
    /// Nominal inter-beacon interval; must be greater than zero.
    /// Fractional seconds are honored down to the tick resolution.
    pub frequency: Duration,
    /// Optional shared secret. Absent: beacons are still signed, over an
    /// all-zero salt, so the wire format stays listener-compatible.
    pub security_key: Option<String>,
    /// Management URL override echoed in Server beacons. Absent: derived
    /// from protocol, advertised host and port.
    pub manager_url: Option<String>,
    /// URL scheme echoed in Server beacons.
    pub manager_protocol: String,
    /// Advertised host. `None` or an unspecified address means "derive
    /// from the primary interface" - a beacon carrying 0.0.0.0 would be
    /// meaningless to remote listeners.
    pub server_address: Option<String>,
    /// Advertised port.
    pub server_port: u16,
    /// Multicast hop limit (TTL), 1-255.
    pub hop_limit: u32,
    /// Fall back to loopback-only delivery when the group join fails.
    /// Off by default: the fallback silently narrows multi-host
    /// discovery to a single host, so it must be requested explicitly.
    pub loopback_fallback: bool,
}

impl Default for AdvertiseConfig {
    fn default() -> Self {
        Self {
            mode: AdvertiseMode::Off,
            group_address: IpAddr::V4(DEFAULT_GROUP_ADDRESS),
            group_port: DEFAULT_GROUP_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bind_port: 0,
            frequency: DEFAULT_FREQUENCY,
            security_key: None,
            manager_url: None,
            manager_protocol: "http".to_string(),
            server_address: None,
            server_port: 80,
            hop_limit: DEFAULT_HOP_LIMIT,
            loopback_fallback: false,
        }
    }
}

impl AdvertiseConfig {
    /// Check the record for syntactic and semantic validity.
    ///
    /// Runs during the host's first configuration pass; a failure aborts
    /// only this configuration, never the process.
    pub fn validate(&self) -> Result<()> {
        match self.group_address {
            IpAddr::V4(group) => {
                if !group.is_multicast() {
                    return Err(Error::InvalidGroup(format!(
                        "{} is not a multicast address",
                        group
                    )));
                }
            }
            IpAddr::V6(group) => {
                return Err(Error::InvalidGroup(format!(
                    "IPv6 group {} is not supported",
                    group
                )));
            }
        }
        if self.group_port == 0 {
            return Err(Error::InvalidGroup("group port must be non-zero".to_string()));
        }
        if let IpAddr::V6(bind) = self.bind_address {
            return Err(Error::InvalidBind(format!(
                "IPv6 bind address {} is not supported",
                bind
            )));
        }
        if self.frequency.is_zero() {
            return Err(Error::InvalidFrequency);
        }
        if self.hop_limit == 0 || self.hop_limit > 255 {
            return Err(Error::InvalidHopLimit(self.hop_limit));
        }
        Ok(())
    }

    /// Effective hop limit: `HERALD_HOPS` wins over the configured value.
    #[must_use]
    pub fn effective_hop_limit(&self) -> u32 {
        if let Ok(raw) = std::env::var("HERALD_HOPS") {
            if let Ok(hops) = raw.parse::<u32>() {
                if hops >= 1 && hops <= 255 {
                    log::debug!("[advertise] HERALD_HOPS override: {}", hops);
                    return hops;
                }
            }
            log::debug!("[advertise] ignoring invalid HERALD_HOPS='{}'", raw);
        }
        self.hop_limit
    }
}

/// Parse the host-facing `on|off [address[:port]]` directive form.
///
/// Returns the mode plus the optional group address/port override. The
/// bare forms `on` and `off` leave the configured group untouched.
pub fn parse_advertise_directive(args: &str) -> Result<(AdvertiseMode, Option<IpAddr>, Option<u16>)> {
    let mut parts = args.split_whitespace();
    let mode = match parts.next() {
        Some(word) if word.eq_ignore_ascii_case("on") => AdvertiseMode::On,
        Some(word) if word.eq_ignore_ascii_case("off") => AdvertiseMode::Off,
        other => {
            return Err(Error::InvalidGroup(format!(
                "directive must start with on/off, got {:?}",
                other.unwrap_or("")
            )))
        }
    };

    let Some(target) = parts.next() else {
        return Ok((mode, None, None));
    };
    if parts.next().is_some() {
        return Err(Error::InvalidGroup(format!(
            "trailing tokens after address in {:?}",
            args
        )));
    }

    // `address` or `address:port`.
    if let Some((addr, port)) = target.rsplit_once(':') {
        let address = addr
            .parse::<IpAddr>()
            .map_err(|err| Error::InvalidGroup(format!("{}: {}", addr, err)))?;
        let port = port
            .parse::<u16>()
            .map_err(|err| Error::InvalidGroup(format!("port {}: {}", port, err)))?;
        Ok((mode, Some(address), Some(port)))
    } else {
        let address = target
            .parse::<IpAddr>()
            .map_err(|err| Error::InvalidGroup(format!("{}: {}", target, err)))?;
        Ok((mode, Some(address), None))
    }
}

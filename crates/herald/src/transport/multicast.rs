// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Multicast channel: socket ownership, group membership, hop limit.
//!
//! One channel per advertiser. The channel owns the only socket in the
//! crate; the announcer thread holds it through an `Arc` for sends and
//! the lifecycle manager closes it during drain.

use crate::error::Error;
use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

/// Options resolved from a validated `AdvertiseConfig`.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Multicast destination.
    pub group: SocketAddrV4,
    /// Local bind address.
    pub bind_address: Ipv4Addr,
    /// Local bind port; 0 means "use the group port".
    pub bind_port: u16,
    /// Multicast hop limit (TTL).
    pub hop_limit: u32,
    /// Continue loopback-only when the group join fails.
    pub loopback_fallback: bool,
}

/// UDP multicast channel owning the advertisement socket.
///
/// `leave()` clears the socket slot; sends afterwards report
/// `NotConnected`. Leaving twice is safe.
pub struct MulticastChannel {
    group: SocketAddrV4,
    /// Interface the group was joined on (mirrors the join for leave).
    iface: Ipv4Addr,
    /// False when running in loopback-only fallback (no membership).
    member: bool,
    socket: Mutex<Option<UdpSocket>>,
}

impl MulticastChannel {
    /// Create the socket, bind it, and join the advertisement group.
    ///
    /// Join failure with `loopback_fallback` set keeps the channel alive
    /// for same-host listeners via loopback delivery. A hop-limit
    /// failure after a successful join leaves the group and closes the
    /// socket before reporting: activation either fully succeeds or
    /// releases everything it took.
    pub fn join(opts: &ChannelOptions) -> Result<Self, Error> {
        let raw = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        raw.set_reuse_address(true)?;

        let bind_port = if opts.bind_port == 0 {
            opts.group.port()
        } else {
            opts.bind_port
        };
        let bind_addr = SocketAddr::from((opts.bind_address, bind_port));
        raw.bind(&bind_addr.into())?;
        let socket: UdpSocket = raw.into();

        let iface = join_interface();
        let member = match socket.join_multicast_v4(opts.group.ip(), &iface) {
            Ok(()) => {
                log::debug!(
                    "[multicast] joined {} (bind {}, iface {})",
                    opts.group,
                    bind_addr,
                    iface
                );
                true
            }
            Err(err) if opts.loopback_fallback => {
                log::warn!(
                    "[multicast] join {} failed ({}), continuing loopback-only",
                    opts.group,
                    err
                );
                false
            }
            Err(err) => {
                log::warn!("[multicast] join {} failed: {}", opts.group, err);
                return Err(Error::Join(err));
            }
        };

        // Loopback delivery keeps same-host listeners working; in
        // fallback mode it is the only delivery path.
        socket.set_multicast_loop_v4(true)?;

        if let Err(err) = socket.set_multicast_ttl_v4(opts.hop_limit) {
            // Must not leak the membership on this path: the platform
            // can refuse hop-limit changes right after a join, and the
            // caller expects either a working channel or nothing.
            if member {
                let _ = socket.leave_multicast_v4(opts.group.ip(), &iface);
            }
            log::warn!(
                "[multicast] hop limit {} rejected: {}",
                opts.hop_limit,
                err
            );
            return Err(Error::HopLimit(err));
        }

        Ok(Self {
            group: opts.group,
            iface,
            member,
            socket: Mutex::new(Some(socket)),
        })
    }

    /// Best-effort datagram send to the group.
    pub fn send(&self, payload: &[u8]) -> io::Result<usize> {
        let guard = self.socket.lock();
        match guard.as_ref() {
            Some(socket) => socket.send_to(payload, SocketAddr::V4(self.group)),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "multicast channel closed",
            )),
        }
    }

    /// Leave the group and close the socket. Safe to call repeatedly and
    /// on a channel that never completed its join.
    pub fn leave(&self) {
        let mut guard = self.socket.lock();
        if let Some(socket) = guard.take() {
            if self.member {
                if let Err(err) = socket.leave_multicast_v4(self.group.ip(), &self.iface) {
                    log::debug!("[multicast] leave {} failed: {}", self.group, err);
                }
            }
            log::debug!("[multicast] channel closed (group {})", self.group);
        }
    }

    /// Whether the socket is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.socket.lock().is_some()
    }

    /// Whether the group membership is in effect (false in the
    /// loopback-only fallback).
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.member
    }

    /// Destination group address.
    #[must_use]
    pub fn group(&self) -> SocketAddrV4 {
        self.group
    }
}

/// Interface for the group join; `HERALD_MULTICAST_IF` overrides the
/// unspecified default (testing/debugging).
fn join_interface() -> Ipv4Addr {
    if let Ok(raw) = std::env::var("HERALD_MULTICAST_IF") {
        if let Ok(addr) = raw.parse::<Ipv4Addr>() {
            log::debug!("[multicast] HERALD_MULTICAST_IF override: {}", addr);
            return addr;
        }
        log::debug!("[multicast] ignoring invalid HERALD_MULTICAST_IF='{}'", raw);
    }
    Ipv4Addr::UNSPECIFIED
}

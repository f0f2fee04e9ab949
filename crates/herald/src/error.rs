// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Errors returned by advertisement validation, activation and transport.
//!
//! Nothing in this crate is fatal to the hosting process: configuration
//! errors abort only the offending configuration, transport and resource
//! errors disable broadcasting for the process and are recorded for the
//! diagnostics snapshot.

use std::fmt;
use std::io;

/// Errors returned by herald operations.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Multicast group address is missing, unparseable, or not an IPv4
    /// multicast address.
    InvalidGroup(String),
    /// Local bind address is unparseable or not IPv4.
    InvalidBind(String),
    /// Advertise frequency must be greater than zero.
    InvalidFrequency,
    /// Multicast hop limit out of range (1-255).
    InvalidHopLimit(u32),
    /// Another advertiser is already registered in this process.
    AlreadyActive,
    /// Operation not valid in the current lifecycle state.
    InvalidState(&'static str),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Joining the multicast group failed (and no loopback fallback was
    /// requested, or the fallback failed too).
    Join(io::Error),
    /// Setting the multicast hop limit failed after a successful join.
    /// The group has been left and the socket closed.
    HopLimit(io::Error),
    /// Socket setup or send I/O failure.
    Io(io::Error),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// Spawning the announcer thread failed.
    Spawn(io::Error),
}

/// Result alias for herald operations.
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidGroup(detail) => write!(f, "invalid multicast group: {}", detail),
            Error::InvalidBind(detail) => write!(f, "invalid bind address: {}", detail),
            Error::InvalidFrequency => write!(f, "advertise frequency must be greater than zero"),
            Error::InvalidHopLimit(hops) => {
                write!(f, "multicast hop limit {} out of range (1-255)", hops)
            }
            Error::AlreadyActive => {
                write!(f, "an advertiser is already registered in this process")
            }
            Error::InvalidState(detail) => write!(f, "invalid lifecycle state: {}", detail),
            Error::Join(err) => write!(f, "multicast group join failed: {}", err),
            Error::HopLimit(err) => write!(f, "multicast hop limit setup failed: {}", err),
            Error::Io(err) => write!(f, "socket I/O failed: {}", err),
            Error::Spawn(err) => write!(f, "announcer thread spawn failed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Join(err) | Error::HopLimit(err) | Error::Io(err) | Error::Spawn(err) => {
                Some(err)
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

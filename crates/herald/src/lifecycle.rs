// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Advertiser lifecycle: the two-phase validate/activate cycle, ordered
//! drain, and the diagnostics snapshot.
//!
//! The host's configuration cycle runs in two passes: a validation pass
//! whose result may still be discarded, and a second pass that takes
//! effect. [`Advertiser::validate`] covers the first (checks plus the
//! one-per-process slot reservation, no sockets or threads), and
//! [`Advertiser::activate`] the second (identity, channel join,
//! scheduler spawn). Teardown is layered the same way:
//! [`Advertiser::drain`] is the configuration-level teardown and `Drop`
//! the process-exit safety net, disarmed once a drain has run.

use crate::announcer::{Announcer, Control};
use crate::beacon::{self, digest, ManagerInfo};
use crate::config::{AdvertiseConfig, AdvertiseMode};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::transport::{ChannelOptions, MulticastChannel};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One advertiser per process. Validation reserves the slot; teardown
/// releases it.
static ADVERTISER_SLOT: AtomicBool = AtomicBool::new(false);

/// Lifecycle states of the broadcast scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiserState {
    /// Validated, not yet activated.
    Idle,
    /// Activation in progress (channel join).
    Joining,
    /// Background scheduler running, beacons flowing.
    Active,
    /// Terminal beacons being emitted.
    Draining,
    /// No beacons; either never started, disabled by a failure, or
    /// drained.
    Stopped,
}

/// Read-only diagnostics view of one advertiser.
///
/// Built for a diagnostics page, not a control channel: every field is a
/// copy taken at call time.
#[derive(Debug, Clone)]
pub struct AdvertiseSnapshot {
    /// Whether beacons are currently flowing.
    pub active: bool,
    /// Current lifecycle state.
    pub state: AdvertiserState,
    /// Group/port in use (or configured, when inactive).
    pub group: SocketAddr,
    /// URL advertised in Server beacons; empty until activation.
    pub advertised_url: String,
    /// Configured inter-beacon interval.
    pub frequency: Duration,
    /// Why advertising is disabled, when it is.
    pub last_error: Option<String>,
}

/// A validated advertisement configuration and its running state.
///
/// Owns the identity, the multicast channel and the scheduler; no
/// ambient globals beyond the one-per-process slot guard.
pub struct Advertiser {
    config: AdvertiseConfig,
    state: AdvertiserState,
    control: Arc<Control>,
    identity: Option<Identity>,
    manager: Option<ManagerInfo>,
    channel: Option<Arc<MulticastChannel>>,
    announcer: Option<Announcer>,
    last_error: Option<String>,
    drained: bool,
    slot_held: bool,
}

impl Advertiser {
    /// First configuration pass: check the record and reserve the
    /// process-wide advertiser slot.
    ///
    /// No sockets or threads are created; dropping the handle releases
    /// the slot, so a configuration that never takes effect costs
    /// nothing. A second advertiser in the same process is rejected here
    /// and leaves the first one untouched.
    pub fn validate(config: AdvertiseConfig) -> Result<Self> {
        config.validate()?;
        if ADVERTISER_SLOT
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::AlreadyActive);
        }
        log::debug!(
            "[advertise] configuration validated (mode {:?}, group {}:{})",
            config.mode,
            config.group_address,
            config.group_port
        );
        Ok(Self {
            config,
            state: AdvertiserState::Idle,
            control: Arc::new(Control::new()),
            identity: None,
            manager: None,
            channel: None,
            announcer: None,
            last_error: None,
            drained: false,
            slot_held: true,
        })
    }

    /// Second configuration pass: derive identity, resolve the
    /// advertised address, join the group and start the scheduler.
    ///
    /// A failure here disables advertising for this process and records
    /// the reason for diagnostics. The host may ignore the returned
    /// error - nothing in this crate is fatal to its primary workload.
    pub fn activate(&mut self) -> Result<()> {
        if self.state != AdvertiserState::Idle {
            return Err(Error::InvalidState("activate requires an idle advertiser"));
        }
        if self.config.mode == AdvertiseMode::Off {
            self.state = AdvertiserState::Stopped;
            log::info!("[advertise] mode off, broadcasting disabled");
            return Ok(());
        }

        self.state = AdvertiserState::Joining;
        match self.try_activate() {
            Ok(()) => {
                self.state = AdvertiserState::Active;
                Ok(())
            }
            Err(err) => {
                self.state = AdvertiserState::Stopped;
                self.last_error = Some(err.to_string());
                if let Some(channel) = self.channel.take() {
                    channel.leave();
                }
                match &err {
                    // Thread spawn failure points at environment
                    // exhaustion; everything else is a transport problem
                    // local to discovery.
                    Error::Spawn(cause) => {
                        log::error!("[advertise] broadcasting disabled: {}", cause);
                    }
                    other => {
                        log::warn!("[advertise] broadcasting disabled: {}", other);
                    }
                }
                Err(err)
            }
        }
    }

    fn try_activate(&mut self) -> Result<()> {
        let identity = Identity::derive(self.config.security_key.as_deref());
        let manager = resolve_manager(&self.config);

        let group = match self.config.group_address {
            IpAddr::V4(ip) => SocketAddrV4::new(ip, self.config.group_port),
            IpAddr::V6(ip) => return Err(Error::InvalidGroup(ip.to_string())),
        };
        let bind_address = match self.config.bind_address {
            IpAddr::V4(ip) => ip,
            IpAddr::V6(ip) => return Err(Error::InvalidBind(ip.to_string())),
        };
        let opts = ChannelOptions {
            group,
            bind_address,
            bind_port: self.config.bind_port,
            hop_limit: self.config.effective_hop_limit(),
            loopback_fallback: self.config.loopback_fallback,
        };
        let channel = Arc::new(MulticastChannel::join(&opts)?);
        // Stored before the spawn so the activation error path can leave
        // the group it just joined.
        self.channel = Some(Arc::clone(&channel));

        let announcer = Announcer::spawn(
            channel,
            identity.clone(),
            manager.clone(),
            self.config.frequency,
            Arc::clone(&self.control),
        )
        .map_err(Error::Spawn)?;

        log::info!(
            "[advertise] active on {} every {:?} (instance {})",
            group,
            self.config.frequency,
            identity.instance_id()
        );
        self.identity = Some(identity);
        self.manager = Some(manager);
        self.announcer = Some(announcer);
        Ok(())
    }

    /// Record a server status change (HTTP-style code).
    ///
    /// Call-in safe from any thread; the scheduler beacons the new
    /// status before the next periodic send would have fired.
    pub fn set_status(&self, status: u16) {
        self.control.set_status(status);
    }

    /// Configuration-level teardown: announce draining (403), stop the
    /// scheduler, announce departure (410), leave the group - in that
    /// order.
    ///
    /// Idempotent, and disarms the process-exit safety net in `Drop`.
    /// The wait for the scheduler is bounded; a wedged tick thread
    /// cannot hang host shutdown.
    pub fn drain(&mut self) {
        if self.drained {
            return;
        }
        self.drained = true;

        if self.state == AdvertiserState::Active {
            self.state = AdvertiserState::Draining;
            self.control.set_status(beacon::STATUS_DRAINING);
            self.send_status_beacon(beacon::STATUS_DRAINING);
            if let Some(announcer) = self.announcer.take() {
                let _ = announcer.stop();
            }
            self.send_status_beacon(beacon::STATUS_GONE);
            log::info!("[advertise] drained, leaving {}", self.group_addr());
        }
        if let Some(channel) = self.channel.take() {
            channel.leave();
        }
        self.state = AdvertiserState::Stopped;
        self.release_slot();
    }

    /// Point-in-time diagnostics view.
    #[must_use]
    pub fn snapshot(&self) -> AdvertiseSnapshot {
        AdvertiseSnapshot {
            active: self.state == AdvertiserState::Active,
            state: self.state,
            group: self.group_addr(),
            advertised_url: self
                .manager
                .as_ref()
                .map(|manager| manager.url.clone())
                .unwrap_or_default(),
            frequency: self.config.frequency,
            last_error: self.last_error.clone(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AdvertiserState {
        self.state
    }

    /// Instance id beacons carry; `None` before activation.
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.identity.as_ref().map(Identity::instance_id)
    }

    fn group_addr(&self) -> SocketAddr {
        SocketAddr::new(self.config.group_address, self.config.group_port)
    }

    /// Send one Status-only beacon from the draining thread.
    fn send_status_beacon(&self, status: u16) {
        let (Some(identity), Some(channel)) = (&self.identity, &self.channel) else {
            return;
        };
        let sequence = self.control.sequence.next();
        let date = beacon::http_date_now();
        let digest = digest::sign(identity.salt(), &date, sequence, identity.instance_id());
        let payload =
            beacon::build_status_beacon(status, &date, sequence, &digest, identity.instance_id());
        if let Err(err) = channel.send(&payload) {
            log::debug!("[advertise] status beacon {} failed: {}", status, err);
        }
    }

    fn release_slot(&mut self) {
        if self.slot_held {
            self.slot_held = false;
            ADVERTISER_SLOT.store(false, Ordering::Release);
        }
    }
}

impl Drop for Advertiser {
    /// Process-exit safety net; a completed `drain` disarms it.
    fn drop(&mut self) {
        if self.drained {
            self.release_slot();
        } else {
            self.drain();
        }
    }
}

/// Resolve the identity fields echoed in Server beacons.
///
/// An explicit `server_address` wins; absent or unspecified addresses
/// fall back to the primary interface IP - a beacon carrying 0.0.0.0
/// would be meaningless to remote listeners.
fn resolve_manager(config: &AdvertiseConfig) -> ManagerInfo {
    let host = advertised_host(config);
    let address = format!("{}:{}", host, config.server_port);
    let protocol = config.manager_protocol.clone();
    let url = config
        .manager_url
        .clone()
        .unwrap_or_else(|| format!("{}://{}", protocol, address));
    ManagerInfo {
        address,
        url,
        protocol,
        host,
    }
}

fn advertised_host(config: &AdvertiseConfig) -> String {
    if let Some(explicit) = &config.server_address {
        let unspecified = explicit
            .parse::<IpAddr>()
            .map(|ip| ip.is_unspecified())
            .unwrap_or(false);
        if !unspecified && !explicit.is_empty() {
            return explicit.clone();
        }
    }
    match local_ip_address::local_ip() {
        Ok(ip) => ip.to_string(),
        Err(err) => {
            log::debug!(
                "[advertise] primary interface lookup failed ({}), advertising loopback",
                err
            );
            Ipv4Addr::LOCALHOST.to_string()
        }
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Broadcast scheduler: the periodic announcer thread.
//!
//! One dedicated background thread per process runs the tick loop. Host
//! call-ins (status changes, shutdown) only store into the shared
//! atomics; the tick thread is the sole mutator of beacon state and the
//! sole user of the channel's send path while active, so the hot path
//! needs no locks.

use crate::beacon::{self, digest, ManagerInfo};
use crate::identity::Identity;
use crate::sequence::SequenceCounter;
use crate::transport::MulticastChannel;
use crossbeam::channel::{bounded, Receiver, Sender};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Tick resolution of the announcer loop.
///
/// The loop wakes at this rate to check the stop flag, the status-change
/// flag, and the accumulated interval. A status change is therefore
/// beaconed at most one resolution quantum after it is flagged.
pub const TICK_RESOLUTION: Duration = Duration::from_millis(100);

/// How long drain waits for the tick thread to acknowledge the stop
/// flag before proceeding with teardown anyway.
pub(crate) const STOP_WAIT: Duration = Duration::from_millis(500);

/// Flags shared between host call-ins and the tick thread.
#[derive(Debug)]
pub(crate) struct Control {
    /// Cooperative stop signal; observed at the next wake.
    pub(crate) stop: AtomicBool,
    /// Current HTTP-style status code.
    pub(crate) status: AtomicU16,
    /// Set when `status` changed since the last beacon.
    pub(crate) status_dirty: AtomicBool,
    /// Beacon sequence numbers; atomic so drain-time terminal beacons
    /// continue the same strictly-increasing series.
    pub(crate) sequence: SequenceCounter,
}

impl Control {
    pub(crate) fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            status: AtomicU16::new(beacon::STATUS_AVAILABLE),
            status_dirty: AtomicBool::new(false),
            sequence: SequenceCounter::new(),
        }
    }

    /// Record a status change; the tick thread beacons the new status
    /// before the next periodic send would have fired.
    pub(crate) fn set_status(&self, status: u16) {
        let previous = self.status.swap(status, Ordering::AcqRel);
        if previous != status {
            self.status_dirty.store(true, Ordering::Release);
        }
    }
}

/// Periodic announcer owning the background tick thread.
pub(crate) struct Announcer {
    handle: Option<JoinHandle<()>>,
    control: Arc<Control>,
    done_rx: Receiver<()>,
}

impl Announcer {
    /// Spawn the tick thread.
    ///
    /// The first beacon goes out on the first tick regardless of the
    /// configured frequency. Spawn failure is a hard activation failure:
    /// the caller disables broadcasting and reports it.
    pub(crate) fn spawn(
        channel: Arc<MulticastChannel>,
        identity: Identity,
        manager: ManagerInfo,
        frequency: Duration,
        control: Arc<Control>,
    ) -> io::Result<Self> {
        let (done_tx, done_rx) = bounded(1);
        let thread_control = Arc::clone(&control);
        let handle = thread::Builder::new()
            .name("herald-announcer".to_string())
            .spawn(move || {
                announcer_loop(channel, identity, manager, frequency, thread_control, done_tx);
            })?;
        Ok(Self {
            handle: Some(handle),
            control,
            done_rx,
        })
    }

    /// Raise the stop flag and wait (bounded) for the thread's
    /// acknowledgment on the done-channel.
    ///
    /// Returns whether the acknowledgment arrived in time; either way
    /// the caller proceeds with teardown, so a wedged thread cannot hang
    /// host shutdown.
    pub(crate) fn stop(mut self) -> bool {
        self.control.stop.store(true, Ordering::Release);
        let acked = self.done_rx.recv_timeout(STOP_WAIT).is_ok();
        if let Some(handle) = self.handle.take() {
            if acked {
                let _ = handle.join();
            } else {
                // Detach; the thread exits at its next wake.
                log::warn!("[announcer] tick thread missed the stop deadline, detaching");
            }
        }
        acked
    }
}

impl Drop for Announcer {
    fn drop(&mut self) {
        self.control.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Tick loop (runs on the announcer thread).
///
/// Sleeps one resolution quantum at a time and accumulates elapsed time;
/// a beacon goes out when the accumulator reaches the frequency, when
/// the status-change flag is set, or on the first tick. Send failures
/// keep the send condition armed so the next tick retries.
fn announcer_loop(
    channel: Arc<MulticastChannel>,
    identity: Identity,
    manager: ManagerInfo,
    frequency: Duration,
    control: Arc<Control>,
    done_tx: Sender<()>,
) {
    log::debug!(
        "[announcer] started (group {}, frequency {:?}, tick {:?})",
        channel.group(),
        frequency,
        TICK_RESOLUTION
    );

    let mut elapsed = Duration::ZERO;
    let mut force = true; // initial beacon goes out immediately
    let mut last_sent_at: Option<Instant> = None;

    loop {
        if control.stop.load(Ordering::Acquire) {
            break;
        }

        let dirty = control.status_dirty.swap(false, Ordering::AcqRel);
        if force || dirty || elapsed >= frequency {
            let status = control.status.load(Ordering::Acquire);
            let sequence = control.sequence.next();
            let date = beacon::http_date_now();
            let digest = digest::sign(identity.salt(), &date, sequence, identity.instance_id());
            let payload = beacon::build_server_beacon(
                status,
                &date,
                sequence,
                &digest,
                identity.instance_id(),
                &manager,
            );

            match channel.send(&payload) {
                Ok(len) => {
                    last_sent_at = Some(Instant::now());
                    elapsed = Duration::ZERO;
                    force = false;
                    log::debug!(
                        "[announcer] sent beacon seq={} status={} len={}",
                        sequence,
                        status,
                        len
                    );
                }
                Err(err) => {
                    // Best effort; retry on the next tick.
                    force = true;
                    log::debug!("[announcer] send failed seq={}: {}", sequence, err);
                }
            }
        }

        thread::sleep(TICK_RESOLUTION);
        elapsed += TICK_RESOLUTION;
    }

    log::debug!(
        "[announcer] stop flag observed, exiting (last send {:?} ago)",
        last_sent_at.map(|t| t.elapsed())
    );
    let _ = done_tx.send(());
}

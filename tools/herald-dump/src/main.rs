// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! herald-dump - listen for advertisement beacons and dump them live
//!
//! Joins the advertisement multicast group and prints every beacon as it
//! arrives. With `--key`, recomputes each beacon's digest and flags
//! forgeries; useful for checking that a fleet member is announcing and
//! that listeners share its key.

use clap::Parser;
use colored::Colorize;
use herald::{parse_beacon, Identity, ParsedBeacon, STATUS_AVAILABLE, STATUS_DRAINING, STATUS_GONE};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Listen for herald advertisement beacons and dump them live
#[derive(Parser, Debug)]
#[command(name = "herald-dump")]
#[command(version)]
#[command(about = "Dump herald advertisement beacons (status, sequence, manager fields)")]
struct Args {
    /// Multicast group to join
    #[arg(short, long, default_value = "224.0.1.105")]
    group: Ipv4Addr,

    /// Advertisement port
    #[arg(short, long, default_value = "23364")]
    port: u16,

    /// Shared security key for digest verification
    #[arg(short, long)]
    key: Option<String>,

    /// Stop after this many seconds (0 = run until Ctrl-C)
    #[arg(short, long, default_value = "0")]
    timeout: u64,

    /// Compact one-line-per-beacon output
    #[arg(long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let socket = match open_listener(args.group, args.port) {
        Ok(socket) => socket,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let salt = args
        .key
        .as_deref()
        .map(|key| *Identity::derive(Some(key)).salt());

    let running = Arc::new(AtomicBool::new(true));
    let running_handler = Arc::clone(&running);
    if let Err(err) = ctrlc::set_handler(move || {
        running_handler.store(false, Ordering::SeqCst);
    }) {
        eprintln!("{} cannot install Ctrl-C handler: {}", "warning:".yellow(), err);
    }

    println!(
        "Listening on {}:{} {}",
        args.group,
        args.port,
        if salt.is_some() {
            "(verifying digests)".dimmed()
        } else {
            "(no digest verification)".dimmed()
        }
    );

    let deadline = (args.timeout > 0).then(|| Instant::now() + Duration::from_secs(args.timeout));
    let mut last_sequence: HashMap<String, i64> = HashMap::new();
    let mut buf = [0u8; 2048];

    while running.load(Ordering::SeqCst) {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                break;
            }
        }
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(_) => continue, // read timeout tick
        };
        match parse_beacon(&buf[..len]) {
            Ok(beacon) => {
                let gap = check_sequence(&mut last_sequence, &beacon);
                print_beacon(&beacon, from, salt.as_ref(), gap, args.quiet);
            }
            Err(err) => {
                eprintln!("{} unparseable datagram from {}: {}", "warning:".yellow(), from, err);
            }
        }
    }
}

fn open_listener(group: Ipv4Addr, port: u16) -> std::io::Result<UdpSocket> {
    let raw = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    raw.set_reuse_address(true)?;
    let bind: SocketAddr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    raw.bind(&bind.into())?;
    let socket: UdpSocket = raw.into();
    socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
    socket.set_read_timeout(Some(Duration::from_millis(500)))?;
    Ok(socket)
}

/// Track per-instance sequences; returns true when a beacon did not
/// advance its sender's sequence (a restart or a replay).
fn check_sequence(last: &mut HashMap<String, i64>, beacon: &ParsedBeacon) -> bool {
    match last.insert(beacon.instance_id.clone(), beacon.sequence) {
        Some(previous) => beacon.sequence <= previous,
        None => false,
    }
}

fn print_beacon(
    beacon: &ParsedBeacon,
    from: SocketAddr,
    salt: Option<&[u8; 16]>,
    gap: bool,
    quiet: bool,
) {
    let status = match beacon.status {
        STATUS_AVAILABLE => format!("{}", beacon.status).green().bold(),
        STATUS_DRAINING => format!("{}", beacon.status).yellow().bold(),
        STATUS_GONE => format!("{}", beacon.status).red().bold(),
        other => format!("{}", other).white().bold(),
    };
    let verdict = match salt {
        Some(salt) if beacon.verify(salt) => " [signed]".green().to_string(),
        Some(_) => " [BAD DIGEST]".red().bold().to_string(),
        None => String::new(),
    };
    let gap_mark = if gap {
        " [sequence regressed]".yellow().to_string()
    } else {
        String::new()
    };

    if quiet {
        println!(
            "{} {} seq={} {}{}{}",
            status, beacon.instance_id, beacon.sequence, from, verdict, gap_mark
        );
        return;
    }

    println!();
    println!("{} from {}{}{}", status, from, verdict, gap_mark);
    println!("  Server:   {}", beacon.instance_id);
    println!("  Date:     {}", beacon.date);
    println!("  Sequence: {}", beacon.sequence);
    println!("  Digest:   {}", beacon.digest.dimmed());
    match &beacon.manager {
        Some(manager) => {
            println!("  Manager:  {} ({})", manager.address, manager.protocol);
            println!("  Url:      {}", manager.url);
            println!("  Host:     {}", manager.host);
        }
        None => println!("  {}", "(status-only beacon)".dimmed()),
    }
}

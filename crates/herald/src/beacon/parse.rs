// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Beacon parsing: the header scanner listeners use.
//!
//! The encoder's framing is deliberately HTTP-shaped, so parsing is a
//! status line followed by `Name: value` headers up to a blank line.
//! Unknown headers are skipped, which keeps old listeners working when
//! new fields appear.

use super::digest;
use super::ManagerInfo;
use std::fmt;

/// Errors from the beacon header scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Payload is not valid UTF-8 text.
    NotText,
    /// Payload ends before the blank-line terminator.
    Truncated,
    /// Status line is not `HTTP/1.0 <code> <reason>`.
    InvalidStatusLine(String),
    /// A header line is missing its `:` separator.
    MalformedHeader(String),
    /// A required header is absent.
    MissingHeader(&'static str),
    /// A header value failed to parse.
    InvalidField(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::NotText => write!(f, "beacon payload is not UTF-8 text"),
            ParseError::Truncated => write!(f, "beacon payload ends before the blank line"),
            ParseError::InvalidStatusLine(line) => write!(f, "invalid status line: {:?}", line),
            ParseError::MalformedHeader(line) => write!(f, "malformed header line: {:?}", line),
            ParseError::MissingHeader(name) => write!(f, "missing header: {}", name),
            ParseError::InvalidField(name) => write!(f, "invalid value for header: {}", name),
        }
    }
}

impl std::error::Error for ParseError {}

/// One decoded beacon.
#[derive(Debug, Clone)]
pub struct ParsedBeacon {
    /// HTTP-style status code from the status line.
    pub status: u16,
    /// `Date:` header, exactly as transmitted (it is digest input).
    pub date: String,
    /// `Sequence:` header.
    pub sequence: i64,
    /// `Digest:` header (32 lowercase hex chars).
    pub digest: String,
    /// `Server:` header — the sender's instance id.
    pub instance_id: String,
    /// Manager fields; present only in full Server beacons.
    pub manager: Option<ManagerInfo>,
}

impl ParsedBeacon {
    /// Recompute the digest from this beacon's own fields and compare.
    ///
    /// `salt` is the listener's copy of the shared-key digest (all zeros
    /// for an unauthenticated deployment).
    #[must_use]
    pub fn verify(&self, salt: &[u8; 16]) -> bool {
        digest::sign(salt, &self.date, self.sequence, &self.instance_id) == self.digest
    }
}

/// Scan one datagram payload into a [`ParsedBeacon`].
pub fn parse_beacon(payload: &[u8]) -> Result<ParsedBeacon, ParseError> {
    let text = std::str::from_utf8(payload).map_err(|_| ParseError::NotText)?;
    let body = text.strip_suffix("\r\n\r\n").ok_or(ParseError::Truncated)?;

    let mut lines = body.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let status = parse_status_line(status_line)?;

    let mut date = None;
    let mut sequence = None;
    let mut digest_field = None;
    let mut instance_id = None;
    let mut mgr_address = None;
    let mut mgr_url = None;
    let mut mgr_protocol = None;
    let mut mgr_host = None;

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            return Err(ParseError::MalformedHeader(line.to_string()));
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("Date") {
            date = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("Sequence") {
            sequence = Some(
                value
                    .parse::<i64>()
                    .map_err(|_| ParseError::InvalidField("Sequence"))?,
            );
        } else if name.eq_ignore_ascii_case("Digest") {
            digest_field = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("Server") {
            instance_id = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("X-Manager-Address") {
            mgr_address = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("X-Manager-Url") {
            mgr_url = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("X-Manager-Protocol") {
            mgr_protocol = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("X-Manager-Host") {
            mgr_host = Some(value.to_string());
        }
        // Unknown headers are skipped.
    }

    let manager = match (mgr_address, mgr_url, mgr_protocol, mgr_host) {
        (Some(address), Some(url), Some(protocol), Some(host)) => Some(ManagerInfo {
            address,
            url,
            protocol,
            host,
        }),
        _ => None,
    };

    Ok(ParsedBeacon {
        status,
        date: date.ok_or(ParseError::MissingHeader("Date"))?,
        sequence: sequence.ok_or(ParseError::MissingHeader("Sequence"))?,
        digest: digest_field.ok_or(ParseError::MissingHeader("Digest"))?,
        instance_id: instance_id.ok_or(ParseError::MissingHeader("Server"))?,
        manager,
    })
}

fn parse_status_line(line: &str) -> Result<u16, ParseError> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    let code = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidStatusLine(line.to_string()));
    }
    code.parse::<u16>()
        .map_err(|_| ParseError::InvalidStatusLine(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::{build_server_beacon, build_status_beacon, STATUS_AVAILABLE, STATUS_GONE};

    const DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";
    const INSTANCE: &str = "00000000-0000-0000-0000-000000000000";

    #[test]
    fn round_trips_a_server_beacon() {
        let manager = ManagerInfo {
            address: "192.0.2.10:8080".to_string(),
            url: "http://192.0.2.10:8080".to_string(),
            protocol: "http".to_string(),
            host: "192.0.2.10".to_string(),
        };
        let salt = [0u8; 16];
        let digest = digest::sign(&salt, DATE, 5, INSTANCE);
        let bytes = build_server_beacon(STATUS_AVAILABLE, DATE, 5, &digest, INSTANCE, &manager);

        let parsed = parse_beacon(&bytes).expect("encoder output must parse");
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.date, DATE);
        assert_eq!(parsed.sequence, 5);
        assert_eq!(parsed.instance_id, INSTANCE);
        let mgr = parsed.manager.as_ref().expect("server beacon carries manager fields");
        assert_eq!(mgr.address, "192.0.2.10:8080");
        assert!(parsed.verify(&salt), "digest must verify against the same salt");
        assert!(!parsed.verify(&[1u8; 16]), "wrong salt must not verify");
    }

    #[test]
    fn status_beacon_parses_without_manager() {
        let digest = digest::sign(&[0u8; 16], DATE, 6, INSTANCE);
        let bytes = build_status_beacon(STATUS_GONE, DATE, 6, &digest, INSTANCE);
        let parsed = parse_beacon(&bytes).expect("encoder output must parse");
        assert_eq!(parsed.status, 410);
        assert!(parsed.manager.is_none());
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(matches!(parse_beacon(&[0xff, 0xfe]), Err(ParseError::NotText)));
        assert!(matches!(parse_beacon(b"HTTP/1.0 200 OK\r\n"), Err(ParseError::Truncated)));
        assert!(matches!(
            parse_beacon(b"NOISE\r\n\r\n"),
            Err(ParseError::InvalidStatusLine(_))
        ));
        assert!(matches!(
            parse_beacon(b"HTTP/1.0 200 OK\r\nSequence: x\r\n\r\n"),
            Err(ParseError::InvalidField("Sequence"))
        ));
        assert!(matches!(
            parse_beacon(b"HTTP/1.0 200 OK\r\nDate: x\r\nSequence: 1\r\nDigest: d\r\n\r\n"),
            Err(ParseError::MissingHeader("Server"))
        ));
    }
}

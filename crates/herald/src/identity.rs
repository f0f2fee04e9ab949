// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! Per-process advertisement identity.
//!
//! Every beacon a process emits carries the same identity material: a
//! digest salt derived from the configured security key and an instance
//! id minted once per process. Listeners use the instance id to tell
//! fleet members apart and the salt-derived digest to reject datagrams
//! from non-cooperating senders.

use md5::{Digest, Md5};
use std::sync::OnceLock;
use uuid::Uuid;

/// Identity material shared by every beacon this process emits.
#[derive(Debug, Clone)]
pub struct Identity {
    salt: [u8; 16],
    instance_id: String,
}

impl Identity {
    /// Derive identity from the configured security key.
    ///
    /// A missing or empty key yields an all-zero salt: the digest stays
    /// format-compatible for listeners that do not enforce
    /// authentication.
    #[must_use]
    pub fn derive(security_key: Option<&str>) -> Self {
        let salt = match security_key {
            Some(key) if !key.is_empty() => {
                let mut hasher = Md5::new();
                hasher.update(key.as_bytes());
                let mut salt = [0u8; 16];
                salt.copy_from_slice(&hasher.finalize());
                salt
            }
            _ => [0u8; 16],
        };
        Self {
            salt,
            instance_id: process_instance_id().to_string(),
        }
    }

    /// Digest salt (MD5 of the security key, or all zeros).
    #[must_use]
    pub fn salt(&self) -> &[u8; 16] {
        &self.salt
    }

    /// Instance id echoed in the `Server:` field of every beacon.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
}

/// Instance id minted once per process and reused for every beacon,
/// including across a drain/reactivate cycle.
fn process_instance_id() -> &'static str {
    static INSTANCE_ID: OnceLock<String> = OnceLock::new();
    INSTANCE_ID.get_or_init(|| Uuid::new_v4().to_string())
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 herald contributors

//! UDP multicast transport for beacon emission.

mod multicast;

pub use multicast::{ChannelOptions, MulticastChannel};

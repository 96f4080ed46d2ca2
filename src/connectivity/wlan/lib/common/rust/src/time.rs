// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::time::Duration,
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

/// Representation of N IEEE 802.11 TimeUnits.
/// A TimeUnit is defined as 1024 micro seconds.
/// Note: Be careful with arithmetic operations on a TimeUnit. A TimeUnit is limited to 2 octets
/// and can easily overflow. However, there is usually no need to ever work with TUs > 0xFFFF.
#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeUnit(pub u16);

impl TimeUnit {
    pub const DEFAULT_BEACON_INTERVAL: Self = Self(100);

    pub fn into_duration(self) -> Duration {
        let tu = self.0;
        Duration::from_micros(tu as u64 * 1024)
    }
}

impl From<TimeUnit> for Duration {
    fn from(tu: TimeUnit) -> Duration {
        tu.into_duration()
    }
}

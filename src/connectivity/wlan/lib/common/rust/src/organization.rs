// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::fmt,
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

/// IEEE Std 802.11-2016, 9.4.1.32, Organizationally Unique Identifier.
#[derive(
    AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[repr(C)]
pub struct Oui([u8; 3]);

impl Oui {
    pub const DOT11: Self = Self([0x00, 0x0F, 0xAC]);
    pub const MSFT: Self = Self([0x00, 0x50, 0xF2]);

    pub const fn new(oui: [u8; 3]) -> Self {
        Self(oui)
    }

    pub fn to_array(&self) -> [u8; 3] {
        self.0
    }
}

impl From<[u8; 3]> for Oui {
    fn from(oui: [u8; 3]) -> Self {
        Self(oui)
    }
}

impl fmt::Debug for Oui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}-{:02X}-{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

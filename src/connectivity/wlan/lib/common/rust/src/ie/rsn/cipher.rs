// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::suite_selector::{self, Factory},
    crate::{
        appendable::{Appendable, BufferTooSmall},
        organization::Oui,
    },
    std::fmt,
};

// IEEE Std 802.11-2016, 9.4.2.25.2, Table 9-131
pub const GROUP_CIPHER_SUITE: u8 = 0;
pub const WEP_40: u8 = 1;
pub const TKIP: u8 = 2;
// 3 - Reserved.
pub const CCMP_128: u8 = 4;
pub const WEP_104: u8 = 5;
pub const BIP_CMAC_128: u8 = 6;
pub const GROUP_ADDRESSED_TRAFFIC_NOT_ALLOWED: u8 = 7;
pub const GCMP_128: u8 = 8;
pub const GCMP_256: u8 = 9;
pub const CCMP_256: u8 = 10;
pub const BIP_GMAC_128: u8 = 11;
pub const BIP_GMAC_256: u8 = 12;
pub const BIP_CMAC_256: u8 = 13;

#[derive(PartialOrd, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Cipher {
    pub oui: Oui,
    pub suite_type: u8,
}

impl Cipher {
    pub fn new_dot11(suite_type: u8) -> Self {
        Cipher { oui: suite_selector::OUI, suite_type }
    }

    fn has_known_usage(&self) -> bool {
        if self.is_reserved() || self.is_vendor_specific() {
            false
        } else {
            self.suite_type != GROUP_CIPHER_SUITE
                && self.suite_type != GROUP_ADDRESSED_TRAFFIC_NOT_ALLOWED
        }
    }

    pub fn is_vendor_specific(&self) -> bool {
        !self.oui.eq(&suite_selector::OUI)
    }

    pub fn is_reserved(&self) -> bool {
        (self.suite_type == 3 || self.suite_type >= 14) && !self.is_vendor_specific()
    }

    /// CCMP-128 is the only cipher this station encrypts unicast and group data with.
    pub fn is_ccmp_128(&self) -> bool {
        !self.is_vendor_specific() && self.suite_type == CCMP_128
    }

    pub fn is_bip_cmac_128(&self) -> bool {
        !self.is_vendor_specific() && self.suite_type == BIP_CMAC_128
    }

    /// IEEE Std 802.11-2016, 12.7.2, Table 12-4
    pub fn tk_bytes(&self) -> Option<u16> {
        if !self.has_known_usage() {
            return None;
        }
        match self.suite_type {
            WEP_40 => Some(5),
            WEP_104 => Some(13),
            TKIP | GCMP_256 | CCMP_256 | BIP_GMAC_256 | BIP_CMAC_256 => Some(32),
            CCMP_128 | BIP_CMAC_128 | GCMP_128 | BIP_GMAC_128 => Some(16),
            _ => None,
        }
    }

    pub fn write_into<A: Appendable>(&self, buf: &mut A) -> Result<(), BufferTooSmall> {
        buf.append_value(&self.oui)?;
        buf.append_byte(self.suite_type)
    }
}

impl Factory for Cipher {
    type Suite = Cipher;

    fn new(oui: Oui, suite_type: u8) -> Self::Suite {
        Cipher { oui, suite_type }
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.oui, self.suite_type)
    }
}

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

// IEEE Std 802.11-2016, 9.4.2.25.3, Table 9-133
pub const EAP: u8 = 1;
pub const PSK: u8 = 2;
pub const FT_EAP: u8 = 3;
pub const FT_PSK: u8 = 4;
pub const EAP_SHA256: u8 = 5;
pub const PSK_SHA256: u8 = 6;
pub const TDLS: u8 = 7;
pub const SAE: u8 = 8;
pub const FT_SAE: u8 = 9;

#[derive(PartialOrd, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Akm {
    pub oui: Oui,
    pub suite_type: u8,
}

impl Akm {
    pub fn new_dot11(suite_type: u8) -> Self {
        Akm { oui: suite_selector::OUI, suite_type }
    }

    fn has_known_algorithm(&self) -> bool {
        if self.is_reserved() || self.is_vendor_specific() {
            false
        } else {
            matches!(self.suite_type, 1..=9)
        }
    }

    pub fn is_vendor_specific(&self) -> bool {
        !self.oui.eq(&suite_selector::OUI)
    }

    pub fn is_reserved(&self) -> bool {
        self.oui == suite_selector::OUI && (self.suite_type == 0 || self.suite_type >= 19)
    }

    /// True for AKMs whose PMK is derived from a passphrase or preshared key.
    pub fn is_psk(&self) -> bool {
        self.oui == suite_selector::OUI && matches!(self.suite_type, PSK | PSK_SHA256)
    }

    /// True for AKMs whose key hierarchy uses the SHA-256 based KDF instead of the SHA-1 PRF.
    pub fn uses_sha256_kdf(&self) -> bool {
        self.oui == suite_selector::OUI && matches!(self.suite_type, EAP_SHA256 | PSK_SHA256)
    }

    /// IEEE Std 802.11-2016, 12.7.3, Table 12-8
    pub fn mic_bytes(&self) -> Option<u16> {
        if !self.has_known_algorithm() {
            return None;
        }
        Some(16)
    }

    /// IEEE Std 802.11-2016, 12.7.3, Table 12-8
    pub fn kck_bits(&self) -> Option<u16> {
        if !self.has_known_algorithm() {
            return None;
        }
        Some(128)
    }

    /// IEEE Std 802.11-2016, 12.7.3, Table 12-8
    pub fn kek_bits(&self) -> Option<u16> {
        if !self.has_known_algorithm() {
            return None;
        }
        Some(128)
    }

    pub fn pmk_bits(&self) -> Option<u16> {
        if !self.has_known_algorithm() {
            return None;
        }
        Some(256)
    }

    /// IEEE Std 802.11-2016, 12.7.2 b.1): Key Descriptor Version used in EAPOL-Key frames.
    pub fn key_descriptor_version(&self) -> Option<u16> {
        match self.suite_type {
            EAP | PSK if !self.is_vendor_specific() => Some(2),
            EAP_SHA256 | PSK_SHA256 if !self.is_vendor_specific() => Some(3),
            _ => None,
        }
    }

    pub fn write_into<A: Appendable>(&self, buf: &mut A) -> Result<(), BufferTooSmall> {
        buf.append_value(&self.oui)?;
        buf.append_byte(self.suite_type)
    }
}

impl Factory for Akm {
    type Suite = Akm;

    fn new(oui: Oui, suite_type: u8) -> Self::Suite {
        Akm { oui, suite_type }
    }
}

impl fmt::Debug for Akm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.oui, self.suite_type)
    }
}

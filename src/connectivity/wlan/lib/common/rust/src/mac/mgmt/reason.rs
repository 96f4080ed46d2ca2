// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::fmt,
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

/// Reason carried by Deauthentication, Disassociation and DELBA frames.
/// IEEE Std 802.11-2016, 9.4.1.7. Only codes a station sends or acts upon are named.
#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct ReasonCode(pub u16);

impl ReasonCode {
    pub const UNSPECIFIED_REASON: Self = Self(1);
    pub const INVALID_AUTHENTICATION: Self = Self(2);
    pub const LEAVING_NETWORK_DEAUTH: Self = Self(3);
    pub const REASON_INACTIVITY: Self = Self(4);
    pub const NO_MORE_STAS: Self = Self(5);
    pub const INVALID_CLASS2FRAME: Self = Self(6);
    pub const INVALID_CLASS3FRAME: Self = Self(7);
    pub const LEAVING_NETWORK_DISASSOC: Self = Self(8);
    pub const NOT_AUTHENTICATED: Self = Self(9);

    // RSN failures, 13-24.
    pub const REASON_INVALID_ELEMENT: Self = Self(13);
    pub const MIC_FAILURE: Self = Self(14);
    pub const FOURWAY_HANDSHAKE_TIMEOUT: Self = Self(15);
    pub const GK_HANDSHAKE_TIMEOUT: Self = Self(16);
    /// The RSNE of 4-Way Handshake message 3 differs from the one in the beacon.
    pub const HANDSHAKE_ELEMENT_MISMATCH: Self = Self(17);
    pub const REASON_INVALID_GROUP_CIPHER: Self = Self(18);
    pub const REASON_INVALID_PAIRWISE_CIPHER: Self = Self(19);
    pub const REASON_INVALID_AKMP: Self = Self(20);
    pub const UNSUPPORTED_RSNE_VERSION: Self = Self(21);
    pub const INVALID_RSNE_CAPABILITIES: Self = Self(22);
    pub const IEEE802_1_X_AUTH_FAILED: Self = Self(23);
    pub const REASON_CIPHER_OUT_OF_POLICY: Self = Self(24);

    // Block Ack teardown, 37-39.
    pub const END_TS_BA_DLS: Self = Self(37);
    pub const UNKNOWN_TS_BA: Self = Self(38);
    pub const TIMEOUT: Self = Self(39);

    /// True for reasons reporting a failed RSN negotiation or key exchange.
    pub fn is_security_failure(&self) -> bool {
        (13..=24).contains(&{ self.0 })
    }

    fn name(&self) -> Option<&'static str> {
        Some(match *self {
            Self::UNSPECIFIED_REASON => "unspecified",
            Self::INVALID_AUTHENTICATION => "invalid authentication",
            Self::LEAVING_NETWORK_DEAUTH | Self::LEAVING_NETWORK_DISASSOC => "leaving network",
            Self::REASON_INACTIVITY => "inactivity",
            Self::NO_MORE_STAS => "AP is full",
            Self::INVALID_CLASS2FRAME => "not authenticated",
            Self::INVALID_CLASS3FRAME => "not associated",
            Self::NOT_AUTHENTICATED => "association without authentication",
            Self::MIC_FAILURE => "MIC failure",
            Self::FOURWAY_HANDSHAKE_TIMEOUT => "4-Way Handshake timeout",
            Self::GK_HANDSHAKE_TIMEOUT => "Group Key Handshake timeout",
            Self::HANDSHAKE_ELEMENT_MISMATCH => "RSNE mismatch",
            Self::END_TS_BA_DLS => "BlockAck ended",
            Self::UNKNOWN_TS_BA => "unknown BlockAck agreement",
            Self::TIMEOUT => "timeout",
            _ if self.is_security_failure() => "RSN negotiation failed",
            _ => return None,
        })
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, { self.0 }),
            None => write!(f, "reason {}", { self.0 }),
        }
    }
}

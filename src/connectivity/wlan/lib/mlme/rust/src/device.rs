// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    thiserror::Error,
    wlan_common::{
        ie::rsn::cipher::Cipher,
        mac::{Bssid, MacAddr},
    },
};

#[cfg(test)]
pub use test_utils::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus(u8);
impl LinkStatus {
    pub const DOWN: Self = Self(0);
    pub const UP: Self = Self(1);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxFlags(pub u32);
impl TxFlags {
    pub const NONE: Self = Self(0);
    /// The frame is already CCMP encapsulated.
    pub const PROTECTED: Self = Self(1);
    /// Send at a robust rate; used for EAPOL.
    pub const FAVOR_RELIABILITY: Self = Self(1 << 1);
    pub const QOS: Self = Self(1 << 2);

    pub fn with(self, other: TxFlags) -> Self {
        Self(self.0 | other.0)
    }

    pub fn contains(&self, other: TxFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Per-frame receive metadata reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxInfo {
    pub rssi_dbm: i8,
    pub timestamp: u64,
    /// The driver already verified and removed the CCMP MIC. The CCMP header is still present.
    pub hw_decrypted: bool,
}

/// Identifies a frame handed to the driver until its transmit completion is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Pairwise,
    Group,
    Igtk,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConfig {
    pub key_id: u8,
    pub key_type: KeyType,
    pub cipher: Cipher,
    pub key: Vec<u8>,
    pub peer_addr: MacAddr,
    /// Receive sequence counter to start from. Only meaningful for group keys.
    pub rsc: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("transmit queue is full")]
    QueueFull,
    #[error("driver rejected frame: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("no key slot available for key id {0}")]
    NoSlot(u8),
    #[error("cipher {0:?} not supported by the driver")]
    UnsupportedCipher(Cipher),
    #[error("driver failed to program key: {0}")]
    Driver(String),
}

/// Hardware and network interface hooks used by the MLME. Implementations must not call back
/// into the MLME; all events are delivered through the MLME's entry points instead.
pub trait DeviceOps {
    /// Hands a complete MPDU to the driver. The driver reports completion with `token`.
    fn submit_tx(&mut self, frame: Vec<u8>, token: TxToken, flags: TxFlags)
        -> Result<(), TxError>;
    fn install_key(&mut self, key: &KeyConfig) -> Result<(), KeyError>;
    fn delete_key(&mut self, key_type: KeyType, key_id: u8) -> Result<(), KeyError>;
    fn set_channel(&mut self, channel: u8);
    /// Delivers an Ethernet II frame to the network stack.
    fn deliver_eth_frame(&mut self, frame: &[u8]);
    fn deliver_monitor_frame(&mut self, frame: &[u8], rx_info: &RxInfo);
    fn set_link_status(&mut self, status: LinkStatus);
    fn scan_done(&mut self);
    fn assoc_done(&mut self, bssid: Bssid, aid: u16);
}

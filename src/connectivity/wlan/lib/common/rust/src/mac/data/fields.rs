// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        big_endian::BigEndianU16,
        mac::{FrameControl, MacAddr, SequenceControl},
    },
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

// IEEE Std 802.11-2016, 9.3.2.1
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct FixedDataHdrFields {
    pub frame_ctrl: FrameControl,
    pub duration: u16,
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: SequenceControl,
}

// IEEE Std 802.2-1998, 3.2
// IETF RFC 1042
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct LlcHdr {
    pub dsap: u8,
    pub ssap: u8,
    pub control: u8,
    pub oui: [u8; 3],
    pub protocol_id: BigEndianU16,
}

pub const LLC_SNAP_EXTENSION: u8 = 0xAA;
pub const LLC_SNAP_UNNUMBERED_INFO: u8 = 0x03;
pub const LLC_SNAP_OUI: [u8; 3] = [0, 0, 0];
// IEEE Std 802.1H, bridge tunnel encapsulation.
pub const LLC_SNAP_BRIDGE_TUNNEL_OUI: [u8; 3] = [0, 0, 0xF8];

impl LlcHdr {
    /// True if this is an RFC 1042 or bridge-tunnel SNAP header.
    pub fn is_snap(&self) -> bool {
        self.dsap == LLC_SNAP_EXTENSION
            && self.ssap == LLC_SNAP_EXTENSION
            && self.control == LLC_SNAP_UNNUMBERED_INFO
            && (self.oui == LLC_SNAP_OUI || self.oui == LLC_SNAP_BRIDGE_TUNNEL_OUI)
    }
}

/// IEEE Std 802.11-2016, 9.3.2.1, Table 9-26: destination address.
pub fn data_dst_addr(hdr: &FixedDataHdrFields) -> MacAddr {
    let fc = hdr.frame_ctrl;
    if fc.to_ds() {
        hdr.addr3
    } else {
        hdr.addr1
    }
}

/// Source address. `addr4` is only consulted for frames in a wireless distribution system.
pub fn data_src_addr(hdr: &FixedDataHdrFields, addr4: Option<MacAddr>) -> Option<MacAddr> {
    let fc = hdr.frame_ctrl;
    match (fc.to_ds(), fc.from_ds()) {
        (_, false) => Some(hdr.addr2),
        (false, true) => Some(hdr.addr3),
        (true, true) => addr4,
    }
}

pub fn data_transmitter_addr(hdr: &FixedDataHdrFields) -> MacAddr {
    hdr.addr2
}

pub fn data_receiver_addr(hdr: &FixedDataHdrFields) -> MacAddr {
    hdr.addr1
}

/// BSSID of the frame, absent for frames in a wireless distribution system.
pub fn data_bssid(hdr: &FixedDataHdrFields) -> Option<MacAddr> {
    let fc = hdr.frame_ctrl;
    match (fc.to_ds(), fc.from_ds()) {
        (false, false) => Some(hdr.addr3),
        (false, true) => Some(hdr.addr2),
        (true, false) => Some(hdr.addr1),
        (true, true) => None,
    }
}

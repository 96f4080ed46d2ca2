// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use zerocopy::{AsBytes, FromBytes, Unaligned};

// IEEE Std 802.11-2016, 9.2.4.1.3 Table 9-1
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(C)]
pub struct FrameType(pub u8);

impl FrameType {
    pub const MGMT: Self = Self(0);
    pub const CTRL: Self = Self(1);
    pub const DATA: Self = Self(2);
    pub const EXT: Self = Self(3);
}

#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(C)]
pub struct MgmtSubtype(pub u8);

impl MgmtSubtype {
    pub const ASSOC_REQ: Self = Self(0b0000);
    pub const ASSOC_RESP: Self = Self(0b0001);
    pub const REASSOC_REQ: Self = Self(0b0010);
    pub const REASSOC_RESP: Self = Self(0b0011);
    pub const PROBE_REQ: Self = Self(0b0100);
    pub const PROBE_RESP: Self = Self(0b0101);
    pub const TIMING_AD: Self = Self(0b0110);
    pub const BEACON: Self = Self(0b1000);
    pub const ATIM: Self = Self(0b1001);
    pub const DISASSOC: Self = Self(0b1010);
    pub const AUTH: Self = Self(0b1011);
    pub const DEAUTH: Self = Self(0b1100);
    pub const ACTION: Self = Self(0b1101);
    pub const ACTION_NO_ACK: Self = Self(0b1110);
}

#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(C)]
pub struct DataSubtype(pub u8);

impl DataSubtype {
    pub const DATA: Self = Self(0b0000);
    pub const NULL: Self = Self(0b0100);
    pub const QOS_DATA: Self = Self(0b1000);
    pub const QOS_NULL: Self = Self(0b1100);

    pub fn qos(&self) -> bool {
        self.0 & 0b1000 != 0
    }

    pub fn null(&self) -> bool {
        self.0 & 0b0100 != 0
    }
}

#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(C)]
pub struct CtrlSubtype(pub u8);

impl CtrlSubtype {
    pub const BLOCK_ACK_REQ: Self = Self(0b1000);
    pub const BLOCK_ACK: Self = Self(0b1001);
    pub const PS_POLL: Self = Self(0b1010);
    pub const RTS: Self = Self(0b1011);
    pub const CTS: Self = Self(0b1100);
    pub const ACK: Self = Self(0b1101);
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.2.4.1.1
    pub struct FrameControl(u16);
    flags {
        to_ds, set_to_ds: 8;
        from_ds, set_from_ds: 9;
        more_frags, set_more_frags: 10;
        retry, set_retry: 11;
        pwr_mgmt, set_pwr_mgmt: 12;
        more_data, set_more_data: 13;
        protected, set_protected: 14;
        htc_order, set_htc_order: 15;
    }
    fields {
        protocol_version, set_protocol_version: u8 = 1, 0;
        raw_frame_type, set_raw_frame_type: u8 = 3, 2;
        frame_subtype, set_frame_subtype: u8 = 7, 4;
    }
}

impl FrameControl {
    pub fn new(frame_type: FrameType, subtype: u8) -> Self {
        let mut fc = FrameControl(0);
        fc.set_frame_type(frame_type);
        fc.set_frame_subtype(subtype);
        fc
    }

    pub fn frame_type(&self) -> FrameType {
        FrameType(self.raw_frame_type())
    }

    pub fn set_frame_type(&mut self, frame_type: FrameType) {
        self.set_raw_frame_type(frame_type.0)
    }

    pub fn mgmt_subtype(&self) -> MgmtSubtype {
        MgmtSubtype(self.frame_subtype())
    }

    pub fn data_subtype(&self) -> DataSubtype {
        DataSubtype(self.frame_subtype())
    }

    pub fn ctrl_subtype(&self) -> CtrlSubtype {
        CtrlSubtype(self.frame_subtype())
    }

    pub fn is_mgmt(&self) -> bool {
        self.frame_type() == FrameType::MGMT
    }

    pub fn is_data(&self) -> bool {
        self.frame_type() == FrameType::DATA
    }

    pub fn is_ctrl(&self) -> bool {
        self.frame_type() == FrameType::CTRL
    }

    /// True for QoS data frames, whose header carries a QoS Control field.
    pub fn is_qos(&self) -> bool {
        self.is_data() && self.data_subtype().qos()
    }

    pub fn has_addr4(&self) -> bool {
        self.to_ds() && self.from_ds()
    }

    /// The HT Control field is only present in QoS data and management frames.
    pub fn has_ht_ctrl(&self) -> bool {
        self.htc_order() && (self.is_qos() || self.is_mgmt())
    }
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.2.4.4
    pub struct SequenceControl(u16);
    flags {}
    fields {
        frag_num, set_frag_num: u8 = 3, 0;
        seq_num, set_seq_num: u16 = 15, 4;
    }
}

impl SequenceControl {
    pub fn new(seq_num: u16, frag_num: u8) -> Self {
        let mut sc = SequenceControl(0);
        sc.set_seq_num(seq_num);
        sc.set_frag_num(frag_num);
        sc
    }
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.2.4.5.1
    pub struct QosControl(u16);
    flags {
        eosp, set_eosp: 4;
        amsdu_present, set_amsdu_present: 7;
    }
    fields {
        tid, set_tid: u8 = 3, 0;
        ack_policy, set_ack_policy: u8 = 6, 5;
        high_byte, set_high_byte: u8 = 15, 8;
    }
}

// IEEE Std 802.11-2016, 9.2.4.5.4 Table 9-6
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AckPolicy(pub u8);

impl AckPolicy {
    pub const NORMAL_ACK: Self = Self(0);
    pub const NO_ACK: Self = Self(1);
    pub const NO_EXPLICIT_ACK: Self = Self(2);
    pub const BLOCK_ACK: Self = Self(3);
}

impl QosControl {
    pub fn with_tid(tid: u8) -> Self {
        let mut qc = QosControl(0);
        qc.set_tid(tid);
        qc
    }
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.1.4
    pub struct CapabilityInfo(u16);
    flags {
        ess, set_ess: 0;
        ibss, set_ibss: 1;
        cf_pollable, set_cf_pollable: 2;
        cf_poll_req, set_cf_poll_req: 3;
        privacy, set_privacy: 4;
        short_preamble, set_short_preamble: 5;
        spectrum_mgmt, set_spectrum_mgmt: 8;
        qos, set_qos: 9;
        short_slot_time, set_short_slot_time: 10;
        apsd, set_apsd: 11;
        radio_measurement, set_radio_measurement: 12;
        delayed_block_ack, set_delayed_block_ack: 14;
        immediate_block_ack, set_immediate_block_ack: 15;
    }
    fields {}
}

#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(C)]
pub struct HtControl(pub [u8; 4]);

// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        mac::{CapabilityInfo, FrameControl, MacAddr, ReasonCode, SequenceControl, StatusCode},
        time::TimeUnit,
    },
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

// IEEE Std 802.11-2016, 9.3.3.2
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct MgmtHdr {
    pub frame_ctrl: FrameControl,
    pub duration: u16,
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: SequenceControl,
}

// IEEE Std 802.11-2016, 9.4.1.1
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(C, packed)]
pub struct AuthAlgorithmNumber(pub u16);

impl AuthAlgorithmNumber {
    pub const OPEN: Self = Self(0);
    pub const SHARED_KEY: Self = Self(1);
    pub const FAST_BSS_TRANSITION: Self = Self(2);
    pub const SAE: Self = Self(3);
}

// IEEE Std 802.11-2016, 9.3.3.3
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct BeaconHdr {
    pub timestamp: u64,
    pub beacon_interval: TimeUnit,
    pub capabilities: CapabilityInfo,
}

// IEEE Std 802.11-2016, 9.3.3.11
pub type ProbeRespHdr = BeaconHdr;

// IEEE Std 802.11-2016, 9.3.3.12
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct AuthHdr {
    pub auth_alg_num: AuthAlgorithmNumber,
    pub auth_txn_seq_num: u16,
    pub status_code: StatusCode,
}

// IEEE Std 802.11-2016, 9.3.3.13
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct DeauthHdr {
    pub reason_code: ReasonCode,
}

// IEEE Std 802.11-2016, 9.3.3.5
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct DisassocHdr {
    pub reason_code: ReasonCode,
}

// IEEE Std 802.11-2016, 9.3.3.6
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct AssocReqHdr {
    pub capabilities: CapabilityInfo,
    pub listen_interval: u16,
}

// IEEE Std 802.11-2016, 9.3.3.7
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct AssocRespHdr {
    pub capabilities: CapabilityInfo,
    pub status_code: StatusCode,
    pub aid: u16,
}

impl AssocRespHdr {
    /// The two most significant bits of the AID field are always set.
    pub fn association_id(&self) -> u16 {
        let aid = self.aid;
        aid & 0x3FFF
    }
}

// IEEE Std 802.11-2016, 9.4.1.11, Table 9-47
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(C)]
pub struct ActionCategory(pub u8);

impl ActionCategory {
    pub const SPECTRUM_MGMT: Self = Self(0);
    pub const QOS: Self = Self(1);
    pub const DLS: Self = Self(2);
    pub const BLOCK_ACK: Self = Self(3);
    pub const PUBLIC: Self = Self(4);
    pub const RADIO_MEASUREMENT: Self = Self(5);
    pub const FT: Self = Self(6);
    pub const HT: Self = Self(7);
    pub const SA_QUERY: Self = Self(8);
    pub const PROTECTED_DUAL: Self = Self(9);
    pub const WNM: Self = Self(10);
    pub const VENDOR_SPECIFIC_PROTECTED: Self = Self(126);
    pub const VENDOR_SPECIFIC: Self = Self(127);

    /// IEEE Std 802.11-2016, Table 9-47, "Robust" column.
    pub fn is_robust(&self) -> bool {
        !matches!(*self, Self::HT | Self::PUBLIC | Self::VENDOR_SPECIFIC)
            && self.0 != 11 // Unprotected WNM
            && self.0 != 20 // Self-protected
    }
}

// IEEE Std 802.11-2016, 9.3.3.14
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct ActionHdr {
    pub action: ActionCategory,
}

// IEEE Std 802.11-2016, 9.6.5.1
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(C)]
pub struct BlockAckAction(pub u8);

impl BlockAckAction {
    pub const ADDBA_REQUEST: Self = Self(0);
    pub const ADDBA_RESPONSE: Self = Self(1);
    pub const DELBA: Self = Self(2);
}

// IEEE Std 802.11-2016, 9.4.1.14
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlockAckPolicy(pub bool);

impl BlockAckPolicy {
    pub const DELAYED: Self = Self(false);
    pub const IMMEDIATE: Self = Self(true);
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.1.14
    pub struct BlockAckParameters(u16);
    flags {
        amsdu, set_amsdu: 0;
        raw_policy, set_raw_policy: 1;
    }
    fields {
        tid, set_tid: u8 = 5, 2;
        buffer_size, set_buffer_size: u16 = 15, 6;
    }
}

impl BlockAckParameters {
    pub fn policy(&self) -> BlockAckPolicy {
        BlockAckPolicy(self.raw_policy())
    }

    pub fn with_amsdu(mut self, amsdu: bool) -> Self {
        self.set_amsdu(amsdu);
        self
    }

    pub fn with_policy(mut self, policy: BlockAckPolicy) -> Self {
        self.set_raw_policy(policy.0);
        self
    }

    pub fn with_tid(mut self, tid: u8) -> Self {
        self.set_tid(tid);
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: u16) -> Self {
        self.set_buffer_size(buffer_size);
        self
    }
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.1.16
    pub struct DelbaParameters(u16);
    flags {
        initiator, set_initiator: 11;
    }
    fields {
        tid, set_tid: u8 = 15, 12;
    }
}

impl DelbaParameters {
    pub fn with_initiator(mut self, initiator: bool) -> Self {
        self.set_initiator(initiator);
        self
    }

    pub fn with_tid(mut self, tid: u8) -> Self {
        self.set_tid(tid);
        self
    }
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.6.5.2 and Figure 9-29
    pub struct BlockAckStartingSequenceControl(u16);
    flags {}
    fields {
        fragment_number, set_fragment_number: u8 = 3, 0;
        starting_sequence_number, set_starting_sequence_number: u16 = 15, 4;
    }
}

impl BlockAckStartingSequenceControl {
    pub fn with_starting_sequence_number(mut self, ssn: u16) -> Self {
        self.set_starting_sequence_number(ssn);
        self
    }
}

// IEEE Std 802.11-2016, 9.6.5.2
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct AddbaReqHdr {
    pub action: BlockAckAction,
    pub dialog_token: u8,
    pub parameters: BlockAckParameters,
    pub timeout: u16,
    pub starting_sequence_control: BlockAckStartingSequenceControl,
}

// IEEE Std 802.11-2016, 9.6.5.3
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct AddbaRespHdr {
    pub action: BlockAckAction,
    pub dialog_token: u8,
    pub status: StatusCode,
    pub parameters: BlockAckParameters,
    pub timeout: u16,
}

// IEEE Std 802.11-2016, 9.6.5.4
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct DelbaHdr {
    pub action: BlockAckAction,
    pub parameters: DelbaParameters,
    pub reason_code: ReasonCode,
}

// IEEE Std 802.11-2016, 9.6.10.1
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(C)]
pub struct SaQueryAction(pub u8);

impl SaQueryAction {
    pub const REQUEST: Self = Self(0);
    pub const RESPONSE: Self = Self(1);
}

// IEEE Std 802.11-2016, 9.6.10.2 and 9.6.10.3
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct SaQueryHdr {
    pub action: SaQueryAction,
    pub transaction_id: [u8; 2],
}

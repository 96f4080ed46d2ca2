// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::organization::Oui,
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.2.3
    pub struct SupportedRate(u8);
    flags {
        basic, set_basic: 7;
    }
    fields {
        rate, set_rate: u8 = 6, 0;
    }
}

impl SupportedRate {
    pub fn with_basic(mut self, basic: bool) -> Self {
        self.set_basic(basic);
        self
    }
}

// IEEE Std 802.11-2016, 9.4.2.4
#[repr(C, packed)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct DsssParamSet {
    pub current_chan: u8,
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.2.12
    pub struct ErpInfo(u8);
    flags {
        non_erp_present, set_non_erp_present: 0;
        use_protection, set_use_protection: 1;
        barker_preamble_mode, set_barker_preamble_mode: 2;
    }
    fields {}
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.2.56.2
    pub struct HtCapabilityInfo(u16);
    flags {
        ldpc_coding_cap, set_ldpc_coding_cap: 0;
        chan_width_set, set_chan_width_set: 1;
        greenfield, set_greenfield: 4;
        short_gi_20, set_short_gi_20: 5;
        short_gi_40, set_short_gi_40: 6;
        tx_stbc, set_tx_stbc: 7;
        delayed_block_ack, set_delayed_block_ack: 10;
        max_amsdu_len, set_max_amsdu_len: 11;
        dsss_in_40, set_dsss_in_40: 12;
        intolerant_40, set_intolerant_40: 14;
        lsig_txop_protect, set_lsig_txop_protect: 15;
    }
    fields {
        sm_power_save, set_sm_power_save: u8 = 3, 2;
        rx_stbc, set_rx_stbc: u8 = 9, 8;
    }
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.2.56.3
    pub struct AmpduParams(u8);
    flags {}
    fields {
        max_ampdu_exponent, set_max_ampdu_exponent: u8 = 1, 0;
        min_start_spacing, set_min_start_spacing: u8 = 4, 2;
    }
}

// IEEE Std 802.11-2016, 9.4.2.56
#[repr(C, packed)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct HtCapabilities {
    pub ht_cap_info: HtCapabilityInfo,
    pub ampdu_params: AmpduParams,
    pub mcs_set: [u8; 16],
    pub ht_ext_cap: u16,
    pub txbf_cap: u32,
    pub asel_cap: u8,
}

impl HtCapabilities {
    /// Capabilities advertised by a single-stream 20 MHz client without optional features.
    pub fn minimal_client() -> Self {
        let mut ht_cap_info = HtCapabilityInfo(0);
        ht_cap_info.set_short_gi_20(true);
        ht_cap_info.set_sm_power_save(3); // Disabled
        let mut ampdu_params = AmpduParams(0);
        ampdu_params.set_max_ampdu_exponent(3);
        let mut mcs_set = [0u8; 16];
        // MCS 0-7 supported.
        mcs_set[0] = 0xff;
        HtCapabilities {
            ht_cap_info,
            ampdu_params,
            mcs_set,
            ht_ext_cap: 0,
            txbf_cap: 0,
            asel_cap: 0,
        }
    }
}

// IEEE Std 802.11-2016, 9.4.2.57
#[repr(C, packed)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct HtOperation {
    pub primary_chan: u8,
    pub ht_op_info: [u8; 5],
    pub basic_ht_mcs_set: [u8; 16],
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.2.29, Figure 9-263
    pub struct AciAifsn(u8);
    flags {
        acm, set_acm: 4;
    }
    fields {
        aifsn, set_aifsn: u8 = 3, 0;
        aci, set_aci: u8 = 6, 5;
    }
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.2.29, Figure 9-264
    pub struct EcwMinMax(u8);
    flags {}
    fields {
        ecw_min, set_ecw_min: u8 = 3, 0;
        ecw_max, set_ecw_max: u8 = 7, 4;
    }
}

// IEEE Std 802.11-2016, 9.4.2.29, Figure 9-262
#[repr(C, packed)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy, Debug, Default)]
pub struct EdcaAcParams {
    pub aci_aifsn: AciAifsn,
    pub ecw_min_max: EcwMinMax,
    pub txop_limit: u16,
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.1.17, QoS Info field as sent by an AP
    pub struct ApQosInfo(u8);
    flags {
        q_ack, set_q_ack: 4;
        queue_request, set_queue_request: 5;
        txop_request, set_txop_request: 6;
        uapsd, set_uapsd: 7;
    }
    fields {
        edca_param_set_update_count, set_edca_param_set_update_count: u8 = 3, 0;
    }
}

/// Body of the EDCA Parameter Set element (IEEE Std 802.11-2016, 9.4.2.29). The WMM Parameter
/// element carries the same layout after its vendor header.
#[repr(C, packed)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy, Debug, Default)]
pub struct EdcaParams {
    pub qos_info: ApQosInfo,
    pub reserved: u8,
    pub ac_be_params: EdcaAcParams,
    pub ac_bk_params: EdcaAcParams,
    pub ac_vi_params: EdcaAcParams,
    pub ac_vo_params: EdcaAcParams,
}

// WMM v1.2.0, 2.2.1
pub const WMM_OUI_TYPE: u8 = 2;
pub const WMM_INFO_OUI_SUBTYPE: u8 = 0;
pub const WMM_PARAM_OUI_SUBTYPE: u8 = 1;
pub const WMM_VERSION: u8 = 1;

#[repr(C, packed)]
#[derive(PartialEq, Eq, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
pub struct VendorHdr {
    pub oui: Oui,
    pub oui_type: u8,
}

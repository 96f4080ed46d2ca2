// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Receive helpers shared by the station: header metadata needed before decryption, parsing
//! of the elements a BSS advertises and conversion of data frames to Ethernet II frames.

use {
    crate::{stats::DropReason, tx},
    log::debug,
    wlan_common::{
        ie::{self, EdcaParams, ErpInfo, SupportedRate},
        mac::{self, FrameControl, MacAddr, MacFrame, SequenceControl, ETHER_TYPE_EAPOL},
    },
    wlan_rsn::ccmp::CCMP_HDR_LEN,
};

const ETH_HDR_LEN: usize = 14;
const EXT_IV: u8 = 0x20;

/// Header fields of a received data or management MPDU. Available for protected frames too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpduMeta {
    pub frame_ctrl: FrameControl,
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: SequenceControl,
    /// TID of QoS data frames.
    pub tid: Option<u8>,
    pub amsdu: bool,
    pub hdr_len: usize,
}

pub fn parse_meta(mpdu: &[u8]) -> Option<MpduMeta> {
    match MacFrame::parse(mpdu)? {
        MacFrame::Mgmt { mgmt_hdr, .. } => Some(MpduMeta {
            frame_ctrl: mgmt_hdr.frame_ctrl,
            addr1: mgmt_hdr.addr1,
            addr2: mgmt_hdr.addr2,
            addr3: mgmt_hdr.addr3,
            seq_ctrl: mgmt_hdr.seq_ctrl,
            tid: None,
            amsdu: false,
            hdr_len: mac::header_len(mgmt_hdr.frame_ctrl),
        }),
        MacFrame::Data { fixed_fields, qos_ctrl, .. } => Some(MpduMeta {
            frame_ctrl: fixed_fields.frame_ctrl,
            addr1: fixed_fields.addr1,
            addr2: fixed_fields.addr2,
            addr3: fixed_fields.addr3,
            seq_ctrl: fixed_fields.seq_ctrl,
            tid: qos_ctrl.as_ref().map(|q| q.tid()),
            amsdu: qos_ctrl.as_ref().map_or(false, |q| q.amsdu_present()),
            hdr_len: mac::header_len(fixed_fields.frame_ctrl),
        }),
        _ => None,
    }
}

/// How the payload of a protected MPDU is protected, judged from its security header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// Extended IV present: CCMP with the given key id.
    ExtIv { key_id: u8 },
    /// No extended IV. WEP, which the station never negotiates.
    Wep,
}

pub fn protection(meta: &MpduMeta, mpdu: &[u8]) -> Option<Protection> {
    if mpdu.len() < meta.hdr_len + CCMP_HDR_LEN {
        return None;
    }
    let key_octet = mpdu[meta.hdr_len + 3];
    if key_octet & EXT_IV == 0 {
        Some(Protection::Wep)
    } else {
        Some(Protection::ExtIv { key_id: key_octet >> 6 })
    }
}

/// Everything the station learns about a BSS from a beacon or probe response body.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BssElements {
    pub ssid: Option<Vec<u8>>,
    /// Supported and extended supported rates, in the order advertised.
    pub rates: Vec<SupportedRate>,
    pub channel: Option<u8>,
    /// The complete RSN element, including its header.
    pub rsne: Option<Vec<u8>>,
    /// WPA1 element body following the vendor header.
    pub wpa_ie: Option<Vec<u8>>,
    pub ht_capable: bool,
    pub wmm: bool,
    pub edca: Option<EdcaParams>,
    pub erp: Option<ErpInfo>,
}

/// Collects the known elements. Malformed elements are skipped.
pub fn parse_bss_elements(elements: &[u8]) -> BssElements {
    let mut bss = BssElements::default();
    let mut reader = ie::Reader::new(elements);
    for (id, body) in &mut reader {
        match id {
            ie::Id::SSID => match ie::parse_ssid(body) {
                Ok(ssid) => bss.ssid = Some(ssid.to_vec()),
                Err(e) => debug!("skipping SSID: {}", e),
            },
            ie::Id::SUPPORTED_RATES | ie::Id::EXT_SUPPORTED_RATES => {
                let rates = if id == ie::Id::SUPPORTED_RATES {
                    ie::parse_supported_rates(body)
                } else {
                    ie::parse_extended_supported_rates(body)
                };
                match rates {
                    Ok(rates) => bss.rates.extend_from_slice(&rates[..]),
                    Err(e) => debug!("skipping rates: {}", e),
                }
            }
            ie::Id::DSSS_PARAM_SET => {
                if let Ok(dsss) = ie::parse_dsss_param_set(body) {
                    bss.channel = Some(dsss.current_chan);
                }
            }
            ie::Id::ERP_INFO => {
                if let Ok(erp) = ie::parse_erp_info(body) {
                    bss.erp = Some(*erp);
                }
            }
            ie::Id::HT_CAPABILITIES => bss.ht_capable = ie::parse_ht_capabilities(body).is_ok(),
            ie::Id::EDCA_PARAM_SET => {
                if let Ok(edca) = ie::parse_edca_param_set(body) {
                    bss.edca = Some(*edca);
                }
            }
            ie::Id::RSNE => {
                let mut rsne = Vec::with_capacity(ie::IE_HDR_LEN + body.len());
                rsne.push(ie::Id::RSNE.0);
                rsne.push(body.len() as u8);
                rsne.extend_from_slice(body);
                bss.rsne = Some(rsne);
            }
            ie::Id::VENDOR_SPECIFIC => match ie::parse_vendor_ie(body) {
                Ok(ie::VendorIe::MsftLegacyWpa(wpa)) => bss.wpa_ie = Some(wpa.to_vec()),
                Ok(ie::VendorIe::WmmInfo(_)) => bss.wmm = true,
                Ok(ie::VendorIe::WmmParam(params)) => {
                    bss.wmm = true;
                    // An EDCA Parameter Set element takes precedence.
                    if bss.edca.is_none() {
                        bss.edca = Some(*params);
                    }
                }
                Ok(ie::VendorIe::Unknown { .. }) => (),
                Err(e) => debug!("skipping vendor element: {}", e),
            },
            _ => (),
        }
    }
    if reader.truncated() {
        debug!("element chain is truncated");
    }
    bss
}

/// An MSDU converted to an Ethernet II frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxMsdu {
    pub ether_type: u16,
    pub eth_frame: Vec<u8>,
}

impl RxMsdu {
    pub fn is_eapol(&self) -> bool {
        self.ether_type == ETHER_TYPE_EAPOL
    }

    /// The frame following the Ethernet header.
    pub fn payload(&self) -> &[u8] {
        &self.eth_frame[ETH_HDR_LEN..]
    }

    pub fn src_addr(&self) -> MacAddr {
        let mut addr = [0u8; 6];
        addr.copy_from_slice(&self.eth_frame[6..12]);
        addr
    }
}

/// Converts a plaintext, reassembled data frame into Ethernet II frames, one per MSDU. Null
/// data frames yield nothing. Every MSDU must carry an LLC/SNAP header.
pub fn data_to_msdus(mpdu: &[u8]) -> Result<Vec<RxMsdu>, DropReason> {
    let (fixed_fields, addr4, qos_ctrl, body) = match MacFrame::parse(mpdu) {
        Some(MacFrame::Data { fixed_fields, addr4, qos_ctrl, body, .. }) => {
            (fixed_fields, addr4, qos_ctrl, body)
        }
        _ => return Err(DropReason::Malformed),
    };
    if { fixed_fields.frame_ctrl }.data_subtype().null() {
        return Ok(vec![]);
    }
    let amsdu = qos_ctrl.map_or(false, |q| q.amsdu_present());

    let msdus: Vec<mac::Msdu<&[u8]>> = if amsdu {
        mac::AmsduReader::new(body).collect()
    } else {
        let dst = mac::data_dst_addr(&fixed_fields);
        let src = mac::data_src_addr(&fixed_fields, addr4.map(|a| *a))
            .ok_or(DropReason::Malformed)?;
        vec![mac::Msdu::parse(dst, src, body).ok_or(DropReason::Malformed)?]
    };

    let mut out = Vec::with_capacity(msdus.len());
    for msdu in msdus {
        if !msdu.llc_hdr.is_snap() {
            return Err(DropReason::NotSnap);
        }
        let ether_type = msdu.llc_hdr.protocol_id.to_native();
        let mut eth_frame = Vec::with_capacity(ETH_HDR_LEN + msdu.body.len());
        tx::write_eth_frame(&mut eth_frame, msdu.dst_addr, msdu.src_addr, ether_type, msdu.body)
            .map_err(|_| DropReason::Malformed)?;
        out.push(RxMsdu { ether_type, eth_frame });
    }
    Ok(out)
}

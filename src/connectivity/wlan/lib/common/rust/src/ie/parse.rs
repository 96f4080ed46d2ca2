// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{constants::*, fields::*, wpa},
    crate::{
        buffer_reader::BufferReader,
        error::{FrameParseError, FrameParseResult},
        organization::Oui,
    },
    zerocopy::{ByteSlice, LayoutVerified},
};

macro_rules! parse_err {
    ($($arg:tt)*) => {
        FrameParseError(format!($($arg)*))
    };
}

pub fn parse_ssid<B: ByteSlice>(raw_body: B) -> FrameParseResult<B> {
    if raw_body.len() > SSID_MAX_LEN {
        Err(parse_err!("SSID is too long: {} bytes", raw_body.len()))
    } else {
        Ok(raw_body)
    }
}

pub fn parse_supported_rates<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, [SupportedRate]>> {
    // IEEE Std 802.11-2016, 9.2.4.3 specifies that at least one rate must be present, but
    // some APs violate the maximum of eight so that limit is not enforced here.
    if raw_body.is_empty() {
        return Err(parse_err!("Empty Supported Rates element"));
    }
    LayoutVerified::new_slice_unaligned(raw_body)
        .ok_or_else(|| parse_err!("Invalid Supported Rates element"))
}

pub fn parse_extended_supported_rates<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, [SupportedRate]>> {
    if raw_body.is_empty() {
        return Err(parse_err!("Empty Extended Supported Rates element"));
    }
    LayoutVerified::new_slice_unaligned(raw_body)
        .ok_or_else(|| parse_err!("Invalid Extended Supported Rates element"))
}

pub fn parse_dsss_param_set<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, DsssParamSet>> {
    LayoutVerified::new_unaligned(raw_body)
        .ok_or_else(|| parse_err!("Invalid length of DSSS Parameter Set element"))
}

pub fn parse_erp_info<B: ByteSlice>(raw_body: B) -> FrameParseResult<LayoutVerified<B, ErpInfo>> {
    LayoutVerified::new_unaligned(raw_body)
        .ok_or_else(|| parse_err!("Invalid length of ERP Information element"))
}

pub fn parse_ht_capabilities<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, HtCapabilities>> {
    LayoutVerified::new_unaligned(raw_body)
        .ok_or_else(|| parse_err!("Invalid length of HT Capabilities element"))
}

pub fn parse_ht_operation<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, HtOperation>> {
    LayoutVerified::new_unaligned(raw_body)
        .ok_or_else(|| parse_err!("Invalid length of HT Operation element"))
}

pub fn parse_edca_param_set<B: ByteSlice>(
    raw_body: B,
) -> FrameParseResult<LayoutVerified<B, EdcaParams>> {
    LayoutVerified::new_unaligned(raw_body)
        .ok_or_else(|| parse_err!("Invalid length of EDCA Parameter Set element"))
}

#[derive(Debug)]
pub enum VendorIe<B: ByteSlice> {
    /// Body of a WPA1 element following the vendor header.
    MsftLegacyWpa(B),
    /// Body of a WMM Information element following the vendor header, subtype and version.
    WmmInfo(B),
    WmmParam(LayoutVerified<B, EdcaParams>),
    Unknown { oui: Oui, body: B },
}

pub fn parse_vendor_ie<B: ByteSlice>(raw_body: B) -> FrameParseResult<VendorIe<B>> {
    let mut reader = BufferReader::new(raw_body);
    let header = reader
        .read::<VendorHdr>()
        .ok_or_else(|| parse_err!("Vendor specific element is too short"))?;
    let (oui, oui_type) = (header.oui, header.oui_type);
    if oui != Oui::MSFT {
        return Ok(VendorIe::Unknown { oui, body: reader.into_remaining() });
    }
    match oui_type {
        wpa::VENDOR_SPECIFIC_TYPE => Ok(VendorIe::MsftLegacyWpa(reader.into_remaining())),
        WMM_OUI_TYPE => {
            let subtype =
                reader.read_byte().ok_or_else(|| parse_err!("WMM element missing subtype"))?;
            let version =
                reader.read_byte().ok_or_else(|| parse_err!("WMM element missing version"))?;
            if version != WMM_VERSION {
                return Err(parse_err!("Unsupported WMM version {}", version));
            }
            match subtype {
                WMM_INFO_OUI_SUBTYPE => Ok(VendorIe::WmmInfo(reader.into_remaining())),
                WMM_PARAM_OUI_SUBTYPE => {
                    let params = reader
                        .read::<EdcaParams>()
                        .ok_or_else(|| parse_err!("WMM Parameter element is too short"))?;
                    Ok(VendorIe::WmmParam(params))
                }
                _ => Err(parse_err!("Unknown WMM subtype {}", subtype)),
            }
        }
        _ => Ok(VendorIe::Unknown { oui, body: reader.into_remaining() }),
    }
}

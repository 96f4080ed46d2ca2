// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{constants::*, fields::*, rsn::rsne, wpa, Header, Id},
    crate::{appendable::Appendable, error::FrameWriteError, organization::Oui},
    zerocopy::AsBytes,
};

fn write_ie_hdr<B: Appendable>(buf: &mut B, id: Id, body_len: usize) -> Result<(), FrameWriteError> {
    if body_len > IE_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data(format!(
            "element body length {} exceeds max of {}",
            body_len, IE_MAX_LEN
        )));
    }
    if !buf.can_append(IE_HDR_LEN + body_len) {
        return Err(FrameWriteError::BufferTooSmall);
    }
    buf.append_value(&Header { id, body_len: body_len as u8 })?;
    Ok(())
}

fn write_ie<B: Appendable>(buf: &mut B, id: Id, body: &[u8]) -> Result<(), FrameWriteError> {
    write_ie_hdr(buf, id, body.len())?;
    buf.append_bytes(body)?;
    Ok(())
}

pub fn write_ssid<B: Appendable>(buf: &mut B, ssid: &[u8]) -> Result<(), FrameWriteError> {
    if ssid.len() > SSID_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data(format!(
            "SSID is too long: {} bytes",
            ssid.len()
        )));
    }
    write_ie(buf, Id::SSID, ssid)
}

pub fn write_supported_rates<B: Appendable>(
    buf: &mut B,
    rates: &[u8],
) -> Result<(), FrameWriteError> {
    if rates.is_empty() {
        return Err(FrameWriteError::new_invalid_data("no rates to write"));
    }
    if rates.len() > SUPPORTED_RATES_MAX_LEN {
        return Err(FrameWriteError::new_invalid_data("too many rates for Supported Rates"));
    }
    write_ie(buf, Id::SUPPORTED_RATES, rates)
}

pub fn write_ext_supported_rates<B: Appendable>(
    buf: &mut B,
    rates: &[u8],
) -> Result<(), FrameWriteError> {
    if rates.is_empty() {
        return Err(FrameWriteError::new_invalid_data("no rates to write"));
    }
    write_ie(buf, Id::EXT_SUPPORTED_RATES, rates)
}

pub fn write_dsss_param_set<B: Appendable>(
    buf: &mut B,
    dsss: &DsssParamSet,
) -> Result<(), FrameWriteError> {
    write_ie(buf, Id::DSSS_PARAM_SET, dsss.as_bytes())
}

pub fn write_ht_capabilities<B: Appendable>(
    buf: &mut B,
    ht_cap: &HtCapabilities,
) -> Result<(), FrameWriteError> {
    write_ie(buf, Id::HT_CAPABILITIES, ht_cap.as_bytes())
}

pub fn write_rsne<B: Appendable>(buf: &mut B, rsne: &rsne::Rsne) -> Result<(), FrameWriteError> {
    if !buf.can_append(rsne.len()) {
        return Err(FrameWriteError::BufferTooSmall);
    }
    rsne.write_into(buf)?;
    Ok(())
}

pub fn write_wpa1_ie<B: Appendable>(
    buf: &mut B,
    wpa_ie: &wpa::WpaIe,
) -> Result<(), FrameWriteError> {
    let body_len = std::mem::size_of::<VendorHdr>() + wpa_ie.len();
    write_ie_hdr(buf, Id::VENDOR_SPECIFIC, body_len)?;
    buf.append_value(&VendorHdr { oui: Oui::MSFT, oui_type: wpa::VENDOR_SPECIFIC_TYPE })?;
    wpa_ie.write_into(buf)?;
    Ok(())
}

/// Writes a WMM Information element announcing the station's QoS capabilities.
pub fn write_wmm_info<B: Appendable>(buf: &mut B, qos_info: u8) -> Result<(), FrameWriteError> {
    let body = [
        Oui::MSFT.to_array()[0],
        Oui::MSFT.to_array()[1],
        Oui::MSFT.to_array()[2],
        WMM_OUI_TYPE,
        WMM_INFO_OUI_SUBTYPE,
        WMM_VERSION,
        qos_info,
    ];
    write_ie(buf, Id::VENDOR_SPECIFIC, &body[..])
}

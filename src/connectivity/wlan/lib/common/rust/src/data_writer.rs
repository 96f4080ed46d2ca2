// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    appendable::Appendable,
    big_endian::BigEndianU16,
    error::FrameWriteError,
    mac::{self, Bssid, FixedDataHdrFields, FrameControl, MacAddr, QosControl, SequenceControl},
};

pub fn data_hdr_client_to_ap(
    mut frame_ctrl: FrameControl,
    bssid: Bssid,
    client_addr: MacAddr,
    seq_ctrl: SequenceControl,
) -> FixedDataHdrFields {
    frame_ctrl.set_to_ds(true);
    frame_ctrl.set_from_ds(false);
    FixedDataHdrFields {
        frame_ctrl,
        duration: 0,
        addr1: bssid.0,
        addr2: client_addr,
        addr3: bssid.0,
        seq_ctrl,
    }
}

pub fn make_snap_llc_hdr(protocol_id: u16) -> mac::LlcHdr {
    mac::LlcHdr {
        dsap: mac::LLC_SNAP_EXTENSION,
        ssap: mac::LLC_SNAP_EXTENSION,
        control: mac::LLC_SNAP_UNNUMBERED_INFO,
        oui: mac::LLC_SNAP_OUI,
        protocol_id: BigEndianU16::from_native(protocol_id),
    }
}

/// Writes a data frame header. A QoS Control field is written iff the frame control announces a
/// QoS data subtype.
pub fn write_data_hdr<B: Appendable>(
    buf: &mut B,
    fixed_fields: FixedDataHdrFields,
    qos_ctrl: Option<QosControl>,
) -> Result<(), FrameWriteError> {
    let fc = fixed_fields.frame_ctrl;
    match (fc.is_qos(), qos_ctrl) {
        (true, Some(qos_ctrl)) => {
            buf.append_value(&fixed_fields)?;
            buf.append_value(&qos_ctrl)?;
        }
        (false, None) => buf.append_value(&fixed_fields)?,
        (true, None) => {
            return Err(FrameWriteError::new_invalid_data("QoS data frame without QoS Control"))
        }
        (false, Some(_)) => {
            return Err(FrameWriteError::new_invalid_data("QoS Control on non-QoS frame"))
        }
    }
    Ok(())
}

// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::mac::{Bssid, FrameControl, FrameType, MacAddr, MgmtHdr, MgmtSubtype, SequenceControl};

pub fn mgmt_hdr_to_ap(
    frame_ctrl: FrameControl,
    bssid: Bssid,
    client_addr: MacAddr,
    seq_ctrl: SequenceControl,
) -> MgmtHdr {
    MgmtHdr { frame_ctrl, duration: 0, addr1: bssid.0, addr2: client_addr, addr3: bssid.0, seq_ctrl }
}

/// Header of a management frame with the given subtype addressed to `dst`. Used for frames that
/// are not sent to the BSSID, such as broadcast probe requests.
pub fn mgmt_hdr(
    subtype: MgmtSubtype,
    dst: MacAddr,
    src: MacAddr,
    bssid: Bssid,
    seq_ctrl: SequenceControl,
) -> MgmtHdr {
    MgmtHdr {
        frame_ctrl: FrameControl::new(FrameType::MGMT, subtype.0),
        duration: 0,
        addr1: dst,
        addr2: src,
        addr3: bssid.0,
        seq_ctrl,
    }
}

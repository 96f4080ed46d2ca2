// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::mac::{FrameControl, MacAddr},
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

// IEEE Std 802.11-2016, 9.3.1
// The following fields are always present for every control frame.
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct CtrlHdr {
    pub frame_ctrl: FrameControl,
    pub duration_or_id: u16,
    pub ra: MacAddr,
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.3.1.8.2
    pub struct BarControl(u16);
    flags {
        bar_ack_policy, set_bar_ack_policy: 0;
        multi_tid, set_multi_tid: 1;
        compressed_bitmap, set_compressed_bitmap: 2;
        gcr, set_gcr: 3;
    }
    fields {
        tid_info, set_tid_info: u8 = 15, 12;
    }
}

packed_bits! {
    // IEEE Std 802.11-2016, 9.3.1.8.4, Figure 9-29
    pub struct PerTidInfo(u16);
    flags {}
    fields {
        tid, set_tid: u8 = 15, 12;
    }
}

// IEEE Std 802.11-2016, 9.3.1.8.1
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct BlockAckReqHdr {
    pub frame_ctrl: FrameControl,
    pub duration: u16,
    pub ra: MacAddr,
    pub ta: MacAddr,
    pub bar_ctrl: BarControl,
}

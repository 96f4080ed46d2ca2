// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::buffer_reader::BufferReader,
    zerocopy::{ByteSlice, LayoutVerified},
};

mod fields;

pub use fields::*;

/// Per-TID starting sequence numbers requested by a Block Ack Request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarTidInfo {
    pub tid: u8,
    pub starting_seq_num: u16,
}

/// A parsed Block Ack Request frame.
pub struct BlockAckReq<B> {
    pub hdr: LayoutVerified<B, BlockAckReqHdr>,
    pub tids: Vec<BarTidInfo>,
}

impl<B: ByteSlice> BlockAckReq<B> {
    /// Parses a Block Ack Request. `bytes` must contain the complete control frame including the
    /// frame control field.
    pub fn parse(bytes: B) -> Option<Self> {
        let mut reader = BufferReader::new(bytes);
        let hdr = reader.read::<BlockAckReqHdr>()?;
        let bar_ctrl = hdr.bar_ctrl;
        let tids = if bar_ctrl.multi_tid() {
            // IEEE Std 802.11-2016, 9.3.1.8.4: TID_INFO holds the number of TIDs minus one.
            let count = bar_ctrl.tid_info() as usize + 1;
            let mut tids = Vec::with_capacity(count);
            for _ in 0..count {
                let per_tid = reader.read::<PerTidInfo>()?;
                let ssc = reader.read::<crate::mac::BlockAckStartingSequenceControl>()?;
                tids.push(BarTidInfo {
                    tid: per_tid.tid(),
                    starting_seq_num: ssc.starting_sequence_number(),
                });
            }
            tids
        } else {
            let ssc = reader.read::<crate::mac::BlockAckStartingSequenceControl>()?;
            vec![BarTidInfo {
                tid: bar_ctrl.tid_info(),
                starting_seq_num: ssc.starting_sequence_number(),
            }]
        };
        Some(Self { hdr, tids })
    }
}

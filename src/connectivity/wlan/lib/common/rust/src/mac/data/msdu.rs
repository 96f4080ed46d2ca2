// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        big_endian::BigEndianU16,
        buffer_reader::BufferReader,
        mac::{LlcHdr, MacAddr},
    },
    zerocopy::{AsBytes, ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

// IEEE Std 802.11-2016, 9.3.2.2.2
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(C, packed)]
pub struct AmsduSubframeHdr {
    pub da: MacAddr,
    pub sa: MacAddr,
    pub msdu_len: BigEndianU16,
}

/// A single MSDU stripped of its LLC/SNAP header.
pub struct Msdu<B> {
    pub dst_addr: MacAddr,
    pub src_addr: MacAddr,
    pub llc_hdr: LayoutVerified<B, LlcHdr>,
    pub body: B,
}

impl<B: ByteSlice> Msdu<B> {
    pub fn parse(dst_addr: MacAddr, src_addr: MacAddr, bytes: B) -> Option<Self> {
        let mut reader = BufferReader::new(bytes);
        let llc_hdr = reader.read::<LlcHdr>()?;
        Some(Msdu { dst_addr, src_addr, llc_hdr, body: reader.into_remaining() })
    }
}

/// Iterates over the subframes of an aggregate MSDU. Iteration stops at the first malformed
/// subframe.
pub struct AmsduReader<B>(BufferReader<B>);

impl<B: ByteSlice> AmsduReader<B> {
    pub fn new(bytes: B) -> Self {
        AmsduReader(BufferReader::new(bytes))
    }
}

impl<B: ByteSlice> Iterator for AmsduReader<B> {
    type Item = Msdu<B>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.bytes_remaining() == 0 {
            return None;
        }
        let hdr = self.0.read::<AmsduSubframeHdr>()?;
        let msdu_len = hdr.msdu_len.to_native() as usize;
        let bytes = self.0.read_bytes(msdu_len)?;
        // Every subframe but the last is padded to a multiple of four bytes.
        let subframe_len = std::mem::size_of::<AmsduSubframeHdr>() + msdu_len;
        let padding = (4 - subframe_len % 4) % 4;
        if self.0.bytes_remaining() > padding {
            self.0.read_bytes(padding)?;
        }
        Msdu::parse(hdr.da, hdr.sa, bytes)
    }
}

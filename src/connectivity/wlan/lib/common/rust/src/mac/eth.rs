// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{big_endian::BigEndianU16, buffer_reader::BufferReader, mac::MacAddr},
    zerocopy::{AsBytes, ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

// RFC 704, Appendix B.2
// https://www.iana.org/assignments/ieee-802-numbers/ieee-802-numbers.xhtml
pub const ETHER_TYPE_EAPOL: u16 = 0x888E;
pub const ETHER_TYPE_IPV4: u16 = 0x0800;
pub const ETHER_TYPE_ARP: u16 = 0x0806;
pub const ETHER_TYPE_IPV6: u16 = 0x86DD;
pub const ETHER_TYPE_VLAN: u16 = 0x8100;

pub const MAX_ETH_FRAME_LEN: usize = 2048;
/// Values at or below this are 802.3 length fields rather than EtherTypes.
pub const MAX_ETH_LEN_FIELD: u16 = 1500;

// IEEE Std 802.3-2015, 3.1.1
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, packed)]
pub struct EthernetIIHdr {
    pub da: MacAddr,
    pub sa: MacAddr,
    pub ether_type: BigEndianU16,
}

// IEEE Std 802.1Q-2018, 9.6
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, packed)]
pub struct VlanTag {
    pub tci: BigEndianU16,
    pub ether_type: BigEndianU16,
}

impl VlanTag {
    /// Priority Code Point, the 802.1p user priority.
    pub fn priority(&self) -> u8 {
        (self.tci.to_native() >> 13) as u8
    }
}

pub struct EthernetFrame<B: ByteSlice> {
    pub hdr: LayoutVerified<B, EthernetIIHdr>,
    pub vlan_tag: Option<LayoutVerified<B, VlanTag>>,
    pub body: B,
}

impl<B: ByteSlice> EthernetFrame<B> {
    pub fn parse(bytes: B) -> Option<Self> {
        let mut reader = BufferReader::new(bytes);
        let hdr = reader.read::<EthernetIIHdr>()?;
        let vlan_tag = if hdr.ether_type.to_native() == ETHER_TYPE_VLAN {
            Some(reader.read::<VlanTag>()?)
        } else {
            None
        };
        Some(Self { hdr, vlan_tag, body: reader.into_remaining() })
    }

    /// The EtherType of the payload, looking past an 802.1Q tag if present.
    pub fn ether_type(&self) -> u16 {
        match &self.vlan_tag {
            Some(tag) => tag.ether_type.to_native(),
            None => self.hdr.ether_type.to_native(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eth_hdr_big_endian() {
        let mut bytes: Vec<u8> = vec![
            1, 2, 3, 4, 5, 6, // dst_addr
            7, 8, 9, 10, 11, 12, // src_addr
            13, 14, // ether_type
            99, 99, // trailing bytes
        ];
        let (mut hdr, body) =
            LayoutVerified::<_, EthernetIIHdr>::new_unaligned_from_prefix(&mut bytes[..])
                .expect("cannot create ethernet header.");
        assert_eq!(hdr.da, [1u8, 2, 3, 4, 5, 6]);
        assert_eq!(hdr.sa, [7u8, 8, 9, 10, 11, 12]);
        assert_eq!(hdr.ether_type.to_native(), 13 << 8 | 14);
        assert_eq!(hdr.ether_type.0, [13u8, 14]);
        assert_eq!(body, [99, 99]);

        hdr.ether_type.set_from_native(0x888e);
        assert_eq!(hdr.ether_type.0, [0x88, 0x8e]);
        #[rustfmt::skip]
        assert_eq!(
            &[1u8, 2, 3, 4, 5, 6,
            7, 8, 9, 10, 11, 12,
            0x88, 0x8e,
            99, 99],
            &bytes[..]);
    }

    #[test]
    fn parse_vlan_tagged_frame() {
        #[rustfmt::skip]
        let bytes = [
            1, 2, 3, 4, 5, 6, // dst_addr
            7, 8, 9, 10, 11, 12, // src_addr
            0x81, 0x00, // VLAN
            0xa0, 0x05, // TCI: priority 5, VLAN 5
            0x08, 0x00, // IPv4
            0x45, // body
        ];
        let frame = EthernetFrame::parse(&bytes[..]).expect("valid frame");
        assert_eq!(ETHER_TYPE_IPV4, frame.ether_type());
        assert_eq!(5, frame.vlan_tag.expect("tagged frame").priority());
        assert_eq!(&[0x45], frame.body);
    }
}

// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    wlan_common::{
        ie::{EdcaAcParams, EdcaParams},
        mac::{EthernetFrame, ETHER_TYPE_IPV4, ETHER_TYPE_IPV6},
    },
    zerocopy::ByteSlice,
};

/// EDCA access category (IEEE Std 802.11-2016, 10.2.4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ac {
    BestEffort,
    Background,
    Video,
    Voice,
}

impl Ac {
    /// Table 10-1: user priority to access category.
    pub fn from_tid(tid: u8) -> Self {
        match tid & 0x7 {
            1 | 2 => Ac::Background,
            0 | 3 => Ac::BestEffort,
            4 | 5 => Ac::Video,
            _ => Ac::Voice,
        }
    }

    pub fn edca_params(self, edca: &EdcaParams) -> EdcaAcParams {
        match self {
            Ac::BestEffort => edca.ac_be_params,
            Ac::Background => edca.ac_bk_params,
            Ac::Video => edca.ac_vi_params,
            Ac::Voice => edca.ac_vo_params,
        }
    }
}

/// User priority of an outgoing Ethernet frame. An 802.1Q tag wins; otherwise, if `use_dscp`,
/// the IP precedence (the top three DSCP bits) is used. Everything else is best effort.
pub fn classify<B: ByteSlice>(frame: &EthernetFrame<B>, use_dscp: bool) -> u8 {
    if let Some(tag) = &frame.vlan_tag {
        return tag.priority();
    }
    if !use_dscp {
        return 0;
    }
    let body = &frame.body[..];
    let tos = match frame.ether_type() {
        ETHER_TYPE_IPV4 if body.len() >= 2 && body[0] >> 4 == 4 => body[1],
        // Traffic class straddles the first two bytes of the IPv6 header.
        ETHER_TYPE_IPV6 if body.len() >= 2 && body[0] >> 4 == 6 => {
            (body[0] << 4) | (body[1] >> 4)
        }
        _ => return 0,
    };
    tos >> 5
}

#[cfg(test)]
mod tests {
    use {super::*, test_case::test_case};

    #[rustfmt::skip]
    fn eth(ether_type: [u8; 2], body: &[u8]) -> Vec<u8> {
        let mut frame = vec![
            1, 1, 1, 1, 1, 1,
            2, 2, 2, 2, 2, 2,
            ether_type[0], ether_type[1],
        ];
        frame.extend_from_slice(body);
        frame
    }

    #[test_case(0, Ac::BestEffort)]
    #[test_case(1, Ac::Background)]
    #[test_case(2, Ac::Background)]
    #[test_case(3, Ac::BestEffort)]
    #[test_case(4, Ac::Video)]
    #[test_case(5, Ac::Video)]
    #[test_case(6, Ac::Voice)]
    #[test_case(7, Ac::Voice)]
    fn tid_to_ac(tid: u8, ac: Ac) {
        assert_eq!(Ac::from_tid(tid), ac);
    }

    #[test]
    fn vlan_priority_wins() {
        #[rustfmt::skip]
        let frame = eth([0x81, 0x00], &[
            0xc0, 0x01, // PCP 6
            0x08, 0x00,
            0x45, 0x20, // DSCP 8, precedence 1
        ]);
        let frame = EthernetFrame::parse(&frame[..]).expect("valid frame");
        assert_eq!(classify(&frame, true), 6);
        assert_eq!(classify(&frame, false), 6);
    }

    #[test]
    fn dscp_classification() {
        // DSCP 46 (EF): precedence 5.
        let v4 = eth([0x08, 0x00], &[0x45, 0xb8, 0, 0]);
        let v4 = EthernetFrame::parse(&v4[..]).expect("valid frame");
        assert_eq!(classify(&v4, true), 5);
        assert_eq!(classify(&v4, false), 0);

        // IPv6 traffic class 0xe0: precedence 7.
        let v6 = eth([0x86, 0xdd], &[0x6e, 0x00, 0, 0]);
        let v6 = EthernetFrame::parse(&v6[..]).expect("valid frame");
        assert_eq!(classify(&v6, true), 7);

        let arp = eth([0x08, 0x06], &[0xff, 0xff]);
        let arp = EthernetFrame::parse(&arp[..]).expect("valid frame");
        assert_eq!(classify(&arp, true), 0);
    }

    #[test]
    fn edca_params_per_ac() {
        let mut edca = EdcaParams::default();
        edca.ac_vo_params.txop_limit = 47;
        edca.ac_bk_params.txop_limit = 3;
        assert_eq!({ Ac::Voice.edca_params(&edca).txop_limit }, 47);
        assert_eq!({ Ac::Background.edca_params(&edca).txop_limit }, 3);
        assert_eq!({ Ac::BestEffort.edca_params(&edca).txop_limit }, 0);
    }
}

// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::buffer_reader::BufferReader,
    zerocopy::{AsBytes, ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

mod ctrl;
mod data;
mod eth;
mod fields;
mod mgmt;

pub use {ctrl::*, data::*, eth::*, fields::*, mgmt::*};

pub type MacAddr = [u8; 6];
pub const BCAST_ADDR: MacAddr = [0xFF; 6];
pub const NULL_ADDR: MacAddr = [0x00; 6];

/// Number of traffic identifiers carried in QoS Control.
pub const NUM_TIDS: usize = 16;
/// Sequence numbers are 12 bits and wrap at this modulus.
pub const MAX_SEQ_NUM: u16 = 4095;
pub const SEQ_NUM_MODULUS: u16 = 4096;

#[derive(
    AsBytes, FromBytes, Unaligned, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[repr(C)]
pub struct Bssid(pub MacAddr);

impl std::fmt::Debug for Bssid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bssid({})", fmt_addr(&self.0))
    }
}

/// Individual/group bit of the first octet.
pub fn is_multicast(addr: &MacAddr) -> bool {
    addr[0] & 0x01 != 0
}

pub fn fmt_addr(addr: &MacAddr) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        addr[0], addr[1], addr[2], addr[3], addr[4], addr[5]
    )
}

/// Length of the MAC header for a data or management frame with the given frame control,
/// including the optional Address 4, QoS Control and HT Control fields.
pub fn header_len(frame_ctrl: FrameControl) -> usize {
    let mut len = std::mem::size_of::<MgmtHdr>();
    if frame_ctrl.is_data() {
        if frame_ctrl.has_addr4() {
            len += std::mem::size_of::<MacAddr>();
        }
        if frame_ctrl.is_qos() {
            len += std::mem::size_of::<QosControl>();
        }
    }
    if frame_ctrl.has_ht_ctrl() {
        len += std::mem::size_of::<HtControl>();
    }
    len
}

#[derive(Debug)]
pub enum MacFrame<B: ByteSlice> {
    Mgmt {
        // Management Header: fixed fields
        mgmt_hdr: LayoutVerified<B, MgmtHdr>,
        // Management Header: optional fields
        ht_ctrl: Option<LayoutVerified<B, HtControl>>,
        // Body
        body: B,
    },
    Data {
        // Data Header: fixed fields
        fixed_fields: LayoutVerified<B, FixedDataHdrFields>,
        // Data Header: optional fields
        addr4: Option<LayoutVerified<B, MacAddr>>,
        qos_ctrl: Option<LayoutVerified<B, QosControl>>,
        ht_ctrl: Option<LayoutVerified<B, HtControl>>,
        // Body
        body: B,
    },
    Ctrl {
        frame_ctrl: FrameControl,
        // Everything following the frame control field.
        body: B,
    },
    Unsupported {
        frame_ctrl: FrameControl,
    },
}

impl<B: ByteSlice> MacFrame<B> {
    /// Parses a MAC frame from the given bytes. Returns None if the frame is truncated or carries
    /// an unknown protocol version.
    pub fn parse(bytes: B) -> Option<MacFrame<B>> {
        let mut reader = BufferReader::new(bytes);
        let frame_ctrl = *reader.peek::<FrameControl>()?;
        if frame_ctrl.protocol_version() != 0 {
            return None;
        }
        match frame_ctrl.frame_type() {
            FrameType::MGMT => {
                let mgmt_hdr = reader.read::<MgmtHdr>()?;
                let ht_ctrl =
                    if frame_ctrl.has_ht_ctrl() { Some(reader.read::<HtControl>()?) } else { None };
                Some(MacFrame::Mgmt { mgmt_hdr, ht_ctrl, body: reader.into_remaining() })
            }
            FrameType::DATA => {
                let fixed_fields = reader.read::<FixedDataHdrFields>()?;
                let addr4 =
                    if frame_ctrl.has_addr4() { Some(reader.read::<MacAddr>()?) } else { None };
                let qos_ctrl =
                    if frame_ctrl.is_qos() { Some(reader.read::<QosControl>()?) } else { None };
                let ht_ctrl =
                    if frame_ctrl.has_ht_ctrl() { Some(reader.read::<HtControl>()?) } else { None };
                Some(MacFrame::Data {
                    fixed_fields,
                    addr4,
                    qos_ctrl,
                    ht_ctrl,
                    body: reader.into_remaining(),
                })
            }
            FrameType::CTRL => {
                reader.read::<FrameControl>()?;
                Some(MacFrame::Ctrl { frame_ctrl, body: reader.into_remaining() })
            }
            _ => Some(MacFrame::Unsupported { frame_ctrl }),
        }
    }

    pub fn frame_ctrl(&self) -> FrameControl {
        match self {
            MacFrame::Mgmt { mgmt_hdr, .. } => mgmt_hdr.frame_ctrl,
            MacFrame::Data { fixed_fields, .. } => fixed_fields.frame_ctrl,
            MacFrame::Ctrl { frame_ctrl, .. } => *frame_ctrl,
            MacFrame::Unsupported { frame_ctrl } => *frame_ctrl,
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::assert_variant};

    #[rustfmt::skip]
    fn qos_data_frame() -> Vec<u8> {
        vec![
            // Data header
            0x88, 0x02, // FC: QoS data, from DS
            0, 0, // duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            3, 3, 3, 3, 3, 3, // addr3
            0x10, 0x00, // seq ctrl
            0x05, 0x00, // QoS control, TID 5
            // Body
            0xAA, 0xAA, 0x03, 0x00, 0x00, 0x00, 0x08, 0x00, 0xAB,
        ]
    }

    #[test]
    fn parse_data_frame() {
        let bytes = qos_data_frame();
        assert_variant!(
            MacFrame::parse(&bytes[..]),
            Some(MacFrame::Data { fixed_fields, addr4, qos_ctrl, ht_ctrl, body }) => {
                assert_eq!([1; 6], fixed_fields.addr1);
                assert_eq!(1, { fixed_fields.seq_ctrl }.seq_num());
                assert!(addr4.is_none());
                assert!(ht_ctrl.is_none());
                assert_eq!(5, qos_ctrl.expect("qos data frame").tid());
                assert_eq!(9, body.len());
            }
        );
    }

    #[test]
    fn parse_truncated_frame() {
        let bytes = qos_data_frame();
        assert!(MacFrame::parse(&bytes[..25]).is_none());
        assert!(MacFrame::parse(&bytes[..1]).is_none());
    }

    #[test]
    fn reject_bad_protocol_version() {
        let mut bytes = qos_data_frame();
        bytes[0] |= 0x01;
        assert!(MacFrame::parse(&bytes[..]).is_none());
    }

    #[test]
    fn parse_mgmt_frame() {
        #[rustfmt::skip]
        let bytes = vec![
            0xc0, 0x00, // FC: deauth
            0, 0, // duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            3, 3, 3, 3, 3, 3, // addr3
            0x00, 0x00, // seq ctrl
            0x03, 0x00, // reason code
        ];
        assert_variant!(
            MacFrame::parse(&bytes[..]),
            Some(MacFrame::Mgmt { mgmt_hdr, body, .. }) => {
                assert_eq!(MgmtSubtype::DEAUTH, { mgmt_hdr.frame_ctrl }.mgmt_subtype());
                assert_eq!(&[3, 0], &body[..]);
            }
        );
    }

    #[test]
    fn header_lengths() {
        assert_eq!(24, header_len(FrameControl(0x0080)));
        assert_eq!(26, header_len(FrameControl(0x0288)));
        assert_eq!(32, header_len(FrameControl(0x0388)));
        assert_eq!(30, header_len(FrameControl(0x8088)));
    }

    #[test]
    fn multicast_bit() {
        assert!(is_multicast(&BCAST_ADDR));
        assert!(is_multicast(&[0x01, 0x00, 0x5e, 0, 0, 1]));
        assert!(!is_multicast(&[0x02, 0, 0, 0, 0, 1]));
    }
}

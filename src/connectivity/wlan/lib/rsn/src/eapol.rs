// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::Error,
    bitfield::bitfield,
    bytes::Bytes,
    nom::{
        bytes::complete::take,
        number::complete::{be_u16, be_u64, be_u8},
        IResult,
    },
};

// IEEE Std 802.1X-2010, 11.3.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProtocolVersion {
    Ieee802dot1x2001 = 1,
    Ieee802dot1x2004 = 2,
}

// IEEE Std 802.1X-2010, 11.3.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Eap = 0,
    Start = 1,
    Logoff = 2,
    Key = 3,
    AsfAlert = 4,
}

// IEEE Std 802.11-2016, 12.7.2, and the WPA1 descriptor found in the wild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyDescriptor {
    Rc4 = 1,
    Ieee802dot11 = 2,
    LegacyWpa1 = 254,
}

// IEEE Std 802.11-2016, 12.7.2 b.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum KeyType {
    Group = 0,
    Pairwise = 1,
}

const EAPOL_HDR_LEN: usize = 4;
// Descriptor type through reserved field, excluding MIC and key data length.
const KEY_FRAME_FIXED_LEN: usize = 1 + 2 + 2 + 8 + 32 + 16 + 8 + 8;

bitfield! {
    // IEEE Std 802.11-2016, 12.7.2, Figure 12-33
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct KeyInformation(u16);
    impl Debug;
    pub key_descriptor_version, set_key_descriptor_version: 2, 0;
    pub key_type, set_key_type: 3, 3;
    // WPA1 only; reserved in RSN.
    pub legacy_key_idx, set_legacy_key_idx: 5, 4;
    pub install, set_install: 6;
    pub key_ack, set_key_ack: 7;
    pub key_mic, set_key_mic: 8;
    pub secure, set_secure: 9;
    pub error, set_error: 10;
    pub request, set_request: 11;
    pub encrypted_key_data, set_encrypted_key_data: 12;
    pub smk_message, set_smk_message: 13;
    pub value, _: 15, 0;
}

impl KeyInformation {
    pub fn is_pairwise(&self) -> bool {
        self.key_type() == KeyType::Pairwise as u16
    }
}

/// IEEE Std 802.11-2016, 12.7.2: an EAPOL-Key frame, including its EAPOL header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFrame {
    pub version: u8,
    pub packet_type: u8,
    pub packet_body_len: u16,

    pub descriptor_type: u8,
    pub key_info: KeyInformation,
    pub key_len: u16,
    pub key_replay_counter: u64,
    pub key_nonce: [u8; 32],
    pub key_iv: [u8; 16],
    pub key_rsc: u64,
    // 8 octets reserved.
    pub key_mic: Bytes,
    pub key_data_len: u16,
    pub key_data: Bytes,
}

impl KeyFrame {
    /// Creates an empty key frame with the given MIC length. The packet body length is set
    /// accordingly and must be updated if key data is added.
    pub fn new(descriptor: KeyDescriptor, key_info: KeyInformation, mic_len: usize) -> Self {
        let mut frame = KeyFrame {
            version: ProtocolVersion::Ieee802dot1x2004 as u8,
            packet_type: PacketType::Key as u8,
            packet_body_len: 0,
            descriptor_type: descriptor as u8,
            key_info,
            key_len: 0,
            key_replay_counter: 0,
            key_nonce: [0u8; 32],
            key_iv: [0u8; 16],
            key_rsc: 0,
            key_mic: Bytes::from(vec![0u8; mic_len]),
            key_data_len: 0,
            key_data: Bytes::new(),
        };
        frame.update_packet_body_len();
        frame
    }

    pub fn set_key_data(&mut self, key_data: Vec<u8>) {
        self.key_data_len = key_data.len() as u16;
        self.key_data = Bytes::from(key_data);
        self.update_packet_body_len();
    }

    pub fn update_packet_body_len(&mut self) {
        self.packet_body_len = self.len() as u16 - EAPOL_HDR_LEN as u16;
    }

    /// Length of the whole frame including the EAPOL header.
    pub fn len(&self) -> usize {
        EAPOL_HDR_LEN + KEY_FRAME_FIXED_LEN + self.key_mic.len() + 2 + self.key_data.len()
    }

    /// Serializes the frame. If `clear_mic` is true, the MIC field is zeroed as required for MIC
    /// computation.
    pub fn to_bytes(&self, clear_mic: bool) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        buf.push(self.version);
        buf.push(self.packet_type);
        buf.extend_from_slice(&self.packet_body_len.to_be_bytes()[..]);
        buf.push(self.descriptor_type);
        buf.extend_from_slice(&self.key_info.value().to_be_bytes()[..]);
        buf.extend_from_slice(&self.key_len.to_be_bytes()[..]);
        buf.extend_from_slice(&self.key_replay_counter.to_be_bytes()[..]);
        buf.extend_from_slice(&self.key_nonce[..]);
        buf.extend_from_slice(&self.key_iv[..]);
        buf.extend_from_slice(&self.key_rsc.to_be_bytes()[..]);
        buf.extend_from_slice(&[0u8; 8][..]);
        if clear_mic {
            buf.resize(buf.len() + self.key_mic.len(), 0);
        } else {
            buf.extend_from_slice(&self.key_mic[..]);
        }
        buf.extend_from_slice(&self.key_data_len.to_be_bytes()[..]);
        buf.extend_from_slice(&self.key_data[..]);
        buf
    }
}

/// An EAPOL frame. Only EAPOL-Key frames are understood by the supplicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Key(KeyFrame),
    Unsupported { packet_type: u8 },
}

fn to_array<A: Default + AsMut<[u8]>>(bytes: &[u8]) -> A {
    let mut array = A::default();
    array.as_mut().copy_from_slice(bytes);
    array
}

fn parse_key_frame(input: &[u8], mic_len: usize) -> IResult<&[u8], KeyFrame> {
    let (i, version) = be_u8(input)?;
    let (i, packet_type) = be_u8(i)?;
    let (i, packet_body_len) = be_u16(i)?;
    let (i, descriptor_type) = be_u8(i)?;
    let (i, key_info) = be_u16(i)?;
    let (i, key_len) = be_u16(i)?;
    let (i, key_replay_counter) = be_u64(i)?;
    let (i, key_nonce) = take(32usize)(i)?;
    let (i, key_iv) = take(16usize)(i)?;
    let (i, key_rsc) = be_u64(i)?;
    let (i, _reserved) = take(8usize)(i)?;
    let (i, key_mic) = take(mic_len)(i)?;
    let (i, key_data_len) = be_u16(i)?;
    let (i, key_data) = take(key_data_len as usize)(i)?;
    Ok((
        i,
        KeyFrame {
            version,
            packet_type,
            packet_body_len,
            descriptor_type,
            key_info: KeyInformation(key_info),
            key_len,
            key_replay_counter,
            key_nonce: to_array(key_nonce),
            key_iv: to_array(key_iv),
            key_rsc,
            key_mic: Bytes::copy_from_slice(key_mic),
            key_data_len,
            key_data: Bytes::copy_from_slice(key_data),
        },
    ))
}

impl Frame {
    /// Parses an EAPOL frame. `mic_len` is the MIC size of the negotiated AKM.
    pub fn parse(bytes: &[u8], mic_len: usize) -> Result<Frame, Error> {
        if bytes.len() < EAPOL_HDR_LEN {
            return Err(Error::InvalidEapolFrame(format!("frame too short: {}", bytes.len())));
        }
        if bytes[1] != PacketType::Key as u8 {
            return Ok(Frame::Unsupported { packet_type: bytes[1] });
        }
        let body_len = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        if bytes.len() < EAPOL_HDR_LEN + body_len {
            return Err(Error::InvalidEapolFrame(format!(
                "packet body length {} exceeds frame length {}",
                body_len,
                bytes.len()
            )));
        }
        // Trailing bytes past the announced body length are link layer padding.
        let frame_bytes = &bytes[..EAPOL_HDR_LEN + body_len];
        match parse_key_frame(frame_bytes, mic_len) {
            Ok((rest, frame)) if rest.is_empty() => Ok(Frame::Key(frame)),
            Ok((rest, _)) => Err(Error::InvalidEapolFrame(format!(
                "{} unexpected trailing bytes in EAPOL-Key frame",
                rest.len()
            ))),
            Err(e) => Err(Error::InvalidEapolFrame(format!("{:?}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    fn msg1_bytes() -> Vec<u8> {
        let mut frame = vec![
            0x02, 0x03, 0x00, 0x5f, // EAPOL header
            0x02, // descriptor type
            0x00, 0x8a, // key info
            0x00, 0x10, // key length
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // replay counter
        ];
        frame.extend_from_slice(&[0x11; 32]); // nonce
        frame.extend_from_slice(&[0; 16]); // IV
        frame.extend_from_slice(&[0; 8]); // RSC
        frame.extend_from_slice(&[0; 8]); // reserved
        frame.extend_from_slice(&[0; 16]); // MIC
        frame.extend_from_slice(&[0x00, 0x00]); // key data length
        frame
    }

    #[test]
    fn test_parse_msg1() {
        let bytes = msg1_bytes();
        let frame = match Frame::parse(&bytes[..], 16).expect("valid frame") {
            Frame::Key(frame) => frame,
            other => panic!("unexpected frame: {:?}", other),
        };
        assert_eq!(1, frame.key_replay_counter);
        assert_eq!(2, frame.key_info.key_descriptor_version());
        assert!(frame.key_info.is_pairwise());
        assert!(frame.key_info.key_ack());
        assert!(!frame.key_info.key_mic());
        assert_eq!([0x11; 32], frame.key_nonce);
        assert_eq!(0, frame.key_data.len());
        assert_eq!(bytes.len(), frame.len());
        assert_eq!(bytes, frame.to_bytes(false));
    }

    #[test]
    fn test_key_information_bits() {
        let info = KeyInformation(0x13ca);
        assert_eq!(2, info.key_descriptor_version());
        assert!(info.is_pairwise());
        assert!(info.install());
        assert!(info.key_ack());
        assert!(info.key_mic());
        assert!(info.secure());
        assert!(info.encrypted_key_data());
        assert!(!info.request());
        assert!(!info.error());
    }

    #[test]
    fn test_parse_with_padding() {
        let mut bytes = msg1_bytes();
        bytes.extend_from_slice(&[0; 4]);
        assert!(matches!(Frame::parse(&bytes[..], 16), Ok(Frame::Key(_))));
    }

    #[test]
    fn test_parse_truncated() {
        let bytes = msg1_bytes();
        assert!(Frame::parse(&bytes[..50], 16).is_err());
        assert!(Frame::parse(&bytes[..2], 16).is_err());
    }

    #[test]
    fn test_parse_key_data_len_mismatch() {
        let mut bytes = msg1_bytes();
        let len = bytes.len();
        bytes[len - 1] = 5;
        assert!(Frame::parse(&bytes[..], 16).is_err());
    }

    #[test]
    fn test_non_key_frame() {
        let bytes = [0x02, 0x01, 0x00, 0x00];
        assert_eq!(Ok(Frame::Unsupported { packet_type: 1 }), Frame::parse(&bytes[..], 16));
    }

    #[test]
    fn test_to_bytes_clears_mic() {
        let mut frame = KeyFrame::new(KeyDescriptor::Ieee802dot11, KeyInformation(0x010a), 16);
        frame.key_mic = Bytes::from(vec![0xff; 16]);
        frame.set_key_data(vec![1, 2, 3]);
        let bytes = frame.to_bytes(true);
        assert_eq!(&[0u8; 16][..], &bytes[81..97]);
        assert_eq!(frame.len() - 4, frame.packet_body_len as usize);
        assert_eq!(&[0, 3, 1, 2, 3][..], &bytes[97..]);
    }
}

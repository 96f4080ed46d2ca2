// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::rsn::{
        akm,
        cipher,
        suite_selector::read_suite_selector,
    },
    crate::{
        appendable::{Appendable, BufferTooSmall},
        error::FrameParseError,
        organization::Oui,
    },
    nom::{
        combinator::all_consuming,
        multi::count,
        number::complete::le_u16,
        IResult,
    },
};

// The WPA1 IE is not fully specified by IEEE. This format was derived from pcap.
// Note that this file only parses fields specific to WPA -- IE headers and MSFT-specific fields
// are omitted.
// (3B) OUI
pub const OUI: Oui = Oui::MSFT;
// (1B) OUI-specific element type
pub const VENDOR_SPECIFIC_TYPE: u8 = 1;
// (2B) WPA type
pub const WPA_TYPE: u16 = 1;
// (4B) multicast cipher
//     0-2 cipher suite (OUI)
//     3   cipher type
// (2B) unicast cipher count
// (4B x N) unicast cipher list
// (2B) AKM count
// (4B x N) AKM list
#[derive(Debug, PartialOrd, PartialEq, Eq, Clone)]
pub struct WpaIe {
    pub multicast_cipher: cipher::Cipher,
    pub unicast_cipher_list: Vec<cipher::Cipher>,
    pub akm_list: Vec<akm::Akm>,
}

impl WpaIe {
    const FIXED_FIELDS_LENGTH: usize = 10;
    pub fn len(&self) -> usize {
        Self::FIXED_FIELDS_LENGTH + self.unicast_cipher_list.len() * 4 + self.akm_list.len() * 4
    }

    pub fn write_into<A: Appendable>(&self, buf: &mut A) -> Result<(), BufferTooSmall> {
        if !buf.can_append(self.len()) {
            return Err(BufferTooSmall);
        }

        buf.append_bytes(&WPA_TYPE.to_le_bytes()[..])?;
        self.multicast_cipher.write_into(buf)?;

        buf.append_bytes(&(self.unicast_cipher_list.len() as u16).to_le_bytes()[..])?;
        for cipher in &self.unicast_cipher_list {
            cipher.write_into(buf)?;
        }

        buf.append_bytes(&(self.akm_list.len() as u16).to_le_bytes()[..])?;
        for akm in &self.akm_list {
            akm.write_into(buf)?;
        }

        Ok(())
    }
}

// Take as many zeroes as possible from the beginning of the buffer. Unlike nom's take_while, this
// handles the case where we run into the end of the buffer.
fn take_while_zero(input: &[u8]) -> IResult<&[u8], ()> {
    match input.iter().position(|b| *b != 0) {
        Some(i) => Ok((&input[i..], ())),
        None => Ok((&input[input.len()..], ())),
    }
}

fn parse_wpa_ie(input: &[u8]) -> IResult<&[u8], WpaIe> {
    let (i, _wpa_type) = le_u16(input)?;
    let (i, multicast_cipher) = read_suite_selector::<cipher::Cipher>(i)?;
    let (i, unicast_cipher_count) = le_u16(i)?;
    let (i, unicast_cipher_list) =
        count(read_suite_selector::<cipher::Cipher>, unicast_cipher_count as usize)(i)?;
    let (i, akm_count) = le_u16(i)?;
    let (i, akm_list) = count(read_suite_selector::<akm::Akm>, akm_count as usize)(i)?;
    // In practice this IE is sometimes zero-padded.
    let (i, ()) = take_while_zero(i)?;
    Ok((i, WpaIe { multicast_cipher, unicast_cipher_list, akm_list }))
}

/// Convert bytes of a WPA information element into a WpaIe representation.
pub fn from_bytes(bytes: &[u8]) -> Result<WpaIe, FrameParseError> {
    all_consuming(parse_wpa_ie)(bytes)
        .map(|(_, wpa_ie)| wpa_ie)
        .map_err(|e| FrameParseError(format!("invalid WPA1 IE: {:?}", e)))
}

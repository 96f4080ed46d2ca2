// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{
        akm::Akm,
        cipher::Cipher,
        pmkid::{Pmkid, PMKID_LEN},
        suite_selector::read_suite_selector,
    },
    crate::{
        appendable::{Appendable, BufferTooSmall},
        error::FrameParseError,
        ie::Id,
    },
    nom::{
        bytes::complete::take,
        error::ErrorKind,
        multi::count,
        number::complete::{le_u16, le_u8},
        IResult,
    },
};

pub const RSNE_VERSION: u16 = 1;

packed_bits! {
    // IEEE Std 802.11-2016, 9.4.2.25.4
    pub struct RsnCapabilities(u16);
    flags {
        preauth, set_preauth: 0;
        no_pairwise, set_no_pairwise: 1;
        mgmt_frame_protection_req, set_mgmt_frame_protection_req: 6;
        mgmt_frame_protection_cap, set_mgmt_frame_protection_cap: 7;
        joint_multiband, set_joint_multiband: 8;
        peerkey_enabled, set_peerkey_enabled: 9;
        ssp_amsdu_cap, set_ssp_amsdu_cap: 10;
        ssp_amsdu_req, set_ssp_amsdu_req: 11;
        pbac, set_pbac: 12;
        extended_key_id, set_extended_key_id: 13;
    }
    fields {
        ptksa_replay_counter, set_ptksa_replay_counter: u8 = 3, 2;
        gtksa_replay_counter, set_gtksa_replay_counter: u8 = 5, 4;
    }
}

impl RsnCapabilities {
    pub fn with_mfp(mut self, capable: bool, required: bool) -> Self {
        self.set_mgmt_frame_protection_cap(capable);
        self.set_mgmt_frame_protection_req(required);
        self
    }
}

// IEEE 802.11-2016, 9.4.2.25.1
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Rsne {
    pub version: u16,
    pub group_data_cipher_suite: Option<Cipher>,
    pub pairwise_cipher_suites: Vec<Cipher>,
    pub akm_suites: Vec<Akm>,
    pub rsn_capabilities: Option<RsnCapabilities>,
    pub pmkids: Vec<Pmkid>,
    pub group_mgmt_cipher_suite: Option<Cipher>,
}

impl Default for Rsne {
    fn default() -> Self {
        Rsne {
            version: RSNE_VERSION,
            group_data_cipher_suite: None,
            pairwise_cipher_suites: vec![],
            akm_suites: vec![],
            rsn_capabilities: None,
            pmkids: vec![],
            group_mgmt_cipher_suite: None,
        }
    }
}

impl Rsne {
    pub fn new() -> Self {
        Self::default()
    }

    /// An element field can only be omitted if all fields following it are omitted as well.
    /// Returns the index of the last field which must be written:
    /// 0 version, 1 group data cipher, 2 pairwise list, 3 AKM list, 4 capabilities, 5 PMKIDs,
    /// 6 group management cipher.
    fn last_present_field(&self) -> usize {
        if self.group_mgmt_cipher_suite.is_some() {
            6
        } else if !self.pmkids.is_empty() {
            5
        } else if self.rsn_capabilities.is_some() {
            4
        } else if !self.akm_suites.is_empty() {
            3
        } else if !self.pairwise_cipher_suites.is_empty() {
            2
        } else if self.group_data_cipher_suite.is_some() {
            1
        } else {
            0
        }
    }

    fn body_len(&self) -> usize {
        let last = self.last_present_field();
        let mut len = 2;
        if last >= 1 {
            len += 4;
        }
        if last >= 2 {
            len += 2 + 4 * self.pairwise_cipher_suites.len();
        }
        if last >= 3 {
            len += 2 + 4 * self.akm_suites.len();
        }
        if last >= 4 {
            len += 2;
        }
        if last >= 5 {
            len += 2 + PMKID_LEN * self.pmkids.len();
        }
        if last >= 6 {
            len += 4;
        }
        len
    }

    /// Length of the full element including its two byte header.
    pub fn len(&self) -> usize {
        2 + self.body_len()
    }

    pub fn write_into<A: Appendable>(&self, buf: &mut A) -> Result<(), BufferTooSmall> {
        if !buf.can_append(self.len()) {
            return Err(BufferTooSmall);
        }
        let last = self.last_present_field();

        buf.append_byte(Id::RSNE.0)?;
        buf.append_byte(self.body_len() as u8)?;
        buf.append_bytes(&self.version.to_le_bytes()[..])?;

        if last >= 1 {
            // A missing group cipher followed by further fields is written as the default suite.
            let group = self
                .group_data_cipher_suite
                .unwrap_or_else(|| Cipher::new_dot11(super::cipher::CCMP_128));
            group.write_into(buf)?;
        }
        if last >= 2 {
            buf.append_bytes(&(self.pairwise_cipher_suites.len() as u16).to_le_bytes()[..])?;
            for cipher in &self.pairwise_cipher_suites {
                cipher.write_into(buf)?;
            }
        }
        if last >= 3 {
            buf.append_bytes(&(self.akm_suites.len() as u16).to_le_bytes()[..])?;
            for akm in &self.akm_suites {
                akm.write_into(buf)?;
            }
        }
        if last >= 4 {
            let caps = self.rsn_capabilities.unwrap_or_default();
            buf.append_bytes(&caps.raw().to_le_bytes()[..])?;
        }
        if last >= 5 {
            buf.append_bytes(&(self.pmkids.len() as u16).to_le_bytes()[..])?;
            for pmkid in &self.pmkids {
                buf.append_bytes(&pmkid[..])?;
            }
        }
        if last >= 6 {
            if let Some(cipher) = self.group_mgmt_cipher_suite.as_ref() {
                cipher.write_into(buf)?;
            }
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        // Writing into a Vec cannot run out of space.
        let _ = self.write_into(&mut buf);
        buf
    }

    /// True if the element advertises management frame protection as supported.
    pub fn mfp_capable(&self) -> bool {
        self.rsn_capabilities.map_or(false, |caps| caps.mgmt_frame_protection_cap())
    }

    pub fn mfp_required(&self) -> bool {
        self.rsn_capabilities.map_or(false, |caps| caps.mgmt_frame_protection_req())
    }

    /// True if BlockAck agreements are only set up and moved by protected action frames.
    pub fn protected_block_ack(&self) -> bool {
        self.rsn_capabilities.map_or(false, |caps| caps.pbac())
    }
}

fn read_pmkid(input: &[u8]) -> IResult<&[u8], Pmkid> {
    let (i, bytes) = take(PMKID_LEN)(input)?;
    let mut pmkid = [0u8; PMKID_LEN];
    pmkid.copy_from_slice(bytes);
    Ok((i, pmkid))
}

fn parse_body(input: &[u8]) -> IResult<&[u8], Rsne> {
    let (mut i, version) = le_u16(input)?;
    let mut rsne = Rsne { version, ..Default::default() };

    if i.is_empty() {
        return Ok((i, rsne));
    }
    let (rest, group) = read_suite_selector::<Cipher>(i)?;
    rsne.group_data_cipher_suite = Some(group);
    i = rest;

    if i.is_empty() {
        return Ok((i, rsne));
    }
    let (rest, n) = le_u16(i)?;
    let (rest, pairwise) = count(read_suite_selector::<Cipher>, n as usize)(rest)?;
    rsne.pairwise_cipher_suites = pairwise;
    i = rest;

    if i.is_empty() {
        return Ok((i, rsne));
    }
    let (rest, n) = le_u16(i)?;
    let (rest, akms) = count(read_suite_selector::<Akm>, n as usize)(rest)?;
    rsne.akm_suites = akms;
    i = rest;

    if i.is_empty() {
        return Ok((i, rsne));
    }
    let (rest, caps) = le_u16(i)?;
    rsne.rsn_capabilities = Some(RsnCapabilities(caps));
    i = rest;

    if i.is_empty() {
        return Ok((i, rsne));
    }
    let (rest, n) = le_u16(i)?;
    let (rest, pmkids) = count(read_pmkid, n as usize)(rest)?;
    rsne.pmkids = pmkids;
    i = rest;

    if i.is_empty() {
        return Ok((i, rsne));
    }
    let (rest, group_mgmt) = read_suite_selector::<Cipher>(i)?;
    rsne.group_mgmt_cipher_suite = Some(group_mgmt);
    Ok((rest, rsne))
}

fn parse_element(input: &[u8]) -> IResult<&[u8], Rsne> {
    let (i, id) = le_u8(input)?;
    if id != Id::RSNE.0 {
        return Err(nom::Err::Error((input, ErrorKind::Tag)));
    }
    let (i, len) = le_u8(i)?;
    let (rest, body) = take(len as usize)(i)?;
    let (_, rsne) = parse_body(body)?;
    Ok((rest, rsne))
}

/// Parses a complete RSNE, including its element ID and length.
pub fn from_bytes(bytes: &[u8]) -> Result<Rsne, FrameParseError> {
    parse_element(bytes)
        .map(|(_, rsne)| rsne)
        .map_err(|e| FrameParseError(format!("invalid RSNE: {:?}", e)))
}

/// Parses the body of an RSNE as yielded by an element reader.
pub fn from_body(body: &[u8]) -> Result<Rsne, FrameParseError> {
    parse_body(body)
        .map(|(_, rsne)| rsne)
        .map_err(|e| FrameParseError(format!("invalid RSNE body: {:?}", e)))
}

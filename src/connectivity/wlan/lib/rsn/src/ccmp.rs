// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! CCMP-128 MPDU protection, IEEE Std 802.11-2016, 12.5.3.

use {
    crate::Error,
    aes::Aes128,
    ccm::{
        aead::{
            consts::{U13, U8},
            generic_array::GenericArray,
            AeadInPlace, NewAead,
        },
        Ccm,
    },
    std::fmt,
    wlan_common::mac::{header_len, FrameControl, NUM_TIDS},
};

pub const CCMP_HDR_LEN: usize = 8;
pub const CCMP_MIC_LEN: usize = 8;
pub const CCMP_TK_LEN: usize = 16;
/// PNs are 48 bits wide.
pub const MAX_PN: u64 = 0xffff_ffff_ffff;
/// Replay counter slot used by protected management frames.
pub const MGMT_REPLAY_SLOT: usize = NUM_TIDS;

const EXT_IV: u8 = 0x20;
const NONCE_MGMT_FLAG: u8 = 0x10;
const ADDR1_OFFSET: usize = 4;
const ADDR2_OFFSET: usize = 10;
const SEQ_CTRL_OFFSET: usize = 22;
const ADDR4_OFFSET: usize = 24;

type Aes128Ccm = Ccm<Aes128, U8, U13>;

/// A CCMP temporal key bound to its key identifier.
pub struct CcmpKey {
    aead: Aes128Ccm,
    key_id: u8,
}

impl fmt::Debug for CcmpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CcmpKey {{ key_id: {} }}", self.key_id)
    }
}

/// Frame control and header length of a data or management MPDU.
fn parse_hdr(mpdu: &[u8]) -> Result<(FrameControl, usize), Error> {
    if mpdu.len() < 2 {
        return Err(Error::CcmpFrameTooShort(mpdu.len()));
    }
    let fc = FrameControl(u16::from_le_bytes([mpdu[0], mpdu[1]]));
    if !fc.is_data() && !fc.is_mgmt() {
        return Err(Error::CcmpUnsupportedFrame(fc.raw()));
    }
    let hdr_len = header_len(fc);
    if mpdu.len() < hdr_len {
        return Err(Error::CcmpFrameTooShort(mpdu.len()));
    }
    Ok((fc, hdr_len))
}

fn qos_tid(fc: FrameControl, hdr: &[u8]) -> Option<u8> {
    if !fc.is_qos() {
        return None;
    }
    let offset = if fc.has_addr4() { ADDR4_OFFSET + 6 } else { ADDR4_OFFSET };
    Some(hdr[offset] & 0x0f)
}

/// IEEE Std 802.11-2016, 12.5.3.3.3
fn build_aad(fc: FrameControl, hdr: &[u8]) -> Vec<u8> {
    let mut masked = fc;
    masked.set_retry(false);
    masked.set_pwr_mgmt(false);
    masked.set_more_data(false);
    masked.set_protected(true);
    if fc.is_data() {
        // Subtype bits 4, 5 and 6 are masked; the QoS bit is kept.
        masked.set_frame_subtype(fc.frame_subtype() & 0b1000);
    }
    if fc.is_qos() {
        masked.set_htc_order(false);
    }

    let mut aad = Vec::with_capacity(30);
    aad.extend_from_slice(&masked.raw().to_le_bytes()[..]);
    aad.extend_from_slice(&hdr[ADDR1_OFFSET..SEQ_CTRL_OFFSET]);
    let seq_ctrl = u16::from_le_bytes([hdr[SEQ_CTRL_OFFSET], hdr[SEQ_CTRL_OFFSET + 1]]);
    aad.extend_from_slice(&(seq_ctrl & 0x000f).to_le_bytes()[..]);
    if fc.has_addr4() {
        aad.extend_from_slice(&hdr[ADDR4_OFFSET..ADDR4_OFFSET + 6]);
    }
    if let Some(tid) = qos_tid(fc, hdr) {
        aad.push(tid);
        aad.push(0);
    }
    aad
}

/// IEEE Std 802.11-2016, 12.5.3.3.4
fn build_nonce(fc: FrameControl, hdr: &[u8], pn: u64) -> [u8; 13] {
    let mut nonce = [0u8; 13];
    let mut flags = qos_tid(fc, hdr).unwrap_or(0);
    if fc.is_mgmt() {
        flags |= NONCE_MGMT_FLAG;
    }
    nonce[0] = flags;
    nonce[1..7].copy_from_slice(&hdr[ADDR2_OFFSET..ADDR2_OFFSET + 6]);
    // PN5 first.
    nonce[7..13].copy_from_slice(&pn.to_be_bytes()[2..]);
    nonce
}

// IEEE Std 802.11-2016, 12.5.3.2, Figure 12-17
fn write_ccmp_hdr(out: &mut Vec<u8>, pn: u64, key_id: u8) {
    let pn = pn.to_le_bytes();
    out.extend_from_slice(&[pn[0], pn[1], 0, EXT_IV | (key_id << 6), pn[2], pn[3], pn[4], pn[5]]);
}

fn read_pn(ccmp_hdr: &[u8]) -> Result<u64, Error> {
    if ccmp_hdr[3] & EXT_IV == 0 {
        return Err(Error::CcmpMissingExtIv);
    }
    let h = ccmp_hdr;
    Ok(u64::from_le_bytes([h[0], h[1], h[4], h[5], h[6], h[7], 0, 0]))
}

/// Slot of the replay counter protecting frames of this kind: one per TID for QoS data, TID 0
/// for non-QoS data and a dedicated slot for management frames.
fn replay_slot(fc: FrameControl, hdr: &[u8]) -> usize {
    if fc.is_mgmt() {
        MGMT_REPLAY_SLOT
    } else {
        qos_tid(fc, hdr).unwrap_or(0) as usize
    }
}

impl CcmpKey {
    pub fn new(tk: &[u8], key_id: u8) -> Result<Self, Error> {
        if tk.len() != CCMP_TK_LEN {
            return Err(Error::InvalidKeyLength(tk.len()));
        }
        if key_id > 3 {
            return Err(Error::InvalidKeyId(key_id as u16));
        }
        Ok(CcmpKey { aead: Aes128Ccm::new(GenericArray::from_slice(tk)), key_id })
    }

    pub fn key_id(&self) -> u8 {
        self.key_id
    }

    /// Protects a plaintext MPDU with the given PN. The returned frame carries the Protected bit,
    /// the CCMP header and the MIC.
    pub fn encrypt(&self, pn: u64, mpdu: &[u8]) -> Result<Vec<u8>, Error> {
        if pn > MAX_PN {
            return Err(Error::CcmpPnExhausted);
        }
        let (fc, hdr_len) = parse_hdr(mpdu)?;
        let hdr = &mpdu[..hdr_len];

        let mut out = Vec::with_capacity(mpdu.len() + CCMP_HDR_LEN + CCMP_MIC_LEN);
        let mut protected_fc = fc;
        protected_fc.set_protected(true);
        out.extend_from_slice(&protected_fc.raw().to_le_bytes()[..]);
        out.extend_from_slice(&hdr[2..]);
        write_ccmp_hdr(&mut out, pn, self.key_id);
        let body_start = out.len();
        out.extend_from_slice(&mpdu[hdr_len..]);

        let aad = build_aad(fc, hdr);
        let nonce = build_nonce(fc, hdr, pn);
        let tag = self
            .aead
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce[..]), &aad[..], &mut out[body_start..])
            .map_err(|_| Error::CcmpEncryptionFailed)?;
        out.extend_from_slice(&tag[..]);
        Ok(out)
    }

    /// Decrypts a protected MPDU without consulting any replay counter. Returns the frame's PN
    /// and the plaintext MPDU with the Protected bit cleared.
    pub fn decrypt(&self, mpdu: &[u8]) -> Result<(u64, Vec<u8>), Error> {
        let (fc, hdr_len) = parse_hdr(mpdu)?;
        if mpdu.len() < hdr_len + CCMP_HDR_LEN + CCMP_MIC_LEN {
            return Err(Error::CcmpFrameTooShort(mpdu.len()));
        }
        let hdr = &mpdu[..hdr_len];
        let pn = read_pn(&mpdu[hdr_len..hdr_len + CCMP_HDR_LEN])?;

        let mic_start = mpdu.len() - CCMP_MIC_LEN;
        let mut body = mpdu[hdr_len + CCMP_HDR_LEN..mic_start].to_vec();
        let aad = build_aad(fc, hdr);
        let nonce = build_nonce(fc, hdr, pn);
        self.aead
            .decrypt_in_place_detached(
                GenericArray::from_slice(&nonce[..]),
                &aad[..],
                &mut body[..],
                GenericArray::from_slice(&mpdu[mic_start..]),
            )
            .map_err(|_| Error::CcmpMicFailure)?;

        let mut out = Vec::with_capacity(hdr_len + body.len());
        let mut plain_fc = fc;
        plain_fc.set_protected(false);
        out.extend_from_slice(&plain_fc.raw().to_le_bytes()[..]);
        out.extend_from_slice(&hdr[2..]);
        out.extend_from_slice(&body[..]);
        Ok((pn, out))
    }
}

/// Monotonic transmit PN for one key.
#[derive(Debug, Clone, Default)]
pub struct PnCounter(u64);

impl PnCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> Result<u64, Error> {
        if self.0 >= MAX_PN {
            return Err(Error::CcmpPnExhausted);
        }
        self.0 += 1;
        Ok(self.0)
    }
}

/// Last accepted PN per replay counter slot of one key.
#[derive(Debug, Clone, Default)]
pub struct ReplayCounters {
    last_pn: [Option<u64>; NUM_TIDS + 1],
}

impl ReplayCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for a group key whose Authenticator announced `rsc` as the next PN to be used.
    pub fn with_rsc(rsc: u64) -> Self {
        let mut counters = Self::default();
        if rsc > 0 {
            counters.last_pn = [Some(rsc - 1); NUM_TIDS + 1];
        }
        counters
    }

    pub fn last_pn(&self, slot: usize) -> Option<u64> {
        self.last_pn.get(slot).copied().flatten()
    }

    pub fn check(&self, slot: usize, pn: u64) -> Result<(), Error> {
        match self.last_pn(slot) {
            Some(last) if pn <= last => Err(Error::CcmpReplay(pn, last)),
            _ => Ok(()),
        }
    }

    pub fn update(&mut self, slot: usize, pn: u64) {
        if let Some(counter) = self.last_pn.get_mut(slot) {
            *counter = Some(pn);
        }
    }

    pub fn reset(&mut self) {
        self.last_pn = [None; NUM_TIDS + 1];
    }
}

/// Decrypts a protected MPDU and enforces replay protection. The replay counter is only advanced
/// once the MIC was verified.
pub fn decrypt_mpdu(
    key: &CcmpKey,
    counters: &mut ReplayCounters,
    mpdu: &[u8],
) -> Result<Vec<u8>, Error> {
    let (fc, hdr_len) = parse_hdr(mpdu)?;
    if mpdu.len() < hdr_len + CCMP_HDR_LEN + CCMP_MIC_LEN {
        return Err(Error::CcmpFrameTooShort(mpdu.len()));
    }
    let slot = replay_slot(fc, &mpdu[..hdr_len]);
    let pn = read_pn(&mpdu[hdr_len..hdr_len + CCMP_HDR_LEN])?;
    counters.check(slot, pn)?;

    let (pn, plain) = key.decrypt(mpdu)?;
    counters.update(slot, pn);
    Ok(plain)
}

/// Handles an MPDU which the hardware already decrypted and verified. The CCMP header is still
/// present while the MIC was removed. Only replay protection is enforced in software.
pub fn strip_hw_decrypted(counters: &mut ReplayCounters, mpdu: &[u8]) -> Result<Vec<u8>, Error> {
    let (fc, hdr_len) = parse_hdr(mpdu)?;
    if mpdu.len() < hdr_len + CCMP_HDR_LEN {
        return Err(Error::CcmpFrameTooShort(mpdu.len()));
    }
    let slot = replay_slot(fc, &mpdu[..hdr_len]);
    let pn = read_pn(&mpdu[hdr_len..hdr_len + CCMP_HDR_LEN])?;
    counters.check(slot, pn)?;
    counters.update(slot, pn);

    let mut out = Vec::with_capacity(mpdu.len() - CCMP_HDR_LEN);
    let mut plain_fc = fc;
    plain_fc.set_protected(false);
    out.extend_from_slice(&plain_fc.raw().to_le_bytes()[..]);
    out.extend_from_slice(&mpdu[2..hdr_len]);
    out.extend_from_slice(&mpdu[hdr_len + CCMP_HDR_LEN..]);
    Ok(out)
}

// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::Tk,
    crate::{
        crypto_utils::{kdf_sha256, prf},
        Error,
    },
    std::cmp::{max, min},
    wlan_common::ie::rsn::{akm::Akm, cipher::Cipher},
};

/// A PTK is derived from a PMK and provides access to the PTK's key-hierarchy which yields a KEK,
/// KCK, and TK, used for EAPOL frame protection, integrity check and unicast frame protection
/// respectively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ptk {
    pub ptk: Vec<u8>,
    kck_len: usize,
    kek_len: usize,
    tk_len: usize,
    pub cipher: Cipher,
}

impl Tk for Ptk {
    fn tk(&self) -> &[u8] {
        let start = self.kck_len + self.kek_len;
        &self.ptk[start..start + self.tk_len]
    }
}

impl Ptk {
    // IEEE 802.11-2016, 12.7.1.3
    pub fn new(
        pmk: &[u8],
        aa: &[u8; 6],
        spa: &[u8; 6],
        anonce: &[u8],
        snonce: &[u8],
        akm: &Akm,
        cipher: Cipher,
    ) -> Result<Ptk, Error> {
        let pmk_len = akm.pmk_bits().ok_or(Error::PtkHierarchyUnsupportedAkm)? as usize / 8;
        if pmk.len() != pmk_len {
            return Err(Error::InvalidPmkLength(pmk_len, pmk.len()));
        }
        if anonce.len() != 32 || snonce.len() != 32 {
            return Err(Error::InvalidNonceSize(anonce.len().min(snonce.len())));
        }

        let kck_bits = akm.kck_bits().ok_or(Error::PtkHierarchyUnsupportedAkm)?;
        let kek_bits = akm.kek_bits().ok_or(Error::PtkHierarchyUnsupportedAkm)?;
        let tk_bits = cipher.tk_bytes().ok_or(Error::PtkHierarchyUnsupportedCipher)? * 8;
        let prf_bits = kck_bits + kek_bits + tk_bits;

        // data length = 6 (aa) + 6 (spa) + 32 (anonce) + 32 (snonce)
        let mut data: [u8; 76] = [0; 76];
        data[0..6].copy_from_slice(&min(aa, spa)[..]);
        data[6..12].copy_from_slice(&max(aa, spa)[..]);
        data[12..44].copy_from_slice(&min(anonce, snonce)[..]);
        data[44..].copy_from_slice(&max(anonce, snonce)[..]);

        let ptk_bytes = if akm.uses_sha256_kdf() {
            kdf_sha256(pmk, "Pairwise key expansion", &data[..], prf_bits as usize)?
        } else {
            prf(pmk, "Pairwise key expansion", &data[..], prf_bits as usize)?
        };
        let ptk = Ptk {
            ptk: ptk_bytes,
            kck_len: (kck_bits / 8) as usize,
            kek_len: (kek_bits / 8) as usize,
            tk_len: (tk_bits / 8) as usize,
            cipher,
        };
        Ok(ptk)
    }

    pub fn kck(&self) -> &[u8] {
        &self.ptk[0..self.kck_len]
    }

    pub fn kek(&self) -> &[u8] {
        let start = self.kck_len;
        &self.ptk[start..start + self.kek_len]
    }
}

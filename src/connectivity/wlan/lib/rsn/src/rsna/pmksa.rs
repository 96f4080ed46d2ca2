// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{crypto_utils::hmac_sha1_128, Error},
    hmac::{Hmac, Mac, NewMac},
    log::info,
    sha2::Sha256,
    std::collections::VecDeque,
    wlan_common::{
        ie::rsn::{
            akm::Akm,
            pmkid::{Pmkid, PMKID_LEN},
        },
        mac::MacAddr,
    },
};

const PMK_NAME: &[u8] = b"PMK Name";
pub const DEFAULT_CAPACITY: usize = 8;

/// IEEE Std 802.11-2016, 12.7.1.3: PMKID = Truncate-128(HMAC(PMK, "PMK Name" || AA || SPA))
pub fn compute_pmkid(pmk: &[u8], aa: &MacAddr, spa: &MacAddr, akm: &Akm) -> Result<Pmkid, Error> {
    if akm.uses_sha256_kdf() {
        let mut hmac =
            Hmac::<Sha256>::new_from_slice(pmk).map_err(|_| Error::InvalidKeyLength(pmk.len()))?;
        hmac.update(PMK_NAME);
        hmac.update(&aa[..]);
        hmac.update(&spa[..]);
        let mut pmkid = [0u8; PMKID_LEN];
        pmkid.copy_from_slice(&hmac.finalize().into_bytes()[..PMKID_LEN]);
        Ok(pmkid)
    } else {
        hmac_sha1_128(pmk, &[PMK_NAME, &aa[..], &spa[..]])
    }
}

/// A cached PMK security association.
#[derive(Debug, Clone, PartialEq)]
pub struct Pmksa {
    pub pmkid: Pmkid,
    pub pmk: Vec<u8>,
    pub aa: MacAddr,
}

/// Bounded cache of PMKSAs, oldest entries are evicted first.
#[derive(Debug)]
pub struct PmksaCache {
    entries: VecDeque<Pmksa>,
    capacity: usize,
}

impl Default for PmksaCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PmksaCache {
    pub fn new(capacity: usize) -> Self {
        PmksaCache { entries: VecDeque::with_capacity(capacity), capacity: capacity.max(1) }
    }

    /// Adds a PMKSA. An older PMKSA with the same Authenticator is replaced.
    pub fn insert(&mut self, pmksa: Pmksa) {
        self.entries.retain(|e| e.aa != pmksa.aa);
        if self.entries.len() >= self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                info!("evicting PMKSA {:02x?}", &evicted.pmkid[..4]);
            }
        }
        self.entries.push_back(pmksa);
    }

    pub fn lookup(&self, pmkid: &Pmkid, aa: &MacAddr) -> Option<&Pmksa> {
        self.entries.iter().find(|e| &e.pmkid == pmkid && &e.aa == aa)
    }

    pub fn get_by_aa(&self, aa: &MacAddr) -> Option<&Pmksa> {
        self.entries.iter().find(|e| &e.aa == aa)
    }

    pub fn remove(&mut self, aa: &MacAddr) {
        self.entries.retain(|e| &e.aa != aa);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod cmac_aes128;
mod hmac_sha1;

use {
    crate::Error,
    cmac_aes128::CmacAes128,
    hmac_sha1::HmacSha1,
    wlan_common::ie::rsn::akm::{self, Akm},
};

/// Message integrity algorithm used to protect EAPOL-Key frames.
pub trait Algorithm {
    fn verify(&self, key: &[u8], data: &[u8], expected: &[u8]) -> bool;
    fn compute(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error>;
}

pub fn integrity_algorithm(akm: &Akm) -> Option<Box<dyn Algorithm>> {
    if akm.is_vendor_specific() {
        return None;
    }
    // IEEE 802.11-2016, 12.7.3, Table 12-8
    match akm.suite_type {
        akm::EAP | akm::PSK => Some(Box::new(HmacSha1::new())),
        akm::EAP_SHA256 | akm::PSK_SHA256 => Some(Box::new(CmacAes128::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_by_akm() {
        assert!(integrity_algorithm(&Akm::new_dot11(akm::PSK)).is_some());
        assert!(integrity_algorithm(&Akm::new_dot11(akm::PSK_SHA256)).is_some());
        assert!(integrity_algorithm(&Akm::new_dot11(akm::SAE)).is_none());
    }

    #[test]
    fn mic_depends_on_algorithm() {
        let key = [3u8; 16];
        let data = b"eapol key frame";
        let sha1 = integrity_algorithm(&Akm::new_dot11(akm::PSK)).expect("HMAC-SHA1");
        let cmac = integrity_algorithm(&Akm::new_dot11(akm::PSK_SHA256)).expect("AES-CMAC");
        let a = sha1.compute(&key[..], &data[..]).expect("computing MIC");
        let b = cmac.compute(&key[..], &data[..]).expect("computing MIC");
        assert_eq!(16, a.len());
        assert_eq!(16, b.len());
        assert_ne!(a, b);
    }
}

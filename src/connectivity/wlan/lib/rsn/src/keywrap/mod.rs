// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod aes;

use {
    crate::Error,
    wlan_common::ie::rsn::akm::{self, Akm},
};

/// Key wrapping algorithm used to protect key data carried in EAPOL-Key frames.
pub trait Algorithm {
    fn wrap(&self, key: &[u8], p: &[u8]) -> Result<Vec<u8>, Error>;
    fn unwrap(&self, key: &[u8], c: &[u8]) -> Result<Vec<u8>, Error>;
}

/// IEEE Std 802.11-2016, 12.7.3, Table 12-8
pub fn keywrap_algorithm(akm: &Akm) -> Option<Box<dyn Algorithm>> {
    if akm.is_vendor_specific() {
        return None;
    }
    match akm.suite_type {
        akm::EAP | akm::PSK | akm::EAP_SHA256 | akm::PSK_SHA256 => Some(Box::new(aes::NistAes)),
        _ => None,
    }
}

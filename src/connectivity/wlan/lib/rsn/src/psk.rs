// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::Error,
    hmac::Hmac,
    sha1::Sha1,
    wlan_common::ie::SSID_MAX_LEN,
};

/// Keys derived from a passphrase provide comparably low levels of security.
/// Passphrases should have a minimum length of 20 characters since shorter passphrases
/// are unlikely to prevent attacks.
pub type Psk = Box<[u8]>;

pub const PSK_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 4096;

/// IEEE Std 802.11-2016, J.4.1
pub fn compute(passphrase: &[u8], ssid: &[u8]) -> Result<Psk, Error> {
    // IEEE Std 802.11-2016, M.4.1: each character is a printable ASCII character.
    if passphrase.len() < 8 || passphrase.len() > 63 {
        return Err(Error::InvalidPassphraseLen(passphrase.len()));
    }
    if let Some(c) = passphrase.iter().find(|c| **c < 32 || **c > 126) {
        return Err(Error::InvalidPassphraseChar(*c));
    }
    if ssid.len() > SSID_MAX_LEN {
        return Err(Error::InvalidSsidLen(ssid.len()));
    }

    let mut psk = vec![0u8; PSK_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha1>>(passphrase, ssid, PBKDF2_ROUNDS, &mut psk[..]);
    Ok(psk.into_boxed_slice())
}

/// Accepts an already derived PSK, e.g. configured as 64 hex digits.
pub fn from_raw(psk: &[u8]) -> Result<Psk, Error> {
    if psk.len() != PSK_LEN {
        return Err(Error::InvalidPmkLength(PSK_LEN, psk.len()));
    }
    Ok(psk.to_vec().into_boxed_slice())
}

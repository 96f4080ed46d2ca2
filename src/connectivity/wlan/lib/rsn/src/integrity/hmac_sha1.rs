// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::Algorithm,
    crate::Error,
    hmac::{Hmac, Mac, NewMac},
    sha1::Sha1,
};

/// HMAC-SHA1-128, IEEE Std 802.11-2016, 12.7.3, Key Descriptor Version 2.
pub struct HmacSha1;

impl HmacSha1 {
    pub fn new() -> Self {
        HmacSha1
    }
}

impl Algorithm for HmacSha1 {
    fn verify(&self, key: &[u8], data: &[u8], expected: &[u8]) -> bool {
        match self.compute(key, data) {
            Ok(mic) => !expected.is_empty() && mic.len() >= expected.len() && {
                // MICs are truncated to the length carried in the frame.
                mic[..expected.len()] == expected[..]
            },
            Err(_) => false,
        }
    }

    fn compute(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut hmac =
            Hmac::<Sha1>::new_from_slice(key).map_err(|_| Error::InvalidKeyLength(key.len()))?;
        hmac.update(data);
        let mut mic = hmac.finalize().into_bytes().to_vec();
        mic.truncate(16);
        Ok(mic)
    }
}

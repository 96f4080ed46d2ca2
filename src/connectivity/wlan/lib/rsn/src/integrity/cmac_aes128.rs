// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::Algorithm,
    crate::Error,
    aes::Aes128,
    cmac::Cmac,
    hmac::{Mac, NewMac},
};

/// AES-128-CMAC, IEEE Std 802.11-2016, 12.7.3, Key Descriptor Version 3.
pub struct CmacAes128;

impl CmacAes128 {
    pub fn new() -> Self {
        CmacAes128
    }
}

impl Algorithm for CmacAes128 {
    fn verify(&self, key: &[u8], data: &[u8], expected: &[u8]) -> bool {
        match self.compute(key, data) {
            Ok(mic) => mic[..] == expected[..],
            Err(_) => false,
        }
    }

    fn compute(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
        let mut cmac =
            Cmac::<Aes128>::new_from_slice(key).map_err(|_| Error::InvalidKeyLength(key.len()))?;
        cmac.update(data);
        Ok(cmac.finalize().into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex::FromHex;

    // RFC 4493, Example 2
    #[test]
    fn test_rfc4493_example_2() {
        let key = Vec::from_hex("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let data = Vec::from_hex("6bc1bee22e409f96e93d7e117393172a").unwrap();
        let expected = Vec::from_hex("070a16b46b4d4144f79bdd9dd04a287c").unwrap();
        let mic = CmacAes128::new().compute(&key[..], &data[..]).expect("computing MIC");
        assert_eq!(mic, expected);
        assert!(CmacAes128::new().verify(&key[..], &data[..], &expected[..]));
    }

    #[test]
    fn test_invalid_key_length() {
        assert_eq!(Err(Error::InvalidKeyLength(5)), CmacAes128::new().compute(&[0; 5][..], b"x"));
    }
}

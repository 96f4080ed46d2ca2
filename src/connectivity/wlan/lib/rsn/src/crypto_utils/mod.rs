// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub mod nonce;

use {
    crate::Error,
    hmac::{Hmac, Mac, NewMac},
    sha1::Sha1,
    sha2::Sha256,
};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

const VALID_PRF_BIT_SIZES: [usize; 6] = [128, 192, 256, 384, 512, 704];

/// IEEE Std 802.11-2016, 12.7.1.2
/// Returns `bits` bits of output from the HMAC-SHA1 based pseudo-random function.
pub fn prf(k: &[u8], a: &str, b: &[u8], bits: usize) -> Result<Vec<u8>, Error> {
    if !VALID_PRF_BIT_SIZES.contains(&bits) {
        return Err(Error::InvalidBitSize(bits));
    }

    let mut result = Vec::with_capacity((bits + 159) / 160 * 20);
    let iterations = (bits + 159) / 160;
    for i in 0..iterations {
        let mut hmac = HmacSha1::new_from_slice(k).map_err(|_| Error::InvalidKeyLength(k.len()))?;
        hmac.update(a.as_bytes());
        hmac.update(&[0u8]);
        hmac.update(b);
        hmac.update(&[i as u8]);
        result.extend_from_slice(&hmac.finalize().into_bytes()[..]);
    }
    result.truncate(bits / 8);
    Ok(result)
}

/// IEEE Std 802.11-2016, 12.7.1.7.2
/// Key derivation function based on HMAC-SHA256. Used by AKMs with SHA-256 key hierarchies.
pub fn kdf_sha256(k: &[u8], label: &str, context: &[u8], bits: usize) -> Result<Vec<u8>, Error> {
    if bits == 0 || bits % 8 != 0 || bits > u16::max_value() as usize {
        return Err(Error::InvalidBitSize(bits));
    }

    let iterations = (bits + 255) / 256;
    let mut result = Vec::with_capacity(iterations * 32);
    for i in 1..=iterations {
        let mut hmac =
            HmacSha256::new_from_slice(k).map_err(|_| Error::InvalidKeyLength(k.len()))?;
        hmac.update(&(i as u16).to_le_bytes()[..]);
        hmac.update(label.as_bytes());
        hmac.update(context);
        hmac.update(&(bits as u16).to_le_bytes()[..]);
        result.extend_from_slice(&hmac.finalize().into_bytes()[..]);
    }
    result.truncate(bits / 8);
    Ok(result)
}

/// HMAC-SHA1 truncated to 128 bits, as used for PMKID computation.
pub fn hmac_sha1_128(k: &[u8], data: &[&[u8]]) -> Result<[u8; 16], Error> {
    let mut hmac = HmacSha1::new_from_slice(k).map_err(|_| Error::InvalidKeyLength(k.len()))?;
    for chunk in data {
        hmac.update(chunk);
    }
    let mut out = [0u8; 16];
    out.copy_from_slice(&hmac.finalize().into_bytes()[..16]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex::FromHex;

    // IEEE Std 802.11-2016, J.3.2, Test case 1
    #[test]
    fn test_prf_test_case_1() {
        let key = Vec::from_hex("0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b").unwrap();
        let actual = prf(&key[..], "prefix", "Hi There".as_bytes(), 512);
        assert_eq!(actual.is_ok(), true);

        let expected = Vec::from_hex(
            "bcd4c650b30b9684951829e0d75f9d54b862175ed9f00606e17d8da35402ffee\
             75df78c3d31e0f889f012120c0862beb67753e7439ae242edb8373698356cf5a",
        )
        .unwrap();
        assert_eq!(actual.unwrap(), expected);
    }

    #[test]
    fn test_prf_truncates_output() {
        let key = [0x0bu8; 20];
        let long = prf(&key[..], "prefix", b"Hi There", 512).expect("PRF-512");
        let short = prf(&key[..], "prefix", b"Hi There", 384).expect("PRF-384");
        assert_eq!(48, short.len());
        assert_eq!(&long[..48], &short[..]);
    }

    #[test]
    fn test_prf_invalid_bit_size() {
        assert_eq!(Err(Error::InvalidBitSize(100)), prf(&[1; 32][..], "label", &[][..], 100));
    }

    #[test]
    fn test_kdf_sha256_length_and_label_separation() {
        let key = [7u8; 32];
        let a = kdf_sha256(&key[..], "Pairwise key expansion", &[1, 2, 3][..], 384)
            .expect("KDF-384");
        let b = kdf_sha256(&key[..], "Other label", &[1, 2, 3][..], 384).expect("KDF-384");
        assert_eq!(48, a.len());
        assert_ne!(a, b);
        // The output length is mixed into every block.
        let c = kdf_sha256(&key[..], "Pairwise key expansion", &[1, 2, 3][..], 256)
            .expect("KDF-256");
        assert_ne!(&a[..32], &c[..]);
    }

    #[test]
    fn test_kdf_sha256_invalid_bit_size() {
        assert_eq!(Err(Error::InvalidBitSize(7)), kdf_sha256(&[1; 32][..], "l", &[][..], 7));
    }
}

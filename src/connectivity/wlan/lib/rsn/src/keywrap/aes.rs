// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::Algorithm,
    crate::Error,
    aes::{Aes128, Block, BlockDecrypt, BlockEncrypt, NewBlockCipher},
};

// RFC 3394, 2.2.3.1
const DEFAULT_IV: [u8; 8] = [0xa6; 8];
const BLOCK_SIZE: usize = 8;

/// AES Key Wrap as specified in RFC 3394.
pub struct NistAes;

fn new_cipher(key: &[u8]) -> Result<Aes128, Error> {
    Aes128::new_from_slice(key).map_err(|_| Error::InvalidKeyLength(key.len()))
}

impl Algorithm for NistAes {
    // RFC 3394, 2.2.1
    fn wrap(&self, key: &[u8], p: &[u8]) -> Result<Vec<u8>, Error> {
        if p.len() < 16 || p.len() % BLOCK_SIZE != 0 {
            return Err(Error::InvalidKeyDataLength(p.len()));
        }
        let cipher = new_cipher(key)?;
        let n = p.len() / BLOCK_SIZE;

        let mut a = DEFAULT_IV;
        let mut r: Vec<[u8; 8]> = p
            .chunks(BLOCK_SIZE)
            .map(|chunk| {
                let mut block = [0u8; 8];
                block.copy_from_slice(chunk);
                block
            })
            .collect();

        let mut b = Block::default();
        for j in 0..6 {
            for i in 1..=n {
                b[..8].copy_from_slice(&a[..]);
                b[8..].copy_from_slice(&r[i - 1][..]);
                cipher.encrypt_block(&mut b);

                let t = (n * j + i) as u64;
                a.copy_from_slice(&b[..8]);
                for (a_byte, t_byte) in a.iter_mut().zip(t.to_be_bytes().iter()) {
                    *a_byte ^= t_byte;
                }
                r[i - 1].copy_from_slice(&b[8..]);
            }
        }

        let mut c = Vec::with_capacity((n + 1) * BLOCK_SIZE);
        c.extend_from_slice(&a[..]);
        for block in &r {
            c.extend_from_slice(&block[..]);
        }
        Ok(c)
    }

    // RFC 3394, 2.2.2
    fn unwrap(&self, key: &[u8], c: &[u8]) -> Result<Vec<u8>, Error> {
        if c.len() < 24 || c.len() % BLOCK_SIZE != 0 {
            return Err(Error::InvalidKeyDataLength(c.len()));
        }
        let cipher = new_cipher(key)?;
        let n = c.len() / BLOCK_SIZE - 1;

        let mut a = [0u8; 8];
        a.copy_from_slice(&c[..8]);
        let mut r: Vec<[u8; 8]> = c[8..]
            .chunks(BLOCK_SIZE)
            .map(|chunk| {
                let mut block = [0u8; 8];
                block.copy_from_slice(chunk);
                block
            })
            .collect();

        let mut b = Block::default();
        for j in (0..6).rev() {
            for i in (1..=n).rev() {
                let t = (n * j + i) as u64;
                for (a_byte, t_byte) in a.iter_mut().zip(t.to_be_bytes().iter()) {
                    *a_byte ^= t_byte;
                }
                b[..8].copy_from_slice(&a[..]);
                b[8..].copy_from_slice(&r[i - 1][..]);
                cipher.decrypt_block(&mut b);

                a.copy_from_slice(&b[..8]);
                r[i - 1].copy_from_slice(&b[8..]);
            }
        }

        if a != DEFAULT_IV {
            return Err(Error::WrongAesKeywrapKey);
        }
        let mut p = Vec::with_capacity(n * BLOCK_SIZE);
        for block in &r {
            p.extend_from_slice(&block[..]);
        }
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex::FromHex;

    // RFC 3394, 4.1 Wrap 128 bits of Key Data with a 128-bit KEK
    #[test]
    fn test_128_data_128_kek() {
        let kek = Vec::from_hex("000102030405060708090A0B0C0D0E0F").unwrap();
        let data = Vec::from_hex("00112233445566778899AABBCCDDEEFF").unwrap();
        let expected = Vec::from_hex("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5").unwrap();

        let result = NistAes.wrap(&kek[..], &data[..]).expect("wrapping failed");
        assert_eq!(result, expected);
        let plain = NistAes.unwrap(&kek[..], &result[..]).expect("unwrapping failed");
        assert_eq!(plain, data);
    }

    #[test]
    fn test_unwrap_wrong_key() {
        let kek = Vec::from_hex("000102030405060708090A0B0C0D0E0F").unwrap();
        let data = Vec::from_hex("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5").unwrap();
        let wrong_kek = [0xff; 16];
        assert_eq!(Err(Error::WrongAesKeywrapKey), NistAes.unwrap(&wrong_kek[..], &data[..]));
        assert!(NistAes.unwrap(&kek[..], &data[..]).is_ok());
    }

    #[test]
    fn test_invalid_lengths() {
        let kek = [0u8; 16];
        assert_eq!(Err(Error::InvalidKeyDataLength(8)), NistAes.wrap(&kek[..], &[0; 8][..]));
        assert_eq!(Err(Error::InvalidKeyDataLength(17)), NistAes.wrap(&kek[..], &[0; 17][..]));
        assert_eq!(Err(Error::InvalidKeyDataLength(16)), NistAes.unwrap(&kek[..], &[0; 16][..]));
        assert_eq!(Err(Error::InvalidKeyLength(5)), NistAes.wrap(&[0; 5][..], &[0; 16][..]));
    }
}

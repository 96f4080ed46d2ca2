// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{crypto_utils::prf, Error},
    rand::RngCore,
    std::time::{SystemTime, UNIX_EPOCH},
    wlan_common::mac::MacAddr,
};

pub type Nonce = [u8; 32];

/// Generates nonces from a per-reader random key and a global counter as suggested by
/// IEEE Std 802.11-2016, 12.7.5.
#[derive(Debug)]
pub struct NonceReader {
    key: [u8; 32],
    counter: u64,
    sta_addr: MacAddr,
}

impl NonceReader {
    pub fn new(sta_addr: &MacAddr) -> Result<NonceReader, Error> {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key[..]);
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();

        // Seed the counter with the local MAC address and the current time.
        let mut init = Vec::with_capacity(6 + 16);
        init.extend_from_slice(&sta_addr[..]);
        init.extend_from_slice(&elapsed.as_nanos().to_le_bytes()[..]);
        let seed = prf(&key[..], "Init Counter", &init[..], 256)?;
        let mut counter_bytes = [0u8; 8];
        counter_bytes.copy_from_slice(&seed[..8]);
        Ok(NonceReader { key, counter: u64::from_le_bytes(counter_bytes), sta_addr: *sta_addr })
    }

    pub fn next(&mut self) -> Result<Nonce, Error> {
        self.counter = self.counter.wrapping_add(1);
        let mut data = Vec::with_capacity(6 + 8);
        data.extend_from_slice(&self.sta_addr[..]);
        data.extend_from_slice(&self.counter.to_le_bytes()[..]);
        let bytes = prf(&self.key[..], "Init Counter", &data[..], 256)?;
        let mut nonce = [0u8; 32];
        nonce.copy_from_slice(&bytes[..]);
        Ok(nonce)
    }
}

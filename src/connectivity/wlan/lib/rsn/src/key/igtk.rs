// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::Tk,
    crate::{key_data::kde, Error},
    wlan_common::ie::rsn::cipher::Cipher,
};

/// Integrity Group Temporal Key protecting group addressed robust management frames (BIP).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Igtk {
    pub igtk: Vec<u8>,
    pub key_id: u16,
    pub ipn: [u8; 6],
    pub cipher: Cipher,
}

impl Igtk {
    pub fn from_kde(element: kde::Igtk, cipher: Cipher) -> Result<Self, Error> {
        let tk_len = cipher.tk_bytes().ok_or(Error::GtkHierarchyUnsupportedCipher)? as usize;
        if element.igtk.len() != tk_len {
            return Err(Error::InvalidGtkLength(tk_len, element.igtk.len()));
        }
        // IEEE Std 802.11-2016, 12.7.2: IGTK key identifiers are 4 or 5.
        if element.id != 4 && element.id != 5 {
            return Err(Error::InvalidKeyId(element.id));
        }
        Ok(Igtk { igtk: element.igtk, key_id: element.id, ipn: element.ipn, cipher })
    }
}

impl Tk for Igtk {
    fn tk(&self) -> &[u8] {
        &self.igtk[..]
    }
}

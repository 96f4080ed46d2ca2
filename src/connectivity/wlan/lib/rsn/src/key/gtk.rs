// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::Tk,
    crate::Error,
    wlan_common::ie::rsn::cipher::Cipher,
};

/// Group Temporal Key used for decrypting group addressed data frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gtk {
    pub gtk: Vec<u8>,
    key_id: u8,
    tk_len: usize,
    pub cipher: Cipher,
    /// Receive sequence counter announced by the Authenticator.
    pub rsc: u64,
}

impl Gtk {
    pub fn from_gtk(gtk: Vec<u8>, key_id: u8, cipher: Cipher, rsc: u64) -> Result<Gtk, Error> {
        let tk_len = cipher.tk_bytes().ok_or(Error::GtkHierarchyUnsupportedCipher)? as usize;
        if gtk.len() < tk_len {
            return Err(Error::InvalidGtkLength(tk_len, gtk.len()));
        }
        if key_id > 3 {
            return Err(Error::InvalidKeyId(key_id as u16));
        }
        Ok(Gtk { gtk, key_id, tk_len, cipher, rsc })
    }

    pub fn key_id(&self) -> u8 {
        self.key_id
    }
}

impl Tk for Gtk {
    fn tk(&self) -> &[u8] {
        &self.gtk[0..self.tk_len]
    }
}

#[cfg(test)]
mod tests {
    use {super::*, wlan_common::ie::rsn::cipher};

    #[test]
    fn test_gtk_from_bytes() {
        let gtk = Gtk::from_gtk(vec![5; 16], 1, Cipher::new_dot11(cipher::CCMP_128), 0)
            .expect("valid GTK");
        assert_eq!(1, gtk.key_id());
        assert_eq!(&[5; 16][..], gtk.tk());
    }

    #[test]
    fn test_gtk_too_short() {
        let result = Gtk::from_gtk(vec![5; 8], 1, Cipher::new_dot11(cipher::CCMP_128), 0);
        assert_eq!(Err(Error::InvalidGtkLength(16, 8)), result);
    }

    #[test]
    fn test_gtk_invalid_key_id() {
        let result = Gtk::from_gtk(vec![5; 16], 4, Cipher::new_dot11(cipher::CCMP_128), 0);
        assert_eq!(Err(Error::InvalidKeyId(4)), result);
    }
}

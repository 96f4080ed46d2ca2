// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        device::{KeyConfig, KeyType},
        error::Error,
    },
    wlan_common::mac::{MacAddr, BCAST_ADDR},
    wlan_rsn::{
        ccmp::{self, CcmpKey, PnCounter, ReplayCounters},
        key::{gtk::Gtk, igtk::Igtk, ptk::Ptk, Tk},
    },
};

/// Key slots at device scope: GTKs use ids 0-3, IGTKs ids 4 and 5.
pub const NUM_KEY_SLOTS: usize = 6;
pub const PAIRWISE_KEY_ID: u8 = 0;

/// The pairwise key of a node with its transmit PN and receive replay counters.
#[derive(Debug)]
pub struct PairwiseKey {
    key: CcmpKey,
    tx_pn: PnCounter,
    replay: ReplayCounters,
    tx_enabled: bool,
}

impl PairwiseKey {
    /// The key only protects received frames until `enable_tx` is called.
    pub fn new(ptk: &Ptk) -> Result<Self, Error> {
        Ok(Self {
            key: CcmpKey::new(ptk.tk(), PAIRWISE_KEY_ID)?,
            tx_pn: PnCounter::new(),
            replay: ReplayCounters::new(),
            tx_enabled: false,
        })
    }

    pub fn key_config(ptk: &Ptk, peer_addr: MacAddr) -> KeyConfig {
        KeyConfig {
            key_id: PAIRWISE_KEY_ID,
            key_type: KeyType::Pairwise,
            cipher: ptk.cipher,
            key: ptk.tk().to_vec(),
            peer_addr,
            rsc: 0,
        }
    }

    pub fn enable_tx(&mut self) {
        self.tx_enabled = true;
    }

    pub fn tx_enabled(&self) -> bool {
        self.tx_enabled
    }

    pub fn encrypt(&mut self, mpdu: &[u8]) -> Result<Vec<u8>, Error> {
        let pn = self.tx_pn.next()?;
        Ok(self.key.encrypt(pn, mpdu)?)
    }

    pub fn decrypt(&mut self, mpdu: &[u8]) -> Result<Vec<u8>, wlan_rsn::Error> {
        ccmp::decrypt_mpdu(&self.key, &mut self.replay, mpdu)
    }

    pub fn strip_hw_decrypted(&mut self, mpdu: &[u8]) -> Result<Vec<u8>, wlan_rsn::Error> {
        ccmp::strip_hw_decrypted(&mut self.replay, mpdu)
    }
}

#[derive(Debug)]
pub struct GroupKey {
    key: CcmpKey,
    replay: ReplayCounters,
}

impl GroupKey {
    pub fn decrypt(&mut self, mpdu: &[u8]) -> Result<Vec<u8>, wlan_rsn::Error> {
        ccmp::decrypt_mpdu(&self.key, &mut self.replay, mpdu)
    }

    pub fn strip_hw_decrypted(&mut self, mpdu: &[u8]) -> Result<Vec<u8>, wlan_rsn::Error> {
        ccmp::strip_hw_decrypted(&mut self.replay, mpdu)
    }
}

/// BIP verification happens in the driver; the IGTK is kept to report its IPN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityKey {
    pub key_id: u16,
    pub ipn: u64,
}

#[derive(Debug)]
enum Slot {
    Gtk(GroupKey),
    Igtk(IntegrityKey),
}

/// Group data and group management keys installed for the current association.
#[derive(Debug, Default)]
pub struct KeyStore {
    slots: [Option<Slot>; NUM_KEY_SLOTS],
}

fn ipn_to_u64(ipn: &[u8; 6]) -> u64 {
    ipn.iter().rev().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the GTK in the slot of its key id. Returns the driver configuration.
    pub fn install_gtk(&mut self, gtk: &Gtk) -> Result<KeyConfig, Error> {
        let key_id = gtk.key_id();
        let key = CcmpKey::new(gtk.tk(), key_id)?;
        self.slots[key_id as usize] =
            Some(Slot::Gtk(GroupKey { key, replay: ReplayCounters::with_rsc(gtk.rsc) }));
        Ok(KeyConfig {
            key_id,
            key_type: KeyType::Group,
            cipher: gtk.cipher,
            key: gtk.tk().to_vec(),
            peer_addr: BCAST_ADDR,
            rsc: gtk.rsc,
        })
    }

    pub fn install_igtk(&mut self, igtk: &Igtk) -> Result<KeyConfig, Error> {
        let slot = igtk.key_id as usize;
        if slot < 4 || slot >= NUM_KEY_SLOTS {
            return Err(wlan_rsn::Error::InvalidKeyId(igtk.key_id).into());
        }
        let ipn = ipn_to_u64(&igtk.ipn);
        self.slots[slot] = Some(Slot::Igtk(IntegrityKey { key_id: igtk.key_id, ipn }));
        Ok(KeyConfig {
            key_id: slot as u8,
            key_type: KeyType::Igtk,
            cipher: igtk.cipher,
            key: igtk.tk().to_vec(),
            peer_addr: BCAST_ADDR,
            rsc: ipn,
        })
    }

    pub fn gtk_mut(&mut self, key_id: u8) -> Option<&mut GroupKey> {
        match self.slots.get_mut(key_id as usize) {
            Some(Some(Slot::Gtk(key))) => Some(key),
            _ => None,
        }
    }

    pub fn igtk(&self, key_id: u8) -> Option<&IntegrityKey> {
        match self.slots.get(key_id as usize) {
            Some(Some(Slot::Igtk(key))) => Some(key),
            _ => None,
        }
    }

    /// Type and id of every occupied slot.
    pub fn installed(&self) -> Vec<(KeyType, u8)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Some(Slot::Gtk(_)) => Some((KeyType::Group, i as u8)),
                Some(Slot::Igtk(_)) => Some((KeyType::Igtk, i as u8)),
                None => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        wlan_common::{
            assert_variant,
            ie::rsn::cipher::{self, Cipher},
        },
        wlan_rsn::key_data::kde,
    };

    fn gtk(key_id: u8, rsc: u64) -> Gtk {
        Gtk::from_gtk(vec![0x42; 16], key_id, Cipher::new_dot11(cipher::CCMP_128), rsc)
            .expect("valid GTK")
    }

    #[test]
    fn install_group_keys() {
        let mut store = KeyStore::new();
        let config = store.install_gtk(&gtk(1, 10)).expect("install GTK");
        assert_eq!(config.key_id, 1);
        assert_eq!(config.key_type, KeyType::Group);
        assert_eq!(config.rsc, 10);
        assert!(store.gtk_mut(1).is_some());
        assert!(store.gtk_mut(2).is_none());

        let igtk = Igtk::from_kde(
            kde::Igtk { id: 4, ipn: [5, 0, 0, 0, 0, 0], igtk: vec![0x24; 16] },
            Cipher::new_dot11(cipher::BIP_CMAC_128),
        )
        .expect("valid IGTK");
        let config = store.install_igtk(&igtk).expect("install IGTK");
        assert_eq!(config.key_type, KeyType::Igtk);
        assert_eq!(config.rsc, 5);
        assert_variant!(store.igtk(4), Some(IntegrityKey { key_id: 4, ipn: 5 }));
        assert_eq!(store.installed(), vec![(KeyType::Group, 1), (KeyType::Igtk, 4)]);

        store.clear();
        assert!(store.installed().is_empty());
    }

    #[test]
    fn group_key_honors_rsc() {
        let mut store = KeyStore::new();
        store.install_gtk(&gtk(2, 100)).expect("install GTK");
        let sender = CcmpKey::new(&[0x42; 16], 2).expect("key");
        #[rustfmt::skip]
        let mpdu = vec![
            0x08, 0x02, 0, 0, // data, from DS
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            1, 1, 1, 1, 1, 1,
            2, 2, 2, 2, 2, 2,
            0x10, 0x00,
            0xaa, 0xaa, 0x03, 0, 0, 0, 0x08, 0x00, 1, 2, 3,
        ];
        let stale = sender.encrypt(99, &mpdu[..]).expect("encrypt");
        let fresh = sender.encrypt(100, &mpdu[..]).expect("encrypt");
        let key = store.gtk_mut(2).expect("GTK installed");
        assert_variant!(key.decrypt(&stale[..]), Err(wlan_rsn::Error::CcmpReplay(99, 99)));
        assert_eq!(key.decrypt(&fresh[..]).expect("decrypt"), mpdu);
    }

    #[test]
    fn pairwise_key_round_trip() {
        let mut key = PairwiseKey {
            key: CcmpKey::new(&[7; 16], 0).expect("key"),
            tx_pn: PnCounter::new(),
            replay: ReplayCounters::new(),
            tx_enabled: false,
        };
        assert!(!key.tx_enabled());
        key.enable_tx();
        assert!(key.tx_enabled());
        #[rustfmt::skip]
        let mpdu = vec![
            0x08, 0x01, 0, 0, // data, to DS
            1, 1, 1, 1, 1, 1,
            2, 2, 2, 2, 2, 2,
            1, 1, 1, 1, 1, 1,
            0x20, 0x00,
            0xaa, 0xaa, 0x03, 0, 0, 0, 0x08, 0x00, 9, 9,
        ];
        let protected = key.encrypt(&mpdu[..]).expect("encrypt");
        assert_eq!(protected.len(), mpdu.len() + 16);
        assert_eq!(key.decrypt(&protected[..]).expect("decrypt"), mpdu);
        assert_variant!(key.decrypt(&protected[..]), Err(wlan_rsn::Error::CcmpReplay(1, 1)));
    }
}

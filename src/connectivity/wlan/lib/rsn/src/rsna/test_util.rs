// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        eapol,
        key::{exchange::compute_mic, ptk::Ptk},
        key_data::kde,
        keywrap::keywrap_algorithm,
        rsna::ProtectionInfo,
    },
    bytes::Bytes,
    hex::FromHex,
    wlan_common::{
        ie::{
            rsn::{
                akm::{self, Akm},
                cipher::{self, Cipher},
                pmkid::Pmkid,
                rsne::Rsne,
            },
            wpa::WpaIe,
        },
        organization::Oui,
    },
};

pub const S_ADDR: [u8; 6] = [0x81, 0x76, 0x61, 0x14, 0xDF, 0xC9];
pub const A_ADDR: [u8; 6] = [0x1D, 0xE3, 0xFD, 0xDF, 0xCB, 0xD3];

pub fn get_a_rsne() -> Rsne {
    Rsne {
        group_data_cipher_suite: Some(Cipher::new_dot11(cipher::CCMP_128)),
        pairwise_cipher_suites: vec![
            Cipher::new_dot11(cipher::CCMP_128),
            Cipher::new_dot11(cipher::TKIP),
        ],
        akm_suites: vec![Akm::new_dot11(akm::PSK)],
        ..Rsne::new()
    }
}

pub fn get_s_rsne() -> Rsne {
    Rsne {
        group_data_cipher_suite: Some(Cipher::new_dot11(cipher::CCMP_128)),
        pairwise_cipher_suites: vec![Cipher::new_dot11(cipher::CCMP_128)],
        akm_suites: vec![Akm::new_dot11(akm::PSK)],
        ..Rsne::new()
    }
}

pub fn get_a_wpa() -> WpaIe {
    WpaIe {
        multicast_cipher: Cipher { oui: Oui::MSFT, suite_type: cipher::CCMP_128 },
        unicast_cipher_list: vec![
            Cipher { oui: Oui::MSFT, suite_type: cipher::CCMP_128 },
            Cipher { oui: Oui::MSFT, suite_type: cipher::TKIP },
        ],
        akm_list: vec![Akm { oui: Oui::MSFT, suite_type: akm::PSK }],
    }
}

pub fn get_s_wpa() -> WpaIe {
    WpaIe {
        multicast_cipher: Cipher { oui: Oui::MSFT, suite_type: cipher::CCMP_128 },
        unicast_cipher_list: vec![Cipher { oui: Oui::MSFT, suite_type: cipher::CCMP_128 }],
        akm_list: vec![Akm { oui: Oui::MSFT, suite_type: akm::PSK }],
    }
}

pub fn get_pmk() -> Vec<u8> {
    Vec::from_hex("0dc0d6eb90555ed6419756b9a15ec3e3209b63df707dd508d14581f8982721af")
        .expect("error reading PMK from hex")
}

pub fn get_akm() -> Akm {
    get_s_rsne().akm_suites.remove(0)
}

pub fn mic_len() -> usize {
    get_akm().mic_bytes().expect("AKM has no known MIC size") as usize
}

pub fn get_ptk(anonce: &[u8], snonce: &[u8]) -> Ptk {
    get_ptk_with_pmk(&get_pmk()[..], anonce, snonce)
}

pub fn get_ptk_with_pmk(pmk: &[u8], anonce: &[u8], snonce: &[u8]) -> Ptk {
    let cipher = get_s_rsne().pairwise_cipher_suites.remove(0);
    Ptk::new(pmk, &A_ADDR, &S_ADDR, anonce, snonce, &get_akm(), cipher)
        .expect("error deriving PTK")
}

pub fn encrypt_key_data(kek: &[u8], key_data: &[u8]) -> Vec<u8> {
    let keywrap_alg =
        keywrap_algorithm(&get_akm()).expect("error AKM has no known keywrap Algorithm");
    keywrap_alg.wrap(kek, key_data).expect("could not encrypt key data")
}

fn to_nonce(bytes: &[u8]) -> [u8; 32] {
    let mut nonce = [0u8; 32];
    nonce.copy_from_slice(bytes);
    nonce
}

fn new_frame(descriptor: eapol::KeyDescriptor, key_info: u16, krc: u64) -> eapol::KeyFrame {
    let mut msg = eapol::KeyFrame::new(descriptor, eapol::KeyInformation(key_info), mic_len());
    msg.version = 1;
    msg.key_replay_counter = krc;
    msg
}

/// Protects a frame with the PTK's KCK once all fields are final.
fn sign(ptk: &Ptk, mut msg: eapol::KeyFrame) -> eapol::KeyFrame {
    msg.update_packet_body_len();
    let mic = compute_mic(ptk.kck(), &get_akm(), &msg).expect("error computing MIC");
    msg.key_mic = Bytes::from(mic);
    msg
}

pub fn get_4whs_msg1<F>(anonce: &[u8], msg_modifier: F) -> eapol::KeyFrame
where
    F: Fn(&mut eapol::KeyFrame),
{
    let mut msg = new_frame(eapol::KeyDescriptor::Ieee802dot11, 0x008a, 1);
    msg.key_len = 16;
    msg.key_nonce = to_nonce(anonce);
    msg_modifier(&mut msg);
    msg.update_packet_body_len();
    msg
}

pub fn get_4whs_msg1_with_pmkid(anonce: &[u8], pmkid: &Pmkid) -> eapol::KeyFrame {
    let mut w = kde::Writer::new(vec![]);
    w.write_pmkid(pmkid).expect("error writing PMKID KDE");
    let key_data = w.finalize_for_plaintext().expect("error finalizing key data");
    get_4whs_msg1(anonce, |msg| msg.set_key_data(key_data.clone()))
}

pub fn get_4whs_msg3<F>(ptk: &Ptk, anonce: &[u8], gtk: &[u8], msg_modifier: F) -> eapol::KeyFrame
where
    F: Fn(&mut eapol::KeyFrame),
{
    get_4whs_msg3_inner(ptk, anonce, gtk, &get_a_rsne(), msg_modifier)
}

pub fn get_4whs_msg3_with_rsne(ptk: &Ptk, anonce: &[u8], gtk: &[u8], rsne: &Rsne) -> eapol::KeyFrame {
    get_4whs_msg3_inner(ptk, anonce, gtk, rsne, |_| {})
}

fn get_4whs_msg3_inner<F>(
    ptk: &Ptk,
    anonce: &[u8],
    gtk: &[u8],
    rsne: &Rsne,
    msg_modifier: F,
) -> eapol::KeyFrame
where
    F: Fn(&mut eapol::KeyFrame),
{
    let mut w = kde::Writer::new(vec![]);
    w.write_protection(&ProtectionInfo::Rsne(rsne.clone())).expect("error writing RSNE");
    w.write_gtk(&kde::Gtk::new(2, kde::GtkInfoTx::BothRxTx, gtk)).expect("error writing GTK KDE");
    let key_data = w.finalize_for_encryption().expect("error finalizing key data");

    let mut msg = new_frame(eapol::KeyDescriptor::Ieee802dot11, 0x13ca, 2);
    msg.key_len = 16;
    msg.key_nonce = to_nonce(anonce);
    msg.set_key_data(encrypt_key_data(ptk.kek(), &key_data[..]));
    msg_modifier(&mut msg);
    sign(ptk, msg)
}

pub fn get_group_key_hs_msg1<F>(ptk: &Ptk, gtk: &[u8], msg_modifier: F) -> eapol::KeyFrame
where
    F: Fn(&mut eapol::KeyFrame),
{
    let mut w = kde::Writer::new(vec![]);
    w.write_gtk(&kde::Gtk::new(3, kde::GtkInfoTx::BothRxTx, gtk)).expect("error writing GTK KDE");
    let key_data = w.finalize_for_encryption().expect("error finalizing key data");

    let mut msg = new_frame(eapol::KeyDescriptor::Ieee802dot11, 0x1382, 3);
    msg.set_key_data(encrypt_key_data(ptk.kek(), &key_data[..]));
    msg_modifier(&mut msg);
    sign(ptk, msg)
}

/// A Group Key Handshake message 1 carrying arbitrary key data, wrapped with the PTK's KEK.
pub fn get_group_key_hs_msg1_with_key_data(ptk: &Ptk, key_data: Vec<u8>) -> eapol::KeyFrame {
    let mut msg = new_frame(eapol::KeyDescriptor::Ieee802dot11, 0x1382, 3);
    msg.set_key_data(encrypt_key_data(ptk.kek(), &key_data[..]));
    sign(ptk, msg)
}

/// WPA1 group message 1: the wrapped GTK is the whole key data and its index lives in the Key
/// Information field.
pub fn get_wpa1_group_key_hs_msg1(ptk: &Ptk, gtk: &[u8], key_idx: u16) -> eapol::KeyFrame {
    let mut key_info = eapol::KeyInformation(0x0382);
    key_info.set_legacy_key_idx(key_idx);
    let mut msg = new_frame(eapol::KeyDescriptor::LegacyWpa1, key_info.value(), 3);
    msg.key_len = gtk.len() as u16;
    msg.set_key_data(encrypt_key_data(ptk.kek(), gtk));
    sign(ptk, msg)
}

/// WPA1 message 3 carries the Authenticator's WPA IE in the clear and no GTK.
pub fn get_wpa1_4whs_msg3(ptk: &Ptk, anonce: &[u8]) -> eapol::KeyFrame {
    let mut w = kde::Writer::new(vec![]);
    w.write_protection(&ProtectionInfo::LegacyWpa(get_a_wpa())).expect("error writing WPA IE");
    let key_data = w.finalize_for_plaintext().expect("error finalizing key data");

    let mut msg = new_frame(eapol::KeyDescriptor::LegacyWpa1, 0x01ca, 2);
    msg.key_len = 16;
    msg.key_nonce = to_nonce(anonce);
    msg.set_key_data(key_data);
    sign(ptk, msg)
}

pub fn get_wpa1_4whs_msg1(anonce: &[u8]) -> eapol::KeyFrame {
    get_4whs_msg1(anonce, |msg| msg.descriptor_type = eapol::KeyDescriptor::LegacyWpa1 as u8)
}

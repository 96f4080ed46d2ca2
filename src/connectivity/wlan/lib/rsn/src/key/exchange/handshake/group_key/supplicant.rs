// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::is_message_1,
    crate::{
        eapol,
        key::{
            exchange::{compute_mic, decrypt_key_data, handshake::fourway::Config, verify_mic, Key},
            gtk::Gtk,
            igtk::Igtk,
            ptk::Ptk,
        },
        key_data::{self, Element},
        rsna::{ProtectionType, SecAssocUpdate, UpdateSink},
        Error,
    },
    bytes::Bytes,
};

// IEEE Std 802.11-2016, 12.7.7.2
fn extract_rsn_keys(
    cfg: &Config,
    key_data: &[u8],
    msg1: &eapol::KeyFrame,
) -> Result<(Gtk, Option<Igtk>), Error> {
    let neg = &cfg.negotiated;
    let mut gtk = None;
    let mut igtk = None;
    for element in key_data::extract_elements(key_data)? {
        match element {
            Element::Gtk(_, kde) => {
                gtk = Some(Gtk::from_gtk(
                    kde.gtk,
                    kde.info.key_id() as u8,
                    neg.group_data.clone(),
                    msg1.key_rsc,
                )?)
            }
            Element::Igtk(_, kde) => {
                if let Some(cipher) = &neg.group_mgmt {
                    igtk = Some(Igtk::from_kde(kde, cipher.clone())?);
                }
            }
            _ => (),
        }
    }
    Ok((gtk.ok_or(Error::MissingGtk)?, igtk))
}

/// WPA1 carries the wrapped GTK itself as key data, its index in the Key Information field.
fn extract_legacy_wpa1_gtk(
    cfg: &Config,
    key_data: Vec<u8>,
    msg1: &eapol::KeyFrame,
) -> Result<Gtk, Error> {
    let mut gtk = key_data;
    let key_len = msg1.key_len as usize;
    if key_len > 0 && key_len <= gtk.len() {
        gtk.truncate(key_len);
    }
    let key_id = msg1.key_info.legacy_key_idx() as u8;
    Gtk::from_gtk(gtk, key_id, cfg.negotiated.group_data.clone(), msg1.key_rsc)
}

// IEEE Std 802.11-2016, 12.7.7.3
fn create_message_2(
    cfg: &Config,
    kck: &[u8],
    msg1: &eapol::KeyFrame,
) -> Result<eapol::KeyFrame, Error> {
    let neg = &cfg.negotiated;
    let mut key_info = eapol::KeyInformation(0);
    key_info.set_key_descriptor_version(msg1.key_info.key_descriptor_version());
    key_info.set_key_type(msg1.key_info.key_type());
    key_info.set_key_mic(true);
    key_info.set_secure(true);
    if neg.protection_type == ProtectionType::LegacyWpa1 {
        key_info.set_legacy_key_idx(msg1.key_info.legacy_key_idx());
    }

    let mut msg2 = eapol::KeyFrame::new(neg.key_descriptor(), key_info, neg.mic_size as usize);
    msg2.version = msg1.version;
    msg2.key_replay_counter = msg1.key_replay_counter;
    if neg.protection_type == ProtectionType::LegacyWpa1 {
        msg2.key_len = msg1.key_len;
    }
    msg2.key_mic = Bytes::from(compute_mic(kck, &neg.akm, &msg2)?);
    Ok(msg2)
}

/// Processes the first message of a Group Key Handshake with the PTK established by the 4-Way
/// Handshake. The new group keys are pushed before the reply.
pub fn on_message_1(
    cfg: &Config,
    ptk: &Ptk,
    update_sink: &mut UpdateSink,
    msg1: &eapol::KeyFrame,
) -> Result<(), Error> {
    if !is_message_1(msg1) {
        return Err(Error::UnexpectedGroupKeyMessage);
    }
    let neg = &cfg.negotiated;
    verify_mic(ptk.kck(), &neg.akm, msg1)?;

    if neg.protection_type == ProtectionType::Rsna && !msg1.key_info.encrypted_key_data() {
        return Err(Error::UnencryptedKeyData);
    }
    let key_data = decrypt_key_data(ptk.kek(), &neg.akm, msg1)?;
    let (gtk, igtk) = match neg.protection_type {
        ProtectionType::Rsna => extract_rsn_keys(cfg, &key_data[..], msg1)?,
        ProtectionType::LegacyWpa1 => (extract_legacy_wpa1_gtk(cfg, key_data, msg1)?, None),
    };
    let msg2 = create_message_2(cfg, ptk.kck(), msg1)?;

    update_sink.push(SecAssocUpdate::Key(Key::Gtk(gtk)));
    if let Some(igtk) = igtk {
        update_sink.push(SecAssocUpdate::Key(Key::Igtk(igtk)));
    }
    update_sink.push(SecAssocUpdate::TxEapolKeyFrame(msg2));
    Ok(())
}

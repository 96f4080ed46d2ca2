// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        crypto_utils::nonce::{Nonce, NonceReader},
        eapol,
        key::{
            exchange::{
                compute_mic, decrypt_key_data,
                handshake::fourway::{self, Config, MessageNumber},
                verify_mic, Key,
            },
            gtk::Gtk,
            igtk::Igtk,
            ptk::Ptk,
        },
        key_data::{self, Element},
        rsna::{ProtectionInfo, ProtectionType, SecAssocUpdate, UpdateSink},
        Error,
    },
    bytes::Bytes,
    log::info,
};

// IEEE Std 802.11-2016, 12.7.6.2
fn handle_message_1(
    cfg: &Config,
    pmk: &[u8],
    snonce: &Nonce,
    msg1: &eapol::KeyFrame,
) -> Result<(eapol::KeyFrame, Ptk), Error> {
    if msg1.key_info.key_mic() {
        return Err(Error::Unexpected4WayHandshakeMessage(fourway::message_number(msg1)));
    }
    let neg = &cfg.negotiated;
    let ptk = Ptk::new(
        pmk,
        &cfg.a_addr,
        &cfg.s_addr,
        &msg1.key_nonce[..],
        &snonce[..],
        &neg.akm,
        neg.pairwise.clone(),
    )?;
    let msg2 = create_message_2(cfg, ptk.kck(), msg1, snonce)?;
    Ok((msg2, ptk))
}

// IEEE Std 802.11-2016, 12.7.6.3
fn create_message_2(
    cfg: &Config,
    kck: &[u8],
    msg1: &eapol::KeyFrame,
    snonce: &Nonce,
) -> Result<eapol::KeyFrame, Error> {
    let mut key_info = eapol::KeyInformation(0);
    key_info.set_key_descriptor_version(msg1.key_info.key_descriptor_version());
    key_info.set_key_type(msg1.key_info.key_type());
    key_info.set_key_mic(true);

    let mut msg2 = new_reply(cfg, msg1, key_info);
    msg2.key_nonce = *snonce;
    msg2.set_key_data(cfg.s_protection.to_bytes());
    msg2.key_mic = Bytes::from(compute_mic(kck, &cfg.negotiated.akm, &msg2)?);
    Ok(msg2)
}

/// A reply to the Authenticator's message sharing its version, descriptor and replay counter.
fn new_reply(
    cfg: &Config,
    request: &eapol::KeyFrame,
    key_info: eapol::KeyInformation,
) -> eapol::KeyFrame {
    let mut reply = eapol::KeyFrame::new(
        cfg.negotiated.key_descriptor(),
        key_info,
        cfg.negotiated.mic_size as usize,
    );
    reply.version = request.version;
    reply.key_replay_counter = request.key_replay_counter;
    // WPA1 Authenticators expect the key length to be echoed.
    if cfg.negotiated.protection_type == ProtectionType::LegacyWpa1 {
        reply.key_len = request.key_len;
    }
    reply
}

struct Msg3Content {
    gtk: Option<Gtk>,
    igtk: Option<Igtk>,
}

// IEEE Std 802.11-2016, 12.7.6.4
fn handle_message_3(
    cfg: &Config,
    ptk: &Ptk,
    msg3: &eapol::KeyFrame,
) -> Result<Msg3Content, Error> {
    let neg = &cfg.negotiated;
    let key_data = match neg.protection_type {
        ProtectionType::Rsna => {
            if !msg3.key_info.encrypted_key_data() {
                return Err(Error::UnencryptedKeyData);
            }
            decrypt_key_data(ptk.kek(), &neg.akm, msg3)?
        }
        // WPA1 carries its IE in the clear.
        ProtectionType::LegacyWpa1 => msg3.key_data.to_vec(),
    };

    let mut protection: Option<ProtectionInfo> = None;
    let mut gtk_kde = None;
    let mut igtk_kde = None;
    for element in key_data::extract_elements(&key_data[..])? {
        match element {
            // Only the first IE announces the Authenticator's protection.
            Element::Rsne(rsne) if protection.is_none() => {
                protection = Some(ProtectionInfo::Rsne(rsne))
            }
            Element::LegacyWpa1(wpa) if protection.is_none() => {
                protection = Some(ProtectionInfo::LegacyWpa(wpa))
            }
            Element::Gtk(_, gtk) => gtk_kde = Some(gtk),
            Element::Igtk(_, igtk) => igtk_kde = Some(igtk),
            _ => (),
        }
    }

    // The IE must be identical to the one received in the Beacon or Probe Response.
    match protection {
        Some(protection) if protection == cfg.a_protection => (),
        _ => return Err(Error::RsneMismatch),
    }

    let gtk = match (neg.protection_type, gtk_kde) {
        (ProtectionType::Rsna, None) => return Err(Error::MissingGtk),
        (_, Some(kde)) => Some(Gtk::from_gtk(
            kde.gtk,
            kde.info.key_id() as u8,
            neg.group_data.clone(),
            msg3.key_rsc,
        )?),
        (ProtectionType::LegacyWpa1, None) => None,
    };
    let igtk = match (&neg.group_mgmt, igtk_kde) {
        (Some(cipher), Some(kde)) => Some(Igtk::from_kde(kde, cipher.clone())?),
        _ => None,
    };
    Ok(Msg3Content { gtk, igtk })
}

// IEEE Std 802.11-2016, 12.7.6.5
fn create_message_4(
    cfg: &Config,
    kck: &[u8],
    msg3: &eapol::KeyFrame,
) -> Result<eapol::KeyFrame, Error> {
    let mut key_info = eapol::KeyInformation(0);
    key_info.set_key_descriptor_version(msg3.key_info.key_descriptor_version());
    key_info.set_key_type(msg3.key_info.key_type());
    key_info.set_key_mic(true);
    key_info.set_secure(cfg.negotiated.protection_type == ProtectionType::Rsna);

    let mut msg4 = new_reply(cfg, msg3, key_info);
    msg4.key_mic = Bytes::from(compute_mic(kck, &cfg.negotiated.akm, &msg4)?);
    Ok(msg4)
}

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    AwaitingMsg1,
    /// The PTK is tentative until message 3 was verified with its KCK.
    AwaitingMsg3 { ptk: Ptk, anonce: Nonce, snonce: Nonce, msg2: eapol::KeyFrame },
    Completed { ptk: Ptk },
}

impl State {
    pub fn on_eapol_key_frame(
        self,
        cfg: &Config,
        update_sink: &mut UpdateSink,
        nonce_rdr: &mut NonceReader,
        pmk: &[u8],
        frame: &eapol::KeyFrame,
    ) -> (Self, Result<(), Error>) {
        match fourway::message_number(frame) {
            MessageNumber::Message1 => self.on_message_1(cfg, update_sink, nonce_rdr, pmk, frame),
            MessageNumber::Message3 => self.on_message_3(cfg, update_sink, frame),
            unexpected_msg => (self, Err(Error::Unexpected4WayHandshakeMessage(unexpected_msg))),
        }
    }

    fn on_message_1(
        self,
        cfg: &Config,
        update_sink: &mut UpdateSink,
        nonce_rdr: &mut NonceReader,
        pmk: &[u8],
        msg1: &eapol::KeyFrame,
    ) -> (Self, Result<(), Error>) {
        let snonce = match self {
            // A retransmitted message 1 is answered with the same message 2.
            State::AwaitingMsg3 { anonce, msg2, ptk, snonce } if anonce == msg1.key_nonce => {
                let mut msg2 = msg2;
                if msg2.key_replay_counter != msg1.key_replay_counter {
                    msg2.key_replay_counter = msg1.key_replay_counter;
                    match compute_mic(ptk.kck(), &cfg.negotiated.akm, &msg2) {
                        Ok(mic) => msg2.key_mic = Bytes::from(mic),
                        Err(e) => return (State::AwaitingMsg1, Err(e)),
                    }
                }
                update_sink.push(SecAssocUpdate::TxEapolKeyFrame(msg2.clone()));
                return (State::AwaitingMsg3 { ptk, anonce, snonce, msg2 }, Ok(()));
            }
            // The SNonce is kept until the handshake completes.
            State::AwaitingMsg3 { snonce, .. } => snonce,
            State::AwaitingMsg1 | State::Completed { .. } => {
                if let State::Completed { .. } = self {
                    info!("restarting already completed 4-Way Handshake");
                }
                match nonce_rdr.next() {
                    Ok(nonce) => nonce,
                    Err(e) => return (self, Err(e)),
                }
            }
        };

        match handle_message_1(cfg, pmk, &snonce, msg1) {
            Ok((msg2, ptk)) => {
                update_sink.push(SecAssocUpdate::TxEapolKeyFrame(msg2.clone()));
                (State::AwaitingMsg3 { ptk, anonce: msg1.key_nonce, snonce, msg2 }, Ok(()))
            }
            Err(e) => (State::AwaitingMsg1, Err(e)),
        }
    }

    fn on_message_3(
        self,
        cfg: &Config,
        update_sink: &mut UpdateSink,
        msg3: &eapol::KeyFrame,
    ) -> (Self, Result<(), Error>) {
        match self {
            State::AwaitingMsg1 => {
                (self, Err(Error::Unexpected4WayHandshakeMessage(MessageNumber::Message3)))
            }
            State::AwaitingMsg3 { ptk, anonce, snonce, msg2 } => {
                if anonce != msg3.key_nonce {
                    let state = State::AwaitingMsg3 { ptk, anonce, snonce, msg2 };
                    return (state, Err(Error::AnonceMismatch));
                }
                // Forged frames must not disturb an ongoing handshake.
                if let Err(e) = verify_mic(ptk.kck(), &cfg.negotiated.akm, msg3) {
                    return (State::AwaitingMsg3 { ptk, anonce, snonce, msg2 }, Err(e));
                }
                let result = handle_message_3(cfg, &ptk, msg3)
                    .and_then(|content| Ok((content, create_message_4(cfg, ptk.kck(), msg3)?)));
                match result {
                    Ok((content, msg4)) => {
                        update_sink.push(SecAssocUpdate::Key(Key::Ptk(ptk.clone())));
                        if let Some(gtk) = content.gtk {
                            update_sink.push(SecAssocUpdate::Key(Key::Gtk(gtk)));
                        }
                        if let Some(igtk) = content.igtk {
                            update_sink.push(SecAssocUpdate::Key(Key::Igtk(igtk)));
                        }
                        update_sink.push(SecAssocUpdate::TxEapolKeyFrame(msg4));
                        (State::Completed { ptk }, Ok(()))
                    }
                    Err(e) => (State::AwaitingMsg1, Err(e)),
                }
            }
            // The Authenticator did not receive message 4. Keys are not installed again.
            State::Completed { ptk } => {
                let result = verify_mic(ptk.kck(), &cfg.negotiated.akm, msg3)
                    .and_then(|()| create_message_4(cfg, ptk.kck(), msg3));
                match result {
                    Ok(msg4) => {
                        update_sink.push(SecAssocUpdate::TxEapolKeyFrame(msg4));
                        (State::Completed { ptk }, Ok(()))
                    }
                    Err(e) => (State::Completed { ptk }, Err(e)),
                }
            }
        }
    }
}

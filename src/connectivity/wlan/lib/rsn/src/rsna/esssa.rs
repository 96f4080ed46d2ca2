// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{
        pmksa::{compute_pmkid, Pmksa, PmksaCache},
        NegotiatedProtection, ProtectionType, SecAssocStatus, SecAssocUpdate, UpdateSink,
    },
    crate::{
        crypto_utils::nonce::NonceReader,
        eapol,
        key::exchange::{
            compute_mic,
            handshake::{
                fourway::{self, Config, Fourway, MessageNumber},
                group_key,
            },
            Key,
        },
        key_data::{self, Element},
        Error,
    },
    bytes::Bytes,
    log::{info, warn},
    wlan_common::ie::rsn::pmkid::Pmkid,
};

/// Replay counter of the last valid EAPOL-Key frame received from the Authenticator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct KeyReplayCounter {
    value: u64,
    ok: bool,
}

impl KeyReplayCounter {
    fn check(&self, counter: u64) -> Result<(), Error> {
        if self.ok && counter <= self.value {
            Err(Error::ReplayedKeyReplayCounter(counter, self.value))
        } else {
            Ok(())
        }
    }

    fn update(&mut self, counter: u64) {
        self.value = counter;
        self.ok = true;
    }
}

/// The ESS security association of a Supplicant: the PMKSA, the PTKSA established through the
/// 4-Way Handshake and the GTKSA maintained by Group Key Handshakes.
#[derive(Debug)]
pub struct EssSa {
    fourway: Fourway,
    pmk: Option<Vec<u8>>,
    pmksa_cache: PmksaCache,
    nonce_rdr: NonceReader,
    key_replay_counter: KeyReplayCounter,
    request_replay_counter: u64,
    gtk_installed: bool,
    established: bool,
}

impl EssSa {
    pub fn new(cfg: Config, pmk: Option<Vec<u8>>) -> Result<EssSa, Error> {
        let nonce_rdr = NonceReader::new(&cfg.s_addr)?;
        Ok(EssSa {
            fourway: Fourway::new(cfg),
            pmk,
            pmksa_cache: PmksaCache::default(),
            nonce_rdr,
            key_replay_counter: KeyReplayCounter::default(),
            request_replay_counter: 0,
            gtk_installed: false,
            established: false,
        })
    }

    pub fn negotiated_protection(&self) -> &NegotiatedProtection {
        &self.fourway.cfg().negotiated
    }

    pub fn is_established(&self) -> bool {
        self.established
    }

    /// Drops all handshake state. Cached PMKSAs survive.
    pub fn reset(&mut self) {
        self.fourway.reset();
        self.key_replay_counter = KeyReplayCounter::default();
        self.gtk_installed = false;
        self.established = false;
    }

    /// Caches a PMK for the current Authenticator and returns its PMKID.
    pub fn add_pmksa(&mut self, pmk: Vec<u8>) -> Result<Pmkid, Error> {
        let cfg = self.fourway.cfg();
        let pmkid = compute_pmkid(&pmk[..], &cfg.a_addr, &cfg.s_addr, &cfg.negotiated.akm)?;
        let aa = cfg.a_addr;
        self.pmksa_cache.insert(Pmksa { pmkid, pmk, aa });
        Ok(pmkid)
    }

    pub fn pmksa_cache(&self) -> &PmksaCache {
        &self.pmksa_cache
    }

    /// Selects the PMK for a 4-Way Handshake. A PMKID announced in message 1 selects a cached
    /// PMKSA, otherwise the configured PMK is used.
    fn select_pmk(&self, msg1: &eapol::KeyFrame) -> Result<Vec<u8>, Error> {
        let aa = &self.fourway.cfg().a_addr;
        if self.negotiated_protection().protection_type == ProtectionType::Rsna {
            if let Ok(elements) = key_data::extract_elements(&msg1.key_data[..]) {
                for element in elements {
                    if let Element::Pmkid(_, pmkid) = element {
                        if let Some(pmksa) = self.pmksa_cache.lookup(&pmkid, aa) {
                            return Ok(pmksa.pmk.clone());
                        }
                    }
                }
            }
        }
        self.pmk.clone().ok_or(Error::NoPmk)
    }

    fn validate_key_frame(&self, frame: &eapol::KeyFrame) -> Result<(), Error> {
        let neg = self.negotiated_protection();
        if frame.descriptor_type != neg.key_descriptor() as u8 {
            return Err(Error::UnsupportedKeyDescriptor(frame.descriptor_type));
        }
        let version = frame.key_info.key_descriptor_version();
        if Some(version) != neg.akm.key_descriptor_version() {
            return Err(Error::UnsupportedKeyDescriptorVersion(version));
        }
        if frame.key_info.request() {
            return Err(Error::UnexpectedKeyRequest);
        }
        self.key_replay_counter.check(frame.key_replay_counter)
    }

    pub fn on_eapol_frame(
        &mut self,
        update_sink: &mut UpdateSink,
        frame: &eapol::Frame,
    ) -> Result<(), Error> {
        let frame = match frame {
            eapol::Frame::Key(frame) => frame,
            eapol::Frame::Unsupported { packet_type } => {
                return Err(Error::NotEapolKeyFrame(*packet_type))
            }
        };
        self.validate_key_frame(frame)?;

        if frame.key_info.is_pairwise() {
            self.on_pairwise_key_frame(update_sink, frame)
        } else {
            self.on_group_key_frame(update_sink, frame)
        }
    }

    fn on_pairwise_key_frame(
        &mut self,
        update_sink: &mut UpdateSink,
        frame: &eapol::KeyFrame,
    ) -> Result<(), Error> {
        let msg_number = fourway::message_number(frame);
        let pmk = match msg_number {
            MessageNumber::Message1 => self.select_pmk(frame)?,
            MessageNumber::Message3 => vec![],
            other => return Err(Error::Unexpected4WayHandshakeMessage(other)),
        };
        self.fourway.on_eapol_key_frame(update_sink, &mut self.nonce_rdr, &pmk[..], frame)?;
        if msg_number != MessageNumber::Message3 {
            return Ok(());
        }

        // Message 3 passed MIC verification.
        self.key_replay_counter.update(frame.key_replay_counter);
        let gtk_delivered =
            update_sink.iter().any(|u| matches!(u, SecAssocUpdate::Key(Key::Gtk(_))));
        self.gtk_installed |= gtk_delivered;
        self.maybe_establish(update_sink);
        Ok(())
    }

    fn on_group_key_frame(
        &mut self,
        update_sink: &mut UpdateSink,
        frame: &eapol::KeyFrame,
    ) -> Result<(), Error> {
        let ptk = self.fourway.ptk().ok_or(Error::UnexpectedGroupKeyMessage)?;
        group_key::supplicant::on_message_1(self.fourway.cfg(), ptk, update_sink, frame)?;
        self.key_replay_counter.update(frame.key_replay_counter);
        self.gtk_installed = true;
        self.maybe_establish(update_sink);
        Ok(())
    }

    fn maybe_establish(&mut self, update_sink: &mut UpdateSink) {
        if !self.established && self.fourway.is_completed() && self.gtk_installed {
            info!("ESS-SA established");
            self.established = true;
            update_sink.push(SecAssocUpdate::Status(SecAssocStatus::EssSaEstablished));
        }
    }

    /// Asks the Authenticator for a new 4-Way Handshake with an EAPOL-Key Request frame.
    pub fn initiate_rekey(&mut self, update_sink: &mut UpdateSink) -> Result<(), Error> {
        let ptk = match self.fourway.ptk() {
            Some(ptk) => ptk,
            None => {
                warn!("cannot request rekey before the PTKSA is established");
                return Err(Error::NoPtk);
            }
        };
        let neg = self.negotiated_protection();
        let mut key_info = eapol::KeyInformation(0);
        key_info.set_key_descriptor_version(neg.akm.key_descriptor_version().unwrap_or(0));
        key_info.set_key_type(eapol::KeyType::Pairwise as u16);
        key_info.set_key_mic(true);
        key_info.set_secure(true);
        key_info.set_request(true);

        let mut request = eapol::KeyFrame::new(neg.key_descriptor(), key_info, neg.mic_size as usize);
        request.key_replay_counter = self.request_replay_counter;
        request.key_mic = Bytes::from(compute_mic(ptk.kck(), &neg.akm, &request)?);
        self.request_replay_counter += 1;
        update_sink.push(SecAssocUpdate::TxEapolKeyFrame(request));
        Ok(())
    }
}

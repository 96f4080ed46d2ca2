// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub mod handshake;

use {
    crate::{
        eapol,
        integrity::integrity_algorithm,
        key::{gtk::Gtk, igtk::Igtk, ptk::Ptk},
        keywrap::keywrap_algorithm,
        Error,
    },
    wlan_common::ie::rsn::akm::Akm,
};

/// Key material produced by a key exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Pmk(Vec<u8>),
    Ptk(Ptk),
    Gtk(Gtk),
    Igtk(Igtk),
}

impl Key {
    pub fn name(&self) -> &'static str {
        match self {
            Key::Pmk(..) => "PMK",
            Key::Ptk(..) => "PTK",
            Key::Gtk(..) => "GTK",
            Key::Igtk(..) => "IGTK",
        }
    }
}

/// Computes the MIC of an EAPOL-Key frame. The frame's own MIC field is treated as zeroed.
pub fn compute_mic(kck: &[u8], akm: &Akm, frame: &eapol::KeyFrame) -> Result<Vec<u8>, Error> {
    let integrity_alg = integrity_algorithm(akm).ok_or(Error::UnsupportedAkmSuite)?;
    let mic_len = akm.mic_bytes().ok_or(Error::UnsupportedAkmSuite)? as usize;
    let mut mic = integrity_alg.compute(kck, &frame.to_bytes(true)[..])?;
    mic.truncate(mic_len);
    Ok(mic)
}

pub fn verify_mic(kck: &[u8], akm: &Akm, frame: &eapol::KeyFrame) -> Result<(), Error> {
    let integrity_alg = integrity_algorithm(akm).ok_or(Error::UnsupportedAkmSuite)?;
    let mic_len = akm.mic_bytes().ok_or(Error::UnsupportedAkmSuite)? as usize;
    if frame.key_mic.len() != mic_len {
        return Err(Error::MicVerificationFailed);
    }
    if integrity_alg.verify(kck, &frame.to_bytes(true)[..], &frame.key_mic[..]) {
        Ok(())
    } else {
        Err(Error::MicVerificationFailed)
    }
}

/// Unwraps the encrypted Key Data field of an EAPOL-Key frame.
pub fn decrypt_key_data(kek: &[u8], akm: &Akm, frame: &eapol::KeyFrame) -> Result<Vec<u8>, Error> {
    let keywrap_alg = keywrap_algorithm(akm).ok_or(Error::UnsupportedAkmSuite)?;
    keywrap_alg.unwrap(kek, &frame.key_data[..])
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::rsna::test_util,
        wlan_common::{assert_variant, ie::rsn::akm},
    };

    #[test]
    fn mic_round_trip() {
        let ptk = test_util::get_ptk(&[1; 32], &[2; 32]);
        let msg3 = test_util::get_4whs_msg3(&ptk, &[1; 32], &[3; 16], |_| {});
        verify_mic(ptk.kck(), &test_util::get_akm(), &msg3).expect("valid MIC");

        let mut tampered = msg3.clone();
        tampered.key_replay_counter += 1;
        assert_variant!(
            verify_mic(ptk.kck(), &test_util::get_akm(), &tampered),
            Err(Error::MicVerificationFailed)
        );
    }

    #[test]
    fn mic_length_depends_on_akm() {
        let frame = test_util::get_4whs_msg1(&[1; 32], |_| {});
        let mic = compute_mic(&[7; 16], &Akm::new_dot11(akm::PSK), &frame).expect("MIC");
        assert_eq!(16, mic.len());
        assert_variant!(
            compute_mic(&[7; 16], &Akm::new_dot11(akm::SAE), &frame),
            Err(Error::UnsupportedAkmSuite)
        );
    }

    #[test]
    fn decrypt_key_data_with_wrong_kek() {
        let ptk = test_util::get_ptk(&[1; 32], &[2; 32]);
        let msg3 = test_util::get_4whs_msg3(&ptk, &[1; 32], &[3; 16], |_| {});
        let plain =
            decrypt_key_data(ptk.kek(), &test_util::get_akm(), &msg3).expect("decrypting key data");
        assert_eq!(0, plain.len() % 8);
        assert_variant!(
            decrypt_key_data(&[0; 16], &test_util::get_akm(), &msg3),
            Err(Error::WrongAesKeywrapKey)
        );
    }
}

// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub mod supplicant;

use {
    crate::{
        crypto_utils::nonce::NonceReader,
        eapol,
        key::ptk::Ptk,
        rsna::{NegotiatedProtection, ProtectionInfo, UpdateSink},
        Error,
    },
    log::error,
    wlan_common::mac::MacAddr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageNumber {
    Message1 = 1,
    Message2 = 2,
    Message3 = 3,
    Message4 = 4,
}

/// Derives the message number of a pairwise EAPOL-Key frame from its Key Information field.
pub fn message_number(frame: &eapol::KeyFrame) -> MessageNumber {
    let key_info = frame.key_info;
    if key_info.key_ack() {
        if key_info.key_mic() {
            MessageNumber::Message3
        } else {
            MessageNumber::Message1
        }
    } else if frame.key_nonce.iter().all(|&b| b == 0) {
        MessageNumber::Message4
    } else {
        MessageNumber::Message2
    }
}

/// Parameters of a 4-Way Handshake between this Supplicant and one Authenticator.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub s_addr: MacAddr,
    pub s_protection: ProtectionInfo,
    pub a_addr: MacAddr,
    pub a_protection: ProtectionInfo,
    pub negotiated: NegotiatedProtection,
}

impl Config {
    pub fn new(
        s_addr: MacAddr,
        s_protection: ProtectionInfo,
        a_addr: MacAddr,
        a_protection: ProtectionInfo,
    ) -> Result<Config, Error> {
        match (&s_protection, &a_protection) {
            (ProtectionInfo::Rsne(_), ProtectionInfo::Rsne(_))
            | (ProtectionInfo::LegacyWpa(_), ProtectionInfo::LegacyWpa(_)) => (),
            _ => return Err(Error::RsneMismatch),
        }
        let negotiated = NegotiatedProtection::from_protection(&s_protection)?;
        Ok(Config { s_addr, s_protection, a_addr, a_protection, negotiated })
    }
}

/// Supplicant side of the 4-Way Handshake.
#[derive(Debug)]
pub struct Fourway {
    cfg: Config,
    state: supplicant::State,
}

impl Fourway {
    pub fn new(cfg: Config) -> Self {
        Fourway { cfg, state: supplicant::State::AwaitingMsg1 }
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn on_eapol_key_frame(
        &mut self,
        update_sink: &mut UpdateSink,
        nonce_rdr: &mut NonceReader,
        pmk: &[u8],
        frame: &eapol::KeyFrame,
    ) -> Result<(), Error> {
        let state = std::mem::replace(&mut self.state, supplicant::State::AwaitingMsg1);
        let (state, result) =
            state.on_eapol_key_frame(&self.cfg, update_sink, nonce_rdr, pmk, frame);
        self.state = state;
        if let Err(e) = &result {
            error!("4-Way Handshake: {}", e);
        }
        result
    }

    /// The PTK once the handshake completed.
    pub fn ptk(&self) -> Option<&Ptk> {
        match &self.state {
            supplicant::State::Completed { ptk } => Some(ptk),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.ptk().is_some()
    }

    pub fn reset(&mut self) {
        self.state = supplicant::State::AwaitingMsg1;
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::rsna::test_util};

    #[test]
    fn message_numbers() {
        let msg1 = test_util::get_4whs_msg1(&[1; 32], |_| {});
        assert_eq!(MessageNumber::Message1, message_number(&msg1));

        let ptk = test_util::get_ptk(&[1; 32], &[2; 32]);
        let msg3 = test_util::get_4whs_msg3(&ptk, &[1; 32], &[3; 16], |_| {});
        assert_eq!(MessageNumber::Message3, message_number(&msg3));

        let mut msg2 = msg1.clone();
        msg2.key_info = eapol::KeyInformation(0x010a);
        assert_eq!(MessageNumber::Message2, message_number(&msg2));
        msg2.key_nonce = [0; 32];
        assert_eq!(MessageNumber::Message4, message_number(&msg2));
    }

    #[test]
    fn mismatching_protection_types() {
        let result = Config::new(
            test_util::S_ADDR,
            ProtectionInfo::Rsne(test_util::get_s_rsne()),
            test_util::A_ADDR,
            ProtectionInfo::LegacyWpa(test_util::get_a_wpa()),
        );
        assert_eq!(Err(Error::RsneMismatch), result.map(|_| ()));
    }
}

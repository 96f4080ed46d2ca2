// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Crate wlan-rsn implements the Supplicant side of an RSN: PSK derivation, the 4-Way and
//! Group Key Handshakes, the PTK/GTK/IGTK key hierarchy, and CCMP frame protection.

pub mod ccmp;
mod crypto_utils;
pub mod eapol;
mod integrity;
pub mod key;
pub mod key_data;
mod keywrap;
pub mod psk;
pub mod rsna;

pub use crate::{
    crypto_utils::nonce::NonceReader,
    key::exchange::Key,
    rsna::{
        NegotiatedProtection, ProtectionInfo, ProtectionType, SecAssocStatus, SecAssocUpdate,
        UpdateSink,
    },
};

use {
    crate::{
        key::exchange::handshake::fourway::{self, MessageNumber},
        rsna::esssa::EssSa,
    },
    thiserror::Error,
    wlan_common::{ie::rsn::pmkid::Pmkid, mac::{MacAddr, ReasonCode}},
};

/// A Supplicant for one association. Received EAPOL frames are fed in, and key installations,
/// EAPOL frames to transmit and status changes come out through an `UpdateSink`.
#[derive(Debug)]
pub struct Supplicant {
    esssa: EssSa,
}

impl Supplicant {
    /// WPA2/WPA1 Personal: the PSK is the PMK.
    pub fn new_wpa_personal(
        psk: psk::Psk,
        s_addr: MacAddr,
        s_protection: ProtectionInfo,
        a_addr: MacAddr,
        a_protection: ProtectionInfo,
    ) -> Result<Supplicant, Error> {
        Self::new_with_pmk(Some(psk.to_vec()), s_addr, s_protection, a_addr, a_protection)
    }

    /// Creates a Supplicant which may only rely on cached PMKSAs if `pmk` is None.
    pub fn new_with_pmk(
        pmk: Option<Vec<u8>>,
        s_addr: MacAddr,
        s_protection: ProtectionInfo,
        a_addr: MacAddr,
        a_protection: ProtectionInfo,
    ) -> Result<Supplicant, Error> {
        let cfg = fourway::Config::new(s_addr, s_protection, a_addr, a_protection)?;
        Ok(Supplicant { esssa: EssSa::new(cfg, pmk)? })
    }

    pub fn negotiated_protection(&self) -> &NegotiatedProtection {
        self.esssa.negotiated_protection()
    }

    pub fn is_established(&self) -> bool {
        self.esssa.is_established()
    }

    pub fn reset(&mut self) {
        self.esssa.reset()
    }

    pub fn add_pmksa(&mut self, pmk: Vec<u8>) -> Result<Pmkid, Error> {
        self.esssa.add_pmksa(pmk)
    }

    pub fn initiate_rekey(&mut self, update_sink: &mut UpdateSink) -> Result<(), Error> {
        self.esssa.initiate_rekey(update_sink)
    }

    /// Processes the body of a received EAPOL frame.
    pub fn on_eapol_frame(&mut self, update_sink: &mut UpdateSink, body: &[u8]) -> Result<(), Error> {
        let mic_len = self.negotiated_protection().mic_size as usize;
        let frame = eapol::Frame::parse(body, mic_len)?;
        self.esssa.on_eapol_frame(update_sink, &frame)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid passphrase length: {}", _0)]
    InvalidPassphraseLen(usize),
    #[error("passphrase contains invalid character: {:#x}", _0)]
    InvalidPassphraseChar(u8),
    #[error("invalid SSID length: {}", _0)]
    InvalidSsidLen(usize),
    #[error("invalid PMK length; expected {} bytes but received {}", _0, _1)]
    InvalidPmkLength(usize, usize),
    #[error("invalid key length: {}", _0)]
    InvalidKeyLength(usize),
    #[error("invalid bit size; must be a multiple of 8 but was {}", _0)]
    InvalidBitSize(usize),
    #[error("invalid nonce size; expected 32 bytes but received {}", _0)]
    InvalidNonceSize(usize),
    #[error("invalid key data length; must be at least 16 bytes and a multiple of 8: {}", _0)]
    InvalidKeyDataLength(usize),
    #[error("invalid key data: {}", _0)]
    InvalidKeyData(String),
    #[error("invalid EAPOL frame: {}", _0)]
    InvalidEapolFrame(String),
    #[error("unwrapping key data failed; integrity check mismatch")]
    WrongAesKeywrapKey,
    #[error("PTK derivation is not supported for the negotiated AKM")]
    PtkHierarchyUnsupportedAkm,
    #[error("PTK derivation is not supported for the negotiated cipher")]
    PtkHierarchyUnsupportedCipher,
    #[error("GTK derivation is not supported for the negotiated cipher")]
    GtkHierarchyUnsupportedCipher,
    #[error("invalid GTK length; expected at least {} bytes but received {}", _0, _1)]
    InvalidGtkLength(usize, usize),
    #[error("invalid key id: {}", _0)]
    InvalidKeyId(u16),
    #[error("unsupported AKM suite")]
    UnsupportedAkmSuite,
    #[error("unsupported cipher suite")]
    UnsupportedCipherSuite,
    #[error("Authenticator requires management frame protection")]
    MfpNotSupported,
    #[error("no PMK available for the 4-Way Handshake")]
    NoPmk,
    #[error("no PTK established yet")]
    NoPtk,
    #[error("EAPOL packet of type {} is not an EAPOL-Key frame", _0)]
    NotEapolKeyFrame(u8),
    #[error("unsupported key descriptor type: {}", _0)]
    UnsupportedKeyDescriptor(u8),
    #[error("unsupported key descriptor version: {}", _0)]
    UnsupportedKeyDescriptorVersion(u16),
    #[error("EAPOL-Key frame carries an invalid MIC")]
    MicVerificationFailed,
    #[error("replayed key replay counter {}; last valid counter was {}", _0, _1)]
    ReplayedKeyReplayCounter(u64, u64),
    #[error("unexpected 4-Way Handshake message: {:?}", _0)]
    Unexpected4WayHandshakeMessage(MessageNumber),
    #[error("unexpected Group Key Handshake message")]
    UnexpectedGroupKeyMessage,
    #[error("the Supplicant does not serve EAPOL-Key requests")]
    UnexpectedKeyRequest,
    #[error("ANonce of message 3 differs from the one of message 1")]
    AnonceMismatch,
    #[error("protection element of message 3 differs from the one announced by the AP")]
    RsneMismatch,
    #[error("message 3 carries no GTK")]
    MissingGtk,
    #[error("key data of an RSN message must be encrypted")]
    UnencryptedKeyData,
    #[error("CCMP frame too short: {} bytes", _0)]
    CcmpFrameTooShort(usize),
    #[error("CCMP cannot protect frames with frame control {:#06x}", _0)]
    CcmpUnsupportedFrame(u16),
    #[error("CCMP encryption failed")]
    CcmpEncryptionFailed,
    #[error("CCMP header lacks the Ext IV bit")]
    CcmpMissingExtIv,
    #[error("CCMP MIC verification failed")]
    CcmpMicFailure,
    #[error("replayed CCMP packet number {}; last accepted {}", _0, _1)]
    CcmpReplay(u64, u64),
    #[error("CCMP packet number space exhausted")]
    CcmpPnExhausted,
}

impl Error {
    /// Reason for deauthenticating from the Authenticator if this error aborts an association.
    /// Errors caused by a single bad frame return None since the frame is simply dropped.
    pub fn deauth_reason(&self) -> Option<ReasonCode> {
        match self {
            Error::RsneMismatch => Some(ReasonCode::HANDSHAKE_ELEMENT_MISMATCH),
            Error::MissingGtk | Error::UnencryptedKeyData | Error::InvalidKeyData(_) => {
                Some(ReasonCode::FOURWAY_HANDSHAKE_TIMEOUT)
            }
            Error::MfpNotSupported => Some(ReasonCode::INVALID_RSNE_CAPABILITIES),
            Error::UnsupportedAkmSuite => Some(ReasonCode::REASON_INVALID_AKMP),
            Error::UnsupportedCipherSuite => Some(ReasonCode::REASON_INVALID_PAIRWISE_CIPHER),
            _ => None,
        }
    }
}

// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub mod esssa;
pub mod pmksa;
#[cfg(test)]
pub mod test_util;

use {
    crate::{eapol, key::exchange::Key, Error},
    wlan_common::{
        appendable::{Appendable, BufferTooSmall},
        ie::{
            rsn::{
                akm::{self, Akm},
                cipher::{self, Cipher},
                rsne::{RsnCapabilities, Rsne},
            },
            wpa::{self, WpaIe},
            Id,
        },
        organization::Oui,
    },
};

/// The security element a station announces: an RSNE or a WPA1 vendor IE.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtectionInfo {
    Rsne(Rsne),
    LegacyWpa(WpaIe),
}

impl ProtectionInfo {
    /// Writes the complete element, including its header.
    pub fn write_into<A: Appendable>(&self, buf: &mut A) -> Result<(), BufferTooSmall> {
        match self {
            ProtectionInfo::Rsne(rsne) => rsne.write_into(buf),
            ProtectionInfo::LegacyWpa(wpa_ie) => {
                buf.append_byte(Id::VENDOR_SPECIFIC.0)?;
                buf.append_byte((4 + wpa_ie.len()) as u8)?;
                buf.append_bytes(&wpa::OUI.to_array()[..])?;
                buf.append_byte(wpa::VENDOR_SPECIFIC_TYPE)?;
                wpa_ie.write_into(buf)
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![];
        // Writing into a Vec cannot run out of space.
        let _ = self.write_into(&mut buf);
        buf
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionType {
    Rsna,
    LegacyWpa1,
}

/// Suites in effect for an association, derived from the Supplicant's own element.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedProtection {
    pub group_data: Cipher,
    pub pairwise: Cipher,
    pub group_mgmt: Option<Cipher>,
    pub akm: Akm,
    pub mic_size: u16,
    pub protection_type: ProtectionType,
    pub caps: Option<RsnCapabilities>,
}

fn is_supported_akm(akm: &Akm) -> bool {
    !akm.is_vendor_specific()
        && matches!(akm.suite_type, akm::EAP | akm::PSK | akm::EAP_SHA256 | akm::PSK_SHA256)
}

impl NegotiatedProtection {
    pub fn from_protection(protection: &ProtectionInfo) -> Result<Self, Error> {
        match protection {
            ProtectionInfo::Rsne(rsne) => Self::from_rsne(rsne),
            ProtectionInfo::LegacyWpa(wpa_ie) => Self::from_legacy_wpa(wpa_ie),
        }
    }

    pub fn from_rsne(rsne: &Rsne) -> Result<Self, Error> {
        let group_data =
            rsne.group_data_cipher_suite.unwrap_or_else(|| Cipher::new_dot11(cipher::CCMP_128));
        let pairwise = *rsne.pairwise_cipher_suites.first().ok_or(Error::UnsupportedCipherSuite)?;
        let akm = *rsne.akm_suites.first().ok_or(Error::UnsupportedAkmSuite)?;
        let group_mgmt = if rsne.mfp_capable() {
            Some(
                rsne.group_mgmt_cipher_suite
                    .unwrap_or_else(|| Cipher::new_dot11(cipher::BIP_CMAC_128)),
            )
        } else {
            None
        };
        Self::validate(NegotiatedProtection {
            group_data,
            pairwise,
            group_mgmt,
            akm,
            mic_size: akm.mic_bytes().ok_or(Error::UnsupportedAkmSuite)?,
            protection_type: ProtectionType::Rsna,
            caps: rsne.rsn_capabilities,
        })
    }

    /// WPA1 suites carry the MSFT OUI but share the IEEE suite type numbering.
    pub fn from_legacy_wpa(wpa_ie: &WpaIe) -> Result<Self, Error> {
        let to_dot11_cipher = |c: &Cipher| {
            if c.oui == Oui::MSFT {
                Ok(Cipher::new_dot11(c.suite_type))
            } else {
                Err(Error::UnsupportedCipherSuite)
            }
        };
        let group_data = to_dot11_cipher(&wpa_ie.multicast_cipher)?;
        let pairwise =
            to_dot11_cipher(wpa_ie.unicast_cipher_list.first().ok_or(Error::UnsupportedCipherSuite)?)?;
        let akm = match wpa_ie.akm_list.first() {
            Some(akm) if akm.oui == Oui::MSFT => Akm::new_dot11(akm.suite_type),
            _ => return Err(Error::UnsupportedAkmSuite),
        };
        Self::validate(NegotiatedProtection {
            group_data,
            pairwise,
            group_mgmt: None,
            akm,
            mic_size: akm.mic_bytes().ok_or(Error::UnsupportedAkmSuite)?,
            protection_type: ProtectionType::LegacyWpa1,
            caps: None,
        })
    }

    fn validate(negotiated: Self) -> Result<Self, Error> {
        if !negotiated.pairwise.is_ccmp_128() || !negotiated.group_data.is_ccmp_128() {
            return Err(Error::UnsupportedCipherSuite);
        }
        if let Some(group_mgmt) = &negotiated.group_mgmt {
            if !group_mgmt.is_bip_cmac_128() {
                return Err(Error::UnsupportedCipherSuite);
            }
        }
        if !is_supported_akm(&negotiated.akm) {
            return Err(Error::UnsupportedAkmSuite);
        }
        Ok(negotiated)
    }

    pub fn key_descriptor(&self) -> eapol::KeyDescriptor {
        match self.protection_type {
            ProtectionType::Rsna => eapol::KeyDescriptor::Ieee802dot11,
            ProtectionType::LegacyWpa1 => eapol::KeyDescriptor::LegacyWpa1,
        }
    }

    pub fn mfp_enabled(&self) -> bool {
        self.group_mgmt.is_some()
    }
}

/// Builds the RSNE a Supplicant sends in its association request in response to the
/// Authenticator's RSNE.
pub fn negotiate_rsne(a_rsne: &Rsne, mfp_capable: bool) -> Result<Rsne, Error> {
    let group = a_rsne.group_data_cipher_suite.unwrap_or_else(|| Cipher::new_dot11(cipher::CCMP_128));
    if !group.is_ccmp_128() {
        return Err(Error::UnsupportedCipherSuite);
    }
    let pairwise = a_rsne
        .pairwise_cipher_suites
        .iter()
        .find(|c| c.is_ccmp_128())
        .ok_or(Error::UnsupportedCipherSuite)?;
    // Prefer the SHA-256 based key hierarchy.
    let akm = [akm::PSK_SHA256, akm::PSK, akm::EAP_SHA256, akm::EAP]
        .iter()
        .filter_map(|t| a_rsne.akm_suites.iter().find(|a| !a.is_vendor_specific() && a.suite_type == *t))
        .next()
        .ok_or(Error::UnsupportedAkmSuite)?;

    if a_rsne.mfp_required() && !mfp_capable {
        return Err(Error::MfpNotSupported);
    }
    let mfp = mfp_capable && a_rsne.mfp_capable();
    let group_mgmt = if mfp { a_rsne.group_mgmt_cipher_suite } else { None };
    if let Some(group_mgmt) = &group_mgmt {
        if !group_mgmt.is_bip_cmac_128() {
            return Err(Error::UnsupportedCipherSuite);
        }
    }

    Ok(Rsne {
        group_data_cipher_suite: Some(group),
        pairwise_cipher_suites: vec![*pairwise],
        akm_suites: vec![*akm],
        rsn_capabilities: Some(RsnCapabilities(0).with_mfp(mfp, false)),
        group_mgmt_cipher_suite: group_mgmt,
        ..Rsne::new()
    })
}

/// Builds the WPA1 IE a Supplicant sends in response to the Authenticator's WPA1 IE.
pub fn negotiate_legacy_wpa(a_wpa: &WpaIe) -> Result<WpaIe, Error> {
    let ccmp = Cipher { oui: Oui::MSFT, suite_type: cipher::CCMP_128 };
    let psk = Akm { oui: Oui::MSFT, suite_type: akm::PSK };
    if a_wpa.multicast_cipher != ccmp || !a_wpa.unicast_cipher_list.contains(&ccmp) {
        return Err(Error::UnsupportedCipherSuite);
    }
    if !a_wpa.akm_list.contains(&psk) {
        return Err(Error::UnsupportedAkmSuite);
    }
    Ok(WpaIe { multicast_cipher: ccmp, unicast_cipher_list: vec![ccmp], akm_list: vec![psk] })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecAssocStatus {
    /// Pairwise and group keys are in place; the controlled port may open.
    EssSaEstablished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SecAssocUpdate {
    TxEapolKeyFrame(eapol::KeyFrame),
    Key(Key),
    Status(SecAssocStatus),
}

pub type UpdateSink = Vec<SecAssocUpdate>;

#[cfg(test)]
mod tests {
    use {super::*, wlan_common::assert_variant};

    fn a_rsne(akms: &[u8], caps: RsnCapabilities) -> Rsne {
        Rsne {
            group_data_cipher_suite: Some(Cipher::new_dot11(cipher::CCMP_128)),
            pairwise_cipher_suites: vec![
                Cipher::new_dot11(cipher::TKIP),
                Cipher::new_dot11(cipher::CCMP_128),
            ],
            akm_suites: akms.iter().map(|t| Akm::new_dot11(*t)).collect(),
            rsn_capabilities: Some(caps),
            ..Rsne::new()
        }
    }

    #[test]
    fn negotiate_prefers_sha256_akm() {
        let s_rsne = negotiate_rsne(&a_rsne(&[akm::PSK, akm::PSK_SHA256], RsnCapabilities(0)), false)
            .expect("compatible RSNE");
        assert_eq!(vec![Cipher::new_dot11(cipher::CCMP_128)], s_rsne.pairwise_cipher_suites);
        assert_eq!(vec![Akm::new_dot11(akm::PSK_SHA256)], s_rsne.akm_suites);

        let negotiated = NegotiatedProtection::from_rsne(&s_rsne).expect("supported suites");
        assert_eq!(16, negotiated.mic_size);
        assert!(!negotiated.mfp_enabled());
    }

    #[test]
    fn negotiate_mfp() {
        let caps = RsnCapabilities(0).with_mfp(true, false);
        let s_rsne = negotiate_rsne(&a_rsne(&[akm::PSK], caps), true).expect("compatible RSNE");
        assert!(s_rsne.mfp_capable());
        let negotiated = NegotiatedProtection::from_rsne(&s_rsne).expect("supported suites");
        assert_eq!(Some(Cipher::new_dot11(cipher::BIP_CMAC_128)), negotiated.group_mgmt);

        let caps = RsnCapabilities(0).with_mfp(true, true);
        assert_variant!(negotiate_rsne(&a_rsne(&[akm::PSK], caps), false), Err(Error::MfpNotSupported));
    }

    #[test]
    fn negotiate_incompatible_rsne() {
        assert_variant!(
            negotiate_rsne(&a_rsne(&[akm::SAE], RsnCapabilities(0)), false),
            Err(Error::UnsupportedAkmSuite)
        );
        let tkip_only = Rsne {
            pairwise_cipher_suites: vec![Cipher::new_dot11(cipher::TKIP)],
            ..a_rsne(&[akm::PSK], RsnCapabilities(0))
        };
        assert_variant!(negotiate_rsne(&tkip_only, false), Err(Error::UnsupportedCipherSuite));
    }

    #[test]
    fn legacy_wpa_is_normalized() {
        let a_wpa = WpaIe {
            multicast_cipher: Cipher { oui: Oui::MSFT, suite_type: cipher::CCMP_128 },
            unicast_cipher_list: vec![
                Cipher { oui: Oui::MSFT, suite_type: cipher::TKIP },
                Cipher { oui: Oui::MSFT, suite_type: cipher::CCMP_128 },
            ],
            akm_list: vec![Akm { oui: Oui::MSFT, suite_type: akm::PSK }],
        };
        let s_wpa = negotiate_legacy_wpa(&a_wpa).expect("compatible WPA1 IE");
        let negotiated = NegotiatedProtection::from_legacy_wpa(&s_wpa).expect("supported suites");
        assert_eq!(Cipher::new_dot11(cipher::CCMP_128), negotiated.pairwise);
        assert_eq!(Akm::new_dot11(akm::PSK), negotiated.akm);
        assert_eq!(eapol::KeyDescriptor::LegacyWpa1, negotiated.key_descriptor());
    }

    #[test]
    fn legacy_wpa_with_tkip_group_is_rejected() {
        let a_wpa = WpaIe {
            multicast_cipher: Cipher { oui: Oui::MSFT, suite_type: cipher::TKIP },
            unicast_cipher_list: vec![Cipher { oui: Oui::MSFT, suite_type: cipher::CCMP_128 }],
            akm_list: vec![Akm { oui: Oui::MSFT, suite_type: akm::PSK }],
        };
        assert_variant!(negotiate_legacy_wpa(&a_wpa), Err(Error::UnsupportedCipherSuite));
    }

    #[test]
    fn wpa_protection_bytes() {
        let wpa = negotiate_legacy_wpa(&WpaIe {
            multicast_cipher: Cipher { oui: Oui::MSFT, suite_type: cipher::CCMP_128 },
            unicast_cipher_list: vec![Cipher { oui: Oui::MSFT, suite_type: cipher::CCMP_128 }],
            akm_list: vec![Akm { oui: Oui::MSFT, suite_type: akm::PSK }],
        })
        .expect("compatible WPA1 IE");
        #[rustfmt::skip]
        assert_eq!(ProtectionInfo::LegacyWpa(wpa).to_bytes(), vec![
            0xdd, 0x16, 0x00, 0x50, 0xf2, 0x01,
            0x01, 0x00,
            0x00, 0x50, 0xf2, 0x04,
            0x01, 0x00, 0x00, 0x50, 0xf2, 0x04,
            0x01, 0x00, 0x00, 0x50, 0xf2, 0x02,
        ]);
    }
}

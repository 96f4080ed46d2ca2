// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::Element,
    crate::rsna::ProtectionInfo,
    bitfield::bitfield,
    nom::{
        bytes::complete::take,
        combinator::all_consuming,
        error::ErrorKind,
        number::complete::{le_u16, le_u8},
        IResult,
    },
    wlan_common::{
        appendable::{Appendable, BufferTooSmall},
        ie::{
            rsn::pmkid::{Pmkid, PMKID_LEN},
            wpa, write_wpa1_ie,
        },
        organization::Oui,
    },
};

pub const TYPE: u8 = 0xDD;
const PADDING_DATA_LEN: u8 = 0;
const HDR_LEN: usize = 6;
/// Octets taken by OUI and data type.
const HDR_OUI_TYPE_LEN: usize = 4;

// IEEE Std 802.11-2016, Table 12-6
const GTK_DATA_TYPE: u8 = 1;
const PMKID_DATA_TYPE: u8 = 4;
const IGTK_DATA_TYPE: u8 = 9;

/// A GTK KDE's fixed length.
/// Note: The KDE consists of a fixed and variable length (the GTK).
const GTK_FIXED_LEN: usize = 2;

const IGTK_IPN_LEN: usize = 6;
const IGTK_FIXED_LEN: usize = 2 + IGTK_IPN_LEN;

// IEEE Std 802.11-2016, 12.7.2, Figure 12-34
#[derive(Default, Debug, PartialEq, Clone)]
pub struct Header {
    pub type_: u8,
    pub len: u8,
    pub oui: Oui,
    pub data_type: u8,
}

impl Header {
    pub fn new(type_: u8, len: u8, oui: &[u8], data_type: u8) -> Header {
        let mut oui_buf = [0u8; 3];
        oui_buf.copy_from_slice(oui);
        Header { type_, len, data_type, oui: Oui::new(oui_buf) }
    }

    pub fn new_dot11(data_type: u8, data_len: usize) -> Header {
        Header { type_: TYPE, len: (HDR_OUI_TYPE_LEN + data_len) as u8, data_type, oui: Oui::DOT11 }
    }

    fn data_len(&self) -> usize {
        (self.len as usize).saturating_sub(HDR_OUI_TYPE_LEN)
    }
}

// IEEE Std 802.11-2016, 12.7.2, j)
pub enum GtkInfoTx {
    OnlyRx = 0,
    BothRxTx = 1,
}

// IEEE Std 802.11-2016, 12.7.2, Figure 12-35
bitfield! {
    #[derive(Clone, Copy)]
    pub struct GtkInfo(u8);
    impl Debug;
    pub key_id, set_key_id: 1, 0;
    pub tx, set_tx: 2, 2;
    // Bit 3-7 reserved.
    pub value, _: 7,0;
}

impl PartialEq for GtkInfo {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// GTK KDE:
/// IEEE Std 802.11-2016, 12.7.2, Figure 12-35
#[derive(Debug, PartialEq, Clone)]
pub struct Gtk {
    pub info: GtkInfo,
    // 1 byte reserved.
    pub gtk: Vec<u8>,
}

impl Gtk {
    pub fn new(key_id: u8, tx: GtkInfoTx, gtk: &[u8]) -> Self {
        let mut gtk_info = GtkInfo(0);
        gtk_info.set_key_id(key_id);
        gtk_info.set_tx(tx as u8);
        Self { info: gtk_info, gtk: gtk.to_vec() }
    }

    /// Length of the GTK KDE including its fixed fields, not just the GTK.
    pub fn len(&self) -> usize {
        GTK_FIXED_LEN + self.gtk.len()
    }
}

/// IGTK KDE:
/// IEEE Std 802.11-2016, 12.7.2, Figure 12-42
#[derive(Debug, PartialEq, Clone)]
pub struct Igtk {
    pub id: u16,
    // IGTK Packet Number
    pub ipn: [u8; IGTK_IPN_LEN],
    pub igtk: Vec<u8>,
}

impl Igtk {
    pub fn new(id: u16, ipn: &[u8], igtk: &[u8]) -> Self {
        let mut ipn_buf = [0u8; IGTK_IPN_LEN];
        ipn_buf.copy_from_slice(ipn);
        Self { id, ipn: ipn_buf, igtk: igtk.to_vec() }
    }

    pub fn len(&self) -> usize {
        IGTK_FIXED_LEN + self.igtk.len()
    }
}

pub fn parse(i0: &[u8]) -> IResult<&[u8], Element> {
    // Check whether parsing is finished.
    if i0.len() <= 1 {
        return Ok((&i0[i0.len()..], Element::Padding));
    }

    // Check whether the remaining data is padding.
    let data_len = i0[1];
    if data_len == PADDING_DATA_LEN {
        return parse_padding(&i0[1..]);
    }

    // Read the KDE Header first.
    let (i1, hdr) = parse_header(i0)?;
    let (i2, bytes) = take(hdr.data_len())(i1)?;
    match hdr.oui {
        Oui::DOT11 => match hdr.data_type {
            GTK_DATA_TYPE => {
                let (_, gtk) = all_consuming(parse_gtk)(bytes)?;
                Ok((i2, Element::Gtk(hdr, gtk)))
            }
            IGTK_DATA_TYPE => {
                let (_, igtk) = all_consuming(parse_igtk)(bytes)?;
                Ok((i2, Element::Igtk(hdr, igtk)))
            }
            PMKID_DATA_TYPE => {
                let (_, pmkid) = all_consuming(parse_pmkid)(bytes)?;
                Ok((i2, Element::Pmkid(hdr, pmkid)))
            }
            _ => Ok((i2, Element::UnsupportedKde(hdr))),
        },
        // The WPA1 IE uses the same vendor IE format as a KDE, so we handle it here as a special
        // case.
        Oui::MSFT if hdr.data_type == wpa::VENDOR_SPECIFIC_TYPE => {
            let wpa = wpa::from_bytes(bytes)
                .map_err(|_| nom::Err::Error((bytes, ErrorKind::Verify)))?;
            Ok((i2, Element::LegacyWpa1(wpa)))
        }
        _ => Ok((i2, Element::UnsupportedKde(hdr))),
    }
}

fn parse_header(input: &[u8]) -> IResult<&[u8], Header> {
    let (i, type_) = le_u8(input)?;
    let (i, len) = le_u8(i)?;
    let (i, oui) = take(3usize)(i)?;
    let (i, data_type) = le_u8(i)?;
    Ok((i, Header::new(type_, len, oui, data_type)))
}

fn parse_padding(input: &[u8]) -> IResult<&[u8], Element> {
    if input.iter().all(|&x| x == 0) {
        Ok((&[], Element::Padding))
    } else {
        // Return ErrorKind::Eof to indicate that we expected that the remaining input should have
        // been all padding bytes.
        Err(nom::Err::Error((input, ErrorKind::Eof)))
    }
}

fn parse_gtk(input: &[u8]) -> IResult<&[u8], Gtk> {
    let (i, info) = le_u8(input)?;
    // 1 byte reserved.
    let (i, _) = take(1usize)(i)?;
    let (i, gtk) = take(i.len())(i)?;
    Ok((i, Gtk { info: GtkInfo(info), gtk: gtk.to_vec() }))
}

fn parse_igtk(input: &[u8]) -> IResult<&[u8], Igtk> {
    let (i, id) = le_u16(input)?;
    let (i, ipn) = take(IGTK_IPN_LEN)(i)?;
    let (i, igtk) = take(i.len())(i)?;
    Ok((i, Igtk::new(id, ipn, igtk)))
}

fn parse_pmkid(input: &[u8]) -> IResult<&[u8], Pmkid> {
    let (i, bytes) = take(PMKID_LEN)(input)?;
    let mut pmkid = [0u8; PMKID_LEN];
    pmkid.copy_from_slice(bytes);
    Ok((i, pmkid))
}

/// KDE Writer to assist with writing key data elements.
pub struct Writer<A: Appendable> {
    buf: A,
}

impl<A: Appendable> Writer<A> {
    pub fn new(buf: A) -> Self {
        Self { buf }
    }

    pub fn bytes_written(&self) -> usize {
        self.buf.bytes_written()
    }

    pub fn write_protection(&mut self, protection: &ProtectionInfo) -> Result<(), BufferTooSmall> {
        match protection {
            ProtectionInfo::Rsne(rsne) => rsne.write_into(&mut self.buf),
            ProtectionInfo::LegacyWpa(wpa) => {
                write_wpa1_ie(&mut self.buf, wpa).map_err(|_| BufferTooSmall)
            }
        }
    }

    fn write_kde_hdr(&mut self, hdr: Header) -> Result<(), BufferTooSmall> {
        if !self.buf.can_append(HDR_LEN) {
            return Err(BufferTooSmall);
        }
        self.buf.append_byte(hdr.type_)?;
        self.buf.append_byte(hdr.len)?;
        self.buf.append_bytes(&hdr.oui.to_array()[..])?;
        self.buf.append_byte(hdr.data_type)?;
        Ok(())
    }

    pub fn write_gtk(&mut self, gtk_kde: &Gtk) -> Result<(), BufferTooSmall> {
        if !self.buf.can_append(HDR_LEN + gtk_kde.len()) {
            return Err(BufferTooSmall);
        }
        // KDE Header
        let hdr = Header::new_dot11(GTK_DATA_TYPE, gtk_kde.len());
        self.write_kde_hdr(hdr)?;

        // GTK KDE
        self.buf.append_byte(gtk_kde.info.value())?;
        self.buf.append_byte(0)?;
        self.buf.append_bytes(&gtk_kde.gtk[..])?;
        Ok(())
    }

    pub fn write_igtk(&mut self, igtk_kde: &Igtk) -> Result<(), BufferTooSmall> {
        if !self.buf.can_append(HDR_LEN + igtk_kde.len()) {
            return Err(BufferTooSmall);
        }
        // KDE Header
        let hdr = Header::new_dot11(IGTK_DATA_TYPE, igtk_kde.len());
        self.write_kde_hdr(hdr)?;

        // IGTK KDE
        self.buf.append_bytes(&igtk_kde.id.to_le_bytes()[..])?;
        self.buf.append_bytes(&igtk_kde.ipn[..])?;
        self.buf.append_bytes(&igtk_kde.igtk[..])?;
        Ok(())
    }

    pub fn write_pmkid(&mut self, pmkid: &Pmkid) -> Result<(), BufferTooSmall> {
        if !self.buf.can_append(HDR_LEN + PMKID_LEN) {
            return Err(BufferTooSmall);
        }
        let hdr = Header::new_dot11(PMKID_DATA_TYPE, PMKID_LEN);
        self.write_kde_hdr(hdr)?;
        self.buf.append_bytes(&pmkid[..])
    }

    pub fn finalize_for_encryption(mut self) -> Result<A, BufferTooSmall> {
        // Optional padding must be added if the key data will be encrypted.
        // See IEEE Std 802.11-2016, 12.7.2 j)
        // Padding is added to extend the key data field to a minimum size of 16 octets or
        // otherwise be a multiple of 8 octets.
        let written = self.bytes_written();
        let padding_len =
            if written < 16 { 16 - written } else { ((written + 7) / 8) * 8 - written };
        if !self.buf.can_append(padding_len) {
            return Err(BufferTooSmall);
        }

        if padding_len != 0 {
            self.buf.append_byte(TYPE)?;
            self.buf.append_bytes_zeroed(padding_len - 1)?;
        }
        Ok(self.buf)
    }

    pub fn finalize_for_plaintext(self) -> Result<A, BufferTooSmall> {
        Ok(self.buf)
    }
}

// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub mod kde;

use {
    crate::Error,
    nom::{bytes::complete::take, error::ErrorKind, number::complete::le_u8, IResult},
    wlan_common::ie::{
        rsn::{pmkid::Pmkid, rsne},
        wpa, Id,
    },
};

/// An element found in the Key Data field of an EAPOL-Key frame.
#[derive(Debug, PartialEq, Clone)]
pub enum Element {
    Gtk(kde::Header, kde::Gtk),
    Igtk(kde::Header, kde::Igtk),
    Pmkid(kde::Header, Pmkid),
    Rsne(rsne::Rsne),
    LegacyWpa1(wpa::WpaIe),
    Padding,
    UnsupportedKde(kde::Header),
    UnsupportedIe(u8, u8),
}

fn parse_ie(input: &[u8]) -> IResult<&[u8], Element> {
    let (i, id) = le_u8(input)?;
    if id == kde::TYPE {
        return kde::parse(input);
    }
    let (i, len) = le_u8(i)?;
    let (i, body) = take(len as usize)(i)?;
    if id == Id::RSNE.0 {
        let rsne =
            rsne::from_body(body).map_err(|_| nom::Err::Error((input, ErrorKind::Verify)))?;
        Ok((i, Element::Rsne(rsne)))
    } else {
        Ok((i, Element::UnsupportedIe(id, len)))
    }
}

/// Splits key data into its elements. Trailing padding is reported as `Element::Padding`.
pub fn extract_elements(key_data: &[u8]) -> Result<Vec<Element>, Error> {
    let mut elements = vec![];
    let mut remaining = key_data;
    while !remaining.is_empty() {
        let (rest, element) =
            parse_ie(remaining).map_err(|e| Error::InvalidKeyData(format!("{:?}", e)))?;
        elements.push(element);
        remaining = rest;
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use {super::*, wlan_common::assert_variant};

    #[rustfmt::skip]
    const RSNE: [u8; 22] = [
        48, 20, 1, 0,
        0x00, 0x0f, 0xac, 4,
        1, 0, 0x00, 0x0f, 0xac, 4,
        1, 0, 0x00, 0x0f, 0xac, 2,
        0x00, 0x00,
    ];

    #[test]
    fn rsne_followed_by_gtk_and_padding() {
        let mut buf = RSNE.to_vec();
        let mut w = kde::Writer::new(&mut buf);
        w.write_gtk(&kde::Gtk::new(1, kde::GtkInfoTx::BothRxTx, &[5; 16][..]))
            .expect("failure writing GTK KDE");
        w.finalize_for_encryption().expect("failure finalizing key data");
        assert_eq!(0, buf.len() % 8);

        let elements = extract_elements(&buf[..]).expect("valid key data");
        assert_eq!(3, elements.len());
        assert_variant!(&elements[0], Element::Rsne(rsne) => {
            assert_eq!(rsne.to_vec(), RSNE.to_vec());
        });
        assert_variant!(&elements[1], Element::Gtk(_, gtk) => {
            assert_eq!(1, gtk.info.key_id());
            assert_eq!(&[5; 16][..], &gtk.gtk[..]);
        });
        assert_variant!(&elements[2], Element::Padding);
    }

    #[test]
    fn unknown_ie_is_skipped() {
        let buf = vec![0x7f, 2, 1, 2, 48, 2, 1, 0];
        let elements = extract_elements(&buf[..]).expect("valid key data");
        assert_eq!(2, elements.len());
        assert_variant!(&elements[0], Element::UnsupportedIe(0x7f, 2));
        assert_variant!(&elements[1], Element::Rsne(_));
    }

    #[test]
    fn truncated_element() {
        let buf = vec![48, 20, 1, 0];
        assert_variant!(extract_elements(&buf[..]), Err(Error::InvalidKeyData(_)));
    }

    #[test]
    fn empty_key_data() {
        assert!(extract_elements(&[]).expect("valid key data").is_empty());
    }
}

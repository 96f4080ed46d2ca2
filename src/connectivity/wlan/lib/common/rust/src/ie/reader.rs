// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{Header, Id},
    crate::buffer_reader::BufferReader,
    std::mem::size_of,
    zerocopy::ByteSlice,
};

/// Walks the elements of a beacon, probe response or association response body, yielding
/// each element's ID and body. A header claiming more bytes than are left ends the walk;
/// `truncated()` tells such a chain apart from one that was read to its end.
pub struct Reader<B> {
    buf: BufferReader<B>,
    truncated: bool,
}

impl<B: ByteSlice> Reader<B> {
    pub fn new(bytes: B) -> Self {
        Reader { buf: BufferReader::new(bytes), truncated: false }
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<B: ByteSlice> Iterator for Reader<B> {
    type Item = (Id, B);

    fn next(&mut self) -> Option<Self::Item> {
        if self.truncated || self.buf.bytes_remaining() == 0 {
            return None;
        }
        let body_len = match self.buf.peek::<Header>() {
            Some(header) => header.body_len as usize,
            None => {
                self.truncated = true;
                return None;
            }
        };
        if self.buf.bytes_remaining() < size_of::<Header>() + body_len {
            self.truncated = true;
            return None;
        }
        let header = self.buf.read::<Header>()?;
        let body = self.buf.read_bytes(body_len)?;
        Some((header.id, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const BEACON_ELEMENTS: &[u8] = &[
        0, 4, b'H', b'o', b'm', b'e', // SSID
        1, 4, 0x82, 0x84, 0x8b, 0x96, // Supported Rates
        3, 1, 6, // DSSS Parameter Set
    ];

    #[test]
    fn beacon_elements() {
        let mut reader = Reader::new(BEACON_ELEMENTS);
        let ids: Vec<Id> = (&mut reader).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![Id::SSID, Id::SUPPORTED_RATES, Id::DSSS_PARAM_SET]);
        assert!(!reader.truncated());
    }

    #[test]
    fn hidden_ssid_has_empty_body() {
        let elements: Vec<_> = Reader::new(&[0, 0, 3, 1, 11][..]).collect();
        assert_eq!(&elements[..], &[(Id::SSID, &[][..]), (Id::DSSS_PARAM_SET, &[11][..])]);
    }

    #[test]
    fn no_elements() {
        let mut reader = Reader::new(&[][..]);
        assert_eq!(reader.next(), None);
        assert!(!reader.truncated());
    }

    #[test]
    fn cut_off_rsne_ends_the_walk() {
        let mut elements = BEACON_ELEMENTS.to_vec();
        elements.extend_from_slice(&[48, 20, 1, 0, 0x00, 0x0f, 0xac]);
        let mut reader = Reader::new(&elements[..]);
        assert_eq!(reader.by_ref().count(), 3);
        assert!(reader.truncated());
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn lone_id_byte_is_truncated() {
        let mut reader = Reader::new(&[221][..]);
        assert_eq!(reader.next(), None);
        assert!(reader.truncated());
    }
}

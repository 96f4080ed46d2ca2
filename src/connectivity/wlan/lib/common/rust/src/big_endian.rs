// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    byteorder::{BigEndian, ByteOrder},
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BigEndianU16(pub [u8; 2]);

impl BigEndianU16 {
    pub fn from_native(native: u16) -> Self {
        let mut buf = [0, 0];
        BigEndian::write_u16(&mut buf, native);
        BigEndianU16(buf)
    }

    pub fn to_native(&self) -> u16 {
        BigEndian::read_u16(&self.0)
    }

    pub fn set_from_native(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.0, value);
    }
}

#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BigEndianU64(pub [u8; 8]);

impl BigEndianU64 {
    pub fn from_native(native: u64) -> Self {
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, native);
        BigEndianU64(buf)
    }

    pub fn to_native(&self) -> u64 {
        BigEndian::read_u64(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_u16() {
        let mut x = BigEndianU16::from_native(0x1234);
        assert_eq!([0x12, 0x34], x.0);
        assert_eq!(0x1234, x.to_native());

        x.set_from_native(0x5678);
        assert_eq!([0x56, 0x78], x.0);
        assert_eq!(0x5678, x.to_native());
    }

    #[test]
    fn big_endian_u64() {
        let x = BigEndianU64::from_native(0x0102030405060708);
        assert_eq!([1, 2, 3, 4, 5, 6, 7, 8], x.0);
        assert_eq!(0x0102030405060708, x.to_native());
    }
}

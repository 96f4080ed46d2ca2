// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod constants;
mod fields;
pub mod intersect;
mod parse;
mod rates_writer;
mod reader;
pub mod rsn;
pub mod wpa;
mod write;

use zerocopy::{AsBytes, FromBytes, Unaligned};

pub use {
    constants::*, fields::*, intersect::*, parse::*, rates_writer::*, reader::*, write::*,
};

#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned, PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct Id(pub u8);

// IEEE Std 802.11-2016, 9.4.2.1, Table 9-77
impl Id {
    pub const SSID: Self = Self(0);
    pub const SUPPORTED_RATES: Self = Self(1);
    pub const DSSS_PARAM_SET: Self = Self(3);
    pub const TIM: Self = Self(5);
    pub const COUNTRY: Self = Self(7);
    pub const EDCA_PARAM_SET: Self = Self(12);
    pub const HT_CAPABILITIES: Self = Self(45);
    pub const ERP_INFO: Self = Self(42);
    pub const RSNE: Self = Self(48);
    pub const EXT_SUPPORTED_RATES: Self = Self(50);
    pub const HT_OPERATION: Self = Self(61);
    pub const VENDOR_SPECIFIC: Self = Self(221);
    pub const EXTENSION: Self = Self(255);
}

#[repr(C, packed)]
#[derive(AsBytes, FromBytes, Unaligned)]
pub struct Header {
    pub id: Id,
    pub body_len: u8,
}

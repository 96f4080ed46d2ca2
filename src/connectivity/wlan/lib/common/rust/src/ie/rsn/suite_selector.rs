// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::organization::Oui,
    nom::{bytes::complete::take, IResult},
};

pub const OUI: Oui = Oui::DOT11;

/// Constructs a suite (cipher or AKM) from its four byte selector.
pub trait Factory {
    type Suite;

    fn new(oui: Oui, suite_type: u8) -> Self::Suite;
}

pub(crate) fn read_suite_selector<T>(input: &[u8]) -> IResult<&[u8], T>
where
    T: Factory<Suite = T>,
{
    let (i, bytes) = take(4usize)(input)?;
    let oui = Oui::new([bytes[0], bytes[1], bytes[2]]);
    Ok((i, T::new(oui, bytes[3])))
}

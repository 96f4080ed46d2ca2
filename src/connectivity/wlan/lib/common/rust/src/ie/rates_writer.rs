// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        appendable::Appendable,
        error::FrameWriteError,
        ie::{
            write_ext_supported_rates, write_supported_rates, IE_MAX_LEN, SUPPORTED_RATES_MAX_LEN,
        },
    },
    zerocopy::ByteSlice,
};

/// A rate set as announced in probe and association requests: the first eight rates go into
/// Supported Rates, any others into Extended Supported Rates.
pub struct RatesWriter<S>(S);

impl<S: ByteSlice> RatesWriter<S> {
    pub fn try_new(rates: S) -> Result<RatesWriter<S>, FrameWriteError> {
        if rates.is_empty() {
            Err(FrameWriteError::new_invalid_data("no rates to write"))
        } else if rates.len() > SUPPORTED_RATES_MAX_LEN + IE_MAX_LEN {
            Err(FrameWriteError::new_invalid_data("rates will not fit in elements"))
        } else {
            Ok(RatesWriter(rates))
        }
    }

    /// Rates of the Supported Rates and the Extended Supported Rates element.
    pub fn split(&self) -> (&[u8], &[u8]) {
        let rates = &self.0[..];
        rates.split_at(std::cmp::min(rates.len(), SUPPORTED_RATES_MAX_LEN))
    }

    /// Writes Supported Rates, followed by Extended Supported Rates if needed.
    pub fn write<B: Appendable>(&self, buf: &mut B) -> Result<(), FrameWriteError> {
        let (supported, extended) = self.split();
        write_supported_rates(&mut *buf, supported)?;
        if !extended.is_empty() {
            write_ext_supported_rates(&mut *buf, extended)?;
        }
        Ok(())
    }
}

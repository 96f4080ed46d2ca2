// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {crate::ie::SupportedRate, std::collections::HashSet, thiserror::Error};

pub struct ApRates<'a>(pub &'a [SupportedRate]);
pub struct ClientRates<'a>(pub &'a [SupportedRate]);

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum IntersectRatesError {
    #[error("at least one basic rate not supported")]
    BasicRatesMismatch,
    #[error("client does not support any AP rates")]
    NoApRatesSupported,
}

/// Returns the rates specified by the AP that are also supported by the client, with basic bits
/// following their values in the AP.
/// Returns Error if intersection fails.
/// Note: The client MUST support ALL the basic rates specified by the AP or the intersection fails.
pub fn intersect_rates(
    ap: ApRates<'_>,
    client: ClientRates<'_>,
) -> Result<Vec<SupportedRate>, IntersectRatesError> {
    let mut ap = ap.0.to_vec();
    let client = client.0.iter().map(|r| r.rate()).collect::<HashSet<_>>();
    // The client MUST support ALL basic rates specified by the AP.
    if ap.iter().any(|ra| ra.basic() && !client.contains(&ra.rate())) {
        return Err(IntersectRatesError::BasicRatesMismatch);
    }

    // Remove rates that are not supported by the client.
    ap.retain(|ra| client.contains(&ra.rate()));
    if ap.is_empty() {
        Err(IntersectRatesError::NoApRatesSupported)
    } else {
        Ok(ap)
    }
}

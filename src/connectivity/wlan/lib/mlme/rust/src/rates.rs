// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{config::PhyMode, error::Error},
    log::debug,
    wlan_common::ie::{intersect_rates, ApRates, ClientRates, IntersectRatesError, SupportedRate},
};

/// Clause 15 (DSSS/CCK) rates in 500 kbit/s units: 1, 2, 5.5 and 11 Mbit/s.
const DSSS_RATES: [u8; 4] = [2, 4, 11, 22];

pub fn is_dsss_rate(rate: u8) -> bool {
    DSSS_RATES.contains(&(rate & 0x7f))
}

/// The configured rates usable in `phy_mode`.
pub fn local_rates(configured: &[u8], phy_mode: PhyMode) -> Vec<SupportedRate> {
    configured
        .iter()
        .filter(|r| phy_mode != PhyMode::Dsss || is_dsss_rate(**r))
        .map(|r| SupportedRate(*r & 0x7f))
        .collect()
}

/// Intersects the rates an AP advertised with ours. Every basic rate of the AP must be
/// supported locally.
pub fn negotiate(
    ap_rates: &[SupportedRate],
    local: &[SupportedRate],
) -> Result<Vec<SupportedRate>, Error> {
    intersect_rates(ApRates(ap_rates), ClientRates(local)).map_err(|e| {
        debug!("rate negotiation failed: {}", e);
        match e {
            IntersectRatesError::BasicRatesMismatch | IntersectRatesError::NoApRatesSupported => {
                Error::RateMismatch
            }
        }
    })
}

pub fn to_bytes(rates: &[SupportedRate]) -> Vec<u8> {
    rates.iter().map(|r| r.0).collect()
}

/// Highest basic rate, used for control responses. Falls back to the lowest rate.
pub fn max_basic_rate(rates: &[SupportedRate]) -> Option<u8> {
    rates
        .iter()
        .filter(|r| r.basic())
        .map(|r| r.rate())
        .max()
        .or_else(|| rates.iter().map(|r| r.rate()).min())
}

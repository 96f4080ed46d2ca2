// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Choosing a BSS to join from what scanning recorded in the node table.

use {
    crate::{
        config::{Config, PhyMode, Security},
        node::{Node, NodeState},
        node_table::NodeTable,
        rates,
        rx::BssElements,
    },
    log::debug,
    thiserror::Error,
    wlan_common::{
        ie::{
            rsn::{akm, rsne},
            wpa,
        },
        mac::{fmt_addr, CapabilityInfo, MacAddr},
        time::TimeUnit,
    },
    wlan_rsn::{
        rsna::{negotiate_legacy_wpa, negotiate_rsne},
        ProtectionInfo,
    },
};

/// Why a BSS cannot be joined with the current configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("channel {0} is not in the scan list")]
    Channel(u8),
    #[error("SSID does not match")]
    Ssid,
    #[error("BSSID does not match")]
    Bssid,
    #[error("not an infrastructure BSS")]
    NotEss,
    #[error("privacy bit does not match the configured security")]
    Privacy,
    #[error("no usable RSN or WPA element")]
    NoSecurityElement,
    #[error("malformed security element")]
    MalformedSecurityElement,
    #[error("security negotiation failed: {0}")]
    Security(wlan_rsn::Error),
    #[error("basic rates not supported")]
    Rates,
    #[error("{0} failed association attempts")]
    TooManyFailures(u32),
}

/// A beacon or probe response as seen on the air.
#[derive(Debug, Clone)]
pub struct BssSighting {
    pub channel: u8,
    pub rssi_dbm: i8,
    pub timestamp: u64,
    pub beacon_interval: TimeUnit,
    pub capabilities: CapabilityInfo,
    pub elements: BssElements,
}

fn is_hidden_ssid(ssid: &[u8]) -> bool {
    ssid.iter().all(|b| *b == 0)
}

/// Records a sighting in a cached node. Sightings from another channel than the one recorded
/// only win if they are at least as strong, which filters out adjacent channel leakage. Within
/// one scan the strongest measurement on a channel is kept; `same_scan` is false for the first
/// sighting of a scan, which replaces what earlier scans measured.
/// Returns whether the node changed.
pub fn merge_sighting(node: &mut Node, sighting: BssSighting, same_scan: bool) -> bool {
    if node.channel != 0 && node.channel != sighting.channel && sighting.rssi_dbm < node.rssi_dbm {
        return false;
    }
    let elements = sighting.elements;
    if !same_scan || node.channel != sighting.channel || sighting.rssi_dbm > node.rssi_dbm {
        node.rssi_dbm = sighting.rssi_dbm;
    }
    node.channel = sighting.channel;
    node.last_seen = sighting.timestamp;
    node.beacon_interval = sighting.beacon_interval;
    node.capabilities = sighting.capabilities;
    // Hidden networks blank their SSID in beacons. Keep what a probe response revealed.
    if let Some(ssid) = elements.ssid.filter(|ssid| !is_hidden_ssid(ssid)) {
        node.ssid = ssid;
    }
    node.qos_capable = elements.wmm || elements.edca.is_some() || sighting.capabilities.qos();
    node.rates = elements.rates;
    node.rsne = elements.rsne;
    node.wpa_ie = elements.wpa_ie;
    node.ht_capable = elements.ht_capable;
    node.edca = elements.edca;
    node.erp = elements.erp;
    true
}

/// Applies a beacon of the BSS the station joined. Only parameters an AP may change during an
/// association are taken over; EDCA parameters only when the AP bumped their update count.
/// Returns whether the EDCA parameters changed.
pub fn update_joined(node: &mut Node, sighting: &BssSighting) -> bool {
    node.rssi_dbm = sighting.rssi_dbm;
    node.last_seen = sighting.timestamp;
    node.capabilities = sighting.capabilities;
    if let Some(erp) = sighting.elements.erp {
        if node.erp.map_or(true, |old| old.use_protection() != erp.use_protection()) {
            debug!("ERP protection {}", if erp.use_protection() { "enabled" } else { "disabled" });
        }
        node.erp = Some(erp);
    }
    match sighting.elements.edca {
        Some(edca) => {
            let count = { edca.qos_info }.edca_param_set_update_count();
            let changed = node
                .edca
                .map_or(true, |old| { old.qos_info }.edca_param_set_update_count() != count);
            if changed {
                node.edca = Some(edca);
            }
            changed
        }
        None => false,
    }
}

/// Works out the security elements of an association: ours, then the AP's. `None` for open
/// networks.
pub fn negotiate_protection(
    node: &Node,
    config: &Config,
) -> Result<Option<(ProtectionInfo, ProtectionInfo)>, Rejection> {
    if !config.security.is_protected() {
        return if node.is_protected() { Err(Rejection::Privacy) } else { Ok(None) };
    }
    if !node.is_protected() {
        return Err(Rejection::Privacy);
    }

    if let Some(raw) = &node.rsne {
        let a_rsne = rsne::from_bytes(raw).map_err(|_| Rejection::MalformedSecurityElement)?;
        match negotiate_rsne(&a_rsne, config.mfp_capable) {
            Ok(s_rsne) => {
                // 802.1X AKMs need a PMK installed out of band, which only a raw PSK provides.
                let eap = s_rsne
                    .akm_suites
                    .iter()
                    .any(|a| a.suite_type == akm::EAP || a.suite_type == akm::EAP_SHA256);
                if eap && !matches!(config.security, Security::Wpa2PskRaw { .. }) {
                    return Err(Rejection::Security(wlan_rsn::Error::UnsupportedAkmSuite));
                }
                return Ok(Some((ProtectionInfo::Rsne(s_rsne), ProtectionInfo::Rsne(a_rsne))));
            }
            Err(e) if !config.wpa1_supported || node.wpa_ie.is_none() => {
                return Err(Rejection::Security(e))
            }
            Err(e) => debug!("RSNE not usable, trying WPA1: {}", e),
        }
    }

    match &node.wpa_ie {
        Some(raw) if config.wpa1_supported => {
            let a_wpa = wpa::from_bytes(raw).map_err(|_| Rejection::MalformedSecurityElement)?;
            let s_wpa = negotiate_legacy_wpa(&a_wpa).map_err(Rejection::Security)?;
            Ok(Some((ProtectionInfo::LegacyWpa(s_wpa), ProtectionInfo::LegacyWpa(a_wpa))))
        }
        _ => Err(Rejection::NoSecurityElement),
    }
}

pub fn check_candidate(
    node: &Node,
    config: &Config,
    phy_mode: PhyMode,
    channels: &[u8],
) -> Result<(), Rejection> {
    if !channels.contains(&node.channel) {
        return Err(Rejection::Channel(node.channel));
    }
    if let Some(ssid) = &config.desired_ssid {
        if &node.ssid != ssid {
            return Err(Rejection::Ssid);
        }
    }
    if let Some(bssid) = &config.desired_bssid {
        if &node.bssid.0 != bssid {
            return Err(Rejection::Bssid);
        }
    }
    if !node.capabilities.ess() {
        return Err(Rejection::NotEss);
    }
    if node.assoc_fails >= config.max_assoc_fails {
        return Err(Rejection::TooManyFailures(node.assoc_fails));
    }
    negotiate_protection(node, config)?;
    rates::negotiate(&node.rates, &rates::local_rates(&config.rates, phy_mode))
        .map_err(|_| Rejection::Rates)?;
    Ok(())
}

/// The strongest cached BSS that can be joined. Ties go to the lowest address.
pub fn select_candidate(nodes: &NodeTable, config: &Config, phy_mode: PhyMode) -> Option<MacAddr> {
    let channels = config.scan_channels();
    let mut best: Option<&Node> = None;
    for addr in nodes.addrs() {
        let node = match nodes.find(&addr) {
            Some(node) if node.state == NodeState::Cache => node,
            _ => continue,
        };
        if let Err(rejection) = check_candidate(node, config, phy_mode, &channels) {
            debug!("not joining {}: {}", fmt_addr(&addr), rejection);
            continue;
        }
        if best.map_or(true, |b| node.rssi_dbm > b.rssi_dbm) {
            best = Some(node);
        }
    }
    best.map(|node| node.addr)
}

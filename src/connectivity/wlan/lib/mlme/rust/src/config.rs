// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    anyhow::{bail, ensure, Context},
    serde::{Deserialize, Serialize},
    std::time::Duration,
    wlan_common::{
        ie::SSID_MAX_LEN,
        mac::{is_multicast, MacAddr, NULL_ADDR},
    },
};

/// Rates in 500 kbit/s units advertised by the station.
pub const DEFAULT_RATES: [u8; 12] = [2, 4, 11, 22, 12, 18, 24, 36, 48, 72, 96, 108];
pub const DEFAULT_CHANNELS: [u8; 11] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
pub const MAX_BLOCK_ACK_WINDOW: u16 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Security {
    Open,
    Wpa2Psk { passphrase: String },
    /// 32 byte PSK given directly.
    Wpa2PskRaw { psk: Vec<u8> },
}

impl Security {
    pub fn is_protected(&self) -> bool {
        !matches!(self, Security::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    Active,
    Passive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    Auto,
    Fixed(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhyMode {
    Dsss,
    Erp,
    Ht,
}

/// Durations are carried as milliseconds on the wire.
mod millis {
    use {
        serde::{Deserialize, Deserializer, Serializer},
        std::time::Duration,
    };

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sta_addr: MacAddr,
    pub desired_ssid: Option<Vec<u8>>,
    pub desired_bssid: Option<MacAddr>,
    pub security: Security,
    pub wpa1_supported: bool,
    pub mfp_capable: bool,

    pub scan_mode: ScanMode,
    pub channel_mode: ChannelMode,
    pub channels: Vec<u8>,
    /// PHY modes tried in order when a scan finds no candidate.
    pub phy_modes: Vec<PhyMode>,
    pub rates: Vec<u8>,
    pub qos_enabled: bool,
    pub ht_enabled: bool,
    pub dscp_classification: bool,

    pub node_table_capacity: usize,
    pub fragment_cache_size: usize,
    #[serde(with = "millis")]
    pub defrag_timeout: Duration,
    #[serde(with = "millis")]
    pub scan_dwell_active: Duration,
    #[serde(with = "millis")]
    pub scan_dwell_passive: Duration,
    #[serde(with = "millis")]
    pub auth_timeout: Duration,
    #[serde(with = "millis")]
    pub assoc_timeout: Duration,
    #[serde(with = "millis")]
    pub handshake_timeout: Duration,
    /// Beacon periods without a beacon from the BSS before the link is declared lost.
    pub beacon_miss_count: u32,
    pub max_assoc_fails: u32,
    /// Inactivity timeout in TUs proposed for Block-Ack sessions. Zero disables it.
    pub ba_inactivity: u16,
    pub ba_window_size: u16,
    pub monitor_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sta_addr: NULL_ADDR,
            desired_ssid: None,
            desired_bssid: None,
            security: Security::Open,
            wpa1_supported: false,
            mfp_capable: false,
            scan_mode: ScanMode::Active,
            channel_mode: ChannelMode::Auto,
            channels: DEFAULT_CHANNELS.to_vec(),
            phy_modes: vec![PhyMode::Ht, PhyMode::Erp, PhyMode::Dsss],
            rates: DEFAULT_RATES.to_vec(),
            qos_enabled: true,
            ht_enabled: true,
            dscp_classification: false,
            node_table_capacity: 64,
            fragment_cache_size: 3,
            defrag_timeout: Duration::from_secs(1),
            scan_dwell_active: Duration::from_millis(50),
            scan_dwell_passive: Duration::from_millis(200),
            auth_timeout: Duration::from_millis(500),
            assoc_timeout: Duration::from_millis(500),
            handshake_timeout: Duration::from_secs(5),
            beacon_miss_count: 100,
            max_assoc_fails: 3,
            ba_inactivity: 0,
            ba_window_size: MAX_BLOCK_ACK_WINDOW,
            monitor_mode: false,
        }
    }
}

impl Config {
    /// Parses and validates a JSON configuration. Missing fields take their default.
    pub fn from_json(json: &str) -> anyhow::Result<Config> {
        let config: Config = serde_json::from_str(json).context("parsing MLME config")?;
        config.validate().context("validating MLME config")?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.sta_addr != NULL_ADDR, "station address is not set");
        ensure!(!is_multicast(&self.sta_addr), "station address must be unicast");
        if let Some(ssid) = &self.desired_ssid {
            ensure!(ssid.len() <= SSID_MAX_LEN, "SSID too long: {} bytes", ssid.len());
        }
        match &self.security {
            Security::Open => (),
            Security::Wpa2Psk { passphrase } => {
                ensure!(
                    (8..=63).contains(&passphrase.len()),
                    "passphrase must be 8 to 63 characters, got {}",
                    passphrase.len()
                );
                ensure!(self.desired_ssid.is_some(), "a passphrase requires a desired SSID");
            }
            Security::Wpa2PskRaw { psk } => {
                ensure!(psk.len() == 32, "raw PSK must be 32 bytes, got {}", psk.len())
            }
        }
        match self.channel_mode {
            ChannelMode::Auto => ensure!(!self.channels.is_empty(), "no channels to scan"),
            ChannelMode::Fixed(channel) => ensure!(channel != 0, "invalid fixed channel 0"),
        }
        ensure!(!self.phy_modes.is_empty(), "no PHY modes configured");
        ensure!(!self.rates.is_empty(), "no rates configured");
        if self.rates.iter().any(|r| *r & 0x7f == 0) {
            bail!("rates must be non-zero");
        }
        ensure!(self.node_table_capacity > 0, "node table capacity must be positive");
        ensure!(self.fragment_cache_size > 0, "fragment cache size must be positive");
        ensure!(
            (1..=MAX_BLOCK_ACK_WINDOW).contains(&self.ba_window_size),
            "Block-Ack window must be 1 to {}",
            MAX_BLOCK_ACK_WINDOW
        );
        ensure!(self.beacon_miss_count > 0, "beacon miss count must be positive");
        ensure!(self.max_assoc_fails > 0, "max association failures must be positive");
        Ok(())
    }

    /// Channels visited by a scan.
    pub fn scan_channels(&self) -> Vec<u8> {
        match self.channel_mode {
            ChannelMode::Auto => self.channels.clone(),
            ChannelMode::Fixed(channel) => vec![channel],
        }
    }

    pub fn scan_dwell(&self) -> Duration {
        match self.scan_mode {
            ScanMode::Active => self.scan_dwell_active,
            ScanMode::Passive => self.scan_dwell_passive,
        }
    }
}

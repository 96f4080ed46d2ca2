// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{
        bss::{self, BssSighting},
        Association, ClientMlme, LostBssCounter, State, ASSOCIATION_STATUS_TIMEOUT_BEACON_COUNT,
    },
    crate::{
        config::{Config, ScanMode, Security},
        device::{DeviceOps, KeyType, LinkStatus, RxInfo, TxFlags},
        error::{Error, ErrorKind},
        key::PAIRWISE_KEY_ID,
        node::NodeState,
        rates,
        rx::{self, MpduMeta},
        stats::DropReason,
        tx::{self, AssocReqParams},
        TimedEvent,
    },
    log::{debug, error, info, warn},
    wlan_common::{
        ie::HtCapabilities,
        mac::{
            fmt_addr, AuthAlgorithmNumber, AuthHdr, Bssid, CapabilityInfo, MacAddr, ReasonCode,
            StatusCode,
        },
        time::TimeUnit,
        timer::EventId,
    },
    wlan_rsn::{psk, ProtectionInfo, Supplicant},
};

fn new_supplicant(
    config: &Config,
    ssid: &[u8],
    bssid: MacAddr,
    s_protection: ProtectionInfo,
    a_protection: ProtectionInfo,
) -> Result<Supplicant, Error> {
    let psk = match &config.security {
        Security::Wpa2Psk { passphrase } => psk::compute(passphrase.as_bytes(), ssid)?,
        Security::Wpa2PskRaw { psk: raw } => psk::from_raw(&raw[..])?,
        Security::Open => return Err(Error::InvalidState("open networks have no supplicant")),
    };
    let supplicant =
        Supplicant::new_wpa_personal(psk, config.sta_addr, s_protection, bssid, a_protection)?;
    Ok(supplicant)
}

impl<D: DeviceOps> ClientMlme<D> {
    pub(super) fn begin_scan(&mut self) {
        self.cancel_state_timers();
        let generation = self.nodes.next_scan_generation();
        info!("scanning with {:?} (scan {})", self.phy_mode(), generation);
        self.scan_channel(0);
    }

    fn scan_channel(&mut self, channel_idx: usize) {
        let channel = match self.config.scan_channels().get(channel_idx) {
            Some(channel) => *channel,
            None => return self.end_scan(),
        };
        self.set_channel(channel);
        if self.config.scan_mode == ScanMode::Active {
            if let Err(e) = self.send_probe_req() {
                warn!("failed to send probe request on channel {}: {}", channel, e);
            }
        }
        let dwell = self.timer.schedule_after(self.config.scan_dwell(), TimedEvent::ScanDwell);
        self.state = State::Scan { channel_idx, dwell };
    }

    fn send_probe_req(&mut self) -> Result<(), Error> {
        let ssid = self.config.desired_ssid.clone().unwrap_or_default();
        let rates = rates::to_bytes(&rates::local_rates(&self.config.rates, self.phy_mode()));
        let ht_cap = if self.ht_active() { Some(HtCapabilities::minimal_client()) } else { None };
        let mut buf = vec![];
        tx::write_probe_req_frame(
            &mut buf,
            self.config.sta_addr,
            &ssid[..],
            &rates[..],
            ht_cap.as_ref(),
            &mut self.seq_mgr,
        )?;
        self.submit_mgmt(None, buf, TxFlags::NONE)?;
        Ok(())
    }

    pub(super) fn on_scan_dwell(&mut self, event_id: EventId) {
        match self.state {
            State::Scan { channel_idx, dwell } if dwell == event_id => {
                self.scan_channel(channel_idx + 1)
            }
            _ => (),
        }
    }

    fn end_scan(&mut self) {
        self.device.scan_done();
        match bss::select_candidate(&self.nodes, &self.config, self.phy_mode()) {
            Some(bssid) => self.join(bssid),
            None => {
                self.phy_idx = (self.phy_idx + 1) % std::cmp::max(self.config.phy_modes.len(), 1);
                debug!("no BSS to join");
                self.begin_scan();
            }
        }
    }

    fn join(&mut self, bssid: MacAddr) {
        let channel = match self.nodes.find_mut(&bssid) {
            Some(node) => {
                node.state = NodeState::Bss;
                node.channel
            }
            None => return self.begin_scan(),
        };
        info!("joining {} on channel {}", fmt_addr(&bssid), channel);
        self.set_channel(channel);
        let sta_addr = self.config.sta_addr;
        let result = self.send_mgmt_frame(bssid, false, |buf, _, seq_mgr| {
            tx::write_open_auth_frame(buf, Bssid(bssid), sta_addr, seq_mgr)
        });
        if let Err(e) = result {
            error!("failed to send authentication request: {}", e);
        }
        let timeout = self.timer.schedule_after(self.config.auth_timeout, TimedEvent::AuthTimeout);
        self.state = State::Auth { bssid, timeout };
    }

    pub(super) fn on_auth_frame(&mut self, src: MacAddr, auth_hdr: AuthHdr) {
        let (bssid, timeout) = match self.state {
            State::Auth { bssid, timeout } if bssid == src => (bssid, timeout),
            _ => return self.stats.record_drop(DropReason::UnexpectedFrame),
        };
        if { auth_hdr.auth_alg_num } != AuthAlgorithmNumber::OPEN
            || { auth_hdr.auth_txn_seq_num } != 2
        {
            warn!("unexpected authentication frame from {}", fmt_addr(&src));
            return self.stats.record_drop(DropReason::UnexpectedFrame);
        }
        self.timer.cancel_event(timeout);
        let status = { auth_hdr.status_code };
        if status != StatusCode::SUCCESS {
            warn!("authentication with {} refused: {:?}", fmt_addr(&bssid), status);
            self.stats.assoc_failures += 1;
            return self.join_failed(bssid);
        }
        if let Some(node) = self.nodes.find_mut(&bssid) {
            node.state = NodeState::Auth;
        }
        info!("authenticated with {}", fmt_addr(&bssid));
        self.associate(bssid);
    }

    fn associate(&mut self, bssid: MacAddr) {
        match self.send_assoc_req(bssid) {
            Ok(()) => (),
            // Lost frames are recovered by the association timeout.
            Err(e) if e.kind() == ErrorKind::ResourceExhaustion => {
                error!("failed to send association request: {}", e)
            }
            Err(e) => {
                warn!("cannot associate with {}: {}", fmt_addr(&bssid), e);
                self.stats.assoc_failures += 1;
                return self.join_failed(bssid);
            }
        }
        let timeout =
            self.timer.schedule_after(self.config.assoc_timeout, TimedEvent::AssocTimeout);
        self.state = State::Assoc { bssid, timeout };
    }

    fn send_assoc_req(&mut self, bssid: MacAddr) -> Result<(), Error> {
        let phy_mode = self.phy_mode();
        let ht_active = self.ht_active();
        let node = self.nodes.find(&bssid).ok_or(Error::NoBssNode)?;
        let protection = bss::negotiate_protection(node, &self.config)?;
        let supplicant = match &protection {
            Some((s_protection, a_protection)) => Some(new_supplicant(
                &self.config,
                &node.ssid[..],
                bssid,
                s_protection.clone(),
                a_protection.clone(),
            )?),
            None => None,
        };

        let mut capabilities = CapabilityInfo(0);
        capabilities.set_ess(true);
        capabilities.set_short_preamble(true);
        capabilities.set_privacy(protection.is_some());
        let rates = rates::to_bytes(&rates::local_rates(&self.config.rates, phy_mode));
        let wmm_qos_info = if self.config.qos_enabled && node.qos_capable { Some(0) } else { None };
        let ht_cap = if ht_active && node.ht_capable {
            Some(HtCapabilities::minimal_client())
        } else {
            None
        };
        let ssid = node.ssid.clone();
        let params = AssocReqParams {
            capabilities,
            ssid: &ssid[..],
            rates: &rates[..],
            protection: protection.as_ref().map(|(s_protection, _)| s_protection),
            wmm_qos_info,
            ht_cap,
        };
        let mut buf = vec![];
        tx::write_assoc_req_frame(
            &mut buf,
            Bssid(bssid),
            self.config.sta_addr,
            &params,
            &mut self.seq_mgr,
        )?;

        if let Some(node) = self.nodes.find_mut(&bssid) {
            node.supplicant = supplicant;
        }
        self.submit_mgmt(Some(bssid), buf, TxFlags::NONE)?;
        Ok(())
    }

    pub(super) fn on_assoc_resp(
        &mut self,
        src: MacAddr,
        status: StatusCode,
        aid: u16,
        elements: &[u8],
    ) {
        let (bssid, timeout) = match self.state {
            State::Assoc { bssid, timeout } if bssid == src => (bssid, timeout),
            _ => return self.stats.record_drop(DropReason::UnexpectedFrame),
        };
        self.timer.cancel_event(timeout);
        if status != StatusCode::SUCCESS {
            warn!("association with {} refused: {:?}", fmt_addr(&bssid), status);
            self.stats.assoc_failures += 1;
            return self.join_failed(bssid);
        }

        let resp = rx::parse_bss_elements(elements);
        let local = rates::local_rates(&self.config.rates, self.phy_mode());
        let qos_enabled = self.config.qos_enabled;
        let node = match self.nodes.find_mut(&bssid) {
            Some(node) => node,
            None => return self.join_failed(bssid),
        };
        let ap_rates = if resp.rates.is_empty() { node.rates.clone() } else { resp.rates };
        let negotiated = match rates::negotiate(&ap_rates, &local) {
            Ok(negotiated) => negotiated,
            Err(e) => {
                warn!("association with {} failed: {}", fmt_addr(&bssid), e);
                self.stats.rate_mismatches += 1;
                self.stats.assoc_failures += 1;
                self.send_deauth_frame(bssid, ReasonCode::UNSPECIFIED_REASON);
                return self.join_failed(bssid);
            }
        };
        node.state = NodeState::Assoc;
        node.aid = aid;
        node.negotiated_rates = negotiated;
        node.assoc_fails = 0;
        if qos_enabled && resp.edca.is_some() {
            node.edca = resp.edca;
        }
        let protected = node.supplicant.is_some();
        if !protected {
            node.port_valid = true;
        }
        let beacon_interval = node.beacon_interval;

        info!("associated with {} (aid {})", fmt_addr(&bssid), aid);
        self.device.assoc_done(Bssid(bssid), aid);
        let status_check = self.schedule_status_check(beacon_interval);
        let handshake_timeout = if protected {
            let timeout = self.config.handshake_timeout;
            Some(self.timer.schedule_after(timeout, TimedEvent::HandshakeTimeout))
        } else {
            self.device.set_link_status(LinkStatus::UP);
            None
        };
        self.state = State::Run(Association {
            bssid,
            lost_bss: LostBssCounter::start(beacon_interval, self.config.beacon_miss_count),
            status_check,
            handshake_timeout,
            sa_query: None,
        });
    }

    fn schedule_status_check(&mut self, beacon_interval: TimeUnit) -> EventId {
        self.timer.schedule_after(
            beacon_interval.into_duration() * ASSOCIATION_STATUS_TIMEOUT_BEACON_COUNT,
            TimedEvent::AssociationStatusCheck,
        )
    }

    /// Gives up on the BSS being joined. It stays in the cache with one more failure counted.
    fn join_failed(&mut self, bssid: MacAddr) {
        if let Some(node) = self.nodes.find_mut(&bssid) {
            node.assoc_fails += 1;
            node.reset_link(&mut self.timer);
            node.state = NodeState::Cache;
        }
        self.begin_scan();
    }

    pub(super) fn on_join_timeout(&mut self, event_id: EventId) {
        let bssid = match self.state {
            State::Auth { bssid, timeout } | State::Assoc { bssid, timeout }
                if timeout == event_id =>
            {
                bssid
            }
            _ => return,
        };
        warn!("{} did not answer in time", fmt_addr(&bssid));
        self.stats.assoc_failures += 1;
        self.join_failed(bssid);
    }

    pub(super) fn on_handshake_timeout(&mut self, event_id: EventId) {
        match &self.state {
            State::Run(association) if association.handshake_timeout == Some(event_id) => (),
            _ => return,
        }
        error!("security handshake did not complete in time");
        self.stats.handshake_failures += 1;
        self.leave_bss(Some(ReasonCode::FOURWAY_HANDSHAKE_TIMEOUT));
    }

    pub(super) fn on_status_check(&mut self, event_id: EventId) {
        let (bssid, lost) = match &mut self.state {
            State::Run(association) if association.status_check == event_id => {
                let lost = association.lost_bss.is_lost();
                if !lost {
                    let count = ASSOCIATION_STATUS_TIMEOUT_BEACON_COUNT;
                    association.lost_bss.add_beacon_interval(count);
                }
                let silence = association.lost_bss.time_without_beacon();
                (association.bssid, lost.then(|| silence))
            }
            _ => return,
        };
        if let Some(silence) = lost {
            warn!("no beacons from {} for {:?}; leaving", fmt_addr(&bssid), silence);
            self.stats.beacon_losses += 1;
            return self.leave_bss(Some(ReasonCode::LEAVING_NETWORK_DEAUTH));
        }
        let beacon_interval = self
            .nodes
            .find(&bssid)
            .map_or(TimeUnit::DEFAULT_BEACON_INTERVAL, |node| node.beacon_interval);
        let status_check = self.schedule_status_check(beacon_interval);
        if let State::Run(association) = &mut self.state {
            association.status_check = status_check;
        }
    }

    /// Ends the current association or join attempt, telling the AP if `reason` is given, and
    /// scans again.
    pub(super) fn leave_bss(&mut self, reason: Option<ReasonCode>) {
        if let Some(bssid) = self.state.bssid() {
            if let Some(reason) = reason {
                self.send_deauth_frame(bssid, reason);
            }
            info!("leaving {}", fmt_addr(&bssid));
        }
        self.cancel_state_timers();
        self.release_link();
        self.begin_scan();
    }

    /// Removes every key from the driver, forgets all nodes and takes the link down.
    pub(super) fn release_link(&mut self) {
        let has_ptk = self
            .nodes
            .addrs()
            .iter()
            .any(|addr| self.nodes.find(addr).map_or(false, |n| n.pairwise_key.is_some()));
        let mut keys = self.keys.installed();
        if has_ptk {
            keys.insert(0, (KeyType::Pairwise, PAIRWISE_KEY_ID));
        }
        for (key_type, key_id) in keys {
            if let Err(e) = self.device.delete_key(key_type, key_id) {
                warn!("failed to delete {:?} key {}: {}", key_type, key_id, e);
            }
        }
        self.keys.clear();
        self.nodes.purge_all(&mut self.timer);
        self.device.set_link_status(LinkStatus::DOWN);
    }

    pub(super) fn on_deauth(&mut self, src: MacAddr, reason: ReasonCode, disassoc: bool) {
        match self.state.bssid() {
            Some(bssid) if bssid == src => (),
            _ => return self.stats.record_drop(DropReason::UnexpectedFrame),
        }
        let action = if disassoc { "disassociated" } else { "deauthenticated" };
        if reason.is_security_failure() {
            warn!("{} by {}: {}", action, fmt_addr(&src), reason);
        } else {
            info!("{} by {}: {}", action, fmt_addr(&src), reason);
        }
        self.leave_bss(None);
    }

    pub(super) fn on_bss_sighting(
        &mut self,
        meta: &MpduMeta,
        beacon_interval: TimeUnit,
        capabilities: CapabilityInfo,
        elements: &[u8],
        rx_info: &RxInfo,
        is_beacon: bool,
    ) {
        let elements = rx::parse_bss_elements(elements);
        let sighting = BssSighting {
            channel: elements.channel.unwrap_or(self.channel),
            rssi_dbm: rx_info.rssi_dbm,
            timestamp: rx_info.timestamp,
            beacon_interval,
            capabilities,
            elements,
        };
        let bssid = meta.addr3;

        if self.state.bssid() == Some(bssid) {
            if let Some(node) = self.nodes.find_mut(&bssid) {
                if bss::update_joined(node, &sighting) {
                    debug!("EDCA parameters of {} changed", fmt_addr(&bssid));
                }
            }
            if let State::Run(association) = &mut self.state {
                if is_beacon {
                    association.lost_bss.reset();
                }
            }
            return;
        }

        let same_scan = self.nodes.seen_in_current_scan(&bssid);
        match self.nodes.alloc_or_reuse(bssid, Bssid(bssid)) {
            Ok(node) => {
                bss::merge_sighting(node, sighting, same_scan);
            }
            Err(e) => {
                debug!("not recording {}: {}", fmt_addr(&bssid), e);
                return self.stats.record_drop(DropReason::NodeTableFull);
            }
        }
        self.nodes.touch(&bssid);
    }
}

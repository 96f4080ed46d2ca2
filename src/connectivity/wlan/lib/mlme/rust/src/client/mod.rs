// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The client station: scanning, joining a BSS and moving frames once associated.
//!
//! `ClientMlme` is driven entirely from the outside. Received MPDUs enter through
//! `on_mac_frame`, outgoing Ethernet frames through `send_eth_frame`, deadlines through
//! `handle_timeout` and transmit completions through `handle_tx_complete`. Every entry point
//! runs to completion on the caller's thread; nothing is shared with the driver except what
//! `DeviceOps` hands over.
//!
//! The association moves through `Init -> Scan -> Auth -> Assoc -> Run`. Any failure after
//! `Scan` releases the link and starts scanning again; `stop` is the only way back to `Init`.

mod action;
mod bss;
mod data;
mod join;
mod lost_bss;

#[cfg(test)]
mod tests;

pub use {
    bss::{BssSighting, Rejection},
    lost_bss::LostBssCounter,
};

use {
    crate::{
        config::{Config, PhyMode},
        device::{DeviceOps, RxInfo, TxFlags, TxToken},
        error::Error,
        key::KeyStore,
        node_table::{NodeRef, NodeTable},
        rx::{self, MpduMeta, Protection},
        stats::{DropReason, Stats},
        TimedEvent,
    },
    log::{debug, trace, warn},
    std::{collections::BTreeMap, time::Duration},
    wlan_common::{
        mac::{
            self, is_multicast, Bssid, CtrlSubtype, MacAddr, MacFrame, MgmtBody, MgmtSubtype,
            ReasonCode,
        },
        sequence::SequenceManager,
        timer::{EventId, Scheduler, Timer},
    },
};

/// Beacon periods between two checks for a lost BSS.
pub const ASSOCIATION_STATUS_TIMEOUT_BEACON_COUNT: u32 = 10;
/// How long the AP gets to answer an SA Query before the association is considered gone.
pub const SA_QUERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Externally visible association state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssocState {
    Init,
    Scan,
    Auth,
    Assoc,
    Run,
}

#[derive(Debug, Clone, Copy)]
struct SaQuery {
    transaction_id: u16,
    timer: EventId,
}

#[derive(Debug)]
struct Association {
    bssid: MacAddr,
    lost_bss: LostBssCounter,
    status_check: EventId,
    /// Armed until the controlled port opens on protected networks.
    handshake_timeout: Option<EventId>,
    sa_query: Option<SaQuery>,
}

#[derive(Debug)]
enum State {
    Init,
    Scan { channel_idx: usize, dwell: EventId },
    Auth { bssid: MacAddr, timeout: EventId },
    Assoc { bssid: MacAddr, timeout: EventId },
    Run(Association),
}

impl State {
    fn assoc_state(&self) -> AssocState {
        match self {
            State::Init => AssocState::Init,
            State::Scan { .. } => AssocState::Scan,
            State::Auth { .. } => AssocState::Auth,
            State::Assoc { .. } => AssocState::Assoc,
            State::Run(_) => AssocState::Run,
        }
    }

    /// The BSS being joined or joined.
    fn bssid(&self) -> Option<MacAddr> {
        match self {
            State::Auth { bssid, .. } | State::Assoc { bssid, .. } => Some(*bssid),
            State::Run(association) => Some(association.bssid),
            State::Init | State::Scan { .. } => None,
        }
    }

    fn run_bssid(&self) -> Option<MacAddr> {
        match self {
            State::Run(association) => Some(association.bssid),
            _ => None,
        }
    }

    fn timers(&self) -> Vec<EventId> {
        match self {
            State::Init => vec![],
            State::Scan { dwell, .. } => vec![*dwell],
            State::Auth { timeout, .. } | State::Assoc { timeout, .. } => vec![*timeout],
            State::Run(association) => std::iter::once(association.status_check)
                .chain(association.handshake_timeout)
                .chain(association.sa_query.map(|q| q.timer))
                .collect(),
        }
    }
}

pub struct ClientMlme<D> {
    config: Config,
    device: D,
    timer: Timer<TimedEvent>,
    nodes: NodeTable,
    keys: KeyStore,
    stats: Stats,
    /// Sequence numbers of management frames.
    seq_mgr: SequenceManager,
    state: State,
    phy_idx: usize,
    channel: u8,
    /// Frames handed to the driver and not yet completed, with the node reference they hold.
    pending_tx: BTreeMap<TxToken, Option<NodeRef>>,
    next_tx_token: u64,
    next_dialog_token: u8,
    next_sa_query_id: u16,
}

fn ccmp_drop_reason(e: wlan_rsn::Error) -> DropReason {
    match e {
        wlan_rsn::Error::CcmpReplay(..) => DropReason::CcmpReplay,
        wlan_rsn::Error::CcmpMicFailure => DropReason::CcmpMicFailure,
        wlan_rsn::Error::CcmpMissingExtIv => DropReason::Undecryptable,
        _ => DropReason::Malformed,
    }
}

impl<D: DeviceOps> ClientMlme<D> {
    pub fn new(config: Config, device: D, scheduler: Box<dyn Scheduler>) -> Self {
        let nodes = NodeTable::new(config.node_table_capacity, config.fragment_cache_size);
        Self {
            config,
            device,
            timer: Timer::new(scheduler),
            nodes,
            keys: KeyStore::new(),
            stats: Stats::new(),
            seq_mgr: SequenceManager::new(),
            state: State::Init,
            phy_idx: 0,
            channel: 0,
            pending_tx: BTreeMap::new(),
            next_tx_token: 0,
            next_dialog_token: 1,
            next_sa_query_id: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn state(&self) -> AssocState {
        self.state.assoc_state()
    }

    /// The BSS the station is associated with.
    pub fn bssid(&self) -> Option<Bssid> {
        self.state.run_bssid().map(Bssid)
    }

    /// PHY mode used by the current scan or association.
    pub fn phy_mode(&self) -> PhyMode {
        self.config.phy_modes.get(self.phy_idx).copied().unwrap_or(PhyMode::Erp)
    }

    fn ht_active(&self) -> bool {
        self.config.ht_enabled && self.phy_mode() == PhyMode::Ht
    }

    /// Starts scanning for a BSS to join.
    pub fn start(&mut self) -> Result<(), Error> {
        if !matches!(self.state, State::Init) {
            return Err(Error::InvalidState("already started"));
        }
        if self.config.scan_channels().is_empty() {
            return Err(Error::InvalidState("no channels to scan"));
        }
        self.begin_scan();
        Ok(())
    }

    /// Leaves any BSS and returns to `Init`. A graceful stop tells the AP first.
    pub fn stop(&mut self, graceful: bool) {
        if graceful {
            if let Some(bssid) = self.state.run_bssid() {
                self.send_deauth_frame(bssid, ReasonCode::LEAVING_NETWORK_DEAUTH);
            }
        }
        self.cancel_state_timers();
        self.release_link();
        self.timer.cancel_all();
        self.state = State::Init;
    }

    /// Deauthenticates from the BSS being joined or joined and starts scanning again.
    pub fn deauthenticate(&mut self, reason: ReasonCode) -> Result<(), Error> {
        if self.state.bssid().is_none() {
            return Err(Error::InvalidState("not joined"));
        }
        self.leave_bss(Some(reason));
        Ok(())
    }

    /// Disassociates from the BSS and starts scanning again.
    pub fn disassociate(&mut self, reason: ReasonCode) -> Result<(), Error> {
        let bssid = self.state.run_bssid().ok_or(Error::InvalidState("not associated"))?;
        let sta_addr = self.config.sta_addr;
        let result = self.send_mgmt_frame(bssid, true, |buf, protected, seq_mgr| {
            crate::tx::write_disassoc_frame(buf, Bssid(bssid), sta_addr, reason, protected, seq_mgr)
        });
        if let Err(e) = result {
            warn!("failed to send disassociation to {}: {}", mac::fmt_addr(&bssid), e);
        }
        self.leave_bss(None);
        Ok(())
    }

    pub fn handle_timeout(&mut self, event_id: EventId) {
        let event = match self.timer.triggered(&event_id) {
            Some(event) => event,
            None => return trace!("ignoring cancelled timeout {:?}", event_id),
        };
        match event {
            TimedEvent::ScanDwell => self.on_scan_dwell(event_id),
            TimedEvent::AuthTimeout | TimedEvent::AssocTimeout => self.on_join_timeout(event_id),
            TimedEvent::HandshakeTimeout => self.on_handshake_timeout(event_id),
            TimedEvent::AssociationStatusCheck => self.on_status_check(event_id),
            TimedEvent::Defrag { peer, seq_num } => {
                let expired =
                    self.nodes.find_mut(&peer).map_or(false, |n| n.frag_cache.on_timeout(event_id));
                if expired {
                    debug!("fragments of {} from {} timed out", seq_num, mac::fmt_addr(&peer));
                    self.stats.fragment_timeouts += 1;
                }
            }
            TimedEvent::RxBlockAckInactive { peer, tid } => {
                self.on_rx_ba_inactive(event_id, peer, tid)
            }
            TimedEvent::TxBlockAckTimeout { peer, tid } => {
                self.on_tx_ba_timeout(event_id, peer, tid)
            }
            TimedEvent::SaQueryTimeout { transaction_id } => {
                self.on_sa_query_timeout(event_id, transaction_id)
            }
        }
    }

    /// Releases the node reference held by a completed transmission.
    pub fn handle_tx_complete(&mut self, token: TxToken) {
        match self.pending_tx.remove(&token) {
            Some(Some(node_ref)) => self.nodes.release(node_ref),
            Some(None) => (),
            None => debug!("completion for unknown frame {:?}", token),
        }
    }

    /// Entry point of every MPDU received by the driver, without FCS.
    pub fn on_mac_frame(&mut self, frame: &[u8], rx_info: RxInfo) {
        self.stats.rx_frames += 1;
        if self.config.monitor_mode {
            self.device.deliver_monitor_frame(frame, &rx_info);
            return;
        }

        let meta = match MacFrame::parse(frame) {
            None | Some(MacFrame::Unsupported { .. }) => {
                return self.stats.record_drop(DropReason::Malformed)
            }
            Some(MacFrame::Ctrl { frame_ctrl, .. }) => {
                if frame_ctrl.ctrl_subtype() == CtrlSubtype::BLOCK_ACK_REQ {
                    self.on_block_ack_req(frame);
                }
                return;
            }
            Some(_) => match rx::parse_meta(frame) {
                Some(meta) => meta,
                None => return self.stats.record_drop(DropReason::Malformed),
            },
        };

        if meta.addr1 != self.config.sta_addr && !is_multicast(&meta.addr1) {
            return self.stats.record_drop(DropReason::NotForUs);
        }
        if self.is_duplicate(&meta, &rx_info) {
            trace!("duplicate of {} from {}", meta.seq_ctrl.seq_num(), mac::fmt_addr(&meta.addr2));
            self.stats.rx_duplicates += 1;
            return;
        }

        if meta.frame_ctrl.is_data() {
            self.on_data_frame(frame, &meta, rx_info);
        } else {
            self.on_mgmt_frame(frame, &meta, rx_info);
        }
    }

    /// Updates the transmitter's signal and runs duplicate detection. Frames of the BSS being
    /// joined create a node for unknown transmitters.
    fn is_duplicate(&mut self, meta: &MpduMeta, rx_info: &RxInfo) -> bool {
        let fc = meta.frame_ctrl;
        let node = match self.state.bssid() {
            Some(bssid) if meta.addr2 == bssid || (fc.is_mgmt() && meta.addr3 == bssid) => {
                self.nodes.find_or_fake(meta.addr2, &bssid).ok()
            }
            _ => self.nodes.find_mut(&meta.addr2),
        };
        let node = match node {
            Some(node) => node,
            None => return false,
        };
        let subtype = fc.mgmt_subtype();
        let sighting = fc.is_mgmt()
            && (subtype == MgmtSubtype::BEACON || subtype == MgmtSubtype::PROBE_RESP);
        // Sightings merge their signal in themselves.
        if !sighting {
            node.rssi_dbm = rx_info.rssi_dbm;
            node.last_seen = rx_info.timestamp;
        }
        node.is_duplicate(fc, meta.seq_ctrl, meta.tid)
    }

    fn on_mgmt_frame(&mut self, frame: &[u8], meta: &MpduMeta, rx_info: RxInfo) {
        let subtype = meta.frame_ctrl.mgmt_subtype();
        let mut owned: Option<Vec<u8>> = None;
        if meta.frame_ctrl.protected() {
            match self.decrypt_mgmt(meta, frame, &rx_info) {
                Ok(plain) => owned = Some(plain),
                Err(reason) => return self.stats.record_drop(reason),
            }
        } else if !is_multicast(&meta.addr1)
            && self.nodes.find(&meta.addr2).map_or(false, |n| n.mfp_active())
            && mac::is_robust_mgmt_frame(subtype, frame.get(meta.hdr_len..).unwrap_or(&[]))
        {
            self.stats.record_drop(DropReason::UnprotectedRobustMgmt);
            if subtype == MgmtSubtype::DEAUTH || subtype == MgmtSubtype::DISASSOC {
                self.start_sa_query();
            }
            return;
        }

        if meta.frame_ctrl.more_frags() || meta.seq_ctrl.frag_num() != 0 {
            let current = owned.as_deref().unwrap_or(frame);
            match self.defragment(meta.addr2, current) {
                Some(complete) => owned = Some(complete),
                None => return,
            }
        }
        let frame = owned.as_deref().unwrap_or(frame);

        let body = match MacFrame::parse(frame) {
            Some(MacFrame::Mgmt { body, .. }) => body,
            _ => return self.stats.record_drop(DropReason::Malformed),
        };
        match MgmtBody::parse(subtype, body) {
            Some(MgmtBody::Beacon { bcn_hdr, elements }) => self.on_bss_sighting(
                meta,
                { bcn_hdr.beacon_interval },
                { bcn_hdr.capabilities },
                elements,
                &rx_info,
                true,
            ),
            Some(MgmtBody::ProbeResp { probe_resp_hdr, elements }) => self.on_bss_sighting(
                meta,
                { probe_resp_hdr.beacon_interval },
                { probe_resp_hdr.capabilities },
                elements,
                &rx_info,
                false,
            ),
            Some(MgmtBody::Authentication { auth_hdr, .. }) => {
                self.on_auth_frame(meta.addr2, *auth_hdr)
            }
            Some(MgmtBody::AssociationResp { assoc_resp_hdr, elements }) => self.on_assoc_resp(
                meta.addr2,
                { assoc_resp_hdr.status_code },
                assoc_resp_hdr.association_id(),
                elements,
            ),
            Some(MgmtBody::Deauthentication { deauth_hdr, .. }) => {
                self.on_deauth(meta.addr2, { deauth_hdr.reason_code }, false)
            }
            Some(MgmtBody::Disassociation { disassoc_hdr, .. }) => {
                self.on_deauth(meta.addr2, { disassoc_hdr.reason_code }, true)
            }
            Some(MgmtBody::Action { action_hdr, elements }) => {
                self.on_action_frame(meta.addr2, { action_hdr.action }, elements)
            }
            Some(MgmtBody::Unsupported { subtype }) => {
                trace!("ignoring management frame subtype {:?}", subtype)
            }
            None => self.stats.record_drop(DropReason::Malformed),
        }
    }

    /// Group addressed management frames are protected with BIP, which the driver verifies.
    /// Only unicast frames under the transmitter's pairwise key arrive here encrypted.
    fn decrypt_mgmt(
        &mut self,
        meta: &MpduMeta,
        frame: &[u8],
        rx_info: &RxInfo,
    ) -> Result<Vec<u8>, DropReason> {
        if is_multicast(&meta.addr1) {
            return Err(DropReason::Undecryptable);
        }
        match rx::protection(meta, frame) {
            Some(Protection::ExtIv { .. }) => (),
            Some(Protection::Wep) => return Err(DropReason::Undecryptable),
            None => return Err(DropReason::Malformed),
        }
        let key = self
            .nodes
            .find_mut(&meta.addr2)
            .and_then(|n| n.pairwise_key.as_mut())
            .ok_or(DropReason::NoKey)?;
        let plain =
            if rx_info.hw_decrypted { key.strip_hw_decrypted(frame) } else { key.decrypt(frame) };
        plain.map_err(ccmp_drop_reason)
    }

    /// Hands a frame to the driver. The node `peer`, if any, stays referenced until the
    /// transmission completes.
    fn submit(
        &mut self,
        peer: Option<MacAddr>,
        frame: Vec<u8>,
        flags: TxFlags,
    ) -> Result<TxToken, Error> {
        let token = TxToken(self.next_tx_token);
        self.next_tx_token += 1;
        let node_ref = peer.and_then(|addr| self.nodes.acquire(&addr));
        match self.device.submit_tx(frame, token, flags) {
            Ok(()) => {
                self.pending_tx.insert(token, node_ref);
                Ok(token)
            }
            Err(e) => {
                if let Some(node_ref) = node_ref {
                    self.nodes.release(node_ref);
                }
                Err(e.into())
            }
        }
    }

    fn submit_mgmt(
        &mut self,
        peer: Option<MacAddr>,
        frame: Vec<u8>,
        flags: TxFlags,
    ) -> Result<TxToken, Error> {
        let result = self.submit(peer, frame, flags);
        match &result {
            Ok(_) => self.stats.tx_mgmt_frames += 1,
            Err(_) => self.stats.mgmt_tx_failures += 1,
        }
        result
    }

    /// Builds and sends a management frame to `bssid`. Robust frames are protected with the
    /// pairwise key once management frame protection is in effect; `write` learns whether to
    /// set the Protected bit.
    fn send_mgmt_frame<F>(
        &mut self,
        bssid: MacAddr,
        robust: bool,
        write: F,
    ) -> Result<TxToken, Error>
    where
        F: FnOnce(&mut Vec<u8>, bool, &mut SequenceManager) -> Result<(), Error>,
    {
        let protect = robust && self.nodes.find(&bssid).map_or(false, |n| n.mfp_active());
        let mut buf = vec![];
        write(&mut buf, protect, &mut self.seq_mgr)?;
        let (frame, flags) = if protect {
            let key = self
                .nodes
                .find_mut(&bssid)
                .and_then(|n| n.pairwise_key.as_mut())
                .ok_or(Error::NoBssNode)?;
            (key.encrypt(&buf[..])?, TxFlags::PROTECTED)
        } else {
            (buf, TxFlags::NONE)
        };
        self.submit_mgmt(Some(bssid), frame, flags)
    }

    fn send_deauth_frame(&mut self, bssid: MacAddr, reason: ReasonCode) {
        let sta_addr = self.config.sta_addr;
        let result = self.send_mgmt_frame(bssid, true, |buf, protected, seq_mgr| {
            crate::tx::write_deauth_frame(buf, Bssid(bssid), sta_addr, reason, protected, seq_mgr)
        });
        if let Err(e) = result {
            warn!("failed to send deauthentication to {}: {}", mac::fmt_addr(&bssid), e);
        }
    }

    fn cancel_state_timers(&mut self) {
        for event_id in self.state.timers() {
            self.timer.cancel_event(event_id);
        }
    }

    fn set_channel(&mut self, channel: u8) {
        if self.channel != channel {
            trace!("switching to channel {}", channel);
            self.channel = channel;
            self.device.set_channel(channel);
        }
    }

    fn next_dialog_token(&mut self) -> u8 {
        let token = self.next_dialog_token;
        // Zero is reserved for frames not using a dialog token.
        self.next_dialog_token = std::cmp::max(self.next_dialog_token.wrapping_add(1), 1);
        token
    }
}

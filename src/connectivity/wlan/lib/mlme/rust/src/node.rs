// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        block_ack::{RxBlockAck, TxBlockAck},
        key::PairwiseKey,
        reassembly::FragmentCache,
        TimedEvent,
    },
    wlan_common::{
        ie::{rsn::rsne, EdcaParams, ErpInfo, SupportedRate},
        mac::{Bssid, CapabilityInfo, FrameControl, MacAddr, SequenceControl, NUM_TIDS},
        sequence::{SequenceManager, NON_QOS_TID},
        time::TimeUnit,
        timer::{EventId, Timer},
    },
    wlan_rsn::{NegotiatedProtection, Supplicant},
};

/// Where a node is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Seen in a beacon or probe response only.
    Cache,
    /// Selected as the BSS to join.
    Bss,
    Auth,
    Assoc,
    /// Removed from the table but still referenced. Reclaimed once the last reference is
    /// released.
    Collect,
}

/// A peer station or access point.
#[derive(Debug)]
pub struct Node {
    pub addr: MacAddr,
    pub bssid: Bssid,
    pub state: NodeState,
    pub ssid: Vec<u8>,
    pub channel: u8,
    pub rssi_dbm: i8,
    /// Receive timestamp of the last frame seen from the node.
    pub last_seen: u64,
    pub beacon_interval: TimeUnit,
    pub capabilities: CapabilityInfo,
    /// Rates as advertised by the peer.
    pub rates: Vec<SupportedRate>,
    pub negotiated_rates: Vec<SupportedRate>,
    /// Complete RSN element of the peer.
    pub rsne: Option<Vec<u8>>,
    /// Body of the peer's WPA1 vendor element, following the vendor header.
    pub wpa_ie: Option<Vec<u8>>,
    pub ht_capable: bool,
    pub qos_capable: bool,
    pub edca: Option<EdcaParams>,
    pub erp: Option<ErpInfo>,
    pub aid: u16,
    /// Failed association attempts. Nodes reaching the configured limit are no longer
    /// candidates.
    pub assoc_fails: u32,
    /// Set on nodes cloned from the BSS node for a previously unknown transmitter.
    pub newly_associated: bool,

    pub seq_mgr: SequenceManager,
    rx_seq: [Option<SequenceControl>; NUM_TIDS + 1],
    pub frag_cache: FragmentCache,
    pub rx_ba: [Option<RxBlockAck>; NUM_TIDS],
    pub tx_ba: [TxBlockAck; NUM_TIDS],

    pub supplicant: Option<Supplicant>,
    pub pairwise_key: Option<PairwiseKey>,
    /// Controlled port state. Always open on networks without protection once associated.
    pub port_valid: bool,
}

impl Node {
    pub fn new(addr: MacAddr, bssid: Bssid, fragment_cache_size: usize) -> Self {
        Self {
            addr,
            bssid,
            state: NodeState::Cache,
            ssid: vec![],
            channel: 0,
            rssi_dbm: 0,
            last_seen: 0,
            beacon_interval: TimeUnit::DEFAULT_BEACON_INTERVAL,
            capabilities: CapabilityInfo(0),
            rates: vec![],
            negotiated_rates: vec![],
            rsne: None,
            wpa_ie: None,
            ht_capable: false,
            qos_capable: false,
            edca: None,
            erp: None,
            aid: 0,
            assoc_fails: 0,
            newly_associated: false,
            seq_mgr: SequenceManager::new(),
            rx_seq: [None; NUM_TIDS + 1],
            frag_cache: FragmentCache::new(fragment_cache_size),
            rx_ba: Default::default(),
            tx_ba: Default::default(),
            supplicant: None,
            pairwise_key: None,
            port_valid: false,
        }
    }

    /// A copy of `self` for another transmitter of the same BSS. Only identity and rate
    /// information is inherited; per-link state starts fresh.
    pub fn clone_for(&self, addr: MacAddr, fragment_cache_size: usize) -> Self {
        Self {
            ssid: self.ssid.clone(),
            channel: self.channel,
            beacon_interval: self.beacon_interval,
            capabilities: self.capabilities,
            rates: self.rates.clone(),
            negotiated_rates: self.negotiated_rates.clone(),
            ht_capable: self.ht_capable,
            qos_capable: self.qos_capable,
            state: NodeState::Assoc,
            newly_associated: true,
            ..Node::new(addr, self.bssid, fragment_cache_size)
        }
    }

    pub fn is_protected(&self) -> bool {
        self.capabilities.privacy()
    }

    pub fn negotiated_protection(&self) -> Option<&NegotiatedProtection> {
        self.supplicant.as_ref().map(|s| s.negotiated_protection())
    }

    /// True once management frame protection was negotiated and the pairwise key is in place.
    pub fn mfp_active(&self) -> bool {
        self.pairwise_key.is_some()
            && self.negotiated_protection().map_or(false, |p| p.mfp_enabled())
    }

    /// True if the peer's RSNE advertises Protected Block Ack.
    pub fn protected_block_ack(&self) -> bool {
        self.rsne
            .as_ref()
            .and_then(|bytes| rsne::from_bytes(&bytes[..]).ok())
            .map_or(false, |rsne| rsne.protected_block_ack())
    }

    /// Duplicate detection as of IEEE Std 802.11-2016, 10.3.2.14.3: a retransmission repeating
    /// the last sequence control seen for the same TID is a duplicate. Records the frame
    /// otherwise.
    pub fn is_duplicate(
        &mut self,
        fc: FrameControl,
        seq_ctrl: SequenceControl,
        tid: Option<u8>,
    ) -> bool {
        let slot = match tid {
            Some(tid) => tid as usize % NUM_TIDS,
            None => NON_QOS_TID,
        };
        if fc.retry() && self.rx_seq[slot] == Some(seq_ctrl) {
            return true;
        }
        self.rx_seq[slot] = Some(seq_ctrl);
        false
    }

    /// Drops fragment caches and BlockAck agreements and cancels their deadlines. Frames
    /// still buffered are discarded.
    pub fn release_caches(&mut self, timer: &mut Timer<TimedEvent>) {
        for event_id in self.frag_cache.clear() {
            timer.cancel_event(event_id);
        }
        for agreement in self.rx_ba.iter_mut() {
            if let Some(RxBlockAck { timer: Some(event_id), .. }) = agreement.take() {
                timer.cancel_event(event_id);
            }
        }
        for agreement in self.tx_ba.iter_mut() {
            if let Some(event_id) = agreement.timer() {
                timer.cancel_event(event_id);
            }
            *agreement = TxBlockAck::Init;
        }
    }

    /// Forgets the association: keys, handshake, port and per-TID state.
    pub fn reset_link(&mut self, timer: &mut Timer<TimedEvent>) {
        self.release_caches(timer);
        self.rx_seq = [None; NUM_TIDS + 1];
        self.supplicant = None;
        self.pairwise_key = None;
        self.port_valid = false;
        self.aid = 0;
        self.negotiated_rates.clear();
    }

    pub fn armed_timers(&self) -> Vec<EventId> {
        let rx = self.rx_ba.iter().filter_map(|a| a.as_ref().and_then(|a| a.timer));
        let tx = self.tx_ba.iter().filter_map(|a| a.timer());
        rx.chain(tx).collect()
    }
}

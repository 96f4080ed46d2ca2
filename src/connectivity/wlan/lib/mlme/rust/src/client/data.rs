// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{ccmp_drop_reason, ClientMlme, State},
    crate::{
        block_ack::TxBlockAck,
        device::{DeviceOps, KeyConfig, LinkStatus, RxInfo, TxFlags, TxToken},
        error::Error,
        key::PairwiseKey,
        qos,
        reassembly::Defrag,
        rx::{self, MpduMeta, Protection},
        stats::DropReason,
        tx, TimedEvent,
    },
    log::{debug, error, info, trace, warn},
    std::time::Duration,
    wlan_common::{
        mac::{
            fmt_addr, is_multicast, Bssid, EthernetFrame, MacAddr, ReasonCode, ETHER_TYPE_EAPOL,
            NUM_TIDS,
        },
        timer::EventId,
    },
    wlan_rsn::{
        key::{ptk::Ptk, Tk},
        Key, SecAssocStatus, SecAssocUpdate, UpdateSink,
    },
};

impl<D: DeviceOps> ClientMlme<D> {
    /// Data frames are only accepted from the joined BSS while associated. QoS data of a TID
    /// with a BlockAck agreement passes the reorder window first.
    pub(super) fn on_data_frame(&mut self, frame: &[u8], meta: &MpduMeta, rx_info: RxInfo) {
        let bssid = match self.state.run_bssid() {
            Some(bssid) => bssid,
            None => return self.stats.record_drop(DropReason::UnexpectedFrame),
        };
        let fc = meta.frame_ctrl;
        if !fc.from_ds() || fc.to_ds() || meta.addr2 != bssid {
            return self.stats.record_drop(DropReason::NotFromBss);
        }
        // Our own group addressed frames relayed by the AP.
        if is_multicast(&meta.addr1) && meta.addr3 == self.config.sta_addr {
            return trace!("dropping own multicast frame");
        }

        let reorder = match meta.tid {
            Some(tid)
                if !fc.data_subtype().null()
                    && !is_multicast(&meta.addr1)
                    && !fc.more_frags()
                    && meta.seq_ctrl.frag_num() == 0 =>
            {
                self.nodes
                    .find(&bssid)
                    .map_or(false, |n| n.rx_ba[tid as usize % NUM_TIDS].is_some())
            }
            _ => false,
        };
        if reorder {
            self.reorder_mpdu(bssid, meta, frame, rx_info);
        } else {
            self.on_data_mpdu(bssid, frame, rx_info);
        }
    }

    /// Decrypts, reassembles and delivers one MPDU in receive order.
    pub(super) fn on_data_mpdu(&mut self, bssid: MacAddr, frame: &[u8], rx_info: RxInfo) {
        let meta = match rx::parse_meta(frame) {
            Some(meta) => meta,
            None => return self.stats.record_drop(DropReason::Malformed),
        };
        let (plain, eapol_only) = match self.unprotect_data(&meta, frame, &rx_info) {
            Ok(unprotected) => unprotected,
            Err(reason) => return self.stats.record_drop(reason),
        };
        let plain = if meta.frame_ctrl.more_frags() || meta.seq_ctrl.frag_num() != 0 {
            match self.defragment(meta.addr2, &plain[..]) {
                Some(complete) => complete,
                None => return,
            }
        } else {
            plain
        };
        let msdus = match rx::data_to_msdus(&plain[..]) {
            Ok(msdus) => msdus,
            Err(reason) => return self.stats.record_drop(reason),
        };

        for msdu in msdus {
            if msdu.is_eapol() {
                self.on_eapol_frame(bssid, msdu.payload());
                // A failed handshake ends the association.
                if self.state.run_bssid() != Some(bssid) {
                    return;
                }
                continue;
            }
            if eapol_only {
                self.stats.record_drop(DropReason::Unprotected);
                continue;
            }
            if !self.nodes.find(&bssid).map_or(false, |n| n.port_valid) {
                self.stats.record_drop(DropReason::PortNotValid);
                continue;
            }
            self.device.deliver_eth_frame(&msdu.eth_frame[..]);
        }
    }

    /// Returns the plaintext MPDU and whether only EAPOL may be taken from it, which is the
    /// case for unprotected frames once a pairwise key is in place.
    fn unprotect_data(
        &mut self,
        meta: &MpduMeta,
        frame: &[u8],
        rx_info: &RxInfo,
    ) -> Result<(Vec<u8>, bool), DropReason> {
        if !meta.frame_ctrl.protected() {
            let keyed = self.nodes.find(&meta.addr2).map_or(false, |n| n.pairwise_key.is_some());
            return Ok((frame.to_vec(), keyed));
        }
        let key_id = match rx::protection(meta, frame) {
            Some(Protection::ExtIv { key_id }) => key_id,
            Some(Protection::Wep) => return Err(DropReason::Undecryptable),
            None => return Err(DropReason::Malformed),
        };
        let plain = if is_multicast(&meta.addr1) {
            let key = self.keys.gtk_mut(key_id).ok_or(DropReason::NoKey)?;
            if rx_info.hw_decrypted {
                key.strip_hw_decrypted(frame)
            } else {
                key.decrypt(frame)
            }
        } else {
            let key = self
                .nodes
                .find_mut(&meta.addr2)
                .and_then(|n| n.pairwise_key.as_mut())
                .ok_or(DropReason::NoKey)?;
            if rx_info.hw_decrypted {
                key.strip_hw_decrypted(frame)
            } else {
                key.decrypt(frame)
            }
        };
        plain.map(|plain| (plain, false)).map_err(ccmp_drop_reason)
    }

    /// Feeds a plaintext fragment to the transmitter's fragment cache. Returns the complete
    /// MPDU once the last fragment arrived.
    pub(super) fn defragment(&mut self, peer: MacAddr, mpdu: &[u8]) -> Option<Vec<u8>> {
        let timeout = self.config.defrag_timeout;
        let node = match self.nodes.find_mut(&peer) {
            Some(node) => node,
            None => {
                self.stats.record_drop(DropReason::UnexpectedFrame);
                return None;
            }
        };
        match node.frag_cache.add(&mut self.timer, peer, timeout, mpdu) {
            Defrag::Complete(frame) => Some(frame),
            Defrag::Pending => None,
            Defrag::Discarded => {
                self.stats.record_drop(DropReason::FragmentOutOfOrder);
                None
            }
        }
    }

    fn on_eapol_frame(&mut self, bssid: MacAddr, body: &[u8]) {
        let mut updates = UpdateSink::default();
        let result = match self.nodes.find_mut(&bssid).and_then(|n| n.supplicant.as_mut()) {
            Some(supplicant) => supplicant.on_eapol_frame(&mut updates, body),
            None => return self.stats.record_drop(DropReason::EapolRejected),
        };
        if let Err(e) = result {
            self.stats.record_drop(match e {
                wlan_rsn::Error::MicVerificationFailed => DropReason::EapolMicFailure,
                _ => DropReason::EapolRejected,
            });
            match e.deauth_reason() {
                Some(reason) => {
                    error!("security handshake with {} failed: {}", fmt_addr(&bssid), e);
                    self.stats.handshake_failures += 1;
                    self.leave_bss(Some(reason));
                }
                None => warn!("rejected EAPOL frame from {}: {}", fmt_addr(&bssid), e),
            }
            return;
        }
        self.apply_updates(bssid, updates);
    }

    /// Applies the outcome of one EAPOL frame in order. Frames queued before the new pairwise
    /// key is enabled for transmission still go out unprotected, so message 4 of the 4-Way
    /// Handshake leaves in the clear.
    fn apply_updates(&mut self, bssid: MacAddr, updates: UpdateSink) {
        let mut new_ptk = None;
        let mut established = false;
        for update in updates {
            match update {
                SecAssocUpdate::TxEapolKeyFrame(frame) => {
                    if let Err(e) = self.send_eapol_frame(bssid, &frame.to_bytes(false)[..]) {
                        error!("failed to send EAPOL frame: {}", e);
                    }
                }
                SecAssocUpdate::Key(Key::Ptk(ptk)) => match self.install_ptk(bssid, &ptk) {
                    Ok(key) => new_ptk = Some(key),
                    Err(e) => {
                        error!("failed to install pairwise key: {}", e);
                        self.stats.handshake_failures += 1;
                        return self.leave_bss(Some(ReasonCode::LEAVING_NETWORK_DEAUTH));
                    }
                },
                SecAssocUpdate::Key(Key::Gtk(gtk)) => {
                    let config = self.keys.install_gtk(&gtk);
                    self.install_group_key(config);
                }
                SecAssocUpdate::Key(Key::Igtk(igtk)) => {
                    let config = self.keys.install_igtk(&igtk);
                    self.install_group_key(config);
                }
                // The PSK is the PMK; nothing to cache.
                SecAssocUpdate::Key(Key::Pmk(_)) => (),
                SecAssocUpdate::Status(SecAssocStatus::EssSaEstablished) => established = true,
            }
        }

        if let Some(mut key) = new_ptk {
            key.enable_tx();
            if let Some(node) = self.nodes.find_mut(&bssid) {
                node.pairwise_key = Some(key);
            }
        }
        if established {
            self.open_port(bssid);
        }
    }

    fn install_ptk(&mut self, bssid: MacAddr, ptk: &Ptk) -> Result<PairwiseKey, Error> {
        let key = PairwiseKey::new(ptk)?;
        self.device.install_key(&PairwiseKey::key_config(ptk, bssid))?;
        debug!("installed pairwise key of {} bytes", ptk.tk().len());
        Ok(key)
    }

    fn install_group_key(&mut self, config: Result<KeyConfig, Error>) {
        let result = match config {
            Ok(config) => self.device.install_key(&config).map_err(Error::from),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!("failed to install group key: {}", e);
        }
    }

    fn open_port(&mut self, bssid: MacAddr) {
        match self.nodes.find_mut(&bssid) {
            Some(node) if !node.port_valid => node.port_valid = true,
            _ => return,
        }
        if let State::Run(association) = &mut self.state {
            if let Some(timeout) = association.handshake_timeout.take() {
                self.timer.cancel_event(timeout);
            }
        }
        info!("controlled port of {} open", fmt_addr(&bssid));
        self.device.set_link_status(LinkStatus::UP);
    }

    /// Sends an Ethernet II frame from the network stack to the joined BSS. Only EAPOL passes
    /// while the controlled port is closed.
    pub fn send_eth_frame(&mut self, frame: &[u8]) -> Result<TxToken, Error> {
        let bssid = self.state.run_bssid().ok_or(Error::InvalidState("not associated"))?;
        let eth = EthernetFrame::parse(frame).ok_or(Error::MalformedFrame("short Ethernet frame"))?;
        let ether_type = eth.ether_type();
        let is_eapol = ether_type == ETHER_TYPE_EAPOL;
        let node = self.nodes.find(&bssid).ok_or(Error::NoBssNode)?;
        if !is_eapol && !node.port_valid {
            debug!("controlled port closed; dropping outgoing frame");
            return Err(Error::PortNotValid);
        }
        let tid = if self.config.qos_enabled && node.qos_capable {
            Some(qos::classify(&eth, self.config.dscp_classification))
        } else {
            None
        };
        let flags = if is_eapol { TxFlags::FAVOR_RELIABILITY } else { TxFlags::NONE };
        self.send_data_frame(bssid, eth.hdr.da, tid, ether_type, &eth.body[..], flags)
    }

    fn send_eapol_frame(&mut self, bssid: MacAddr, body: &[u8]) -> Result<TxToken, Error> {
        self.send_data_frame(bssid, bssid, None, ETHER_TYPE_EAPOL, body, TxFlags::FAVOR_RELIABILITY)
    }

    fn send_data_frame(
        &mut self,
        bssid: MacAddr,
        dst: MacAddr,
        tid: Option<u8>,
        ether_type: u16,
        payload: &[u8],
        flags: TxFlags,
    ) -> Result<TxToken, Error> {
        let sta_addr = self.config.sta_addr;
        let node = self.nodes.find_mut(&bssid).ok_or(Error::NoBssNode)?;
        let protect = node.pairwise_key.as_ref().map_or(false, |key| key.tx_enabled());
        let mut buf = vec![];
        tx::write_data_frame(
            &mut buf,
            &mut node.seq_mgr,
            Bssid(bssid),
            sta_addr,
            dst,
            protect,
            tid,
            ether_type,
            payload,
        )?;
        let mut flags = flags;
        let frame = match node.pairwise_key.as_mut() {
            Some(key) if protect => {
                flags = flags.with(TxFlags::PROTECTED);
                key.encrypt(&buf[..])?
            }
            _ => buf,
        };
        if tid.is_some() {
            flags = flags.with(TxFlags::QOS);
        }
        let rearm = tid.and_then(|tid| match node.tx_ba[tid as usize % NUM_TIDS] {
            TxBlockAck::Agreed { timeout: Some(timeout), timer, .. } => Some((tid, timeout, timer)),
            _ => None,
        });
        if let Some((tid, timeout, old)) = rearm {
            self.rearm_tx_ba(bssid, tid, timeout, old);
        }

        match self.submit(Some(bssid), frame, flags) {
            Ok(token) => {
                self.stats.tx_data_frames += 1;
                Ok(token)
            }
            Err(e) => {
                self.stats.tx_data_failures += 1;
                Err(e)
            }
        }
    }

    fn rearm_tx_ba(
        &mut self,
        bssid: MacAddr,
        tid: u8,
        timeout: Duration,
        old: Option<EventId>,
    ) {
        if let Some(old) = old {
            self.timer.cancel_event(old);
        }
        let event =
            self.timer.schedule_after(timeout, TimedEvent::TxBlockAckTimeout { peer: bssid, tid });
        if let Some(node) = self.nodes.find_mut(&bssid) {
            if let TxBlockAck::Agreed { timer, .. } = &mut node.tx_ba[tid as usize % NUM_TIDS] {
                *timer = Some(event);
            }
        }
    }
}

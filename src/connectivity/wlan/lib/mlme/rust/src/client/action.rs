// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Action frames of an association: BlockAck agreements in both directions and the SA Query
//! procedure protecting against forged deauthentication.

use {
    super::{ClientMlme, SaQuery, State, SA_QUERY_TIMEOUT},
    crate::{
        block_ack::{self, BufferedMpdu, RxBlockAck, TxBlockAck, ADDBA_RESPONSE_TIMEOUT},
        device::{DeviceOps, RxInfo},
        error::Error,
        reassembly::ReorderError,
        rx::MpduMeta,
        stats::DropReason,
        tx, TimedEvent,
    },
    log::{debug, error, info, trace, warn},
    wlan_common::{
        buffer_reader::BufferReader,
        mac::{
            fmt_addr, ActionCategory, BlockAckAction, BlockAckReq, Bssid, MacAddr, ReasonCode,
            SaQueryAction, SaQueryHdr, StatusCode, NUM_TIDS,
        },
        time::TimeUnit,
        timer::{EventId, Timer},
    },
};

/// BlockAck agreements are only set up for the eight user priorities.
const MAX_BLOCK_ACK_TID: u8 = 7;

/// Restarts the inactivity deadline of a recipient agreement, if it negotiated one.
fn rearm_rx_ba(
    timer: &mut Timer<TimedEvent>,
    agreement: &mut RxBlockAck,
    peer: MacAddr,
    tid: u8,
) {
    if let Some(event_id) = agreement.timer.take() {
        timer.cancel_event(event_id);
    }
    if let Some(timeout) = agreement.timeout {
        agreement.timer =
            Some(timer.schedule_after(timeout, TimedEvent::RxBlockAckInactive { peer, tid }));
    }
}

impl<D: DeviceOps> ClientMlme<D> {
    /// `body` follows the category byte.
    pub(super) fn on_action_frame(&mut self, src: MacAddr, category: ActionCategory, body: &[u8]) {
        match self.state.run_bssid() {
            Some(bssid) if bssid == src => (),
            _ => return self.stats.record_drop(DropReason::UnexpectedFrame),
        }
        if category == ActionCategory::BLOCK_ACK {
            match body.first().map(|action| BlockAckAction(*action)) {
                Some(BlockAckAction::ADDBA_REQUEST) => self.on_addba_req(src, body),
                Some(BlockAckAction::ADDBA_RESPONSE) => self.on_addba_resp(src, body),
                Some(BlockAckAction::DELBA) => self.on_delba(src, body),
                _ => self.stats.record_drop(DropReason::Malformed),
            }
        } else if category == ActionCategory::SA_QUERY {
            self.on_sa_query(src, body);
        } else {
            trace!("ignoring action frame of category {:?}", category);
        }
    }

    fn on_addba_req(&mut self, src: MacAddr, body: &[u8]) {
        let req = match block_ack::read_addba_req_hdr(body) {
            Ok(req) => *req,
            Err(e) => {
                debug!("{}", e);
                return self.stats.record_drop(DropReason::Malformed);
            }
        };
        let tid = { req.parameters }.tid();
        let dialog_token = req.dialog_token;
        let timeout = { req.timeout };
        let sta_addr = self.config.sta_addr;

        // Reordering under a BlockAck agreement needs HT on both sides.
        let peer_ht = self.nodes.find(&src).map_or(false, |node| node.ht_capable);
        if !self.config.qos_enabled || !self.ht_active() || !peer_ht || tid > MAX_BLOCK_ACK_TID {
            info!("refusing BlockAck agreement for TID {}", tid);
            let params = { req.parameters };
            let result = self.send_mgmt_frame(src, true, |buf, protected, seq_mgr| {
                tx::write_addba_resp_frame(
                    buf,
                    Bssid(src),
                    sta_addr,
                    dialog_token,
                    StatusCode::REFUSED_REASON_UNSPECIFIED,
                    params,
                    timeout,
                    protected,
                    seq_mgr,
                )
            });
            if let Err(e) = result {
                error!("failed to send ADDBA response: {}", e);
            }
            return;
        }

        let mut agreement = RxBlockAck::from_addba_req(&req, self.config.ba_window_size);
        rearm_rx_ba(&mut self.timer, &mut agreement, src, tid);
        let params = agreement.resp_parameters(tid);
        let winsize = agreement.window.winsize();
        let mut released = vec![];
        match self.nodes.find_mut(&src) {
            Some(node) => {
                // A new request replaces the agreement of the TID.
                if let Some(mut old) = node.rx_ba[tid as usize].replace(agreement) {
                    if let Some(event_id) = old.timer {
                        self.timer.cancel_event(event_id);
                    }
                    released = old.window.flush();
                }
            }
            None => return self.stats.record_drop(DropReason::UnexpectedFrame),
        }

        let result = self.send_mgmt_frame(src, true, |buf, protected, seq_mgr| {
            tx::write_addba_resp_frame(
                buf,
                Bssid(src),
                sta_addr,
                dialog_token,
                StatusCode::SUCCESS,
                params,
                timeout,
                protected,
                seq_mgr,
            )
        });
        if let Err(e) = result {
            error!("failed to send ADDBA response: {}", e);
        }
        info!("BlockAck agreement for TID {} with {} (window {})", tid, fmt_addr(&src), winsize);
        self.process_released(src, released);
    }

    fn on_addba_resp(&mut self, src: MacAddr, body: &[u8]) {
        let dialog_token = match body.get(1) {
            Some(token) => *token,
            None => return self.stats.record_drop(DropReason::Malformed),
        };
        let resp = match block_ack::read_addba_resp_hdr(dialog_token, body) {
            Ok(resp) => *resp,
            Err(e) => {
                debug!("{}", e);
                return self.stats.record_drop(DropReason::Malformed);
            }
        };
        let node = match self.nodes.find_mut(&src) {
            Some(node) => node,
            None => return self.stats.record_drop(DropReason::UnexpectedFrame),
        };
        let tid = node.tx_ba.iter().position(|agreement| match agreement {
            TxBlockAck::Requested { dialog_token: token, .. } => *token == dialog_token,
            _ => false,
        });
        let tid = match tid {
            Some(tid) => tid,
            None => return self.stats.record_drop(DropReason::UnexpectedFrame),
        };
        if let Some(event_id) = node.tx_ba[tid].timer() {
            self.timer.cancel_event(event_id);
        }

        let status = { resp.status };
        if status != StatusCode::SUCCESS {
            node.tx_ba[tid] = TxBlockAck::Init;
            return info!("{} refused BlockAck for TID {}: {:?}", fmt_addr(&src), tid, status);
        }
        let timeout = match { resp.timeout } {
            0 => None,
            tu => Some(TimeUnit(tu).into_duration()),
        };
        let timer = match timeout {
            Some(timeout) => {
                let event = TimedEvent::TxBlockAckTimeout { peer: src, tid: tid as u8 };
                Some(self.timer.schedule_after(timeout, event))
            }
            None => None,
        };
        let buffer_size = { resp.parameters }.buffer_size();
        node.tx_ba[tid] = TxBlockAck::Agreed { buffer_size, timeout, timer };
        info!("{} accepted BlockAck for TID {} (buffer {})", fmt_addr(&src), tid, buffer_size);
    }

    fn on_delba(&mut self, src: MacAddr, body: &[u8]) {
        let delba = match block_ack::read_delba_hdr(body) {
            Ok(delba) => *delba,
            Err(e) => {
                debug!("{}", e);
                return self.stats.record_drop(DropReason::Malformed);
            }
        };
        let params = { delba.parameters };
        let tid = params.tid() as usize % NUM_TIDS;
        let node = match self.nodes.find_mut(&src) {
            Some(node) => node,
            None => return self.stats.record_drop(DropReason::UnexpectedFrame),
        };
        info!("{} ended BlockAck for TID {}: {}", fmt_addr(&src), tid, { delba.reason_code });
        if params.initiator() {
            // The peer is the originator; tear down our recipient side.
            let released = match node.rx_ba[tid].take() {
                Some(mut agreement) => {
                    if let Some(event_id) = agreement.timer {
                        self.timer.cancel_event(event_id);
                    }
                    agreement.window.flush()
                }
                None => vec![],
            };
            self.process_released(src, released);
        } else {
            if let Some(event_id) = node.tx_ba[tid].timer() {
                self.timer.cancel_event(event_id);
            }
            node.tx_ba[tid] = TxBlockAck::Init;
        }
    }

    /// Requests a BlockAck agreement as originator for `tid` with the joined BSS.
    pub fn start_block_ack(&mut self, tid: u8) -> Result<(), Error> {
        let bssid = self.state.run_bssid().ok_or(Error::InvalidState("not associated"))?;
        if tid > MAX_BLOCK_ACK_TID {
            return Err(Error::InvalidState("BlockAck needs a user priority TID"));
        }
        if !self.config.qos_enabled {
            return Err(Error::InvalidState("QoS is disabled"));
        }
        let node = self.nodes.find(&bssid).ok_or(Error::NoBssNode)?;
        if !node.qos_capable {
            return Err(Error::InvalidState("BSS does not support QoS"));
        }
        if !self.ht_active() || !node.ht_capable {
            return Err(Error::InvalidState("BlockAck needs HT"));
        }
        if node.tx_ba[tid as usize] != TxBlockAck::Init {
            return Err(Error::InvalidState("BlockAck agreement already exists"));
        }
        let ssn = node.seq_mgr.peek_sns2(tid);
        let dialog_token = self.next_dialog_token();
        let sta_addr = self.config.sta_addr;
        let buffer_size = self.config.ba_window_size;
        let inactivity = self.config.ba_inactivity;
        self.send_mgmt_frame(bssid, true, |buf, protected, seq_mgr| {
            tx::write_addba_req_frame(
                buf,
                Bssid(bssid),
                sta_addr,
                dialog_token,
                tid,
                buffer_size,
                inactivity,
                ssn,
                protected,
                seq_mgr,
            )
        })?;
        let event = TimedEvent::TxBlockAckTimeout { peer: bssid, tid };
        let timer = self.timer.schedule_after(ADDBA_RESPONSE_TIMEOUT, event);
        if let Some(node) = self.nodes.find_mut(&bssid) {
            node.tx_ba[tid as usize] = TxBlockAck::Requested { dialog_token, timer };
        }
        info!("requested BlockAck for TID {} (ssn {})", tid, ssn);
        Ok(())
    }

    /// Fires when the ADDBA response is late or an originator agreement saw no traffic.
    pub(super) fn on_tx_ba_timeout(&mut self, event_id: EventId, peer: MacAddr, tid: u8) {
        let node = match self.nodes.find_mut(&peer) {
            Some(node) => node,
            None => return,
        };
        let slot = &mut node.tx_ba[tid as usize % NUM_TIDS];
        if slot.timer() != Some(event_id) {
            return;
        }
        let agreed = slot.is_agreed();
        *slot = TxBlockAck::Init;
        if !agreed {
            return warn!("no ADDBA response from {} for TID {}", fmt_addr(&peer), tid);
        }
        info!("BlockAck for TID {} idle; tearing down", tid);
        self.send_delba(peer, true, tid);
    }

    pub(super) fn on_rx_ba_inactive(&mut self, event_id: EventId, peer: MacAddr, tid: u8) {
        let node = match self.nodes.find_mut(&peer) {
            Some(node) => node,
            None => return,
        };
        let slot = &mut node.rx_ba[tid as usize % NUM_TIDS];
        if slot.as_ref().and_then(|agreement| agreement.timer) != Some(event_id) {
            return;
        }
        let released = match slot.take() {
            Some(mut agreement) => agreement.window.flush(),
            None => return,
        };
        info!("BlockAck for TID {} from {} idle; tearing down", tid, fmt_addr(&peer));
        self.process_released(peer, released);
        self.send_delba(peer, false, tid);
    }

    fn send_delba(&mut self, peer: MacAddr, is_initiator: bool, tid: u8) {
        let sta_addr = self.config.sta_addr;
        let result = self.send_mgmt_frame(peer, true, |buf, protected, seq_mgr| {
            tx::write_delba_frame(
                buf,
                Bssid(peer),
                sta_addr,
                is_initiator,
                tid,
                ReasonCode::TIMEOUT,
                protected,
                seq_mgr,
            )
        });
        if let Err(e) = result {
            error!("failed to send DELBA: {}", e);
        }
    }

    /// Buffers a QoS data MPDU of a TID with a recipient agreement and processes whatever the
    /// reorder window releases in sequence order.
    pub(super) fn reorder_mpdu(
        &mut self,
        bssid: MacAddr,
        meta: &MpduMeta,
        frame: &[u8],
        rx_info: RxInfo,
    ) {
        let tid = match meta.tid {
            Some(tid) => tid,
            None => return self.on_data_mpdu(bssid, frame, rx_info),
        };
        let seq_num = meta.seq_ctrl.seq_num();
        let timer = &mut self.timer;
        let agreement = self
            .nodes
            .find_mut(&bssid)
            .and_then(|node| node.rx_ba[tid as usize % NUM_TIDS].as_mut());
        let result = agreement.map(|agreement| {
            let mpdu = BufferedMpdu { frame: frame.to_vec(), rx_info };
            let result = agreement.window.insert(seq_num, mpdu);
            rearm_rx_ba(timer, agreement, bssid, tid);
            result
        });
        match result {
            Some(Ok(released)) => self.process_released(bssid, released),
            Some(Err(ReorderError::Stale(_))) => {
                self.stats.record_drop(DropReason::BlockAckStale)
            }
            Some(Err(ReorderError::Duplicate(_))) => {
                self.stats.record_drop(DropReason::BlockAckDuplicate)
            }
            None => self.on_data_mpdu(bssid, frame, rx_info),
        }
    }

    /// Moves the reorder windows named by a Block Ack Request. Refused once management frame
    /// protection is in effect, since an unprotected BAR could flush the windows at will.
    pub(super) fn on_block_ack_req(&mut self, frame: &[u8]) {
        let bar = match BlockAckReq::parse(frame) {
            Some(bar) => bar,
            None => return self.stats.record_drop(DropReason::Malformed),
        };
        if { bar.hdr.ra } != self.config.sta_addr {
            return self.stats.record_drop(DropReason::NotForUs);
        }
        let bssid = match self.state.run_bssid() {
            Some(bssid) if bssid == { bar.hdr.ta } => bssid,
            _ => return self.stats.record_drop(DropReason::UnexpectedFrame),
        };
        let node = match self.nodes.find_mut(&bssid) {
            Some(node) => node,
            None => return self.stats.record_drop(DropReason::UnexpectedFrame),
        };
        // With Protected Block Ack the window only moves through protected action frames.
        if node.mfp_active() && node.protected_block_ack() {
            return self.stats.record_drop(DropReason::BlockAckReqRefused);
        }
        let mut released = vec![];
        for info in &bar.tids {
            if let Some(agreement) = node.rx_ba[info.tid as usize % NUM_TIDS].as_mut() {
                released.extend(agreement.window.move_to(info.starting_seq_num));
                rearm_rx_ba(&mut self.timer, agreement, bssid, info.tid);
            }
        }
        self.process_released(bssid, released);
    }

    fn process_released(&mut self, bssid: MacAddr, released: Vec<BufferedMpdu>) {
        for mpdu in released {
            self.on_data_mpdu(bssid, &mpdu.frame[..], mpdu.rx_info);
            if self.state.run_bssid() != Some(bssid) {
                return;
            }
        }
    }

    /// Asks the AP whether the association still exists after an unprotected deauthentication
    /// or disassociation arrived while management frames are protected.
    pub(super) fn start_sa_query(&mut self) {
        let bssid = match &self.state {
            State::Run(association) if association.sa_query.is_none() => association.bssid,
            _ => return,
        };
        let transaction_id = self.next_sa_query_id;
        self.next_sa_query_id = self.next_sa_query_id.wrapping_add(1);
        let sta_addr = self.config.sta_addr;
        let result = self.send_mgmt_frame(bssid, true, |buf, _, seq_mgr| {
            tx::write_sa_query_frame(
                buf,
                Bssid(bssid),
                sta_addr,
                SaQueryAction::REQUEST,
                transaction_id.to_le_bytes(),
                seq_mgr,
            )
        });
        if let Err(e) = result {
            return error!("failed to send SA Query request: {}", e);
        }
        let event = TimedEvent::SaQueryTimeout { transaction_id };
        let timer = self.timer.schedule_after(SA_QUERY_TIMEOUT, event);
        if let State::Run(association) = &mut self.state {
            association.sa_query = Some(SaQuery { transaction_id, timer });
        }
        info!("unprotected deauthentication; querying {}", fmt_addr(&bssid));
    }

    fn on_sa_query(&mut self, src: MacAddr, body: &[u8]) {
        let hdr = match BufferReader::new(body).read::<SaQueryHdr>() {
            Some(hdr) => *hdr,
            None => return self.stats.record_drop(DropReason::Malformed),
        };
        let action = { hdr.action };
        let transaction_id = { hdr.transaction_id };

        if action == SaQueryAction::REQUEST {
            let sta_addr = self.config.sta_addr;
            let result = self.send_mgmt_frame(src, true, |buf, _, seq_mgr| {
                tx::write_sa_query_frame(
                    buf,
                    Bssid(src),
                    sta_addr,
                    SaQueryAction::RESPONSE,
                    transaction_id,
                    seq_mgr,
                )
            });
            if let Err(e) = result {
                error!("failed to send SA Query response: {}", e);
            }
            return;
        }

        if action == SaQueryAction::RESPONSE {
            let id = u16::from_le_bytes(transaction_id);
            if let State::Run(association) = &mut self.state {
                match association.sa_query {
                    Some(query) if query.transaction_id == id => {
                        association.sa_query = None;
                        self.timer.cancel_event(query.timer);
                        return info!("{} confirmed the association", fmt_addr(&src));
                    }
                    _ => (),
                }
            }
        }
        self.stats.record_drop(DropReason::UnexpectedFrame);
    }

    pub(super) fn on_sa_query_timeout(&mut self, event_id: EventId, transaction_id: u16) {
        match &mut self.state {
            State::Run(association)
                if association.sa_query.map_or(false, |query| {
                    query.timer == event_id && query.transaction_id == transaction_id
                }) =>
            {
                association.sa_query = None;
            }
            _ => return,
        }
        warn!("SA Query unanswered; the association is gone");
        self.leave_bss(None);
    }
}

// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Frame builders used by the station. Every builder appends a complete MPDU, minus the FCS,
//! to the given buffer. CCMP is applied afterwards to frames written with `protected` set.

use {
    crate::{block_ack, error::Error},
    wlan_common::{
        appendable::Appendable,
        data_writer,
        ie::{self, HtCapabilities},
        mac::{self, Bssid, MacAddr},
        mgmt_writer,
        sequence::SequenceManager,
    },
    wlan_rsn::ProtectionInfo,
};

/// The station listens to every beacon.
pub const LISTEN_INTERVAL: u16 = 1;

fn mgmt_frame_ctrl(subtype: mac::MgmtSubtype, protected: bool) -> mac::FrameControl {
    let mut frame_ctrl = mac::FrameControl::new(mac::FrameType::MGMT, subtype.0);
    frame_ctrl.set_protected(protected);
    frame_ctrl
}

fn write_mgmt_hdr_to_ap<B: Appendable>(
    buf: &mut B,
    subtype: mac::MgmtSubtype,
    bssid: Bssid,
    client_addr: MacAddr,
    protected: bool,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    let seq_ctrl = mac::SequenceControl::new(seq_mgr.next_sns1(), 0);
    let frame_ctrl = mgmt_frame_ctrl(subtype, protected);
    buf.append_value(&mgmt_writer::mgmt_hdr_to_ap(frame_ctrl, bssid, client_addr, seq_ctrl))?;
    Ok(())
}

fn write_rates<B: Appendable>(buf: &mut B, rates: &[u8]) -> Result<(), Error> {
    ie::RatesWriter::try_new(rates)?.write(buf)?;
    Ok(())
}

/// Broadcast probe request. An empty `ssid` is the wildcard SSID.
pub fn write_probe_req_frame<B: Appendable>(
    buf: &mut B,
    client_addr: MacAddr,
    ssid: &[u8],
    rates: &[u8],
    ht_cap: Option<&HtCapabilities>,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    let seq_ctrl = mac::SequenceControl::new(seq_mgr.next_sns1(), 0);
    buf.append_value(&mgmt_writer::mgmt_hdr(
        mac::MgmtSubtype::PROBE_REQ,
        mac::BCAST_ADDR,
        client_addr,
        Bssid(mac::BCAST_ADDR),
        seq_ctrl,
    ))?;
    ie::write_ssid(buf, ssid)?;
    write_rates(buf, rates)?;
    if let Some(ht_cap) = ht_cap {
        ie::write_ht_capabilities(buf, ht_cap)?;
    }
    Ok(())
}

pub fn write_open_auth_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    write_mgmt_hdr_to_ap(buf, mac::MgmtSubtype::AUTH, bssid, client_addr, false, seq_mgr)?;
    buf.append_value(&mac::AuthHdr {
        auth_alg_num: mac::AuthAlgorithmNumber::OPEN,
        auth_txn_seq_num: 1,
        status_code: mac::StatusCode::SUCCESS,
    })?;
    Ok(())
}

pub fn write_deauth_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    reason_code: mac::ReasonCode,
    protected: bool,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    write_mgmt_hdr_to_ap(buf, mac::MgmtSubtype::DEAUTH, bssid, client_addr, protected, seq_mgr)?;
    buf.append_value(&mac::DeauthHdr { reason_code })?;
    Ok(())
}

pub fn write_disassoc_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    reason_code: mac::ReasonCode,
    protected: bool,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    write_mgmt_hdr_to_ap(buf, mac::MgmtSubtype::DISASSOC, bssid, client_addr, protected, seq_mgr)?;
    buf.append_value(&mac::DisassocHdr { reason_code })?;
    Ok(())
}

/// Everything the association request advertises besides addressing.
#[derive(Debug)]
pub struct AssocReqParams<'a> {
    pub capabilities: mac::CapabilityInfo,
    pub ssid: &'a [u8],
    pub rates: &'a [u8],
    pub protection: Option<&'a ProtectionInfo>,
    /// WMM QoS Info to announce. `None` if QoS is not used.
    pub wmm_qos_info: Option<u8>,
    pub ht_cap: Option<HtCapabilities>,
}

pub fn write_assoc_req_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    params: &AssocReqParams<'_>,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    write_mgmt_hdr_to_ap(buf, mac::MgmtSubtype::ASSOC_REQ, bssid, client_addr, false, seq_mgr)?;
    buf.append_value(&mac::AssocReqHdr {
        capabilities: params.capabilities,
        listen_interval: LISTEN_INTERVAL,
    })?;
    ie::write_ssid(buf, params.ssid)?;
    write_rates(buf, params.rates)?;
    if let Some(protection) = params.protection {
        protection.write_into(buf)?;
    }
    if let Some(ht_cap) = &params.ht_cap {
        ie::write_ht_capabilities(buf, ht_cap)?;
    }
    if let Some(qos_info) = params.wmm_qos_info {
        ie::write_wmm_info(buf, qos_info)?;
    }
    Ok(())
}

pub fn write_addba_req_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    dialog_token: u8,
    tid: u8,
    buffer_size: u16,
    timeout: u16,
    ssn: u16,
    protected: bool,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    write_mgmt_hdr_to_ap(buf, mac::MgmtSubtype::ACTION, bssid, client_addr, protected, seq_mgr)?;
    block_ack::write_addba_req_body(buf, dialog_token, tid, buffer_size, timeout, ssn)
}

pub fn write_addba_resp_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    dialog_token: u8,
    status: mac::StatusCode,
    parameters: mac::BlockAckParameters,
    timeout: u16,
    protected: bool,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    write_mgmt_hdr_to_ap(buf, mac::MgmtSubtype::ACTION, bssid, client_addr, protected, seq_mgr)?;
    block_ack::write_addba_resp_body(buf, dialog_token, status, parameters, timeout)
}

pub fn write_delba_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    is_initiator: bool,
    tid: u8,
    reason_code: mac::ReasonCode,
    protected: bool,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    write_mgmt_hdr_to_ap(buf, mac::MgmtSubtype::ACTION, bssid, client_addr, protected, seq_mgr)?;
    block_ack::write_delba_body(buf, is_initiator, tid, reason_code)
}

/// SA Query request or response. SA Query frames are robust and always sent protected.
pub fn write_sa_query_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    action: mac::SaQueryAction,
    transaction_id: [u8; 2],
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    write_mgmt_hdr_to_ap(buf, mac::MgmtSubtype::ACTION, bssid, client_addr, true, seq_mgr)?;
    buf.append_value(&mac::ActionHdr { action: mac::ActionCategory::SA_QUERY })?;
    buf.append_value(&mac::SaQueryHdr { action, transaction_id })?;
    Ok(())
}

/// Data frame from the station to the distribution system. With `tid` set the frame is a QoS
/// data frame and draws its sequence number from that TID's space.
pub fn write_data_frame<B: Appendable>(
    buf: &mut B,
    seq_mgr: &mut SequenceManager,
    bssid: Bssid,
    src: MacAddr,
    dst: MacAddr,
    protected: bool,
    tid: Option<u8>,
    ether_type: u16,
    payload: &[u8],
) -> Result<(), Error> {
    let subtype = if tid.is_some() { mac::DataSubtype::QOS_DATA } else { mac::DataSubtype::DATA };
    let mut frame_ctrl = mac::FrameControl::new(mac::FrameType::DATA, subtype.0);
    frame_ctrl.set_protected(protected);

    let qos_ctrl = tid.map(mac::QosControl::with_tid);
    let seq_num = match tid {
        Some(tid) => seq_mgr.next_sns2(tid),
        None => seq_mgr.next_sns1(),
    };
    let mut fixed_fields = data_writer::data_hdr_client_to_ap(
        frame_ctrl,
        bssid,
        src,
        mac::SequenceControl::new(seq_num, 0),
    );
    fixed_fields.addr3 = dst;
    data_writer::write_data_hdr(buf, fixed_fields, qos_ctrl)?;
    buf.append_value(&data_writer::make_snap_llc_hdr(ether_type))?;
    buf.append_bytes(payload)?;
    Ok(())
}

pub fn write_eth_frame<B: Appendable>(
    buf: &mut B,
    dst_addr: MacAddr,
    src_addr: MacAddr,
    protocol_id: u16,
    body: &[u8],
) -> Result<(), Error> {
    let mut eth_hdr = buf.append_value_zeroed::<mac::EthernetIIHdr>()?;
    eth_hdr.da = dst_addr;
    eth_hdr.sa = src_addr;
    eth_hdr.ether_type.set_from_native(protocol_id);

    buf.append_bytes(body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        wlan_common::{
            assert_variant,
            buffer_writer::BufferWriter,
            ie::rsn::{
                akm::{self, Akm},
                cipher::{self, Cipher},
                rsne::{RsnCapabilities, Rsne},
            },
        },
    };

    const BSSID: Bssid = Bssid([1; 6]);
    const CLIENT: MacAddr = [2; 6];

    #[test]
    fn open_auth_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        write_open_auth_frame(&mut buf, BSSID, CLIENT, &mut seq_mgr)
            .expect("failed writing frame");
        #[rustfmt::skip]
        let expected = [
            // Mgmt header
            0b10110000, 0, // Frame Control
            0, 0, // Duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            1, 1, 1, 1, 1, 1, // addr3
            0, 0, // Sequence Control
            // Auth body
            0, 0, // Auth Algorithm Number
            1, 0, // Auth Txn Seq Number
            0, 0, // Status code
        ];
        assert_eq!(&expected[..], &buf[..]);
    }

    #[test]
    fn deauth_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        write_deauth_frame(
            &mut buf,
            BSSID,
            CLIENT,
            mac::ReasonCode::LEAVING_NETWORK_DEAUTH,
            true,
            &mut seq_mgr,
        )
        .expect("failed writing frame");
        #[rustfmt::skip]
        let expected = [
            // Mgmt header
            0b11000000, 0b01000000, // Frame Control, protected
            0, 0, // Duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            1, 1, 1, 1, 1, 1, // addr3
            0, 0, // Sequence Control
            // Deauth body
            3, 0, // reason code
        ];
        assert_eq!(&expected[..], &buf[..]);
    }

    #[test]
    fn disassoc_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        write_disassoc_frame(
            &mut buf,
            BSSID,
            CLIENT,
            mac::ReasonCode::LEAVING_NETWORK_DISASSOC,
            false,
            &mut seq_mgr,
        )
        .expect("failed writing frame");
        assert_eq!(&buf[0..2], &[0b10100000, 0]);
        assert_eq!(&buf[24..], &[8, 0]);
    }

    #[test]
    fn probe_req_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        write_probe_req_frame(&mut buf, CLIENT, b"Home", &[2, 4, 11, 22], None, &mut seq_mgr)
            .expect("failed writing frame");
        #[rustfmt::skip]
        let expected = [
            // Mgmt header
            0b01000000, 0, // Frame Control
            0, 0, // Duration
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // addr3
            0, 0, // Sequence Control
            0, 4, b'H', b'o', b'm', b'e', // SSID
            1, 4, 2, 4, 11, 22, // Supported rates
        ];
        assert_eq!(&expected[..], &buf[..]);
    }

    #[test]
    fn assoc_req_frame_splits_rates() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        let rsne = Rsne {
            group_data_cipher_suite: Some(Cipher::new_dot11(cipher::CCMP_128)),
            pairwise_cipher_suites: vec![Cipher::new_dot11(cipher::CCMP_128)],
            akm_suites: vec![Akm::new_dot11(akm::PSK)],
            rsn_capabilities: Some(RsnCapabilities(0)),
            ..Rsne::new()
        };
        let protection = ProtectionInfo::Rsne(rsne.clone());
        let mut capabilities = mac::CapabilityInfo(0);
        capabilities.set_ess(true);
        capabilities.set_privacy(true);
        let params = AssocReqParams {
            capabilities,
            ssid: b"Home",
            rates: &[2, 4, 11, 22, 12, 18, 24, 36, 48, 72, 96, 108],
            protection: Some(&protection),
            wmm_qos_info: Some(0),
            ht_cap: None,
        };
        write_assoc_req_frame(&mut buf, BSSID, CLIENT, &params, &mut seq_mgr)
            .expect("failed writing frame");

        #[rustfmt::skip]
        let mut expected = vec![
            // Mgmt header
            0, 0, // Frame Control
            0, 0, // Duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            1, 1, 1, 1, 1, 1, // addr3
            0, 0, // Sequence Control
            0x11, 0, // capabilities
            1, 0, // listen interval
            0, 4, b'H', b'o', b'm', b'e', // SSID
            1, 8, 2, 4, 11, 22, 12, 18, 24, 36, // Supported rates
            50, 4, 48, 72, 96, 108, // Extended supported rates
        ];
        expected.extend_from_slice(&rsne.to_vec()[..]);
        #[rustfmt::skip]
        expected.extend_from_slice(&[
            221, 7, 0x00, 0x50, 0xf2, 2, 0, 1, 0, // WMM Info
        ]);
        assert_eq!(expected, buf);
    }

    #[test]
    fn addba_req_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        write_addba_req_frame(&mut buf, BSSID, CLIENT, 1, 0, 64, 0, 1, false, &mut seq_mgr)
            .expect("failed writing frame");
        #[rustfmt::skip]
        let expected = [
            // Mgmt header
            0b11010000, 0, // Frame Control
            0, 0, // Duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            1, 1, 1, 1, 1, 1, // addr3
            0, 0, // Sequence Control
            3, // Action category
            0, // BlockAck action
            1, // Dialog token
            0b00000011, 0b00010000, // BlockAck parameters
            0, 0, // Timeout
            0b00010000, 0, // Starting sequence control
        ];
        assert_eq!(&expected[..], &buf[..]);
    }

    #[test]
    fn sa_query_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        write_sa_query_frame(
            &mut buf,
            BSSID,
            CLIENT,
            mac::SaQueryAction::RESPONSE,
            [0x12, 0x34],
            &mut seq_mgr,
        )
        .expect("failed writing frame");
        assert_eq!(&buf[0..2], &[0b11010000, 0b01000000]);
        assert_eq!(&buf[24..], &[8, 1, 0x12, 0x34]);
    }

    #[test]
    fn data_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        write_data_frame(&mut buf, &mut seq_mgr, BSSID, CLIENT, [3; 6], false, None, 0x0800, &[1, 2])
            .expect("failed writing frame");
        #[rustfmt::skip]
        let expected = [
            // Data header
            0b00001000, 0b00000001, // Frame Control, to DS
            0, 0, // Duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            3, 3, 3, 3, 3, 3, // addr3
            0, 0, // Sequence Control
            // LLC header
            0xaa, 0xaa, 0x03, // dsap ssap ctrl
            0, 0, 0, // oui
            0x08, 0x00, // protocol id
            // Payload
            1, 2,
        ];
        assert_eq!(&expected[..], &buf[..]);
    }

    #[test]
    fn qos_data_frame_uses_tid_sequence() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        // Advance the non-QoS sequence space; the TID space is separate.
        seq_mgr.next_sns1();
        seq_mgr.next_sns2(5);
        write_data_frame(&mut buf, &mut seq_mgr, BSSID, CLIENT, [3; 6], true, Some(5), 0x888e, &[])
            .expect("failed writing frame");
        #[rustfmt::skip]
        let expected = [
            // Data header
            0b10001000, 0b01000001, // Frame Control, QoS data, to DS, protected
            0, 0, // Duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            3, 3, 3, 3, 3, 3, // addr3
            0x10, 0, // Sequence Control
            5, 0, // QoS Control
            0xaa, 0xaa, 0x03, 0, 0, 0, 0x88, 0x8e,
        ];
        assert_eq!(&expected[..], &buf[..]);
    }

    #[test]
    fn eth_frame() {
        let mut buf = [99u8; 18];
        let mut writer = BufferWriter::new(&mut buf[..]);
        write_eth_frame(&mut writer, [1; 6], [2; 6], 0x0800, &[4, 5, 6, 7])
            .expect("failed writing frame");
        assert_eq!(writer.into_written(), 18);
        #[rustfmt::skip]
        assert_eq!(
            &[
                1, 1, 1, 1, 1, 1,
                2, 2, 2, 2, 2, 2,
                0x08, 0x00,
                4, 5, 6, 7,
            ],
            &buf[..]
        );
    }

    #[test]
    fn small_buffer() {
        let mut buf = [0u8; 10];
        let mut writer = BufferWriter::new(&mut buf[..]);
        let mut seq_mgr = SequenceManager::new();
        let result = write_open_auth_frame(&mut writer, BSSID, CLIENT, &mut seq_mgr);
        assert_variant!(result, Err(Error::BufferTooSmall));
    }
}

// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::*,
    crate::{
        config::{ChannelMode, Security},
        device::{FakeDevice, LinkStatus},
        key::PairwiseKey,
    },
    wlan_common::{
        assert_variant,
        ie::rsn::{akm::{self, Akm}, cipher::{self, Cipher}},
        mac::BCAST_ADDR,
        timer::FakeScheduler,
    },
    wlan_rsn::{
        ccmp::CcmpKey,
        eapol,
        key::{ptk::Ptk, Tk},
    },
};

const STA: MacAddr = [2, 2, 2, 2, 2, 2];
const AP: MacAddr = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01];
const SRC: MacAddr = [4, 4, 4, 4, 4, 4];

const ESS: u16 = 0x0001;
const PRIVACY: u16 = 0x0010;
const QOS: u16 = 0x0200;

#[rustfmt::skip]
const RATES: &[u8] = &[
    1, 8, 0x82, 0x84, 0x8b, 0x96, 0x0c, 0x12, 0x18, 0x24, // supported rates
    50, 4, 0x30, 0x48, 0x60, 0x6c, // extended supported rates
];

#[rustfmt::skip]
const RSNE_PSK: &[u8] = &[
    48, 20, 1, 0,
    0x00, 0x0f, 0xac, 4, // group cipher: CCMP-128
    1, 0, 0x00, 0x0f, 0xac, 4, // pairwise cipher: CCMP-128
    1, 0, 0x00, 0x0f, 0xac, 2, // AKM: PSK
    0x00, 0x00, // capabilities
];

#[rustfmt::skip]
const RSNE_PSK_MFP: &[u8] = &[
    48, 26, 1, 0,
    0x00, 0x0f, 0xac, 4, // group cipher: CCMP-128
    1, 0, 0x00, 0x0f, 0xac, 4, // pairwise cipher: CCMP-128
    1, 0, 0x00, 0x0f, 0xac, 2, // AKM: PSK
    0x80, 0x00, // capabilities: MFP capable
    0, 0, // no PMKIDs
    0x00, 0x0f, 0xac, 6, // group management cipher: BIP-CMAC-128
];

#[rustfmt::skip]
const RSNE_PSK_MFP_PBAC: &[u8] = &[
    48, 26, 1, 0,
    0x00, 0x0f, 0xac, 4, // group cipher: CCMP-128
    1, 0, 0x00, 0x0f, 0xac, 4, // pairwise cipher: CCMP-128
    1, 0, 0x00, 0x0f, 0xac, 2, // AKM: PSK
    0x80, 0x10, // capabilities: MFP capable, Protected Block Ack
    0, 0, // no PMKIDs
    0x00, 0x0f, 0xac, 6, // group management cipher: BIP-CMAC-128
];

fn config() -> Config {
    Config {
        sta_addr: STA,
        desired_ssid: Some(b"Home".to_vec()),
        channel_mode: ChannelMode::Fixed(6),
        phy_modes: vec![PhyMode::Erp],
        ht_enabled: false,
        ..Config::default()
    }
}

fn ht_config() -> Config {
    Config { phy_modes: vec![PhyMode::Ht], ht_enabled: true, ..config() }
}

fn protected_config() -> Config {
    Config { security: Security::Wpa2Psk { passphrase: "password".to_string() }, ..config() }
}

fn setup(config: Config) -> (ClientMlme<FakeDevice>, FakeScheduler) {
    let scheduler = FakeScheduler::new();
    let me = ClientMlme::new(config, FakeDevice::new(), scheduler.as_scheduler());
    (me, scheduler)
}

fn rx(rssi_dbm: i8) -> RxInfo {
    RxInfo { rssi_dbm, ..Default::default() }
}

fn mgmt_frame(fc0: u8, addr1: MacAddr, seq: u16, body: &[u8]) -> Vec<u8> {
    let mut frame = vec![fc0, 0, 0, 0];
    frame.extend_from_slice(&addr1);
    frame.extend_from_slice(&AP);
    frame.extend_from_slice(&AP);
    frame.extend_from_slice(&(seq << 4).to_le_bytes());
    frame.extend_from_slice(body);
    frame
}

fn beacon_elements(rsne: Option<&[u8]>) -> Vec<u8> {
    let mut elements = vec![0, 4, b'H', b'o', b'm', b'e'];
    elements.extend_from_slice(RATES);
    elements.extend_from_slice(&[3, 1, 6]); // DS parameter set: channel 6
    if let Some(rsne) = rsne {
        elements.extend_from_slice(rsne);
    }
    elements
}

fn ht_beacon_elements() -> Vec<u8> {
    let mut elements = beacon_elements(None);
    elements.extend_from_slice(&[45, 26]); // HT Capabilities
    elements.extend_from_slice(&[0; 26]);
    elements
}

fn beacon(seq: u16, capabilities: u16, elements: &[u8]) -> Vec<u8> {
    let mut body = vec![0; 8]; // timestamp
    body.extend_from_slice(&100u16.to_le_bytes());
    body.extend_from_slice(&capabilities.to_le_bytes());
    body.extend_from_slice(elements);
    mgmt_frame(0x80, BCAST_ADDR, seq, &body[..])
}

fn auth_resp(seq: u16) -> Vec<u8> {
    // Open System, transaction 2, success.
    mgmt_frame(0xb0, STA, seq, &[0, 0, 2, 0, 0, 0])
}

fn assoc_resp(seq: u16, elements: &[u8]) -> Vec<u8> {
    let mut body = vec![0x01, 0x00, 0, 0, 0x01, 0xc0]; // ESS, success, aid 1
    body.extend_from_slice(elements);
    mgmt_frame(0x10, STA, seq, &body[..])
}

fn data_frame(seq: u16, tid: Option<u8>, ether_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![if tid.is_some() { 0x88 } else { 0x08 }, 0x02, 0, 0];
    frame.extend_from_slice(&STA);
    frame.extend_from_slice(&AP);
    frame.extend_from_slice(&SRC);
    frame.extend_from_slice(&(seq << 4).to_le_bytes());
    if let Some(tid) = tid {
        frame.extend_from_slice(&[tid, 0]);
    }
    frame.extend_from_slice(&[0xaa, 0xaa, 0x03, 0, 0, 0]);
    frame.extend_from_slice(&ether_type.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

fn eth_frame(ether_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = SRC.to_vec();
    frame.extend_from_slice(&STA);
    frame.extend_from_slice(&ether_type.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

fn msg1() -> Vec<u8> {
    let mut msg =
        eapol::KeyFrame::new(eapol::KeyDescriptor::Ieee802dot11, eapol::KeyInformation(0x008a), 16);
    msg.version = 1;
    msg.key_replay_counter = 1;
    msg.key_len = 16;
    msg.key_nonce = [0x11; 32];
    msg.update_packet_body_len();
    msg.to_bytes(false)
}

fn test_ptk() -> Ptk {
    Ptk::new(
        &[0x42; 32],
        &AP,
        &STA,
        &[0x11; 32],
        &[0x22; 32],
        &Akm::new_dot11(akm::PSK),
        Cipher::new_dot11(cipher::CCMP_128),
    )
    .expect("deriving PTK")
}

fn scan_dwell(me: &ClientMlme<FakeDevice>) -> EventId {
    assert_variant!(&me.state, State::Scan { dwell, .. } => *dwell)
}

fn status_check(me: &ClientMlme<FakeDevice>) -> EventId {
    assert_variant!(&me.state, State::Run(association) => association.status_check)
}

/// Scans, authenticates and associates with the AP announced by a single beacon.
fn join(me: &mut ClientMlme<FakeDevice>, capabilities: u16, elements: &[u8]) {
    me.start().expect("starting scan");
    me.on_mac_frame(&beacon(1, capabilities, elements)[..], rx(-40));
    let dwell = scan_dwell(me);
    me.handle_timeout(dwell);
    assert_eq!(me.state(), AssocState::Auth);
    me.on_mac_frame(&auth_resp(2)[..], rx(-40));
    assert_eq!(me.state(), AssocState::Assoc);
    me.on_mac_frame(&assoc_resp(3, RATES)[..], rx(-40));
    assert_eq!(me.state(), AssocState::Run);
}

#[test]
fn strongest_sighting_is_kept_and_joined() {
    let (mut me, _scheduler) = setup(config());
    me.start().expect("starting scan");
    assert_eq!(me.device().channel, 6);

    let elements = beacon_elements(None);
    me.on_mac_frame(&beacon(1, ESS, &elements[..])[..], rx(40));
    me.on_mac_frame(&beacon(2, ESS, &elements[..])[..], rx(55));
    assert_eq!(me.nodes().len(), 1);
    assert_eq!(me.nodes().find(&AP).map(|node| node.rssi_dbm), Some(55));

    let dwell = scan_dwell(&me);
    me.handle_timeout(dwell);
    assert_eq!(me.device().scan_done_count, 1);
    assert_eq!(me.state(), AssocState::Auth);
    let frames = me.device_mut().take_wlan_frames();
    let auth = frames.last().expect("authentication request");
    assert_eq!(auth[0], 0xb0);
    assert_eq!(&auth[4..10], &AP[..]);
}

#[test]
fn basic_rate_mismatch_fails_association() {
    let (mut me, _scheduler) = setup(config());
    me.start().expect("starting scan");
    me.on_mac_frame(&beacon(1, ESS, &beacon_elements(None)[..])[..], rx(-40));
    let dwell = scan_dwell(&me);
    me.handle_timeout(dwell);
    me.on_mac_frame(&auth_resp(2)[..], rx(-40));
    me.device_mut().take_wlan_frames();

    // 60 Mbps as a basic rate, which the station does not support.
    me.on_mac_frame(&assoc_resp(3, &[1, 1, 0x80 | 120])[..], rx(-40));

    assert_eq!(me.stats().rate_mismatches, 1);
    assert_eq!(me.stats().assoc_failures, 1);
    assert_eq!(me.state(), AssocState::Scan);
    assert!(me.device().assoc_done.is_none());
    assert_eq!(me.device().link_status, LinkStatus::DOWN);
    assert_eq!(me.nodes().find(&AP).map(|node| node.assoc_fails), Some(1));

    let frames = me.device_mut().take_wlan_frames();
    let deauth = frames.iter().find(|frame| frame[0] == 0xc0).expect("deauthentication sent");
    assert_eq!(&deauth[4..10], &AP[..]);
    assert_eq!(&deauth[24..26], &[1, 0]); // unspecified reason
}

#[test]
fn open_network_delivers_data() {
    let (mut me, _scheduler) = setup(config());
    join(&mut me, ESS, &beacon_elements(None)[..]);
    assert_eq!(me.device().link_status, LinkStatus::UP);
    assert_eq!(me.device().assoc_done, Some((Bssid(AP), 1)));
    assert_eq!(me.bssid(), Some(Bssid(AP)));

    me.on_mac_frame(&data_frame(10, None, 0x0800, &[1, 2, 3])[..], rx(-40));

    #[rustfmt::skip]
    let expected = [
        2, 2, 2, 2, 2, 2, // destination
        4, 4, 4, 4, 4, 4, // source
        0x08, 0x00, // IPv4
        1, 2, 3,
    ];
    assert_eq!(me.device().eth_queue, vec![expected.to_vec()]);
}

#[test]
fn retried_duplicate_is_dropped() {
    let (mut me, _scheduler) = setup(config());
    join(&mut me, ESS, &beacon_elements(None)[..]);

    let frame = data_frame(10, None, 0x0800, &[1]);
    let mut retry = frame.clone();
    retry[1] |= 0x08;
    me.on_mac_frame(&frame[..], rx(-40));
    me.on_mac_frame(&retry[..], rx(-60));

    assert_eq!(me.device().eth_queue.len(), 1);
    assert_eq!(me.stats().rx_duplicates, 1);
    assert_eq!(me.stats().total_drops(), 0);
    // The duplicate still refreshes the signal strength.
    assert_eq!(me.nodes().find(&AP).map(|node| node.rssi_dbm), Some(-60));
}

#[test]
fn data_before_association_is_dropped() {
    let (mut me, _scheduler) = setup(config());
    me.start().expect("starting scan");
    me.on_mac_frame(&data_frame(10, None, 0x0800, &[1])[..], rx(-40));
    assert!(me.device().eth_queue.is_empty());
    assert_eq!(me.stats().drops(DropReason::UnexpectedFrame), 1);
}

#[test]
fn sends_qos_data_when_bss_supports_it() {
    let (mut me, _scheduler) = setup(config());
    join(&mut me, ESS | QOS, &beacon_elements(None)[..]);
    me.device_mut().take_wlan_frames();

    let token = me.send_eth_frame(&eth_frame(0x0800, &[1, 2, 3])[..]).expect("sending frame");

    let (frame, sent_token, flags) = me.device().wlan_queue.last().expect("data frame").clone();
    assert_eq!(sent_token, token);
    assert_eq!(frame[0], 0x88);
    assert_eq!(frame[1] & 0x01, 0x01); // to DS
    assert_eq!(&frame[4..10], &AP[..]);
    assert!(!flags.contains(TxFlags::PROTECTED));
    assert_eq!(me.stats().tx_data_frames, 1);
}

#[test]
fn send_eth_frame_requires_association() {
    let (mut me, _scheduler) = setup(config());
    assert_variant!(
        me.send_eth_frame(&eth_frame(0x0800, &[1])[..]),
        Err(Error::InvalidState(_))
    );
}

#[test]
fn closed_port_only_passes_eapol() {
    let (mut me, _scheduler) = setup(protected_config());
    join(&mut me, ESS | PRIVACY, &beacon_elements(Some(RSNE_PSK))[..]);
    assert_eq!(me.device().link_status, LinkStatus::DOWN);
    me.device_mut().take_wlan_frames();

    assert_variant!(
        me.send_eth_frame(&eth_frame(0x0800, &[1])[..]),
        Err(Error::PortNotValid)
    );
    assert!(me.device().wlan_queue.is_empty());

    me.send_eth_frame(&eth_frame(0x888e, &[1])[..]).expect("sending EAPOL");
    let (_, _, flags) = me.device().wlan_queue.last().expect("EAPOL frame");
    assert!(flags.contains(TxFlags::FAVOR_RELIABILITY));

    // Received data does not pass the closed port either.
    me.on_mac_frame(&data_frame(10, None, 0x0800, &[1])[..], rx(-40));
    assert!(me.device().eth_queue.is_empty());
    assert_eq!(me.stats().drops(DropReason::PortNotValid), 1);
}

#[test]
fn replayed_handshake_message_is_answered_again() {
    let (mut me, _scheduler) = setup(protected_config());
    join(&mut me, ESS | PRIVACY, &beacon_elements(Some(RSNE_PSK))[..]);
    me.device_mut().take_wlan_frames();

    let msg1 = msg1();
    me.on_mac_frame(&data_frame(10, None, 0x888e, &msg1[..])[..], rx(-40));
    me.on_mac_frame(&data_frame(11, None, 0x888e, &msg1[..])[..], rx(-40));

    let frames = me.device_mut().take_wlan_frames();
    assert_eq!(frames.len(), 2);
    for frame in &frames {
        assert_eq!(frame[0], 0x08);
        assert_eq!(&frame[24..32], &[0xaa, 0xaa, 0x03, 0, 0, 0, 0x88, 0x8e]);
        assert_eq!(frame[33], 3); // EAPOL-Key
    }
    assert!(me.device().keys.is_empty());
    assert!(me.device().eth_queue.is_empty());
    assert_eq!(me.device().link_status, LinkStatus::DOWN);
    assert_eq!(me.state(), AssocState::Run);
    assert_eq!(me.stats().handshake_failures, 0);
    assert_eq!(me.stats().drops(DropReason::EapolRejected), 0);
}

#[test]
fn handshake_timeout_deauthenticates() {
    let (mut me, _scheduler) = setup(protected_config());
    join(&mut me, ESS | PRIVACY, &beacon_elements(Some(RSNE_PSK))[..]);
    me.device_mut().take_wlan_frames();

    let timeout =
        assert_variant!(&me.state, State::Run(association) => association.handshake_timeout);
    me.handle_timeout(timeout.expect("handshake timeout armed"));

    assert_eq!(me.stats().handshake_failures, 1);
    assert_eq!(me.state(), AssocState::Scan);
    let frames = me.device_mut().take_wlan_frames();
    let deauth = frames.iter().find(|frame| frame[0] == 0xc0).expect("deauthentication sent");
    assert_eq!(&deauth[24..26], &[15, 0]); // 4-Way Handshake timeout
}

#[test]
fn replayed_packet_number_is_dropped() {
    let (mut me, _scheduler) = setup(config());
    join(&mut me, ESS, &beacon_elements(None)[..]);
    let ptk = test_ptk();
    me.nodes.find_mut(&AP).expect("BSS node").pairwise_key =
        Some(PairwiseKey::new(&ptk).expect("pairwise key"));

    let sender = CcmpKey::new(ptk.tk(), 0).expect("sender key");
    let first = sender.encrypt(5, &data_frame(10, None, 0x0800, &[1])[..]).expect("encrypting");
    let replay = sender.encrypt(5, &data_frame(11, None, 0x0800, &[2])[..]).expect("encrypting");
    me.on_mac_frame(&first[..], rx(-40));
    me.on_mac_frame(&replay[..], rx(-40));

    assert_eq!(me.device().eth_queue.len(), 1);
    assert_eq!(&me.device().eth_queue[0][14..], &[1][..]);
    assert_eq!(me.stats().drops(DropReason::CcmpReplay), 1);
}

#[test]
fn unprotected_data_is_dropped_once_keyed() {
    let (mut me, _scheduler) = setup(config());
    join(&mut me, ESS, &beacon_elements(None)[..]);
    me.nodes.find_mut(&AP).expect("BSS node").pairwise_key =
        Some(PairwiseKey::new(&test_ptk()).expect("pairwise key"));

    me.on_mac_frame(&data_frame(10, None, 0x0800, &[1])[..], rx(-40));

    assert!(me.device().eth_queue.is_empty());
    assert_eq!(me.stats().drops(DropReason::Unprotected), 1);
}

#[test]
fn missing_beacons_end_association() {
    let (mut me, _scheduler) = setup(Config { beacon_miss_count: 20, ..config() });
    join(&mut me, ESS, &beacon_elements(None)[..]);
    me.device_mut().take_wlan_frames();

    for _ in 0..2 {
        let event_id = status_check(&me);
        me.handle_timeout(event_id);
        assert_eq!(me.state(), AssocState::Run);
    }
    let event_id = status_check(&me);
    me.handle_timeout(event_id);

    assert_eq!(me.stats().beacon_losses, 1);
    assert_eq!(me.state(), AssocState::Scan);
    assert_eq!(me.device().link_status, LinkStatus::DOWN);
    assert!(me.nodes().find(&AP).is_none());
    let frames = me.device_mut().take_wlan_frames();
    let deauth = frames.iter().find(|frame| frame[0] == 0xc0).expect("deauthentication sent");
    assert_eq!(&deauth[24..26], &[3, 0]); // leaving network
}

#[test]
fn beacons_keep_association_alive() {
    let (mut me, _scheduler) = setup(Config { beacon_miss_count: 20, ..config() });
    let elements = beacon_elements(None);
    join(&mut me, ESS, &elements[..]);

    for seq in 10..15 {
        let event_id = status_check(&me);
        me.handle_timeout(event_id);
        me.on_mac_frame(&beacon(seq, ESS, &elements[..])[..], rx(-40));
    }
    assert_eq!(me.state(), AssocState::Run);
    assert_eq!(me.stats().beacon_losses, 0);
}

#[test]
fn deauthentication_from_ap_restarts_scan() {
    let (mut me, _scheduler) = setup(config());
    join(&mut me, ESS, &beacon_elements(None)[..]);

    me.on_mac_frame(&mgmt_frame(0xc0, STA, 4, &[3, 0])[..], rx(-40));

    assert_eq!(me.state(), AssocState::Scan);
    assert_eq!(me.device().link_status, LinkStatus::DOWN);
    assert!(me.bssid().is_none());
}

#[test]
fn disassociate_sends_reason() {
    let (mut me, _scheduler) = setup(config());
    assert_variant!(me.disassociate(ReasonCode::LEAVING_NETWORK_DISASSOC), Err(_));
    join(&mut me, ESS, &beacon_elements(None)[..]);
    me.device_mut().take_wlan_frames();

    me.disassociate(ReasonCode::LEAVING_NETWORK_DISASSOC).expect("disassociating");

    assert_eq!(me.state(), AssocState::Scan);
    let frames = me.device_mut().take_wlan_frames();
    assert_eq!(frames[0][0], 0xa0);
    assert_eq!(&frames[0][24..26], &[8, 0]);
}

#[test]
fn graceful_stop_tells_ap() {
    let (mut me, scheduler) = setup(config());
    join(&mut me, ESS, &beacon_elements(None)[..]);
    me.device_mut().take_wlan_frames();

    me.stop(true);

    assert_eq!(me.state(), AssocState::Init);
    assert_eq!(me.device().link_status, LinkStatus::DOWN);
    let frames = me.device_mut().take_wlan_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0][0], 0xc0);
    assert_eq!(&frames[0][24..26], &[3, 0]);
    // Leftover deadlines are ignored.
    for (event_id, _) in scheduler.scheduled() {
        me.handle_timeout(event_id);
    }
    assert_eq!(me.state(), AssocState::Init);
}

#[test]
fn monitor_mode_bypasses_processing() {
    let (mut me, _scheduler) = setup(Config { monitor_mode: true, ..config() });
    me.start().expect("starting scan");

    let frame = beacon(1, ESS, &beacon_elements(None)[..]);
    me.on_mac_frame(&frame[..], rx(-40));

    assert_eq!(me.device().monitor_queue.len(), 1);
    assert_eq!(me.device().monitor_queue[0].0, frame);
    assert_eq!(me.nodes().len(), 0);
    assert_eq!(me.stats().rx_frames, 1);
}

#[test]
fn tx_completion_releases_node() {
    let (mut me, _scheduler) = setup(config());
    join(&mut me, ESS, &beacon_elements(None)[..]);
    // Authentication and association requests are still in flight.
    assert_eq!(me.nodes().refcount(&AP), 2);

    let tokens: Vec<TxToken> = me.device().wlan_queue.iter().map(|(_, token, _)| *token).collect();
    for token in tokens {
        me.handle_tx_complete(token);
    }
    assert_eq!(me.nodes().refcount(&AP), 0);

    // Unknown completions are ignored.
    me.handle_tx_complete(TxToken(1000));
    assert_eq!(me.nodes().refcount(&AP), 0);
}

#[test]
fn data_frame_holds_node_until_completion() {
    let (mut me, _scheduler) = setup(config());
    join(&mut me, ESS, &beacon_elements(None)[..]);
    let tokens: Vec<TxToken> = me.device().wlan_queue.iter().map(|(_, token, _)| *token).collect();
    for token in tokens {
        me.handle_tx_complete(token);
    }
    assert_eq!(me.nodes().refcount(&AP), 0);

    let token = me.send_eth_frame(&eth_frame(0x0800, &[1, 2, 3])[..]).expect("sending frame");
    assert_eq!(me.nodes().refcount(&AP), 1);

    me.handle_tx_complete(token);
    assert_eq!(me.nodes().refcount(&AP), 0);
}

fn addba_req(seq: u16) -> Vec<u8> {
    #[rustfmt::skip]
    let body = [
        3, 0, // BlockAck category, ADDBA request
        5, // dialog token
        0x02, 0x10, // immediate policy, TID 0, buffer size 64
        0, 0, // no inactivity timeout
        0xa0, 0x00, // starting sequence number 10
    ];
    mgmt_frame(0xd0, STA, seq, &body[..])
}

#[test]
fn block_ack_reorders_data() {
    let (mut me, _scheduler) = setup(ht_config());
    join(&mut me, ESS | QOS, &ht_beacon_elements()[..]);
    me.device_mut().take_wlan_frames();

    me.on_mac_frame(&addba_req(4)[..], rx(-40));
    let frames = me.device_mut().take_wlan_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0][0], 0xd0);
    assert_eq!(&frames[0][24..27], &[3, 1, 5]); // ADDBA response to dialog 5
    assert_eq!(&frames[0][27..29], &[0, 0]); // success

    me.on_mac_frame(&data_frame(11, Some(0), 0x0800, &[11])[..], rx(-40));
    assert!(me.device().eth_queue.is_empty());
    me.on_mac_frame(&data_frame(10, Some(0), 0x0800, &[10])[..], rx(-40));

    let payloads: Vec<u8> = me.device().eth_queue.iter().map(|frame| frame[14]).collect();
    assert_eq!(payloads, vec![10, 11]);

    // Behind the window.
    me.on_mac_frame(&data_frame(9, Some(0), 0x0800, &[9])[..], rx(-40));
    assert_eq!(me.stats().drops(DropReason::BlockAckStale), 1);
}

#[test]
fn block_ack_request_moves_window() {
    let (mut me, _scheduler) = setup(ht_config());
    join(&mut me, ESS | QOS, &ht_beacon_elements()[..]);
    me.on_mac_frame(&addba_req(4)[..], rx(-40));

    me.on_mac_frame(&data_frame(12, Some(0), 0x0800, &[12])[..], rx(-40));
    assert!(me.device().eth_queue.is_empty());

    let mut bar = vec![0x84, 0x00, 0, 0];
    bar.extend_from_slice(&STA);
    bar.extend_from_slice(&AP);
    bar.extend_from_slice(&[0x04, 0x00]); // compressed bitmap, TID 0
    bar.extend_from_slice(&[0xd0, 0x00]); // starting sequence number 13
    me.on_mac_frame(&bar[..], rx(-40));

    let payloads: Vec<u8> = me.device().eth_queue.iter().map(|frame| frame[14]).collect();
    assert_eq!(payloads, vec![12]);
}

#[test]
fn addba_request_refused_without_qos() {
    let (mut me, _scheduler) = setup(Config { qos_enabled: false, ..config() });
    join(&mut me, ESS, &beacon_elements(None)[..]);
    me.device_mut().take_wlan_frames();

    me.on_mac_frame(&addba_req(4)[..], rx(-40));

    let frames = me.device_mut().take_wlan_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(&frames[0][27..29], &[1, 0]); // refused
    assert!(me.nodes().find(&AP).map_or(false, |node| node.rx_ba[0].is_none()));
}

#[test]
fn addba_request_refused_without_ht() {
    let (mut me, _scheduler) = setup(config());
    join(&mut me, ESS | QOS, &ht_beacon_elements()[..]);
    me.device_mut().take_wlan_frames();

    me.on_mac_frame(&addba_req(4)[..], rx(-40));

    let frames = me.device_mut().take_wlan_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(&frames[0][27..29], &[1, 0]); // refused
    assert!(me.nodes().find(&AP).map_or(false, |node| node.rx_ba[0].is_none()));
    assert_variant!(me.start_block_ack(0), Err(Error::InvalidState(_)));
}

fn join_with_mfp(me: &mut ClientMlme<FakeDevice>, rsne: &[u8]) -> Ptk {
    join(me, ESS | PRIVACY, &beacon_elements(Some(rsne))[..]);
    let ptk = test_ptk();
    me.nodes.find_mut(&AP).expect("BSS node").pairwise_key =
        Some(PairwiseKey::new(&ptk).expect("pairwise key"));
    assert!(me.nodes().find(&AP).map_or(false, |node| node.mfp_active()));
    me.device_mut().take_wlan_frames();
    ptk
}

#[test]
fn unprotected_deauth_triggers_sa_query() {
    let (mut me, _scheduler) = setup(Config { mfp_capable: true, ..protected_config() });
    let ptk = join_with_mfp(&mut me, RSNE_PSK_MFP);

    me.on_mac_frame(&mgmt_frame(0xc0, STA, 4, &[2, 0])[..], rx(-40));

    assert_eq!(me.state(), AssocState::Run);
    assert_eq!(me.stats().drops(DropReason::UnprotectedRobustMgmt), 1);
    let (query, _, flags) = me.device().wlan_queue.last().expect("SA Query request").clone();
    assert_eq!(query[0], 0xd0);
    assert_eq!(query[1] & 0x40, 0x40);
    assert!(flags.contains(TxFlags::PROTECTED));
    let transaction_id = assert_variant!(
        &me.state,
        State::Run(association) => association.sa_query.map(|query| query.transaction_id)
    );
    assert_eq!(transaction_id, Some(0));

    // The AP answers under the pairwise key.
    let sender = CcmpKey::new(ptk.tk(), 0).expect("sender key");
    let response = mgmt_frame(0xd0, STA, 5, &[8, 1, 0, 0]);
    let response = sender.encrypt(1, &response[..]).expect("encrypting");
    me.on_mac_frame(&response[..], rx(-40));

    assert_eq!(me.state(), AssocState::Run);
    assert_variant!(&me.state, State::Run(association) => assert!(association.sa_query.is_none()));
}

#[test]
fn unanswered_sa_query_ends_association() {
    let (mut me, _scheduler) = setup(Config { mfp_capable: true, ..protected_config() });
    join_with_mfp(&mut me, RSNE_PSK_MFP);

    me.on_mac_frame(&mgmt_frame(0xc0, STA, 4, &[2, 0])[..], rx(-40));
    let timer = assert_variant!(
        &me.state,
        State::Run(association) => association.sa_query.map(|query| query.timer)
    );
    me.handle_timeout(timer.expect("SA Query pending"));

    assert_eq!(me.state(), AssocState::Scan);
    assert_eq!(me.device().link_status, LinkStatus::DOWN);
}

fn block_ack_req() -> Vec<u8> {
    let mut bar = vec![0x84, 0x00, 0, 0];
    bar.extend_from_slice(&STA);
    bar.extend_from_slice(&AP);
    bar.extend_from_slice(&[0x04, 0x00, 0xd0, 0x00]);
    bar
}

#[test]
fn block_ack_request_refused_with_protected_block_ack() {
    let (mut me, _scheduler) = setup(Config { mfp_capable: true, ..protected_config() });
    join_with_mfp(&mut me, RSNE_PSK_MFP_PBAC);

    me.on_mac_frame(&block_ack_req()[..], rx(-40));

    assert_eq!(me.stats().drops(DropReason::BlockAckReqRefused), 1);
}

#[test]
fn block_ack_request_accepted_with_mfp_only() {
    let (mut me, _scheduler) = setup(Config { mfp_capable: true, ..protected_config() });
    join_with_mfp(&mut me, RSNE_PSK_MFP);
    let drops = me.stats().total_drops();

    me.on_mac_frame(&block_ack_req()[..], rx(-40));

    assert_eq!(me.stats().total_drops(), drops);
}

// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! This crate implements the station side of IEEE Std 802.11-2016 MLME for SoftMAC hardware:
//! the node table, the receive and transmit pipelines, fragment and BlockAck reassembly and
//! the association state machine of a client. The driver is reached through
//! [`device::DeviceOps`]; time only advances through [`common::timer`] events handed back to
//! [`client::ClientMlme::handle_timeout`].

pub mod block_ack;
pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod key;
pub mod node;
pub mod node_table;
pub mod qos;
pub mod rates;
pub mod reassembly;
pub mod registry;
pub mod rx;
pub mod stats;
pub mod tx;

pub use {
    client::{AssocState, ClientMlme},
    config::Config,
    device::DeviceOps,
    error::{Error, ErrorKind},
    registry::{DeviceId, Registry},
    stats::{DropReason, Stats},
    wlan_common as common,
};

use wlan_common::mac::MacAddr;

/// Deadlines scheduled by the MLME. Each event comes back through `handle_timeout` with the
/// id it was scheduled under; ids no longer tracked by their owner are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimedEvent {
    /// Time to move on to the next scan channel.
    ScanDwell,
    AuthTimeout,
    AssocTimeout,
    /// The 4-Way Handshake did not open the controlled port in time.
    HandshakeTimeout,
    /// Periodic check for a lost BSS while associated.
    AssociationStatusCheck,
    /// Discards a partially reassembled frame.
    Defrag { peer: MacAddr, seq_num: u16 },
    RxBlockAckInactive { peer: MacAddr, tid: u8 },
    TxBlockAckTimeout { peer: MacAddr, tid: u8 },
    SaQueryTimeout { transaction_id: u16 },
}

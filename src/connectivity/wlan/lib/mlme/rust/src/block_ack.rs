// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! BlockAck agreements and frames.
//!
//! A station keeps two independent agreements per TID: as _recipient_ it buffers received QoS
//! data in a reorder window (`RxBlockAck`), as _originator_ it tracks the ADDBA exchange it
//! started (`TxBlockAck`). Sending frames and arming timers is left to the caller; this module
//! only holds state and reads and writes the action frame bodies.
//!
//! See IEEE Std 802.11-2016, 10.24.

use {
    crate::{device::RxInfo, error::Error, reassembly::ReorderWindow},
    std::time::Duration,
    wlan_common::{
        appendable::Appendable,
        buffer_reader::BufferReader,
        mac,
        time::TimeUnit,
        timer::EventId,
    },
    zerocopy::{ByteSlice, LayoutVerified},
};

/// How long an originator waits for the ADDBA response.
pub const ADDBA_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/// An MPDU held back by a reorder window together with its receive metadata. The frame is kept
/// as received; decryption and defragmentation happen once it is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedMpdu {
    pub frame: Vec<u8>,
    pub rx_info: RxInfo,
}

/// Recipient side of an agreement. Exists only while the agreement does.
#[derive(Debug)]
pub struct RxBlockAck {
    pub window: ReorderWindow<BufferedMpdu>,
    /// Inactivity timeout requested by the originator.
    pub timeout: Option<Duration>,
    pub timer: Option<EventId>,
    pub amsdu: bool,
}

impl RxBlockAck {
    /// Accepts an ADDBA request. The window is the smaller of the requested buffer size and
    /// `max_window`; a requested size of zero leaves the choice to the recipient.
    pub fn from_addba_req(req: &mac::AddbaReqHdr, max_window: u16) -> Self {
        let requested = { req.parameters }.buffer_size();
        let winsize =
            if requested == 0 { max_window } else { std::cmp::min(requested, max_window) };
        let ssn = { req.starting_sequence_control }.starting_sequence_number();
        let timeout = match { req.timeout } {
            0 => None,
            tu => Some(TimeUnit(tu).into_duration()),
        };
        Self {
            window: ReorderWindow::new(ssn, winsize),
            timeout,
            timer: None,
            amsdu: { req.parameters }.amsdu(),
        }
    }

    /// Parameters echoed in the ADDBA response.
    pub fn resp_parameters(&self, tid: u8) -> mac::BlockAckParameters {
        mac::BlockAckParameters(0)
            .with_amsdu(self.amsdu)
            .with_policy(mac::BlockAckPolicy::IMMEDIATE)
            .with_tid(tid)
            .with_buffer_size(self.window.winsize())
    }
}

/// Originator side of an agreement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxBlockAck {
    /// No agreement. This is the initial state.
    Init,
    /// ADDBA request sent; `timer` bounds the wait for the response.
    Requested { dialog_token: u8, timer: EventId },
    /// The recipient accepted. `timer` tracks inactivity if a timeout was negotiated.
    Agreed { buffer_size: u16, timeout: Option<Duration>, timer: Option<EventId> },
}

impl Default for TxBlockAck {
    fn default() -> Self {
        TxBlockAck::Init
    }
}

impl TxBlockAck {
    pub fn is_agreed(&self) -> bool {
        matches!(self, TxBlockAck::Agreed { .. })
    }

    /// Any armed deadline of the agreement.
    pub fn timer(&self) -> Option<EventId> {
        match self {
            TxBlockAck::Init => None,
            TxBlockAck::Requested { timer, .. } => Some(*timer),
            TxBlockAck::Agreed { timer, .. } => *timer,
        }
    }
}

/// Writes the body of the management frame for an `ADDBA` request to the given buffer. The
/// management header should be written to the buffer before using this function.
///
/// Note that the action header is part of the management frame body and is written by this
/// function. The frame format is described by IEEE Std 802.11-2016, 9.6.5.2.
pub fn write_addba_req_body<B: Appendable>(
    buffer: &mut B,
    dialog_token: u8,
    tid: u8,
    buffer_size: u16,
    timeout: u16,
    ssn: u16,
) -> Result<(), Error> {
    buffer.append_value(&mac::ActionHdr { action: mac::ActionCategory::BLOCK_ACK })?;
    buffer.append_value(&mac::AddbaReqHdr {
        action: mac::BlockAckAction::ADDBA_REQUEST,
        dialog_token,
        parameters: mac::BlockAckParameters(0)
            .with_amsdu(true)
            .with_policy(mac::BlockAckPolicy::IMMEDIATE)
            .with_tid(tid)
            .with_buffer_size(buffer_size),
        timeout,
        // The fragment number is always zero. See IEEE Std 802.11-2016, 9.6.5.2.
        starting_sequence_control: mac::BlockAckStartingSequenceControl(0)
            .with_starting_sequence_number(ssn),
    })?;
    Ok(())
}

/// Writes the body of the management frame for an `ADDBA` response to the given buffer. The
/// frame format is described by IEEE Std 802.11-2016, 9.6.5.3.
pub fn write_addba_resp_body<B: Appendable>(
    buffer: &mut B,
    dialog_token: u8,
    status: mac::StatusCode,
    parameters: mac::BlockAckParameters,
    timeout: u16,
) -> Result<(), Error> {
    buffer.append_value(&mac::ActionHdr { action: mac::ActionCategory::BLOCK_ACK })?;
    buffer.append_value(&mac::AddbaRespHdr {
        action: mac::BlockAckAction::ADDBA_RESPONSE,
        dialog_token,
        status,
        parameters,
        timeout,
    })?;
    Ok(())
}

pub fn write_delba_body<B: Appendable>(
    buffer: &mut B,
    is_initiator: bool,
    tid: u8,
    reason_code: mac::ReasonCode,
) -> Result<(), Error> {
    buffer.append_value(&mac::ActionHdr { action: mac::ActionCategory::BLOCK_ACK })?;
    buffer.append_value(&mac::DelbaHdr {
        action: mac::BlockAckAction::DELBA,
        parameters: mac::DelbaParameters(0).with_initiator(is_initiator).with_tid(tid),
        reason_code,
    })?;
    Ok(())
}

/// Reads an ADDBA request header from an ADDBA frame body.
///
/// This function and others in this module expect the body to start at the BlockAck action
/// byte; the category byte must be parsed and removed beforehand.
pub fn read_addba_req_hdr<B: ByteSlice>(
    body: B,
) -> Result<LayoutVerified<B, mac::AddbaReqHdr>, Error> {
    let mut reader = BufferReader::new(body);
    reader.read::<mac::AddbaReqHdr>().ok_or(Error::MalformedFrame("ADDBA request too short"))
}

/// Reads an ADDBA response header from an ADDBA frame body.
///
/// # Errors
///
/// Returns an error if the header cannot be parsed or if its dialog token is not the same as the
/// given parameters.
pub fn read_addba_resp_hdr<B: ByteSlice>(
    dialog_token: u8,
    body: B,
) -> Result<LayoutVerified<B, mac::AddbaRespHdr>, Error> {
    let mut reader = BufferReader::new(body);
    let response = reader
        .read::<mac::AddbaRespHdr>()
        .ok_or(Error::MalformedFrame("ADDBA response too short"))?;
    if response.dialog_token == dialog_token {
        Ok(response)
    } else {
        Err(Error::MalformedFrame("mismatched dialog token in ADDBA response"))
    }
}

pub fn read_delba_hdr<B: ByteSlice>(body: B) -> Result<LayoutVerified<B, mac::DelbaHdr>, Error> {
    let mut reader = BufferReader::new(body);
    reader.read::<mac::DelbaHdr>().ok_or(Error::MalformedFrame("DELBA too short"))
}

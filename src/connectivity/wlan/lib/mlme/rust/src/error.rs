// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        client::Rejection,
        device::{KeyError, TxError},
    },
    thiserror::Error,
    wlan_common::{
        appendable::BufferTooSmall,
        error::{FrameParseError, FrameWriteError},
        mac::{fmt_addr, MacAddr},
    },
};

/// Coarse classification of MLME failures. No error terminates the device context; the kind
/// only decides whether the caller drops, refuses or aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A peer sent something malformed or not allowed. Dropped and counted.
    ProtocolViolation,
    /// MIC, replay or key hierarchy failure. Dropped and counted, may end a handshake.
    CryptoFailure,
    /// A bounded table refused a new entry. Visible to the caller.
    CapacityExceeded,
    /// The request does not fit the current association state.
    StateViolation,
    /// The driver or a buffer ran out. The operation is aborted.
    ResourceExhaustion,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("provided buffer too small")]
    BufferTooSmall,
    #[error("error parsing frame: {0}")]
    ParsingFrame(#[from] FrameParseError),
    #[error("error writing frame: {0}")]
    WritingFrame(#[from] FrameWriteError),
    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),
    #[error("node table is full; capacity {0}")]
    CapacityExceeded(usize),
    #[error("no BSS node to send to")]
    NoBssNode,
    #[error("unknown node {}", fmt_addr(.0))]
    NodeNotFound(MacAddr),
    #[error("not allowed: {0}")]
    InvalidState(&'static str),
    #[error("a basic rate of the AP is not supported")]
    RateMismatch,
    #[error("BSS is not compatible: {0}")]
    IncompatibleBss(#[from] Rejection),
    #[error("controlled port is not open")]
    PortNotValid,
    #[error("driver refused frame: {0}")]
    Driver(#[from] TxError),
    #[error("key installation failed: {0}")]
    Key(#[from] KeyError),
    #[error("RSN error: {0}")]
    Rsn(#[from] wlan_rsn::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ParsingFrame(_)
            | Error::MalformedFrame(_)
            | Error::RateMismatch
            | Error::IncompatibleBss(_) => ErrorKind::ProtocolViolation,
            Error::Rsn(_) | Error::Key(_) => ErrorKind::CryptoFailure,
            Error::CapacityExceeded(_) => ErrorKind::CapacityExceeded,
            Error::NoBssNode
            | Error::NodeNotFound(_)
            | Error::InvalidState(_)
            | Error::PortNotValid => ErrorKind::StateViolation,
            Error::BufferTooSmall | Error::WritingFrame(_) | Error::Driver(_) => {
                ErrorKind::ResourceExhaustion
            }
        }
    }
}

impl From<BufferTooSmall> for Error {
    fn from(_: BufferTooSmall) -> Self {
        Error::BufferTooSmall
    }
}

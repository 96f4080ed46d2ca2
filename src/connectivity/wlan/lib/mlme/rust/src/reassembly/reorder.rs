// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::collections::VecDeque,
    thiserror::Error,
    wlan_common::{
        mac::SEQ_NUM_MODULUS,
        sequence::{seq_add, seq_leq, seq_lt, seq_sub},
    },
};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReorderError {
    #[error("sequence number {0} precedes the window")]
    Stale(u16),
    #[error("sequence number {0} is already buffered")]
    Duplicate(u16),
}

/// Receive reorder buffer of a Block-Ack agreement (IEEE Std 802.11-2016, 10.24.7.6).
///
/// Slot `i` holds the MPDU with sequence number `winstart + i`. Items are released strictly in
/// sequence order; holes are skipped only when the window is forced forward.
#[derive(Debug)]
pub struct ReorderWindow<T> {
    winstart: u16,
    buf: VecDeque<Option<T>>,
}

impl<T> ReorderWindow<T> {
    pub fn new(ssn: u16, winsize: u16) -> Self {
        let winsize = std::cmp::max(winsize, 1) as usize;
        Self { winstart: ssn % SEQ_NUM_MODULUS, buf: (0..winsize).map(|_| None).collect() }
    }

    pub fn winstart(&self) -> u16 {
        self.winstart
    }

    pub fn winsize(&self) -> u16 {
        self.buf.len() as u16
    }

    pub fn winend(&self) -> u16 {
        seq_add(self.winstart, self.winsize() - 1)
    }

    pub fn buffered(&self) -> usize {
        self.buf.iter().filter(|slot| slot.is_some()).count()
    }

    /// Buffers `item` received with sequence number `sn` and returns every MPDU now deliverable,
    /// in order.
    pub fn insert(&mut self, sn: u16, item: T) -> Result<Vec<T>, ReorderError> {
        let sn = sn % SEQ_NUM_MODULUS;
        if seq_lt(sn, self.winstart) {
            return Err(ReorderError::Stale(sn));
        }
        let mut out = vec![];
        if seq_lt(self.winend(), sn) {
            let winstart = seq_sub(sn, self.winsize() - 1);
            self.advance_to(winstart, &mut out);
        }
        let slot = seq_sub(sn, self.winstart) as usize;
        if self.buf[slot].is_some() {
            return Err(ReorderError::Duplicate(sn));
        }
        self.buf[slot] = Some(item);
        self.drain(&mut out);
        Ok(out)
    }

    /// Moves winstart to `ssn` as requested by a BlockAckReq or ADDBA. Buffered MPDUs before
    /// `ssn` are released along with any in-order run starting at `ssn`.
    pub fn move_to(&mut self, ssn: u16) -> Vec<T> {
        let ssn = ssn % SEQ_NUM_MODULUS;
        let mut out = vec![];
        if seq_leq(ssn, self.winstart) {
            return out;
        }
        self.advance_to(ssn, &mut out);
        self.drain(&mut out);
        out
    }

    /// Releases everything buffered, in order. Used when the agreement is torn down.
    pub fn flush(&mut self) -> Vec<T> {
        let winsize = self.buf.len();
        let out = self.buf.drain(..).flatten().collect();
        self.buf.extend((0..winsize).map(|_| None));
        out
    }

    fn advance_to(&mut self, winstart: u16, out: &mut Vec<T>) {
        let shift = seq_sub(winstart, self.winstart) as usize;
        if shift >= self.buf.len() {
            out.extend(self.flush());
        } else {
            for _ in 0..shift {
                if let Some(Some(item)) = self.buf.pop_front() {
                    out.push(item);
                }
                self.buf.push_back(None);
            }
        }
        self.winstart = winstart;
    }

    fn drain(&mut self, out: &mut Vec<T>) {
        while let Some(Some(_)) = self.buf.front() {
            if let Some(Some(item)) = self.buf.pop_front() {
                out.push(item);
            }
            self.buf.push_back(None);
            self.winstart = seq_add(self.winstart, 1);
        }
    }
}

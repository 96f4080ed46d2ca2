// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::mac::{NUM_TIDS, SEQ_NUM_MODULUS};

/// Index of the sequence number space used by management frames and non-QoS data frames.
pub const NON_QOS_TID: usize = NUM_TIDS;

/// Transmit sequence number spaces for one peer.
///
/// IEEE Std 802.11-2016, 10.3.2.14.2: QoS data frames are numbered per TID while management and
/// non-QoS data frames share a single counter.
#[derive(Debug, Clone, Default)]
pub struct SequenceManager {
    next: [u16; NUM_TIDS + 1],
}

impl SequenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sequence number to use for the next non-QoS or management frame.
    pub fn next_sns1(&mut self) -> u16 {
        self.next_for(NON_QOS_TID)
    }

    /// Returns the sequence number to use for the next QoS data frame of the given TID.
    pub fn next_sns2(&mut self, tid: u8) -> u16 {
        self.next_for(tid as usize % NUM_TIDS)
    }

    /// Sequence number the next QoS frame of `tid` will carry, without consuming it.
    pub fn peek_sns2(&self, tid: u8) -> u16 {
        self.next[tid as usize % NUM_TIDS]
    }

    fn next_for(&mut self, index: usize) -> u16 {
        let seq = self.next[index];
        self.next[index] = (seq + 1) % SEQ_NUM_MODULUS;
        seq
    }
}

/// Serial number comparison modulo 4096 (IEEE Std 802.11-2016, 10.24.7.7).
pub fn seq_lt(a: u16, b: u16) -> bool {
    a != b && ((b.wrapping_sub(a)) % SEQ_NUM_MODULUS) < SEQ_NUM_MODULUS / 2
}

pub fn seq_leq(a: u16, b: u16) -> bool {
    a == b || seq_lt(a, b)
}

pub fn seq_add(a: u16, n: u16) -> u16 {
    a.wrapping_add(n) % SEQ_NUM_MODULUS
}

pub fn seq_sub(a: u16, b: u16) -> u16 {
    a.wrapping_sub(b) % SEQ_NUM_MODULUS
}

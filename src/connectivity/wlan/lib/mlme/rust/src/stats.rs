// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {log::debug, std::collections::BTreeMap};

/// Why a received frame was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DropReason {
    /// Truncated frame or unknown protocol version.
    Malformed,
    NotForUs,
    NotFromBss,
    /// Frame is valid but does not fit the association state.
    UnexpectedFrame,
    /// Unprotected data frame while a pairwise key is in place.
    Unprotected,
    /// Unprotected unicast robust management frame while MFP is in effect.
    UnprotectedRobustMgmt,
    /// WEP or TKIP protected frame.
    Undecryptable,
    NoKey,
    CcmpReplay,
    CcmpMicFailure,
    PortNotValid,
    NotSnap,
    FragmentOutOfOrder,
    BlockAckStale,
    BlockAckDuplicate,
    BlockAckReqRefused,
    NodeTableFull,
    EapolRejected,
    EapolMicFailure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    drops: BTreeMap<DropReason, u64>,
    pub rx_frames: u64,
    pub rx_duplicates: u64,
    pub tx_data_frames: u64,
    pub tx_data_failures: u64,
    pub tx_mgmt_frames: u64,
    pub mgmt_tx_failures: u64,
    pub assoc_failures: u64,
    pub rate_mismatches: u64,
    pub handshake_failures: u64,
    pub beacon_losses: u64,
    pub fragment_timeouts: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_drop(&mut self, reason: DropReason) {
        debug!("dropping frame: {:?}", reason);
        *self.drops.entry(reason).or_insert(0) += 1;
    }

    pub fn drops(&self, reason: DropReason) -> u64 {
        self.drops.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_drops(&self) -> u64 {
        self.drops.values().sum()
    }

    /// All non-zero drop counters ordered by reason.
    pub fn drop_counts(&self) -> impl Iterator<Item = (DropReason, u64)> + '_ {
        self.drops.iter().map(|(reason, count)| (*reason, *count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_counters() {
        let mut stats = Stats::new();
        assert_eq!(stats.total_drops(), 0);
        stats.record_drop(DropReason::CcmpReplay);
        stats.record_drop(DropReason::CcmpReplay);
        stats.record_drop(DropReason::Malformed);
        assert_eq!(stats.drops(DropReason::CcmpReplay), 2);
        assert_eq!(stats.drops(DropReason::NotSnap), 0);
        assert_eq!(stats.total_drops(), 3);
        assert_eq!(
            stats.drop_counts().collect::<Vec<_>>(),
            vec![(DropReason::Malformed, 1), (DropReason::CcmpReplay, 2)]
        );
    }
}

// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {std::time::Duration, wlan_common::time::TimeUnit};

/// Beacon periods the joined BSS went without a beacon, as seen by the periodic association
/// status check. Any beacon resets the count.
///
/// A status check adds the whole interval since the previous check even if a beacon arrived
/// near its end, so `is_lost()` has to be asked before `add_beacon_interval()`.
#[derive(Debug)]
pub struct LostBssCounter {
    beacon_period: Duration,
    miss_limit: u32,
    missed: u32,
}

impl LostBssCounter {
    pub fn start(beacon_period: TimeUnit, miss_limit: u32) -> Self {
        Self { beacon_period: beacon_period.into_duration(), miss_limit, missed: 0 }
    }

    pub fn reset(&mut self) {
        self.missed = 0;
    }

    pub fn is_lost(&self) -> bool {
        self.missed >= self.miss_limit
    }

    pub fn add_beacon_interval(&mut self, periods: u32) {
        self.missed = self.missed.saturating_add(periods);
    }

    pub fn missed(&self) -> u32 {
        self.missed
    }

    pub fn time_without_beacon(&self) -> Duration {
        self.beacon_period * self.missed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Status checks run every ten beacon periods.
    const CHECK: u32 = 10;

    #[test]
    fn lost_after_miss_limit() {
        let mut counter = LostBssCounter::start(TimeUnit(100), 20);
        assert!(!counter.is_lost());
        counter.add_beacon_interval(CHECK);
        assert!(!counter.is_lost());
        counter.add_beacon_interval(CHECK);
        assert!(counter.is_lost());
        assert_eq!(counter.missed(), 20);
        assert_eq!(counter.time_without_beacon(), TimeUnit(100).into_duration() * 20);
    }

    #[test]
    fn beacon_starts_over() {
        let mut counter = LostBssCounter::start(TimeUnit(100), 20);
        counter.add_beacon_interval(CHECK + CHECK - 1);
        counter.reset();
        assert_eq!(counter.time_without_beacon(), Duration::from_nanos(0));

        counter.add_beacon_interval(CHECK);
        assert!(!counter.is_lost());
    }

    #[test]
    fn zero_limit_is_lost_right_away() {
        let counter = LostBssCounter::start(TimeUnit(100), 0);
        assert!(counter.is_lost());
    }

    #[test]
    fn count_saturates() {
        let mut counter = LostBssCounter::start(TimeUnit(100), 20);
        counter.add_beacon_interval(u32::MAX);
        counter.add_beacon_interval(CHECK);
        assert_eq!(counter.missed(), u32::MAX);
        assert!(counter.is_lost());
    }
}

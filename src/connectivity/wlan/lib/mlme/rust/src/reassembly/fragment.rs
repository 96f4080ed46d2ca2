// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::TimedEvent,
    log::trace,
    std::time::Duration,
    wlan_common::{
        mac::{header_len, FrameControl, MacAddr, SequenceControl},
        timer::{EventId, Timer},
    },
};

const ADDR1_OFFSET: usize = 4;
const ADDR3_END: usize = 22;
const SEQ_CTRL_OFFSET: usize = 22;

/// Outcome of feeding one fragment to the cache.
#[derive(Debug, PartialEq, Eq)]
pub enum Defrag {
    /// The MSDU or MMPDU is complete. The frame carries the first fragment's header with More
    /// Fragments cleared.
    Complete(Vec<u8>),
    /// Fragment stored; more are expected.
    Pending,
    /// Fragment does not continue any cached frame and was discarded.
    Discarded,
}

#[derive(Debug)]
struct FragmentEntry {
    seq_num: u16,
    last_frag: u8,
    frame_ctrl: FrameControl,
    /// Addresses 1 to 3 of the first fragment.
    addrs: [u8; ADDR3_END - ADDR1_OFFSET],
    frame: Vec<u8>,
    timer: EventId,
}

/// Bounded ring of frames being reassembled from one transmitter. A new first fragment takes
/// the next slot in turn, replacing whatever reassembly occupied it.
#[derive(Debug)]
pub struct FragmentCache {
    entries: Vec<Option<FragmentEntry>>,
    next: usize,
}

fn parse_fragment(mpdu: &[u8]) -> Option<(FrameControl, usize, SequenceControl)> {
    if mpdu.len() < 2 {
        return None;
    }
    let fc = FrameControl(u16::from_le_bytes([mpdu[0], mpdu[1]]));
    let hdr_len = header_len(fc);
    if mpdu.len() < hdr_len {
        return None;
    }
    let seq_ctrl =
        SequenceControl(u16::from_le_bytes([mpdu[SEQ_CTRL_OFFSET], mpdu[SEQ_CTRL_OFFSET + 1]]));
    Some((fc, hdr_len, seq_ctrl))
}

impl FragmentCache {
    pub fn new(size: usize) -> Self {
        let size = std::cmp::max(size, 1);
        Self { entries: (0..size).map(|_| None).collect(), next: 0 }
    }

    /// Adds a plaintext fragment received from `peer`. The first fragment of a frame arms a
    /// `TimedEvent::Defrag` which discards the partial frame once `timeout` passes.
    pub fn add(
        &mut self,
        timer: &mut Timer<TimedEvent>,
        peer: MacAddr,
        timeout: Duration,
        mpdu: &[u8],
    ) -> Defrag {
        let (fc, hdr_len, seq_ctrl) = match parse_fragment(mpdu) {
            Some(parsed) => parsed,
            None => return Defrag::Discarded,
        };
        let seq_num = seq_ctrl.seq_num();
        let frag_num = seq_ctrl.frag_num();

        if frag_num == 0 {
            if !fc.more_frags() {
                return Defrag::Complete(mpdu.to_vec());
            }
            let slot = self.next;
            self.next = (self.next + 1) % self.entries.len();
            if let Some(old) = self.entries[slot].take() {
                trace!("fragment cache slot reused; dropping seq {}", old.seq_num);
                timer.cancel_event(old.timer);
            }
            let mut addrs = [0u8; ADDR3_END - ADDR1_OFFSET];
            addrs.copy_from_slice(&mpdu[ADDR1_OFFSET..ADDR3_END]);
            let event = timer.schedule_after(timeout, TimedEvent::Defrag { peer, seq_num });
            self.entries[slot] = Some(FragmentEntry {
                seq_num,
                last_frag: 0,
                frame_ctrl: fc,
                addrs,
                frame: mpdu.to_vec(),
                timer: event,
            });
            return Defrag::Pending;
        }

        let slot = match self.entries.iter().position(|entry| match entry {
            Some(entry) => {
                entry.seq_num == seq_num
                    && entry.frame_ctrl.frame_type() == fc.frame_type()
                    && entry.addrs[..] == mpdu[ADDR1_OFFSET..ADDR3_END]
            }
            None => false,
        }) {
            Some(slot) => slot,
            None => return Defrag::Discarded,
        };

        let entry = match &mut self.entries[slot] {
            Some(entry) => entry,
            None => return Defrag::Discarded,
        };
        if frag_num != entry.last_frag + 1 {
            // Out of order or duplicate. Keep the partial frame for the fragment expected next.
            return Defrag::Discarded;
        }
        entry.last_frag = frag_num;
        entry.frame.extend_from_slice(&mpdu[hdr_len..]);
        if fc.more_frags() {
            return Defrag::Pending;
        }

        match self.entries[slot].take() {
            Some(entry) => {
                timer.cancel_event(entry.timer);
                let mut frame = entry.frame;
                let mut fc = entry.frame_ctrl;
                fc.set_more_frags(false);
                frame[0..2].copy_from_slice(&fc.raw().to_le_bytes()[..]);
                Defrag::Complete(frame)
            }
            None => Defrag::Discarded,
        }
    }

    /// Drops the partial frame whose deadline `event_id` was. Returns whether one was dropped.
    pub fn on_timeout(&mut self, event_id: EventId) -> bool {
        for entry in self.entries.iter_mut() {
            if entry.as_ref().map_or(false, |e| e.timer == event_id) {
                *entry = None;
                return true;
            }
        }
        false
    }

    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Empties the cache and returns the deadlines which are still armed.
    pub fn clear(&mut self) -> Vec<EventId> {
        self.entries.iter_mut().filter_map(|e| e.take()).map(|e| e.timer).collect()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        wlan_common::{assert_variant, timer::FakeScheduler},
    };

    const PEER: MacAddr = [2; 6];
    const TIMEOUT: Duration = Duration::from_secs(1);

    #[rustfmt::skip]
    fn fragment(seq_num: u16, frag_num: u8, more_frags: bool, body: &[u8]) -> Vec<u8> {
        let sc = SequenceControl::new(seq_num, frag_num).raw().to_le_bytes();
        let mut frame = vec![
            0x08, if more_frags { 0x06 } else { 0x02 }, // data, from DS, more fragments
            0, 0,
            1, 1, 1, 1, 1, 1,
            2, 2, 2, 2, 2, 2,
            3, 3, 3, 3, 3, 3,
            sc[0], sc[1],
        ];
        frame.extend_from_slice(body);
        frame
    }

    fn setup() -> (FakeScheduler, Timer<TimedEvent>, FragmentCache) {
        let scheduler = FakeScheduler::new();
        let timer = Timer::new(scheduler.as_scheduler());
        (scheduler, timer, FragmentCache::new(3))
    }

    #[test]
    fn reassembles_in_order_fragments() {
        let (scheduler, mut timer, mut cache) = setup();
        assert_eq!(cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 0, true, &[1, 2])[..]), Defrag::Pending);
        assert_eq!(scheduler.scheduled().len(), 1);
        assert_eq!(cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 1, true, &[3])[..]), Defrag::Pending);
        let frame = assert_variant!(
            cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 2, false, &[4, 5])[..]),
            Defrag::Complete(frame) => frame
        );
        assert_eq!(frame, fragment(7, 0, false, &[1, 2, 3, 4, 5]));
        // Completion cancels the deadline.
        assert!(scheduler.scheduled().is_empty());
        assert_eq!(cache.pending(), 0);
    }

    #[test]
    fn unfragmented_frame_passes_through() {
        let (_, mut timer, mut cache) = setup();
        let frame = fragment(1, 0, false, &[9]);
        assert_eq!(cache.add(&mut timer, PEER, TIMEOUT, &frame[..]), Defrag::Complete(frame));
    }

    #[test]
    fn out_of_order_fragment_is_discarded() {
        let (_, mut timer, mut cache) = setup();
        cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 0, true, &[1])[..]);
        assert_eq!(cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 2, false, &[3])[..]), Defrag::Discarded);
        // Duplicate of the first fragment's successor is accepted only once.
        assert_eq!(cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 1, true, &[2])[..]), Defrag::Pending);
        assert_eq!(cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 1, true, &[2])[..]), Defrag::Discarded);
        assert_variant!(
            cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 2, false, &[3])[..]),
            Defrag::Complete(frame) => assert_eq!(frame, fragment(7, 0, false, &[1, 2, 3]))
        );
        // A continuation without a first fragment is dropped.
        assert_eq!(cache.add(&mut timer, PEER, TIMEOUT, &fragment(9, 1, false, &[1])[..]), Defrag::Discarded);
    }

    #[test]
    fn address_mismatch_is_discarded() {
        let (_, mut timer, mut cache) = setup();
        cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 0, true, &[1])[..]);
        let mut other = fragment(7, 1, false, &[2]);
        other[10] = 0x42;
        assert_eq!(cache.add(&mut timer, PEER, TIMEOUT, &other[..]), Defrag::Discarded);
        assert_eq!(cache.pending(), 1);
    }

    #[test]
    fn timeout_yields_nothing() {
        let (scheduler, mut timer, mut cache) = setup();
        cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 0, true, &[1])[..]);
        let (event_id, after) = scheduler.scheduled()[0];
        assert_eq!(after, TIMEOUT);
        assert_variant!(timer.triggered(&event_id), Some(TimedEvent::Defrag { seq_num: 7, .. }));
        assert!(cache.on_timeout(event_id));
        assert!(!cache.on_timeout(event_id));
        assert_eq!(cache.add(&mut timer, PEER, TIMEOUT, &fragment(7, 1, false, &[2])[..]), Defrag::Discarded);
    }

    #[test]
    fn ring_reuses_oldest_slot() {
        let (scheduler, mut timer, mut cache) = setup();
        for seq in 1..=4 {
            cache.add(&mut timer, PEER, TIMEOUT, &fragment(seq, 0, true, &[seq as u8])[..]);
        }
        assert_eq!(cache.pending(), 3);
        assert_eq!(scheduler.scheduled().len(), 3);
        // Sequence 1 was evicted by sequence 4.
        assert_eq!(cache.add(&mut timer, PEER, TIMEOUT, &fragment(1, 1, false, &[0])[..]), Defrag::Discarded);
        assert_variant!(cache.add(&mut timer, PEER, TIMEOUT, &fragment(2, 1, false, &[0])[..]), Defrag::Complete(_));
        assert_eq!(cache.clear().len(), 2);
        assert_eq!(cache.pending(), 0);
    }
}

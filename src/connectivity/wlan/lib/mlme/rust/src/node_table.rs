// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Peers known to the station, keyed by MAC address.
//!
//! Nodes live in an arena; an ordered index maps addresses to arena slots. Callers that hold on
//! to a node across asynchronous work (e.g. until a transmit completes) acquire a `NodeRef`
//! and must hand it back through `release`. A node removed while referenced leaves the index
//! immediately but keeps its slot in state `Collect` until the last reference is released.

use {
    crate::{
        error::Error,
        node::{Node, NodeState},
        TimedEvent,
    },
    log::{debug, trace},
    std::collections::BTreeMap,
    wlan_common::{
        mac::{Bssid, MacAddr},
        timer::Timer,
    },
};

/// What `iterate` should do with the node just visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Keep,
    Remove,
}

/// Counted reference to a node. Not `Clone`: every acquired reference is released exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "node references must be released"]
pub struct NodeRef {
    slot: usize,
    addr: MacAddr,
}

impl NodeRef {
    pub fn addr(&self) -> MacAddr {
        self.addr
    }
}

#[derive(Debug)]
struct Slot {
    node: Node,
    refcount: usize,
    generation: u64,
}

#[derive(Debug)]
pub struct NodeTable {
    slots: Vec<Option<Slot>>,
    index: BTreeMap<MacAddr, usize>,
    capacity: usize,
    generation: u64,
    fragment_cache_size: usize,
}

impl NodeTable {
    pub fn new(capacity: usize, fragment_cache_size: usize) -> Self {
        Self {
            slots: vec![],
            index: BTreeMap::new(),
            capacity,
            generation: 0,
            fragment_cache_size,
        }
    }

    /// Number of nodes reachable by address.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Occupied arena slots, including nodes awaiting collection.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn find(&self, addr: &MacAddr) -> Option<&Node> {
        let slot = *self.index.get(addr)?;
        self.slots[slot].as_ref().map(|s| &s.node)
    }

    pub fn find_mut(&mut self, addr: &MacAddr) -> Option<&mut Node> {
        let slot = *self.index.get(addr)?;
        self.slots[slot].as_mut().map(|s| &mut s.node)
    }

    pub fn contains(&self, addr: &MacAddr) -> bool {
        self.index.contains_key(addr)
    }

    /// Starts a new scan generation. Cache nodes not touched during the new generation become
    /// eligible for eviction.
    pub fn next_scan_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Tags the node with the current scan generation.
    pub fn touch(&mut self, addr: &MacAddr) {
        if let Some(&slot) = self.index.get(addr) {
            if let Some(s) = self.slots[slot].as_mut() {
                s.generation = self.generation;
            }
        }
    }

    /// True if the node was already tagged during the current scan.
    pub fn seen_in_current_scan(&self, addr: &MacAddr) -> bool {
        self.index
            .get(addr)
            .and_then(|&slot| self.slots[slot].as_ref())
            .map_or(false, |s| s.generation == self.generation)
    }

    /// Returns the node for `addr`, creating it if unknown. A full table is swept for stale,
    /// unreferenced cache nodes first; `CapacityExceeded` if none can be reclaimed.
    pub fn alloc_or_reuse(&mut self, addr: MacAddr, bssid: Bssid) -> Result<&mut Node, Error> {
        if !self.contains(&addr) {
            let node = Node::new(addr, bssid, self.fragment_cache_size);
            self.insert(node)?;
        }
        self.find_mut(&addr).ok_or(Error::NodeNotFound(addr))
    }

    /// Adds `node`, replacing an unreferenced node with the same address.
    pub fn insert(&mut self, node: Node) -> Result<(), Error> {
        let addr = node.addr;
        if let Some(&slot) = self.index.get(&addr) {
            if let Some(s) = self.slots[slot].as_mut() {
                if s.refcount == 0 {
                    s.node = node;
                    s.generation = self.generation;
                    return Ok(());
                }
            }
            self.unlink(&addr);
        }
        if self.occupied() >= self.capacity && self.evict() == 0 {
            debug!("node table full; refusing {}", wlan_common::mac::fmt_addr(&addr));
            return Err(Error::CapacityExceeded(self.capacity));
        }
        let entry = Slot { node, refcount: 0, generation: self.generation };
        let slot = match self.slots.iter().position(|s| s.is_none()) {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.index.insert(addr, slot);
        Ok(())
    }

    /// Removes the node from the table. Returns it unless it is still referenced, in which
    /// case it is kept in state `Collect` until released.
    pub fn remove(&mut self, addr: &MacAddr) -> Option<Node> {
        let slot = self.index.remove(addr)?;
        self.take_or_collect(slot)
    }

    /// Looks up the transmitter of a frame, cloning the BSS node `bssid_hint` for transmitters
    /// not yet known. Clones inherit the BSS rates and are marked newly associated.
    pub fn find_or_fake(
        &mut self,
        addr: MacAddr,
        bssid_hint: &MacAddr,
    ) -> Result<&mut Node, Error> {
        if !self.contains(&addr) {
            let bss = self.find(bssid_hint).ok_or(Error::NoBssNode)?;
            let node = bss.clone_for(addr, self.fragment_cache_size);
            trace!("faking node {} from BSS", wlan_common::mac::fmt_addr(&addr));
            self.insert(node)?;
        }
        self.find_mut(&addr).ok_or(Error::NodeNotFound(addr))
    }

    /// Visits every node in address order. Nodes the visitor asks to remove are removed after
    /// the visit, subject to the same reference rules as `remove`.
    pub fn iterate<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Node) -> Visit,
    {
        let mut removed = vec![];
        for (addr, &slot) in self.index.iter() {
            if let Some(s) = self.slots[slot].as_mut() {
                if f(&mut s.node) == Visit::Remove {
                    removed.push(*addr);
                }
            }
        }
        for addr in removed {
            self.remove(&addr);
        }
    }

    /// Empties the table. Fragment caches and BlockAck state of every node are released along
    /// with their timers. Referenced nodes linger in `Collect` until released.
    pub fn purge_all(&mut self, timer: &mut Timer<TimedEvent>) {
        for s in self.slots.iter_mut().filter_map(|s| s.as_mut()) {
            s.node.release_caches(timer);
        }
        let addrs: Vec<MacAddr> = self.index.keys().copied().collect();
        for addr in addrs {
            self.remove(&addr);
        }
    }

    /// Takes a counted reference to the node.
    pub fn acquire(&mut self, addr: &MacAddr) -> Option<NodeRef> {
        let slot = *self.index.get(addr)?;
        let s = self.slots[slot].as_mut()?;
        s.refcount += 1;
        Some(NodeRef { slot, addr: *addr })
    }

    /// Gives back a reference. The last release of a collected node frees it.
    pub fn release(&mut self, node_ref: NodeRef) {
        let collect = match self.slots.get_mut(node_ref.slot).and_then(|s| s.as_mut()) {
            Some(s) if s.node.addr == node_ref.addr => {
                s.refcount = s.refcount.saturating_sub(1);
                s.refcount == 0 && s.node.state == NodeState::Collect
            }
            _ => false,
        };
        if collect {
            trace!("collecting node {}", wlan_common::mac::fmt_addr(&node_ref.addr));
            self.slots[node_ref.slot] = None;
        }
    }

    /// The node a reference points to, even once it is awaiting collection.
    pub fn get(&self, node_ref: &NodeRef) -> Option<&Node> {
        self.slots.get(node_ref.slot)?.as_ref().map(|s| &s.node)
    }

    pub fn get_mut(&mut self, node_ref: &NodeRef) -> Option<&mut Node> {
        self.slots.get_mut(node_ref.slot)?.as_mut().map(|s| &mut s.node)
    }

    pub fn refcount(&self, addr: &MacAddr) -> usize {
        self.index
            .get(addr)
            .and_then(|&slot| self.slots[slot].as_ref())
            .map_or(0, |s| s.refcount)
    }

    pub fn addrs(&self) -> Vec<MacAddr> {
        self.index.keys().copied().collect()
    }

    fn unlink(&mut self, addr: &MacAddr) {
        if let Some(slot) = self.index.remove(addr) {
            self.take_or_collect(slot);
        }
    }

    fn take_or_collect(&mut self, slot: usize) -> Option<Node> {
        let referenced = self.slots[slot].as_ref().map_or(false, |s| s.refcount > 0);
        if referenced {
            if let Some(s) = self.slots[slot].as_mut() {
                s.node.state = NodeState::Collect;
            }
            None
        } else {
            self.slots[slot].take().map(|s| s.node)
        }
    }

    /// Reclaims unreferenced cache nodes tagged with an older scan generation. Returns how many
    /// were reclaimed.
    fn evict(&mut self) -> usize {
        let generation = self.generation;
        let stale: Vec<MacAddr> = self
            .index
            .iter()
            .filter(|(_, &slot)| {
                self.slots[slot].as_ref().map_or(false, |s| {
                    s.refcount == 0 && s.node.state == NodeState::Cache && s.generation < generation
                })
            })
            .map(|(addr, _)| *addr)
            .collect();
        for addr in &stale {
            debug!("evicting stale node {}", wlan_common::mac::fmt_addr(addr));
            self.remove(addr);
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::block_ack::TxBlockAck,
        std::time::Duration,
        wlan_common::{assert_variant, timer::FakeScheduler},
    };

    const BSS: MacAddr = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01];

    fn addr(last: u8) -> MacAddr {
        [2, 0, 0, 0, 0, last]
    }

    #[test]
    fn alloc_find_remove() {
        let mut table = NodeTable::new(4, 3);
        assert!(table.is_empty());
        table.alloc_or_reuse(addr(1), Bssid(addr(1))).expect("alloc").rssi_dbm = -40;
        // Allocating again returns the same node.
        assert_eq!(table.alloc_or_reuse(addr(1), Bssid(addr(1))).expect("alloc").rssi_dbm, -40);
        assert_eq!(table.len(), 1);
        assert_eq!(table.find(&addr(1)).expect("node").rssi_dbm, -40);
        assert!(table.find(&addr(2)).is_none());

        let node = table.remove(&addr(1)).expect("unreferenced node is returned");
        assert_eq!(node.addr, addr(1));
        assert!(table.is_empty());
        assert!(table.remove(&addr(1)).is_none());
    }

    #[test]
    fn ordered_iteration_and_removal() {
        let mut table = NodeTable::new(8, 3);
        for last in &[5, 1, 3, 2] {
            table.alloc_or_reuse(addr(*last), Bssid(addr(*last))).expect("alloc");
        }
        let mut visited = vec![];
        table.iterate(|node| {
            visited.push(node.addr[5]);
            if node.addr[5] % 2 == 1 {
                Visit::Remove
            } else {
                Visit::Keep
            }
        });
        assert_eq!(visited, vec![1, 2, 3, 5]);
        assert_eq!(table.addrs(), vec![addr(2)]);
    }

    #[test]
    fn referenced_node_is_collected_on_release() {
        let mut table = NodeTable::new(4, 3);
        table.alloc_or_reuse(addr(1), Bssid(addr(1))).expect("alloc");
        let first = table.acquire(&addr(1)).expect("acquire");
        let second = table.acquire(&addr(1)).expect("acquire");
        assert_eq!(table.refcount(&addr(1)), 2);

        assert!(table.remove(&addr(1)).is_none());
        assert!(table.find(&addr(1)).is_none());
        assert_eq!(table.get(&first).expect("still alive").state, NodeState::Collect);
        assert_eq!(table.occupied(), 1);

        table.release(first);
        assert_eq!(table.occupied(), 1);
        table.release(second);
        assert_eq!(table.occupied(), 0);
    }

    #[test]
    fn released_live_node_stays() {
        let mut table = NodeTable::new(4, 3);
        table.alloc_or_reuse(addr(1), Bssid(addr(1))).expect("alloc");
        let node_ref = table.acquire(&addr(1)).expect("acquire");
        assert_eq!(node_ref.addr(), addr(1));
        table.release(node_ref);
        assert_eq!(table.refcount(&addr(1)), 0);
        assert!(table.contains(&addr(1)));
    }

    #[test]
    fn capacity_exceeded_without_stale_nodes() {
        let mut table = NodeTable::new(2, 3);
        table.alloc_or_reuse(addr(1), Bssid(addr(1))).expect("alloc");
        table.alloc_or_reuse(addr(2), Bssid(addr(2))).expect("alloc");
        assert_variant!(
            table.alloc_or_reuse(addr(3), Bssid(addr(3))),
            Err(Error::CapacityExceeded(2))
        );
    }

    #[test]
    fn eviction_reclaims_stale_cache_nodes() {
        let mut table = NodeTable::new(3, 3);
        table.alloc_or_reuse(addr(1), Bssid(addr(1))).expect("alloc");
        table.alloc_or_reuse(addr(2), Bssid(addr(2))).expect("alloc");
        table.alloc_or_reuse(addr(3), Bssid(addr(3))).expect("alloc").state = NodeState::Bss;

        table.next_scan_generation();
        table.touch(&addr(2));
        assert!(table.seen_in_current_scan(&addr(2)));
        assert!(!table.seen_in_current_scan(&addr(1)));
        table.alloc_or_reuse(addr(4), Bssid(addr(4))).expect("stale node 1 evicted");
        assert_eq!(table.addrs(), vec![addr(2), addr(3), addr(4)]);

        // Remaining nodes are current, referenced or not cache nodes.
        table.next_scan_generation();
        let held = table.acquire(&addr(2)).expect("acquire");
        table.touch(&addr(4));
        assert_variant!(
            table.alloc_or_reuse(addr(5), Bssid(addr(5))),
            Err(Error::CapacityExceeded(3))
        );
        table.release(held);
    }

    #[test]
    fn find_or_fake_clones_bss() {
        let mut table = NodeTable::new(4, 3);
        let bss = table.alloc_or_reuse(BSS, Bssid(BSS)).expect("alloc");
        bss.rates = vec![wlan_common::ie::SupportedRate(0x82)];
        bss.state = NodeState::Assoc;

        let node = table.find_or_fake(addr(9), &BSS).expect("faked");
        assert!(node.newly_associated);
        assert_eq!(node.bssid, Bssid(BSS));
        assert_eq!(node.rates, vec![wlan_common::ie::SupportedRate(0x82)]);
        // Known nodes are returned as is.
        assert!(!table.find_or_fake(BSS, &BSS).expect("bss").newly_associated);
        assert_eq!(table.len(), 2);

        assert_variant!(table.find_or_fake(addr(7), &addr(8)), Err(Error::NoBssNode));
    }

    #[test]
    fn purge_all_releases_caches() {
        let scheduler = FakeScheduler::new();
        let mut timer = Timer::new(scheduler.as_scheduler());
        let mut table = NodeTable::new(4, 3);
        let event = timer.schedule_after(
            Duration::from_secs(1),
            TimedEvent::TxBlockAckTimeout { peer: BSS, tid: 0 },
        );
        table.alloc_or_reuse(BSS, Bssid(BSS)).expect("alloc").tx_ba[0] =
            TxBlockAck::Requested { dialog_token: 1, timer: event };
        table.alloc_or_reuse(addr(1), Bssid(BSS)).expect("alloc");
        let held = table.acquire(&addr(1)).expect("acquire");

        table.purge_all(&mut timer);
        assert!(table.is_empty());
        assert!(scheduler.scheduled().is_empty());
        // The referenced node awaits its release.
        assert_eq!(table.occupied(), 1);
        table.release(held);
        assert_eq!(table.occupied(), 0);
    }

    #[test]
    fn insert_replaces_unreferenced_node() {
        let mut table = NodeTable::new(2, 3);
        table.alloc_or_reuse(addr(1), Bssid(addr(1))).expect("alloc").channel = 1;
        let mut node = Node::new(addr(1), Bssid(addr(1)), 3);
        node.channel = 6;
        table.insert(node).expect("insert");
        assert_eq!(table.find(&addr(1)).expect("node").channel, 6);
        assert_eq!(table.occupied(), 1);
    }
}

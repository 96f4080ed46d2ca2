// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Interfaces served by one process, keyed by a locally assigned id. Typically holds one
//! `ClientMlme` per driver interface.

use {
    crate::error::Error,
    log::info,
    std::collections::{btree_map, BTreeMap},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u16);

pub struct Registry<T> {
    devices: BTreeMap<DeviceId, T>,
    capacity: usize,
    next_id: u16,
}

impl<T> Registry<T> {
    pub fn new(capacity: usize) -> Self {
        Self { devices: BTreeMap::new(), capacity, next_id: 0 }
    }

    /// Registers a device under the lowest unused id at or after the last one handed out.
    pub fn add(&mut self, device: T) -> Result<DeviceId, Error> {
        if self.devices.len() >= self.capacity {
            return Err(Error::CapacityExceeded(self.capacity));
        }
        let mut id = DeviceId(self.next_id);
        while self.devices.contains_key(&id) {
            id = DeviceId(id.0.wrapping_add(1));
        }
        self.next_id = id.0.wrapping_add(1);
        self.devices.insert(id, device);
        info!("registered device {}", id.0);
        Ok(id)
    }

    pub fn remove(&mut self, id: DeviceId) -> Option<T> {
        let device = self.devices.remove(&id);
        if device.is_some() {
            info!("removed device {}", id.0);
        }
        device
    }

    pub fn get(&self, id: DeviceId) -> Option<&T> {
        self.devices.get(&id)
    }

    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut T> {
        self.devices.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in id order.
    pub fn iter(&self) -> btree_map::Iter<'_, DeviceId, T> {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, DeviceId, T> {
        self.devices.iter_mut()
    }
}

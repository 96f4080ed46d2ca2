// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub const PMKID_LEN: usize = 16;

/// IEEE Std 802.11-2016, 12.7.1.3: identifies a cached PMK security association.
pub type Pmkid = [u8; PMKID_LEN];

// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Per-node receive state that restores MSDU boundaries and order: the fragment cache
//! (defragmentation) and the Block-Ack reorder window.

mod fragment;
mod reorder;

pub use {fragment::*, reorder::*};

// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub mod exchange;
pub mod gtk;
pub mod igtk;
pub mod ptk;

pub trait Tk {
    fn tk(&self) -> &[u8];
}

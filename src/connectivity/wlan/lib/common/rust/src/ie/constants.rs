// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub const IE_HDR_LEN: usize = 2;
pub const IE_MAX_LEN: usize = 255;
pub const SSID_MAX_LEN: usize = 32;
pub const SUPPORTED_RATES_MAX_LEN: usize = 8;
pub const HT_CAPABILITIES_LEN: usize = 26;
pub const HT_OPERATION_LEN: usize = 22;
pub const EDCA_PARAM_SET_LEN: usize = 18;

// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

pub mod supplicant;

use crate::eapol;

/// The Group Key Handshake's first message is sent by the Authenticator with Ack and MIC set.
pub fn is_message_1(frame: &eapol::KeyFrame) -> bool {
    !frame.key_info.is_pairwise() && frame.key_info.key_ack() && frame.key_info.key_mic()
}

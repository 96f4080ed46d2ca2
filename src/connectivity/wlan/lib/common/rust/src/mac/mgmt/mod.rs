// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{buffer_reader::BufferReader, mac::MgmtSubtype},
    zerocopy::{ByteSlice, LayoutVerified},
};

mod fields;
mod reason;
mod status;

pub use {fields::*, reason::*, status::*};

/// Management frame bodies the station reacts to.
#[derive(Debug)]
pub enum MgmtBody<B: ByteSlice> {
    Beacon { bcn_hdr: LayoutVerified<B, BeaconHdr>, elements: B },
    ProbeResp { probe_resp_hdr: LayoutVerified<B, ProbeRespHdr>, elements: B },
    Authentication { auth_hdr: LayoutVerified<B, AuthHdr>, elements: B },
    AssociationResp { assoc_resp_hdr: LayoutVerified<B, AssocRespHdr>, elements: B },
    Deauthentication { deauth_hdr: LayoutVerified<B, DeauthHdr>, elements: B },
    Disassociation { disassoc_hdr: LayoutVerified<B, DisassocHdr>, elements: B },
    Action { action_hdr: LayoutVerified<B, ActionHdr>, elements: B },
    Unsupported { subtype: MgmtSubtype },
}

impl<B: ByteSlice> MgmtBody<B> {
    pub fn parse(subtype: MgmtSubtype, bytes: B) -> Option<Self> {
        let mut reader = BufferReader::new(bytes);
        match subtype {
            MgmtSubtype::BEACON => {
                let bcn_hdr = reader.read()?;
                Some(MgmtBody::Beacon { bcn_hdr, elements: reader.into_remaining() })
            }
            MgmtSubtype::PROBE_RESP => {
                let probe_resp_hdr = reader.read()?;
                Some(MgmtBody::ProbeResp { probe_resp_hdr, elements: reader.into_remaining() })
            }
            MgmtSubtype::AUTH => {
                let auth_hdr = reader.read()?;
                Some(MgmtBody::Authentication { auth_hdr, elements: reader.into_remaining() })
            }
            MgmtSubtype::ASSOC_RESP | MgmtSubtype::REASSOC_RESP => {
                let assoc_resp_hdr = reader.read()?;
                Some(MgmtBody::AssociationResp { assoc_resp_hdr, elements: reader.into_remaining() })
            }
            MgmtSubtype::DEAUTH => {
                let deauth_hdr = reader.read()?;
                Some(MgmtBody::Deauthentication { deauth_hdr, elements: reader.into_remaining() })
            }
            MgmtSubtype::DISASSOC => {
                let disassoc_hdr = reader.read()?;
                Some(MgmtBody::Disassociation { disassoc_hdr, elements: reader.into_remaining() })
            }
            MgmtSubtype::ACTION | MgmtSubtype::ACTION_NO_ACK => {
                let action_hdr = reader.read()?;
                Some(MgmtBody::Action { action_hdr, elements: reader.into_remaining() })
            }
            subtype => Some(MgmtBody::Unsupported { subtype }),
        }
    }
}

/// IEEE Std 802.11-2016, 11.13: robust management frames are protected once management frame
/// protection has been negotiated.
pub fn is_robust_mgmt_frame(subtype: MgmtSubtype, body: &[u8]) -> bool {
    match subtype {
        MgmtSubtype::DEAUTH | MgmtSubtype::DISASSOC => true,
        MgmtSubtype::ACTION | MgmtSubtype::ACTION_NO_ACK => match body.first() {
            Some(&category) => ActionCategory(category).is_robust(),
            None => false,
        },
        _ => false,
    }
}

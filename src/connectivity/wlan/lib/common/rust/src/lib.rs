// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Crate wlan-common hosts common libraries
//! to be used for WLAN SME, MLME, and binaries written in Rust.

#[macro_use]
mod packed_bits;

pub mod appendable;
pub mod big_endian;
pub mod buffer_reader;
pub mod buffer_writer;
pub mod data_writer;
pub mod error;
pub mod ie;
pub mod mac;
pub mod mgmt_writer;
pub mod organization;
pub mod sequence;
pub mod time;
pub mod timer;

/// Asserts that `$e` matches the given pattern(s) and optionally evaluates `$rhs` with the
/// pattern's bindings in scope. Panics with the unmatched value otherwise.
#[macro_export]
macro_rules! assert_variant {
    // Use custom formatting when panicking.
    ($test:expr, $variant:pat $( | $others:pat)* => $e:expr, $fmt:expr $(, $args:tt)* $(,)?) => {
        match $test {
            $variant $(| $others)* => $e,
            _ => panic!($fmt, $($args,)*),
        }
    };
    // Use default message when panicking.
    ($test:expr, $variant:pat $( | $others:pat)* => $e:expr $(,)?) => {
        match $test {
            $variant $(| $others)* => $e,
            other => panic!("unexpected variant: {:?}", other),
        }
    };
    // Custom error message.
    ($test:expr, $variant:pat $( | $others:pat)* , $fmt:expr $(, $args:tt)* $(,)?) => {
        $crate::assert_variant!($test, $variant $( | $others)* => {}, $fmt $(, $args)*)
    };
    // Default error message.
    ($test:expr, $variant:pat $( | $others:pat)* $(,)?) => {
        $crate::assert_variant!($test, $variant $( | $others)* => {})
    };
}

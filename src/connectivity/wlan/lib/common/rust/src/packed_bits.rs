// Copyright 2020 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

/// Declares a byte-aligned integer wrapper with single-bit flags and multi-bit fields.
///
/// Generated types are `#[repr(C, packed)]` so they can be embedded in packed frame headers and
/// borrowed from there without alignment concerns. Accessors always copy the wrapped value out
/// before operating on it.
macro_rules! packed_bits {
    (
        $(#[$attr:meta])*
        pub struct $name:ident($repr:ty);
        flags {
            $( $(#[$fdoc:meta])* $fget:ident, $fset:ident: $bit:literal; )*
        }
        fields {
            $( $(#[$doc:meta])* $get:ident, $set:ident: $ty:ty = $msb:literal, $lsb:literal; )*
        }
    ) => {
        $(#[$attr])*
        #[derive(
            zerocopy::AsBytes, zerocopy::FromBytes, zerocopy::Unaligned,
            Clone, Copy, PartialEq, Eq, Hash, Default,
        )]
        #[repr(C, packed)]
        pub struct $name(pub $repr);

        #[allow(dead_code)]
        impl $name {
            $(
                $(#[$fdoc])*
                pub fn $fget(&self) -> bool {
                    let raw = self.0;
                    raw & (1 << $bit) != 0
                }

                pub fn $fset(&mut self, value: bool) {
                    let raw = self.0;
                    self.0 = if value { raw | (1 << $bit) } else { raw & !(1 << $bit) };
                }
            )*
            $(
                $(#[$doc])*
                pub fn $get(&self) -> $ty {
                    let raw = self.0;
                    ((raw >> $lsb) & Self::mask($msb, $lsb)) as $ty
                }

                pub fn $set(&mut self, value: $ty) {
                    let raw = self.0;
                    let mask = Self::mask($msb, $lsb);
                    self.0 = (raw & !(mask << $lsb)) | (((value as $repr) & mask) << $lsb);
                }
            )*

            pub fn raw(&self) -> $repr {
                self.0
            }

            const fn mask(msb: u32, lsb: u32) -> $repr {
                <$repr>::MAX >> (<$repr>::BITS - (msb - lsb + 1))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let raw = self.0;
                write!(f, "{}({:#x})", stringify!($name), raw)
            }
        }
    };
}

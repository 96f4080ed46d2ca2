// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    thiserror::Error,
    zerocopy::{AsBytes, FromBytes, LayoutVerified, Unaligned},
};

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[error("buffer is too small")]
pub struct BufferTooSmall;

/// A destination for frame bytes. Writers append headers, bodies and elements in order.
pub trait Appendable {
    fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferTooSmall>;

    fn append_bytes_zeroed(&mut self, len: usize) -> Result<&mut [u8], BufferTooSmall>;

    fn bytes_written(&self) -> usize;

    fn can_append(&self, bytes: usize) -> bool;

    fn append_value<T>(&mut self, value: &T) -> Result<(), BufferTooSmall>
    where
        T: AsBytes + ?Sized,
    {
        self.append_bytes(value.as_bytes())
    }

    fn append_value_zeroed<T>(&mut self) -> Result<LayoutVerified<&mut [u8], T>, BufferTooSmall>
    where
        T: FromBytes + Unaligned,
    {
        let bytes = self.append_bytes_zeroed(std::mem::size_of::<T>())?;
        Ok(LayoutVerified::new_unaligned(bytes).ok_or(BufferTooSmall)?)
    }

    fn append_byte(&mut self, byte: u8) -> Result<(), BufferTooSmall> {
        self.append_bytes(&[byte])
    }
}

impl Appendable for Vec<u8> {
    fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferTooSmall> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn append_bytes_zeroed(&mut self, len: usize) -> Result<&mut [u8], BufferTooSmall> {
        let old_len = self.len();
        self.resize(old_len + len, 0);
        Ok(&mut self[old_len..])
    }

    fn bytes_written(&self) -> usize {
        self.len()
    }

    fn can_append(&self, _bytes: usize) -> bool {
        true
    }
}

impl<A: Appendable + ?Sized> Appendable for &mut A {
    fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferTooSmall> {
        (**self).append_bytes(bytes)
    }

    fn append_bytes_zeroed(&mut self, len: usize) -> Result<&mut [u8], BufferTooSmall> {
        (**self).append_bytes_zeroed(len)
    }

    fn bytes_written(&self) -> usize {
        (**self).bytes_written()
    }

    fn can_append(&self, bytes: usize) -> bool {
        (**self).can_append(bytes)
    }
}

// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::appendable::{Appendable, BufferTooSmall};

/// Writes into a fixed-size buffer, typically one lent by the driver for a single frame.
pub struct BufferWriter<B> {
    buf: B,
    written: usize,
}

impl<B: AsMut<[u8]> + AsRef<[u8]>> BufferWriter<B> {
    pub fn new(buf: B) -> Self {
        Self { buf, written: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.as_ref().len() - self.written
    }

    pub fn into_written(self) -> usize {
        self.written
    }

    pub fn written(&self) -> &[u8] {
        &self.buf.as_ref()[..self.written]
    }
}

impl<B: AsMut<[u8]> + AsRef<[u8]>> Appendable for BufferWriter<B> {
    fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferTooSmall> {
        let dst = self.append_bytes_zeroed(bytes.len())?;
        dst.copy_from_slice(bytes);
        Ok(())
    }

    fn append_bytes_zeroed(&mut self, len: usize) -> Result<&mut [u8], BufferTooSmall> {
        if !self.can_append(len) {
            return Err(BufferTooSmall);
        }
        let start = self.written;
        self.written += len;
        let dst = &mut self.buf.as_mut()[start..start + len];
        for b in dst.iter_mut() {
            *b = 0;
        }
        Ok(dst)
    }

    fn bytes_written(&self) -> usize {
        self.written
    }

    fn can_append(&self, bytes: usize) -> bool {
        self.remaining() >= bytes
    }
}

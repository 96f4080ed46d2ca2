// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::mem::size_of,
    zerocopy::{ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

pub struct BufferReader<B> {
    buffer: Option<B>,
    bytes_read: usize,
}

impl<B: ByteSlice> BufferReader<B> {
    pub fn new(bytes: B) -> Self {
        BufferReader { buffer: Some(bytes), bytes_read: 0 }
    }

    pub fn read<T: Unaligned + FromBytes>(&mut self) -> Option<LayoutVerified<B, T>> {
        self.read_bytes(size_of::<T>()).and_then(LayoutVerified::new_unaligned)
    }

    pub fn peek<T: Unaligned + FromBytes>(&self) -> Option<LayoutVerified<&[u8], T>> {
        let buffer = self.buffer.as_ref()?;
        LayoutVerified::new_unaligned_from_prefix(&buffer[..]).map(|(x, _)| x)
    }

    pub fn read_array<T: Unaligned + FromBytes>(
        &mut self,
        num_elems: usize,
    ) -> Option<LayoutVerified<B, [T]>> {
        self.read_bytes(size_of::<T>().checked_mul(num_elems)?)
            .and_then(LayoutVerified::new_slice_unaligned)
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        self.read_bytes(1).map(|bytes| bytes[0])
    }

    pub fn read_bytes(&mut self, len: usize) -> Option<B> {
        let buffer = self.buffer.take()?;
        if buffer.len() >= len {
            let (head, tail) = buffer.split_at(len);
            self.buffer = Some(tail);
            self.bytes_read += len;
            Some(head)
        } else {
            self.buffer = Some(buffer);
            None
        }
    }

    pub fn peek_bytes(&self, len: usize) -> Option<&[u8]> {
        let buffer = self.buffer.as_ref()?;
        if buffer.len() >= len {
            Some(&buffer[..len])
        } else {
            None
        }
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    pub fn bytes_remaining(&self) -> usize {
        self.buffer.as_ref().map(|b| b.len()).unwrap_or(0)
    }

    pub fn into_remaining(self) -> B {
        // The buffer is only ever taken transiently inside `read_bytes`.
        match self.buffer {
            Some(buffer) => buffer,
            None => unreachable!("buffer always restored"),
        }
    }
}

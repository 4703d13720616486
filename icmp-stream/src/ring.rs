//! Bounded byte ring buffer.
//!
//! Both the send and the receive side of a frame manager stage bytes in a
//! [`RingBuffer`].  Writers must check [`RingBuffer::space_left`] first:
//! a write that does not fit is refused as a whole, never truncated.

use std::collections::VecDeque;

#[derive(Debug)]
pub struct RingBuffer {
    buf: VecDeque<u8>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn space_left(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Append `data` if all of it fits.  Returns `false` (and writes nothing)
    /// otherwise.
    pub fn write(&mut self, data: &[u8]) -> bool {
        if data.len() > self.space_left() {
            return false;
        }
        self.buf.extend(data);
        true
    }

    /// Remove and return up to `n` bytes from the front.
    pub fn take(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.buf.len());
        self.buf.drain(..n).collect()
    }

    /// The longest contiguous run of readable bytes, without consuming them.
    ///
    /// May be shorter than [`RingBuffer::len`] when the data wraps; read it,
    /// [`skip`](RingBuffer::skip) what was consumed and call again.
    pub fn peek_contiguous(&self) -> &[u8] {
        self.buf.as_slices().0
    }

    /// Discard up to `n` bytes from the front.
    pub fn skip(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.drain(..n);
    }
}

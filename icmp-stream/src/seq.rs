//! Circular frame-id arithmetic.
//!
//! Frame ids live in `[0, max_id)` and wrap back to zero.  Wraparound is an
//! ordinary event at sustained throughput, so ids are never compared as raw
//! integers: every comparison is made relative to a cursor (the receiver's
//! `recv_id`), by normalising both operands to their forward distance from it.
//!
//! The acceptance range and the "old" range are both `window` ids wide and sit
//! on opposite sides of the cursor:
//!
//! ```text
//!          old                 in range
//!   ├──────────────────┤├──────────────────────┤
//!   cursor-window ... cursor-1  cursor ... cursor+window-1
//! ```

use std::cmp::Ordering;

/// Id space of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqSpace {
    max_id: u32,
}

impl SeqSpace {
    /// `max_id` must be at least 2; `FrameConfig::validate` guarantees ten
    /// times the window size.
    pub fn new(max_id: u32) -> Self {
        Self { max_id }
    }

    /// The id following `id`, wrapping to zero at `max_id`.
    #[inline]
    pub fn next(&self, id: u32) -> u32 {
        let n = id + 1;
        if n >= self.max_id {
            0
        } else {
            n
        }
    }

    /// Forward distance from `cursor` to `id`, in `[0, max_id)`.
    #[inline]
    pub fn distance(&self, cursor: u32, id: u32) -> u32 {
        let max = u64::from(self.max_id);
        ((u64::from(id) + max - u64::from(cursor) % max) % max) as u32
    }

    /// `true` when `id` lies in `[cursor, cursor + window)` modulo `max_id`.
    #[inline]
    pub fn in_range(&self, cursor: u32, id: u32, window: u32) -> bool {
        id < self.max_id && self.distance(cursor, id) < window
    }

    /// `true` when `id` is one of the `window` ids just before `cursor`,
    /// i.e. it was already delivered and can only be a retransmission.
    #[inline]
    pub fn is_old(&self, cursor: u32, id: u32, window: u32) -> bool {
        if id >= self.max_id {
            return false;
        }
        let back = self.distance(id, cursor);
        back >= 1 && back <= window
    }

    /// Order two ids by their distance from `cursor`.
    #[inline]
    pub fn compare(&self, cursor: u32, a: u32, b: u32) -> Ordering {
        self.distance(cursor, a).cmp(&self.distance(cursor, b))
    }
}

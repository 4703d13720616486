//! Receive side: reordering, in-order delivery and gap requests.
//!
//! [`Reassembler`] holds DATA frames that arrived ahead of the delivery
//! cursor `recv_id`, ordered by their circular distance from it.  Each tick
//! the caller:
//!
//! 1. [`admit`](Reassembler::admit)s every arrived DATA frame and acknowledges
//!    the ones whose [`Admission::should_ack`] is `true`;
//! 2. [`drain`](Reassembler::drain)s the contiguous prefix into the receive
//!    buffer;
//! 3. asks for [`gap_requests`](Reassembler::gap_requests) and sends them in
//!    a REQ frame.
//!
//! Compressed payloads are inflated on admission, so a frame that cannot be
//! inflated is never acknowledged and the sender's timeout resends it.  No
//! stored payload exceeds the frame payload limit, which bounds the window's
//! memory by `window_size * payload_limit`.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::compress;
use crate::frame::{DataFrame, DataKind};
use crate::ring::RingBuffer;
use crate::seq::SeqSpace;

/// Outcome of offering one DATA frame to the receive window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// New frame stored in the window.
    Accepted,
    /// Already waiting in the window.
    Duplicate,
    /// Already delivered; a retransmission whose ACK was lost.
    Old,
    /// Neither in range nor old.  Silently ignored.
    Dropped,
    /// Failed to inflate, or its payload exceeds the frame payload limit.
    Corrupt,
}

impl Admission {
    /// Whether the sender should be told to retire this id.
    pub fn should_ack(self) -> bool {
        matches!(self, Self::Accepted | Self::Duplicate | Self::Old)
    }
}

/// Result of one [`Reassembler::drain`] pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Drained {
    /// Frames consumed from the window.
    pub frames: usize,
    /// User bytes written to the receive buffer.
    pub bytes: usize,
    /// Control frames (CLOSE, CONN, CONNRSP) consumed, in stream order.
    pub signals: Vec<DataKind>,
}

/// Receive-side state for one connection.
#[derive(Debug)]
pub struct Reassembler {
    window: VecDeque<DataFrame>,
    recv_id: u32,
    window_size: u32,
    space: SeqSpace,
    /// Largest payload a stored frame may have, after inflation.
    payload_limit: usize,
    /// Last time each missing id was requested.
    requested: HashMap<u32, Instant>,
}

impl Reassembler {
    pub fn new(window_size: u32, space: SeqSpace, payload_limit: usize) -> Self {
        Self {
            window: VecDeque::new(),
            recv_id: 0,
            window_size,
            space,
            payload_limit,
            requested: HashMap::new(),
        }
    }

    /// Next id to be delivered.
    #[cfg(test)]
    fn recv_id(&self) -> u32 {
        self.recv_id
    }

    /// Frames waiting for a gap to close.
    pub fn buffered(&self) -> usize {
        self.window.len()
    }

    /// Ids waiting in the window, in delivery order.
    #[cfg(test)]
    fn buffered_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.window.iter().map(|f| f.id)
    }

    /// Offer an arrived DATA frame to the window.
    pub fn admit(&mut self, mut frame: DataFrame) -> Admission {
        let id = frame.id;
        if !self.space.in_range(self.recv_id, id, self.window_size) {
            if self.space.is_old(self.recv_id, id, self.window_size) {
                log::debug!("[frame] old id={id} recv_id={}", self.recv_id);
                return Admission::Old;
            }
            log::debug!("[frame] out of range id={id} recv_id={}", self.recv_id);
            return Admission::Dropped;
        }

        if self.window.iter().any(|f| f.id == id) {
            log::debug!("[frame] duplicate id={id}");
            return Admission::Duplicate;
        }

        if frame.compressed {
            match compress::decompress(&frame.payload, self.payload_limit) {
                Ok(raw) => {
                    frame.payload = raw;
                    frame.compressed = false;
                }
                Err(e) => {
                    log::warn!("[frame] dropping id={id}: {e}");
                    return Admission::Corrupt;
                }
            }
        } else if frame.payload.len() > self.payload_limit {
            log::warn!(
                "[frame] dropping id={id}: payload {} exceeds {}",
                frame.payload.len(),
                self.payload_limit
            );
            return Admission::Corrupt;
        }

        let cursor = self.recv_id;
        let space = self.space;
        match self
            .window
            .iter()
            .position(|f| space.compare(cursor, id, f.id).is_lt())
        {
            Some(pos) => self.window.insert(pos, frame),
            None => self.window.push_back(frame),
        }
        Admission::Accepted
    }

    /// Move the contiguous prefix of the window into `buf`.
    ///
    /// Stops at the first gap, or at a user frame that does not fit the
    /// remaining buffer space; that frame stays put until the application
    /// frees room.
    pub fn drain(&mut self, buf: &mut RingBuffer) -> Drained {
        let mut out = Drained::default();
        while let Some(front) = self.window.front() {
            if front.id != self.recv_id {
                break;
            }
            match front.kind {
                DataKind::UserData => {
                    if !buf.write(&front.payload) {
                        log::debug!(
                            "[frame] recv buffer full, deferring id={} len={}",
                            front.id,
                            front.payload.len()
                        );
                        break;
                    }
                    out.bytes += front.payload.len();
                }
                kind => out.signals.push(kind),
            }
            self.requested.remove(&self.recv_id);
            self.window.pop_front();
            self.recv_id = self.space.next(self.recv_id);
            out.frames += 1;
        }
        if out.frames > 0 {
            log::debug!(
                "[frame] delivered {} frame(s), {} byte(s), recv_id={}",
                out.frames,
                out.bytes,
                self.recv_id
            );
        }
        out
    }

    /// Missing ids worth asking for at `now`.
    ///
    /// Scans forward from `recv_id` up to the last buffered frame, at most
    /// `window_size` ids and `max_ids` results.  An id is skipped when it was
    /// already requested less than `rtt` ago.
    pub fn gap_requests(&mut self, now: Instant, rtt: Duration, max_ids: usize) -> Vec<u32> {
        let mut reqs = Vec::new();
        let mut expected = self.recv_id;
        let mut scanned = 0u32;

        'scan: for f in self.window.iter() {
            while expected != f.id {
                if scanned >= self.window_size || reqs.len() >= max_ids {
                    break 'scan;
                }
                let due = self
                    .requested
                    .get(&expected)
                    .map_or(true, |t| now.saturating_duration_since(*t) > rtt);
                if due {
                    reqs.push(expected);
                    self.requested.insert(expected, now);
                }
                expected = self.space.next(expected);
                scanned += 1;
            }
            expected = self.space.next(expected);
            scanned += 1;
        }
        reqs
    }
}

//! Send side: segmentation, the send window and retransmission selection.
//!
//! [`Segmenter`] cuts the application's send buffer into DATA frames, keeps
//! every frame in the window until the peer acknowledges it, and decides once
//! per tick which frames go (back) onto the wire.
//!
//! # Window contract
//!
//! - At most `window_size` frames are outstanding at once.
//! - Ids come from a monotonically increasing cursor (`send_id`) that wraps
//!   at `max_frame_id`.
//! - ACKs are **selective**: each names individual ids, in any order.
//! - There is no retry limit.  A frame is resent until acknowledged or until
//!   the owner discards the manager.
//!
//! This module only manages state; serialisation and I/O belong to the caller.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::compress::Compressor;
use crate::frame::{DataFrame, DataKind};
use crate::ring::RingBuffer;
use crate::seq::SeqSpace;

/// One outstanding frame in the send window.
#[derive(Debug, Clone)]
pub struct SendEntry {
    pub frame: DataFrame,
    /// Time of the most recent physical send; `None` until first sent.
    pub last_sent_at: Option<Instant>,
    /// Set when the peer explicitly asked for this id again.
    pub pending_resend: bool,
    /// Number of physical sends so far.
    pub tx_count: u32,
}

impl SendEntry {
    fn new(frame: DataFrame) -> Self {
        Self {
            frame,
            last_sent_at: None,
            pending_resend: false,
            tx_count: 0,
        }
    }
}

/// Send-side state for one connection.
///
/// ```text
///   oldest unacked                       send_id
///        │                                  │
///  ──────┼──────────────────────────────────┼──────────▶ id space (mod max)
///        │<──── window (≤ window_size) ────▶│<── next cut
/// ```
#[derive(Debug)]
pub struct Segmenter {
    window: VecDeque<SendEntry>,
    window_size: usize,
    max_payload: usize,
    space: SeqSpace,
    send_id: u32,
    compressor: Compressor,
    /// Payload-less frames (CONN, CONNRSP) waiting for window room.
    pending_control: VecDeque<DataKind>,
    close_sent: bool,
}

impl Segmenter {
    pub fn new(
        window_size: usize,
        max_payload: usize,
        space: SeqSpace,
        compressor: Compressor,
    ) -> Self {
        Self {
            window: VecDeque::with_capacity(window_size),
            window_size,
            max_payload,
            space,
            send_id: 0,
            compressor,
            pending_control: VecDeque::new(),
            close_sent: false,
        }
    }

    /// `true` when there is room for at least one more frame.
    pub fn has_room(&self) -> bool {
        self.window.len() < self.window_size
    }

    /// Number of frames awaiting acknowledgement.
    pub fn in_flight(&self) -> usize {
        self.window.len()
    }

    /// `true` once the CLOSE marker has been queued.
    pub fn close_sent(&self) -> bool {
        self.close_sent
    }

    /// Outstanding frames, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &SendEntry> {
        self.window.iter()
    }

    /// Queue a payload-less frame of `kind`; it enters the window at the next
    /// [`Segmenter::admit_control`] with room.
    pub fn queue_control(&mut self, kind: DataKind) {
        self.pending_control.push_back(kind);
    }

    /// Move queued control frames into the window while it has room.
    pub fn admit_control(&mut self) {
        while self.has_room() {
            let Some(kind) = self.pending_control.pop_front() else {
                break;
            };
            let id = self.push(kind, Vec::new(), false);
            log::debug!("[frame] queue {kind:?} id={id}");
        }
    }

    /// Cut buffered bytes from `buf` into frames.
    ///
    /// Full `max_payload` frames are cut first; a shorter tail is flushed in
    /// the same pass so short writes are not held back waiting for more
    /// data.  When `closing` and everything has been cut, exactly one CLOSE
    /// marker is queued over the lifetime of the segmenter.
    ///
    /// Returns the number of frames added to the window.
    pub fn cut(&mut self, buf: &mut RingBuffer, closing: bool) -> usize {
        self.admit_control();

        let mut added = 0;
        while !buf.is_empty() && self.has_room() {
            let chunk = buf.take(self.max_payload);
            let (payload, compressed) = self.compressor.maybe_compress(chunk);
            let id = self.push(DataKind::UserData, payload, compressed);
            log::debug!(
                "[frame] cut id={id} len={} compressed={compressed} win={}",
                self.window.back().map_or(0, |e| e.frame.payload.len()),
                self.window.len()
            );
            added += 1;
        }

        if closing && buf.is_empty() && !self.close_sent && self.has_room() {
            let id = self.push(DataKind::Close, Vec::new(), false);
            self.close_sent = true;
            log::debug!("[frame] queue CLOSE id={id}");
            added += 1;
        }
        added
    }

    fn push(&mut self, kind: DataKind, payload: Vec<u8>, compressed: bool) -> u32 {
        debug_assert!(self.has_room(), "push on a full send window");
        let id = self.send_id;
        self.send_id = self.space.next(id);
        self.window.push_back(SendEntry::new(DataFrame {
            id,
            kind,
            compressed,
            payload,
        }));
        id
    }

    /// Retire `id` after an ACK.  Returns `false` for ids not in the window.
    pub fn on_ack(&mut self, id: u32) -> bool {
        match self.window.iter().position(|e| e.frame.id == id) {
            Some(pos) => {
                self.window.remove(pos);
                log::debug!("[frame] acked id={id} win={}", self.window.len());
                true
            }
            None => false,
        }
    }

    /// Flag `id` for resend after a REQ.  Returns `false` for ids not in the
    /// window.
    pub fn on_req(&mut self, id: u32) -> bool {
        match self.window.iter_mut().find(|e| e.frame.id == id) {
            Some(entry) => {
                entry.pending_resend = true;
                true
            }
            None => false,
        }
    }

    /// Frames to put on the wire this tick.
    ///
    /// A frame is due when it was never sent, when the peer requested it, or
    /// when `resend_timeout` has passed since its last send.  In every case
    /// more than `rtt` must have passed since that send: nothing is resent
    /// faster than a round trip could confirm it.
    pub fn select_due(
        &mut self,
        now: Instant,
        resend_timeout: Duration,
        rtt: Duration,
    ) -> Vec<DataFrame> {
        let mut due = Vec::new();
        for entry in self.window.iter_mut() {
            let since = entry.last_sent_at.map(|t| now.saturating_duration_since(t));
            let wanted = entry.pending_resend || since.map_or(true, |s| s > resend_timeout);
            let paced = since.map_or(true, |s| s > rtt);
            if wanted && paced {
                entry.last_sent_at = Some(now);
                entry.pending_resend = false;
                entry.tx_count += 1;
                due.push(entry.frame.clone());
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn segmenter(window: usize, payload: usize) -> Segmenter {
        Segmenter::new(window, payload, SeqSpace::new(1_000_000), Compressor::new(0))
    }

    fn ids(s: &Segmenter) -> Vec<u32> {
        s.entries().map(|e| e.frame.id).collect()
    }

    #[test]
    fn cut_full_frames_and_tail() {
        let mut s = segmenter(4, 8);
        let mut buf = RingBuffer::new(64);
        buf.write(b"AAAAAAAABBBBBBBBCCCC");

        assert_eq!(s.cut(&mut buf, false), 3);
        let lens: Vec<usize> = s.entries().map(|e| e.frame.payload.len()).collect();
        assert_eq!(lens, vec![8, 8, 4]);
        assert_eq!(ids(&s), vec![0, 1, 2]);
        assert!(buf.is_empty());
    }

    #[test]
    fn cut_stops_at_window_size() {
        let mut s = segmenter(2, 4);
        let mut buf = RingBuffer::new(64);
        buf.write(&[0u8; 20]);

        assert_eq!(s.cut(&mut buf, false), 2);
        assert!(!s.has_room());
        assert_eq!(buf.len(), 12, "bytes stay buffered until the window drains");
    }

    #[test]
    fn ids_wrap_at_max() {
        let mut s = Segmenter::new(8, 1, SeqSpace::new(3), Compressor::new(0));
        let mut buf = RingBuffer::new(8);
        buf.write(b"abcd");
        s.cut(&mut buf, false);
        assert_eq!(ids(&s), vec![0, 1, 2, 0]);
    }

    #[test]
    fn close_marker_is_queued_once() {
        let mut s = segmenter(4, 8);
        let mut buf = RingBuffer::new(64);
        for _ in 0..5 {
            s.cut(&mut buf, true);
        }
        let closes = s
            .entries()
            .filter(|e| e.frame.kind == DataKind::Close)
            .count();
        assert_eq!(closes, 1);
        assert!(s.close_sent());
    }

    #[test]
    fn close_waits_for_buffered_data() {
        let mut s = segmenter(1, 4);
        let mut buf = RingBuffer::new(64);
        buf.write(b"12345678");
        s.cut(&mut buf, true);
        assert!(!s.close_sent(), "window full: data still buffered");

        assert!(s.on_ack(0));
        s.cut(&mut buf, true);
        assert!(!s.close_sent());

        assert!(s.on_ack(1));
        s.cut(&mut buf, true);
        assert!(s.close_sent());
        assert_eq!(s.entries().next().unwrap().frame.kind, DataKind::Close);
    }

    #[test]
    fn control_frames_wait_for_room() {
        let mut s = segmenter(1, 4);
        let mut buf = RingBuffer::new(64);
        buf.write(b"ab");
        s.cut(&mut buf, false);

        s.queue_control(DataKind::ConnRsp);
        s.admit_control();
        assert_eq!(s.in_flight(), 1);

        s.on_ack(0);
        s.admit_control();
        let entry = s.entries().next().unwrap();
        assert_eq!(entry.frame.kind, DataKind::ConnRsp);
        assert_eq!(entry.frame.id, 1);
        assert!(entry.frame.payload.is_empty());
    }

    #[test]
    fn ack_removes_only_named_id() {
        let mut s = segmenter(4, 1);
        let mut buf = RingBuffer::new(8);
        buf.write(b"xyz");
        s.cut(&mut buf, false);

        assert!(s.on_ack(1));
        assert!(!s.on_ack(1), "duplicate ACK is a no-op");
        assert!(!s.on_ack(99));
        assert_eq!(ids(&s), vec![0, 2]);
    }

    #[test]
    fn new_frames_are_due_immediately_then_wait_for_timeout() {
        let mut s = segmenter(4, 8);
        let mut buf = RingBuffer::new(64);
        buf.write(b"hello");
        s.cut(&mut buf, false);

        let t0 = Instant::now();
        assert_eq!(s.select_due(t0, 400 * MS, 50 * MS).len(), 1);
        assert!(s.select_due(t0 + 100 * MS, 400 * MS, 50 * MS).is_empty());
        assert_eq!(s.select_due(t0 + 401 * MS, 400 * MS, 50 * MS).len(), 1);
        assert_eq!(s.entries().next().unwrap().tx_count, 2);
    }

    #[test]
    fn req_forces_resend_but_respects_rtt() {
        let mut s = segmenter(4, 8);
        let mut buf = RingBuffer::new(64);
        buf.write(b"hello");
        s.cut(&mut buf, false);

        let t0 = Instant::now();
        s.select_due(t0, 400 * MS, 50 * MS);
        assert!(s.on_req(0));

        assert!(
            s.select_due(t0 + 20 * MS, 400 * MS, 50 * MS).is_empty(),
            "within one RTT of the last send"
        );
        let again = s.select_due(t0 + 60 * MS, 400 * MS, 50 * MS);
        assert_eq!(again.len(), 1);
        assert!(!s.entries().next().unwrap().pending_resend);
    }

    #[test]
    fn compression_flag_follows_payload() {
        let mut s = Segmenter::new(4, 512, SeqSpace::new(100), Compressor::new(32));
        let mut buf = RingBuffer::new(1024);
        buf.write(&[b'z'; 512]);
        buf.write(b"short");
        s.cut(&mut buf, false);

        let entries: Vec<&SendEntry> = s.entries().collect();
        assert!(entries[0].frame.compressed);
        assert!(entries[0].frame.payload.len() < 512);
        assert!(!entries[1].frame.compressed);
        assert_eq!(entries[1].frame.payload, b"short");
    }
}

//! The frame manager: one reliable, ordered byte stream per logical
//! connection, carried over a channel that loses, reorders and duplicates.
//!
//! # Tick
//!
//! The owner writes bytes in, calls [`FrameManager::update`] periodically
//! (every ~10 ms), sends whatever [`FrameManager::drain_ready_to_send_frames`]
//! returns and reads reassembled bytes out.  One tick:
//!
//! 1. cuts buffered send bytes into DATA frames (and the CLOSE marker);
//! 2. takes the inbox in one swap and classifies it (PING, PONG, REQ, ACK,
//!    DATA), answering PINGs and acknowledging admitted DATA with one ACK;
//! 3. drains contiguous DATA into the receive buffer and handles CLOSE, CONN
//!    and CONNRSP markers;
//! 4. requests gaps, at most once per RTT per id;
//! 5. selects DATA frames due for (re)transmission;
//! 6. emits a keepalive PING when one is due.
//!
//! # Contexts
//!
//! Only [`FrameManager::on_frame_received`] (or an [`InboxHandle`] obtained
//! from [`FrameManager::inbox`]) may be used from another context.  Every
//! other operation belongs to the tick's owner.  Nothing blocks.

use std::mem;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::ack::{self, Inbound};
use crate::compress::Compressor;
use crate::config::{ConfigError, FrameConfig, IdlePolicy};
use crate::frame::{DataKind, Frame};
use crate::inbox::InboxHandle;
use crate::reassembler::Reassembler;
use crate::ring::RingBuffer;
use crate::rtt::{Keepalive, RttEstimator};
use crate::segmenter::Segmenter;
use crate::seq::SeqSpace;
use crate::state::ConnectionState;
use crate::stats::FrameStats;

/// Caller errors on the write path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManagerError {
    /// The write does not fit; nothing was written.
    #[error("send buffer has room for {available} bytes, {requested} requested")]
    CapacityExceeded { requested: usize, available: usize },
    /// `close()` was already called; the stream accepts no more data.
    #[error("stream is closing")]
    Closing,
}

/// Reliable transport state for one connection.
#[derive(Debug)]
pub struct FrameManager {
    config: FrameConfig,

    send_buf: RingBuffer,
    recv_buf: RingBuffer,

    segmenter: Segmenter,
    reassembler: Reassembler,

    rtt: RttEstimator,
    keepalive: Keepalive,

    inbox: InboxHandle,
    outbound: Vec<Frame>,

    state: ConnectionState,
    connected: bool,
    close_requested: bool,
    remote_closed: bool,

    last_activity: Instant,
    stats: Option<FrameStats>,
    last_stats: Instant,
}

impl FrameManager {
    /// Create a manager whose clock starts now.
    pub fn new(config: FrameConfig) -> Result<Self, ConfigError> {
        Self::new_at(config, Instant::now())
    }

    /// Create a manager whose clock starts at `epoch`.
    pub fn new_at(config: FrameConfig, epoch: Instant) -> Result<Self, ConfigError> {
        config.validate()?;
        let space = SeqSpace::new(config.max_frame_id);
        let compressor = Compressor::new(config.compression_threshold);

        Ok(Self {
            send_buf: RingBuffer::new(config.buffer_capacity),
            recv_buf: RingBuffer::new(config.buffer_capacity),
            segmenter: Segmenter::new(
                config.window_size,
                config.max_frame_payload,
                space,
                compressor,
            ),
            reassembler: Reassembler::new(
                config.window_size as u32,
                space,
                config.max_frame_payload,
            ),
            rtt: RttEstimator::new(config.resend_timeout),
            keepalive: Keepalive::new(epoch, config.ping_interval),
            inbox: InboxHandle::new(),
            outbound: Vec::new(),
            state: ConnectionState::Unconnected,
            connected: false,
            close_requested: false,
            remote_closed: false,
            last_activity: epoch,
            stats: config.stats_enabled.then(FrameStats::default),
            last_stats: epoch,
            config,
        })
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Send path
    // -----------------------------------------------------------------------

    pub fn send_buffer_space_left(&self) -> usize {
        self.send_buf.space_left()
    }

    pub fn send_buffer_size(&self) -> usize {
        self.send_buf.len()
    }

    /// Stage `data` for sending.  All of it is accepted or none of it is.
    pub fn write_send_buffer(&mut self, data: &[u8]) -> Result<(), ManagerError> {
        if self.close_requested {
            return Err(ManagerError::Closing);
        }
        if !self.send_buf.write(data) {
            return Err(ManagerError::CapacityExceeded {
                requested: data.len(),
                available: self.send_buf.space_left(),
            });
        }
        log::debug!(
            "[frame] buffered {} byte(s), {} pending",
            data.len(),
            self.send_buf.len()
        );
        Ok(())
    }

    /// Take this tick's outbound frames for serialisation and transmission.
    pub fn drain_ready_to_send_frames(&mut self) -> Vec<Frame> {
        mem::take(&mut self.outbound)
    }

    // -----------------------------------------------------------------------
    // Receive path
    // -----------------------------------------------------------------------

    /// Queue one decoded inbound frame for the next tick.
    pub fn on_frame_received(&self, frame: Frame) {
        self.inbox.push(frame);
    }

    /// Handle for feeding inbound frames from another context.
    pub fn inbox(&self) -> InboxHandle {
        self.inbox.clone()
    }

    /// Reassembled bytes waiting for the application.
    pub fn recv_buffer_size(&self) -> usize {
        self.recv_buf.len()
    }

    /// The next contiguous run of reassembled bytes.  Not consumed until
    /// [`FrameManager::skip_recv_buffer`] is called.
    pub fn read_recv_buffer(&self) -> &[u8] {
        self.recv_buf.peek_contiguous()
    }

    pub fn skip_recv_buffer(&mut self, n: usize) {
        self.recv_buf.skip(n);
    }

    /// Copy out and consume up to `max` reassembled bytes.
    pub fn read_recv(&mut self, max: usize) -> Vec<u8> {
        self.recv_buf.take(max)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start the handshake.  No-op unless still unconnected.
    pub fn connect(&mut self) {
        if self.state == ConnectionState::Unconnected {
            self.segmenter.queue_control(DataKind::Conn);
            self.state = ConnectionState::Connecting;
            log::debug!("[frame] connecting");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Stop accepting writes and send CLOSE once everything buffered is out.
    pub fn close(&mut self) {
        if !self.close_requested {
            self.close_requested = true;
            self.state = ConnectionState::LocalClosing;
            log::debug!("[frame] close requested, {} byte(s) pending", self.send_buf.len());
        }
    }

    /// The peer's CLOSE has been reassembled: it will send no more data.
    pub fn is_remote_closed(&self) -> bool {
        self.remote_closed
    }

    /// `true` once the CLOSE marker has entered the send window.
    pub fn is_close_sent(&self) -> bool {
        self.segmenter.close_sent()
    }

    pub fn state(&self) -> ConnectionState {
        if self.state == ConnectionState::LocalClosing
            && self.segmenter.close_sent()
            && self.segmenter.in_flight() == 0
        {
            ConnectionState::Closed
        } else {
            self.state
        }
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Current smoothed round-trip estimate.
    pub fn rtt(&self) -> Duration {
        self.rtt.current()
    }

    /// Frames awaiting acknowledgement.
    pub fn in_flight(&self) -> usize {
        self.segmenter.in_flight()
    }

    /// Ids awaiting acknowledgement, oldest first.
    pub fn send_window_ids(&self) -> Vec<u32> {
        self.segmenter.entries().map(|e| e.frame.id).collect()
    }

    /// Payload lengths of the frames awaiting acknowledgement, oldest first.
    pub fn send_window_lens(&self) -> Vec<usize> {
        self.segmenter
            .entries()
            .map(|e| e.frame.payload.len())
            .collect()
    }

    /// Frames received ahead of a gap.
    pub fn reorder_buffered(&self) -> usize {
        self.reassembler.buffered()
    }

    pub fn stats(&self) -> Option<&FrameStats> {
        self.stats.as_ref()
    }

    /// When the last inbound frame was processed.
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Whether the peer has been silent for longer than the idle policy
    /// allows.  Always `false` under [`IdlePolicy::Disabled`].
    pub fn is_idle_at(&self, now: Instant) -> bool {
        match self.config.idle_policy {
            IdlePolicy::Disabled => false,
            IdlePolicy::After(limit) => now.saturating_duration_since(self.last_activity) > limit,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.is_idle_at(Instant::now())
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance one tick using the wall clock.
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Advance one tick as of `now`.
    pub fn update_at(&mut self, now: Instant) {
        self.outbound.clear();

        self.segmenter.cut(&mut self.send_buf, self.close_requested);

        let frames = self.inbox.take();
        if !frames.is_empty() {
            self.last_activity = now;
        }
        self.apply_inbound(Inbound::classify(frames), now);

        let drained = self.reassembler.drain(&mut self.recv_buf);
        for signal in drained.signals {
            self.on_signal(signal);
        }

        self.request_gaps(now);

        self.segmenter.admit_control();
        let due = self
            .segmenter
            .select_due(now, self.config.resend_timeout, self.rtt.current());
        for frame in due {
            if let Some(stats) = self.stats.as_mut() {
                stats.record_data_sent(frame.id);
            }
            log::debug!("[frame] → DATA id={} len={}", frame.id, frame.payload.len());
            self.outbound.push(Frame::Data(frame));
        }

        if let Some(stamp) = self.keepalive.poll(now) {
            self.outbound.push(Frame::Ping(stamp));
            if let Some(stats) = self.stats.as_mut() {
                stats.ping_sent += 1;
            }
        }

        self.log_stats(now);
    }

    fn apply_inbound(&mut self, inbound: Inbound, now: Instant) {
        for stamp in inbound.pings {
            self.outbound.push(Frame::Pong(stamp));
            if let Some(stats) = self.stats.as_mut() {
                stats.ping_recv += 1;
                stats.pong_sent += 1;
            }
        }

        for stamp in inbound.pongs {
            if let Some(sample) = self.keepalive.sample(stamp, now) {
                self.rtt.on_sample(sample);
                log::debug!(
                    "[frame] ← PONG sample={sample:?} rtt={:?}",
                    self.rtt.current()
                );
                if let Some(stats) = self.stats.as_mut() {
                    stats.pong_recv += 1;
                }
            }
        }

        for id in inbound.reqs {
            if self.segmenter.on_req(id) {
                log::debug!("[frame] ← REQ id={id}");
            }
            if let Some(stats) = self.stats.as_mut() {
                stats.record_req_recv(id);
            }
        }

        for id in inbound.acks {
            self.segmenter.on_ack(id);
            if let Some(stats) = self.stats.as_mut() {
                stats.ack_recv += 1;
            }
        }

        let mut to_ack = Vec::new();
        for frame in inbound.data {
            let id = frame.id;
            if let Some(stats) = self.stats.as_mut() {
                stats.record_data_recv(id);
            }
            if self.reassembler.admit(frame).should_ack() {
                to_ack.push(id);
            }
        }
        if !to_ack.is_empty() {
            log::debug!("[frame] → ACK {to_ack:?}");
            if let Some(stats) = self.stats.as_mut() {
                stats.ack_sent += to_ack.len() as u64;
            }
            let per_frame = ack::ids_per_frame(self.config.max_frame_payload);
            self.outbound
                .extend(ack::pack_ids(&to_ack, per_frame, Frame::Ack));
        }
    }

    fn on_signal(&mut self, kind: DataKind) {
        match kind {
            DataKind::Close => {
                self.remote_closed = true;
                log::debug!("[frame] ← CLOSE");
            }
            DataKind::Conn => {
                self.segmenter.queue_control(DataKind::ConnRsp);
                self.mark_connected();
                log::debug!("[frame] ← CONN; → CONNRSP");
            }
            DataKind::ConnRsp => {
                self.mark_connected();
                log::debug!("[frame] ← CONNRSP");
            }
            DataKind::UserData => {}
        }
    }

    fn mark_connected(&mut self) {
        self.connected = true;
        if self.state.awaiting_handshake() {
            self.state = ConnectionState::Connected;
        }
    }

    fn request_gaps(&mut self, now: Instant) {
        let per_frame = ack::ids_per_frame(self.config.max_frame_payload);
        let gaps = self
            .reassembler
            .gap_requests(now, self.rtt.current(), per_frame);
        if gaps.is_empty() {
            return;
        }
        log::debug!("[frame] → REQ {gaps:?}");
        if let Some(stats) = self.stats.as_mut() {
            for id in &gaps {
                stats.record_req_sent(*id);
            }
        }
        self.outbound
            .extend(ack::pack_ids(&gaps, per_frame, Frame::Req));
    }

    fn log_stats(&mut self, now: Instant) {
        let Some(stats) = self.stats.as_mut() else {
            return;
        };
        if now.saturating_duration_since(self.last_stats) > self.config.stats_interval {
            self.last_stats = now;
            log::info!("[frame] stats {stats}");
            stats.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::DataFrame;

    const MS: Duration = Duration::from_millis(1);

    fn small_config() -> FrameConfig {
        FrameConfig {
            max_frame_payload: 8,
            window_size: 4,
            buffer_capacity: 64,
            ..FrameConfig::default()
        }
    }

    fn data_ids(frames: &[Frame]) -> Vec<u32> {
        frames
            .iter()
            .filter_map(|f| match f {
                Frame::Data(d) => Some(d.id),
                _ => None,
            })
            .collect()
    }

    /// Deliver every frame `from` has ready into `to`.
    fn pump(from: &mut FrameManager, to: &FrameManager) {
        for f in from.drain_ready_to_send_frames() {
            to.on_frame_received(f);
        }
    }

    #[test]
    fn selective_ack_and_timeout_resend() {
        let t0 = Instant::now();
        let mut m = FrameManager::new_at(small_config(), t0).unwrap();
        m.write_send_buffer(b"AAAAAAAABBBBBBBBCCCC").unwrap();

        m.update_at(t0);
        assert_eq!(m.send_window_ids(), vec![0, 1, 2]);
        assert_eq!(m.send_window_lens(), vec![8, 8, 4]);
        assert_eq!(data_ids(&m.drain_ready_to_send_frames()), vec![0, 1, 2]);

        m.on_frame_received(Frame::Ack(vec![1]));
        m.update_at(t0 + 10 * MS);
        assert_eq!(m.send_window_ids(), vec![0, 2]);
        assert!(m.drain_ready_to_send_frames().is_empty());

        m.update_at(t0 + 401 * MS);
        assert_eq!(data_ids(&m.drain_ready_to_send_frames()), vec![0, 2]);
    }

    #[test]
    fn write_beyond_capacity_is_refused_whole() {
        let mut m = FrameManager::new(small_config()).unwrap();
        m.write_send_buffer(&[0u8; 60]).unwrap();
        assert_eq!(m.send_buffer_space_left(), 4);
        assert_eq!(
            m.write_send_buffer(&[0u8; 5]),
            Err(ManagerError::CapacityExceeded {
                requested: 5,
                available: 4
            })
        );
        assert_eq!(m.send_buffer_size(), 60);
    }

    #[test]
    fn window_is_bounded_when_nothing_is_acked() {
        let t0 = Instant::now();
        let mut m = FrameManager::new_at(small_config(), t0).unwrap();
        for tick in 0..50u32 {
            let room = m.send_buffer_space_left();
            m.write_send_buffer(&vec![7u8; room]).unwrap();
            m.update_at(t0 + tick * 100 * MS);
            assert!(m.in_flight() <= 4);
        }
        assert_eq!(m.in_flight(), 4);
        assert_eq!(m.send_buffer_space_left(), 0);
    }

    #[test]
    fn close_marker_is_queued_exactly_once() {
        let t0 = Instant::now();
        let mut m = FrameManager::new_at(small_config(), t0).unwrap();
        m.close();
        assert_eq!(m.state(), ConnectionState::LocalClosing);

        let mut closes = 0;
        for tick in 0..20u32 {
            m.update_at(t0 + tick * 500 * MS);
            closes += m
                .drain_ready_to_send_frames()
                .iter()
                .filter(|f| matches!(f, Frame::Data(d) if d.kind == DataKind::Close))
                .count();
        }
        assert!(m.is_close_sent());
        assert_eq!(m.in_flight(), 1, "one CLOSE frame, resent but never duplicated");
        assert!(closes > 1, "the single CLOSE frame is retransmitted");
        assert_eq!(m.send_window_ids(), vec![0]);

        m.on_frame_received(Frame::Ack(vec![0]));
        m.update_at(t0 + 20 * 500 * MS);
        assert_eq!(m.state(), ConnectionState::Closed);
    }

    #[test]
    fn writes_after_close_are_refused() {
        let mut m = FrameManager::new(small_config()).unwrap();
        m.close();
        assert_eq!(m.write_send_buffer(b"late"), Err(ManagerError::Closing));
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let t0 = Instant::now();
        let mut m = FrameManager::new_at(small_config(), t0).unwrap();
        m.on_frame_received(Frame::Ping(12345));
        m.update_at(t0 + MS);
        assert_eq!(m.drain_ready_to_send_frames(), vec![Frame::Pong(12345)]);
    }

    #[test]
    fn pong_updates_rtt() {
        let t0 = Instant::now();
        let mut m = FrameManager::new_at(small_config(), t0).unwrap();
        m.update_at(t0 + 1001 * MS);
        let stamp = m
            .drain_ready_to_send_frames()
            .into_iter()
            .find_map(|f| match f {
                Frame::Ping(ts) => Some(ts),
                _ => None,
            })
            .expect("keepalive ping");

        m.on_frame_received(Frame::Pong(stamp));
        m.update_at(t0 + 1101 * MS);
        assert_eq!(m.rtt(), (400 * MS + 100 * MS) / 2);
    }

    #[test]
    fn duplicate_data_is_acked_twice_and_delivered_once() {
        let t0 = Instant::now();
        let mut m = FrameManager::new_at(small_config(), t0).unwrap();
        let frame = Frame::Data(DataFrame::user(0, b"once".to_vec()));

        m.on_frame_received(frame.clone());
        m.update_at(t0 + MS);
        assert!(m
            .drain_ready_to_send_frames()
            .contains(&Frame::Ack(vec![0])));

        m.on_frame_received(frame);
        m.update_at(t0 + 2 * MS);
        assert!(m
            .drain_ready_to_send_frames()
            .contains(&Frame::Ack(vec![0])));

        assert_eq!(m.read_recv(100), b"once");
    }

    #[test]
    fn frames_larger_than_the_payload_limit_are_not_acked() {
        let t0 = Instant::now();
        let mut m = FrameManager::new_at(small_config(), t0).unwrap();
        // A few bytes on the wire that inflate far past eight.
        let bomb = zstd::bulk::compress(&vec![0u8; 64 * 1024], 3).unwrap();
        assert!(bomb.len() < 64);
        m.on_frame_received(Frame::Data(DataFrame {
            id: 0,
            kind: DataKind::UserData,
            compressed: true,
            payload: bomb,
        }));
        m.on_frame_received(Frame::Data(DataFrame::user(1, vec![7u8; 9])));
        m.update_at(t0 + MS);

        assert!(!m
            .drain_ready_to_send_frames()
            .iter()
            .any(|f| matches!(f, Frame::Ack(_))));
        assert_eq!(m.reorder_buffered(), 0);
        assert_eq!(m.recv_buffer_size(), 0);
    }

    #[test]
    fn admitted_frames_share_one_ack() {
        let t0 = Instant::now();
        let mut m = FrameManager::new_at(small_config(), t0).unwrap();
        for id in [2, 0, 1] {
            m.on_frame_received(Frame::Data(DataFrame::user(id, vec![b'a' + id as u8])));
        }
        m.on_frame_received(Frame::Data(DataFrame::user(900, b"far".to_vec())));
        m.update_at(t0 + MS);

        let acks: Vec<Frame> = m
            .drain_ready_to_send_frames()
            .into_iter()
            .filter(|f| matches!(f, Frame::Ack(_)))
            .collect();
        // Eight-byte payloads carry two ids per ACK frame.
        assert_eq!(acks, vec![Frame::Ack(vec![2, 0]), Frame::Ack(vec![1])]);
        assert_eq!(m.read_recv(10), b"abc");
    }

    #[test]
    fn gap_produces_req() {
        let t0 = Instant::now();
        let mut m = FrameManager::new_at(small_config(), t0).unwrap();
        m.on_frame_received(Frame::Data(DataFrame::user(2, b"c".to_vec())));
        m.update_at(t0 + MS);
        let out = m.drain_ready_to_send_frames();
        assert!(out.contains(&Frame::Req(vec![0, 1])));
        assert_eq!(m.reorder_buffered(), 1);
    }

    #[test]
    fn handshake_connects_both_sides() {
        let t0 = Instant::now();
        let mut client = FrameManager::new_at(small_config(), t0).unwrap();
        let mut server = FrameManager::new_at(small_config(), t0).unwrap();

        client.connect();
        assert_eq!(client.state(), ConnectionState::Connecting);

        client.update_at(t0);
        pump(&mut client, &server);
        server.update_at(t0 + MS);
        assert!(server.is_connected());
        assert_eq!(server.state(), ConnectionState::Connected);

        pump(&mut server, &client);
        client.update_at(t0 + 2 * MS);
        assert!(client.is_connected());
        assert_eq!(client.state(), ConnectionState::Connected);
    }

    #[test]
    fn remote_close_is_flagged() {
        let t0 = Instant::now();
        let mut a = FrameManager::new_at(small_config(), t0).unwrap();
        let mut b = FrameManager::new_at(small_config(), t0).unwrap();

        a.write_send_buffer(b"bye").unwrap();
        a.close();
        a.update_at(t0);
        pump(&mut a, &b);
        b.update_at(t0 + MS);

        assert!(b.is_remote_closed());
        assert_eq!(b.read_recv(10), b"bye");
        assert!(!b.is_connected(), "no handshake happened");

        pump(&mut b, &a);
        a.update_at(t0 + 2 * MS);
        assert_eq!(a.state(), ConnectionState::Closed);
    }

    #[test]
    fn full_recv_buffer_withholds_delivery() {
        let t0 = Instant::now();
        let cfg = FrameConfig {
            max_frame_payload: 20,
            ..small_config()
        };
        let mut m = FrameManager::new_at(cfg, t0).unwrap();
        for id in 0..4u32 {
            m.on_frame_received(Frame::Data(DataFrame::user(id, vec![id as u8; 20])));
        }
        m.update_at(t0 + MS);
        assert_eq!(m.recv_buffer_size(), 60);
        assert_eq!(m.reorder_buffered(), 1);

        m.skip_recv_buffer(20);
        m.update_at(t0 + 2 * MS);
        assert_eq!(m.recv_buffer_size(), 60);
        assert_eq!(m.reorder_buffered(), 0);
    }

    #[test]
    fn idle_policy_is_explicit() {
        let t0 = Instant::now();
        let disabled = FrameManager::new_at(small_config(), t0).unwrap();
        assert!(!disabled.is_idle_at(t0 + Duration::from_secs(3600)));

        let cfg = FrameConfig {
            idle_policy: IdlePolicy::After(Duration::from_secs(5)),
            ..small_config()
        };
        let mut m = FrameManager::new_at(cfg, t0).unwrap();
        assert!(!m.is_idle_at(t0 + Duration::from_secs(4)));
        assert!(m.is_idle_at(t0 + Duration::from_secs(6)));

        m.on_frame_received(Frame::Ping(0));
        m.update_at(t0 + Duration::from_secs(6));
        assert!(!m.is_idle_at(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn stats_count_traffic_when_enabled() {
        let t0 = Instant::now();
        let cfg = FrameConfig {
            stats_enabled: true,
            stats_interval: Duration::from_secs(3600),
            ..small_config()
        };
        let mut m = FrameManager::new_at(cfg, t0).unwrap();
        m.write_send_buffer(b"hello").unwrap();
        m.on_frame_received(Frame::Data(DataFrame::user(0, b"x".to_vec())));
        m.on_frame_received(Frame::Ping(1));
        m.update_at(t0 + MS);

        let s = m.stats().expect("stats enabled");
        assert_eq!(s.data_sent, 1);
        assert_eq!(s.data_recv, 1);
        assert_eq!(s.ack_sent, 1);
        assert_eq!(s.ping_recv, 1);
        assert_eq!(s.pong_sent, 1);

        assert!(FrameManager::new(small_config()).unwrap().stats().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = FrameConfig {
            window_size: 0,
            ..FrameConfig::default()
        };
        assert_eq!(FrameManager::new(cfg).unwrap_err(), ConfigError::EmptyWindow);

        let cfg = FrameConfig {
            max_frame_payload: 0,
            ..FrameConfig::default()
        };
        assert!(matches!(
            FrameManager::new(cfg),
            Err(ConfigError::FramePayload { got: 0, .. })
        ));
    }
}

//! Async session: a [`FrameManager`] driven by a tokio task over a
//! [`Socket`].
//!
//! ```text
//!   app ──send()──▶ mpsc ──▶ ┌──────────────┐ ──frames──▶ Socket ──▶ peer
//!                            │ driver task  │
//!   app ◀──recv()── mpsc ◀── │ FrameManager │ ◀──frames── Socket ◀── peer
//!                            └──────────────┘
//!                              10 ms tick
//! ```
//!
//! The driver multiplexes three branches with `tokio::select!`: inbound
//! datagrams (fed to the manager's inbox), application writes (pulled only
//! while the send buffer has room) and the tick.  Reassembled bytes go to
//! the application through a bounded channel; when it is full, bytes stay in
//! the receive buffer and the peer's window stalls.
//!
//! Once the local side closes, the peer has `close_grace` to acknowledge the
//! CLOSE and close its own side, after which the driver gives up with
//! [`SessionError::CloseTimeout`].

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::{ConfigError, FrameConfig, IdlePolicy};
use crate::manager::FrameManager;
use crate::socket::{Socket, SocketError};
use crate::state::ConnectionState;

/// Tick period of the driver.
pub const TICK: Duration = Duration::from_millis(10);

/// How long a finished session keeps answering the peer, so a lost ACK of
/// its CLOSE can still be repaired.
pub const LINGER: Duration = Duration::from_secs(1);

/// Largest chunk handed to the application per `recv()`.
const READ_CHUNK: usize = 16 * 1024;

/// Depth of the application channels, in chunks.
const CHANNEL_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Socket(#[from] SocketError),
    /// The write side was closed, or the driver has exited.
    #[error("session is closed")]
    Closed,
    #[error("peer idle for longer than {0:?}")]
    Idle(Duration),
    /// The close handshake did not complete within `FrameConfig::close_grace`.
    #[error("close not completed within {0:?}")]
    CloseTimeout(Duration),
    #[error("driver task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Handle to a running session.
#[derive(Debug)]
pub struct Session {
    peer: SocketAddr,
    writer: Option<mpsc::Sender<Vec<u8>>>,
    reader: mpsc::Receiver<Vec<u8>>,
    task: JoinHandle<Result<(), SessionError>>,
}

impl Session {
    /// Open a session to `peer`, starting the handshake.
    pub fn connect(
        socket: Socket,
        peer: SocketAddr,
        config: FrameConfig,
    ) -> Result<Self, SessionError> {
        let mut manager = FrameManager::new(config)?;
        manager.connect();
        log::info!("[session] connecting {} → {peer}", socket.local_addr);
        Ok(Self::spawn(socket, peer, manager))
    }

    /// Wait for the first valid frame on `socket` and open a session to its
    /// sender.
    pub async fn accept(socket: Socket, config: FrameConfig) -> Result<Self, SessionError> {
        let manager = FrameManager::new(config)?;
        let peer = loop {
            match socket.recv_from().await {
                Ok((frame, from)) => {
                    manager.on_frame_received(frame);
                    break from;
                }
                Err(SocketError::Frame(e)) => {
                    log::warn!("[session] ignoring malformed datagram: {e}");
                }
                Err(e) => return Err(e.into()),
            }
        };
        log::info!("[session] accepted {peer} on {}", socket.local_addr);
        Ok(Self::spawn(socket, peer, manager))
    }

    /// Run `manager` over `socket` in a background task.
    pub fn spawn(socket: Socket, peer: SocketAddr, manager: FrameManager) -> Self {
        let (writer, app_rx) = mpsc::channel(CHANNEL_DEPTH);
        let (app_tx, reader) = mpsc::channel(CHANNEL_DEPTH);
        let driver = Driver {
            socket,
            peer,
            manager,
            app_rx,
            app_tx,
            pending: Vec::new(),
            app_open: true,
        };
        Self {
            peer,
            writer: Some(writer),
            reader,
            task: tokio::spawn(driver.run()),
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Queue bytes for the peer.  Waits while the session is back-pressured.
    pub async fn send(&self, data: Vec<u8>) -> Result<(), SessionError> {
        let writer = self.writer.as_ref().ok_or(SessionError::Closed)?;
        writer.send(data).await.map_err(|_| SessionError::Closed)
    }

    /// Next chunk of bytes from the peer; `None` once the session has ended
    /// and everything was delivered.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.reader.recv().await
    }

    /// Signal end of stream.  Bytes already sent are still delivered.
    pub fn close(&mut self) {
        self.writer = None;
    }

    /// Close, then wait for the driver to finish.
    pub async fn finish(mut self) -> Result<(), SessionError> {
        self.close();
        drop(self.reader);
        self.task.await?
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

struct Driver {
    socket: Socket,
    peer: SocketAddr,
    manager: FrameManager,
    app_rx: mpsc::Receiver<Vec<u8>>,
    app_tx: mpsc::Sender<Vec<u8>>,
    /// Bytes taken from the application that did not fit the send buffer.
    pending: Vec<u8>,
    app_open: bool,
}

impl Driver {
    async fn run(mut self) -> Result<(), SessionError> {
        let inbox = self.manager.inbox();
        let mut tick = tokio::time::interval(TICK);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut linger_until: Option<Instant> = None;
        let mut close_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                res = self.socket.recv_from() => match res {
                    Ok((frame, from)) if from == self.peer => inbox.push(frame),
                    Ok((_, from)) => log::debug!("[session] ignoring datagram from {from}"),
                    Err(SocketError::Frame(e)) => {
                        log::warn!("[session] dropping malformed datagram: {e}");
                    }
                    Err(e) => return Err(e.into()),
                },

                msg = self.app_rx.recv(), if self.app_open && self.pending.is_empty() => {
                    match msg {
                        Some(data) => {
                            self.pending = data;
                            self.stage_pending();
                        }
                        None => {
                            log::debug!("[session] application closed the write side");
                            self.app_open = false;
                        }
                    }
                }

                _ = tick.tick() => {
                    self.stage_pending();
                    if !self.app_open && self.pending.is_empty() && close_deadline.is_none() {
                        self.manager.close();
                        close_deadline = Some(Instant::now() + self.manager.config().close_grace);
                    }

                    self.manager.update();
                    self.flush_outbound().await;
                    self.deliver();

                    if let IdlePolicy::After(limit) = self.manager.config().idle_policy {
                        if self.manager.is_idle() {
                            log::warn!("[session] peer {} idle, giving up", self.peer);
                            return Err(SessionError::Idle(limit));
                        }
                    }

                    match linger_until {
                        Some(deadline) if Instant::now() >= deadline => break,
                        Some(_) => {}
                        None if self.finished() => {
                            log::info!("[session] closed both ways with {}", self.peer);
                            linger_until = Some(Instant::now() + LINGER);
                        }
                        None => {
                            if close_deadline.is_some_and(|d| Instant::now() >= d) {
                                let grace = self.manager.config().close_grace;
                                log::warn!("[session] {} never completed the close", self.peer);
                                return Err(SessionError::CloseTimeout(grace));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Move as much of `pending` into the send buffer as fits.
    fn stage_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let n = self.pending.len().min(self.manager.send_buffer_space_left());
        if n == 0 {
            return;
        }
        if self.manager.write_send_buffer(&self.pending[..n]).is_ok() {
            self.pending.drain(..n);
        }
    }

    async fn flush_outbound(&mut self) {
        for frame in self.manager.drain_ready_to_send_frames() {
            // The path is lossy anyway; a failed send is just another loss.
            if let Err(e) = self.socket.send_to(&frame, self.peer).await {
                log::warn!("[session] send {} failed: {e}", frame.name());
            }
        }
    }

    /// Hand reassembled bytes to the application while it has room.
    fn deliver(&mut self) {
        while self.manager.recv_buffer_size() > 0 {
            match self.app_tx.try_reserve() {
                Ok(permit) => permit.send(self.manager.read_recv(READ_CHUNK)),
                Err(TrySendError::Full(())) => break,
                Err(TrySendError::Closed(())) => {
                    // Nobody is reading; keep the stream moving.
                    let n = self.manager.recv_buffer_size();
                    self.manager.skip_recv_buffer(n);
                }
            }
        }
    }

    fn finished(&self) -> bool {
        self.manager.state() == ConnectionState::Closed
            && self.manager.is_remote_closed()
            && self.manager.recv_buffer_size() == 0
    }
}

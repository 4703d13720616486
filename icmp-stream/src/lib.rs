//! `icmp-stream`: a reliable, ordered byte stream over a lossy datagram
//! channel such as ICMP echo.
//!
//! # Architecture
//!
//! ```text
//!   write_send_buffer            read_recv_buffer / skip_recv_buffer
//!          │                                   ▲
//!   ┌──────▼─────┐                      ┌──────┴──────┐
//!   │ send ring  │                      │ recv ring   │
//!   └──────┬─────┘                      └──────▲──────┘
//!   ┌──────▼─────┐   REQ / ACK          ┌──────┴──────┐
//!   │ Segmenter  │◀────────────┐  ┌────▶│ Reassembler │
//!   │ (send win) │             │  │     │ (recv win)  │
//!   └──────┬─────┘            ┌┴──┴┐    └──────┬──────┘
//!          │ DATA             │inbox│◀── on_frame_received (any context)
//!          ▼                  └─────┘          │ gap REQs
//!   drain_ready_to_send_frames ◀───────────────┘
//! ```
//!
//! [`manager::FrameManager`] ties the pieces together and is advanced by a
//! periodic `update()`.  It performs no I/O: [`session`] drives it over a
//! [`socket::Socket`] on a tokio task, and [`simulator`] stands in for a
//! lossy path in tests.
//!
//! Modules:
//! - [`frame`]       wire format of DATA/ACK/REQ/PING/PONG frames
//! - [`seq`]         circular id arithmetic
//! - [`ring`]        bounded byte buffers
//! - [`compress`]    optional payload compression
//! - [`segmenter`]   send window and retransmission selection
//! - [`reassembler`] receive window, ordered delivery, gap requests
//! - [`ack`]         per-tick inbound classification and id packing
//! - [`rtt`]         RTT estimate and keepalive pings
//! - [`inbox`]       cross-context inbound queue
//! - [`state`]       connection lifecycle states
//! - [`stats`]       optional traffic counters
//! - [`config`]      tunables and validation
//! - [`manager`]     the frame manager
//! - [`socket`]      async UDP transport for frames
//! - [`session`]     tokio driver around a manager
//! - [`simulator`]   seeded loss/reorder/duplicate channel

pub mod ack;
pub mod compress;
pub mod config;
pub mod frame;
pub mod inbox;
pub mod manager;
pub mod reassembler;
pub mod ring;
pub mod rtt;
pub mod segmenter;
pub mod seq;
pub mod session;
pub mod simulator;
pub mod socket;
pub mod state;
pub mod stats;

pub use config::{FrameConfig, IdlePolicy};
pub use frame::{DataFrame, DataKind, Frame};
pub use manager::{FrameManager, ManagerError};
pub use state::ConnectionState;

//! Tunable parameters of a frame manager.

use std::time::Duration;

use thiserror::Error;

/// Largest DATA payload by default.  Leaves room under a typical ICMP/IP MTU
/// for the outer envelope.
pub const DEFAULT_MAX_FRAME_PAYLOAD: usize = 888;

/// Size of the circular id space by default.
pub const DEFAULT_MAX_FRAME_ID: u32 = 1_000_000;

/// Send and receive buffer capacity by default (1 MiB each).
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1024;

pub const DEFAULT_WINDOW_SIZE: usize = 10_000;

pub const DEFAULT_RESEND_TIMEOUT: Duration = Duration::from_millis(400);

/// How long a session waits for the close handshake by default.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(10);

/// The id space must be at least this many windows wide, so that "old" and
/// "future" ids can never be confused.
pub const ID_SPACE_WINDOWS: u64 = 10;

/// What to do about a peer that has gone silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdlePolicy {
    /// Never report idleness; the owning session's timers decide.
    #[default]
    Disabled,
    /// Report idleness after this long without any inbound frame.
    After(Duration),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_frame_payload must be between 1 and {max}, got {got}")]
    FramePayload { got: usize, max: usize },
    #[error("window_size must be at least 1")]
    EmptyWindow,
    #[error("window_size {window} too large for id space {max_id} (max {limit})")]
    WindowTooLarge { window: usize, max_id: u32, limit: u64 },
    #[error("buffer_capacity {capacity} is smaller than one frame ({payload})")]
    BufferTooSmall { capacity: usize, payload: usize },
}

/// Parameters of one [`crate::manager::FrameManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    pub max_frame_payload: usize,
    pub max_frame_id: u32,
    /// Capacity of each of the send and receive buffers.
    pub buffer_capacity: usize,
    /// Maximum outstanding frames, and width of the receive acceptance range.
    pub window_size: usize,
    /// Base resend timeout for unacknowledged frames; also the initial RTT.
    pub resend_timeout: Duration,
    /// Payloads longer than this are compressed.  Zero disables compression.
    pub compression_threshold: usize,
    pub stats_enabled: bool,
    pub stats_interval: Duration,
    pub ping_interval: Duration,
    pub idle_policy: IdlePolicy,
    /// Time a session allows, after closing its side, for the peer to
    /// acknowledge and close back.
    pub close_grace: Duration,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_payload: DEFAULT_MAX_FRAME_PAYLOAD,
            max_frame_id: DEFAULT_MAX_FRAME_ID,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            window_size: DEFAULT_WINDOW_SIZE,
            resend_timeout: DEFAULT_RESEND_TIMEOUT,
            compression_threshold: 0,
            stats_enabled: false,
            stats_interval: Duration::from_secs(1),
            ping_interval: Duration::from_secs(1),
            idle_policy: IdlePolicy::Disabled,
            close_grace: DEFAULT_CLOSE_GRACE,
        }
    }
}

impl FrameConfig {
    /// Check parameter combinations a manager cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = u16::MAX as usize;
        if self.max_frame_payload == 0 || self.max_frame_payload > max {
            return Err(ConfigError::FramePayload {
                got: self.max_frame_payload,
                max,
            });
        }
        if self.window_size == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        let limit = u64::from(self.max_frame_id) / ID_SPACE_WINDOWS;
        if self.window_size as u64 > limit {
            return Err(ConfigError::WindowTooLarge {
                window: self.window_size,
                max_id: self.max_frame_id,
                limit,
            });
        }
        if self.buffer_capacity < self.max_frame_payload {
            return Err(ConfigError::BufferTooSmall {
                capacity: self.buffer_capacity,
                payload: self.max_frame_payload,
            });
        }
        Ok(())
    }
}

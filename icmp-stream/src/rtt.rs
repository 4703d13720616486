//! Round-trip estimation and keepalive pings.
//!
//! The estimate paces two things: how soon a frame may be physically resent
//! and how often the same gap may be requested.  It is blended from PONG
//! samples as `rtt = (rtt + sample) / 2`, starting from the configured resend
//! timeout before any sample exists.
//!
//! PING timestamps are nanoseconds since the manager was created.  Only the
//! sender ever interprets them (the peer echoes them back verbatim), so a
//! local monotonic epoch is enough.

use std::time::{Duration, Instant};

/// Smoothed round-trip-time estimate.
#[derive(Debug, Clone, Copy)]
pub struct RttEstimator {
    rtt: Duration,
}

impl RttEstimator {
    pub fn new(initial: Duration) -> Self {
        Self { rtt: initial }
    }

    pub fn current(&self) -> Duration {
        self.rtt
    }

    /// Blend one sample into the estimate.
    pub fn on_sample(&mut self, sample: Duration) {
        self.rtt = (self.rtt + sample) / 2;
    }
}

/// Periodic PING scheduling and PONG timestamp interpretation.
#[derive(Debug)]
pub struct Keepalive {
    epoch: Instant,
    interval: Duration,
    last_ping: Instant,
}

impl Keepalive {
    pub fn new(epoch: Instant, interval: Duration) -> Self {
        Self {
            epoch,
            interval,
            last_ping: epoch,
        }
    }

    /// Timestamp for a PING sent at `now`.
    pub fn stamp(&self, now: Instant) -> i64 {
        i64::try_from(now.saturating_duration_since(self.epoch).as_nanos()).unwrap_or(i64::MAX)
    }

    /// Returns the timestamp to send when a PING is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<i64> {
        if now.saturating_duration_since(self.last_ping) > self.interval {
            self.last_ping = now;
            Some(self.stamp(now))
        } else {
            None
        }
    }

    /// Round trip for a PONG echoing `stamp`, received at `now`.
    ///
    /// `None` for negative stamps or ones that are not in the past.
    pub fn sample(&self, stamp: i64, now: Instant) -> Option<Duration> {
        let nanos = u64::try_from(stamp).ok()?;
        let sent = self.epoch.checked_add(Duration::from_nanos(nanos))?;
        now.checked_duration_since(sent).filter(|d| !d.is_zero())
    }
}

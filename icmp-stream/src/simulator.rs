//! Deterministic fault injection for frame batches.
//!
//! Real paths drop, reorder and duplicate datagrams.  To exercise the
//! reliability machinery without a real network, [`LossyChannel`] sits
//! between two managers and mangles each outbound batch:
//!
//! | Fault       | Description                                             |
//! |-------------|---------------------------------------------------------|
//! | Loss        | Drop a frame with probability `loss_rate`.              |
//! | Reordering  | Hold a frame back until after the next batch.           |
//! | Duplication | Deliver a frame twice.                                  |
//!
//! Faults are drawn from a seeded RNG, so a failing run replays exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::frame::Frame;

/// Fault model.  Probabilities are clamped to `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub loss_rate: f64,
    pub duplicate_rate: f64,
    pub reorder_rate: f64,
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        // Transparent pass-through.
        Self {
            loss_rate: 0.0,
            duplicate_rate: 0.0,
            reorder_rate: 0.0,
            seed: 0,
        }
    }
}

/// Counters of what the channel did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FaultCounts {
    pub delivered: u64,
    pub dropped: u64,
    pub duplicated: u64,
    pub reordered: u64,
}

/// One direction of a simulated lossy path.
#[derive(Debug)]
pub struct LossyChannel {
    config: SimulatorConfig,
    rng: StdRng,
    held: Vec<Frame>,
    counts: FaultCounts,
}

impl LossyChannel {
    pub fn new(config: SimulatorConfig) -> Self {
        let config = SimulatorConfig {
            loss_rate: config.loss_rate.clamp(0.0, 1.0),
            duplicate_rate: config.duplicate_rate.clamp(0.0, 1.0),
            reorder_rate: config.reorder_rate.clamp(0.0, 1.0),
            seed: config.seed,
        };
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            held: Vec::new(),
            counts: FaultCounts::default(),
        }
    }

    /// Pass one batch through the channel and return what arrives.
    ///
    /// Frames held back by an earlier call arrive after this batch's frames.
    pub fn transmit(&mut self, frames: Vec<Frame>) -> Vec<Frame> {
        let late = std::mem::take(&mut self.held);
        let mut out = Vec::with_capacity(frames.len() + late.len());

        for frame in frames {
            if self.rng.random_bool(self.config.loss_rate) {
                self.counts.dropped += 1;
                continue;
            }
            if self.rng.random_bool(self.config.duplicate_rate) {
                self.counts.duplicated += 1;
                out.push(frame.clone());
            }
            if self.rng.random_bool(self.config.reorder_rate) {
                self.counts.reordered += 1;
                self.held.push(frame);
            } else {
                out.push(frame);
            }
        }
        out.extend(late);
        self.counts.delivered += out.len() as u64;
        out
    }

    /// Release everything still held back.
    pub fn flush(&mut self) -> Vec<Frame> {
        let out = std::mem::take(&mut self.held);
        self.counts.delivered += out.len() as u64;
        out
    }

    pub fn counts(&self) -> FaultCounts {
        self.counts
    }
}

//! Optional per-connection counters.
//!
//! When enabled, the manager bumps these as frames move and logs a summary
//! once per `stats_interval`, then starts over.  The per-id maps answer "how
//! many ids needed one send, how many needed two, ..." which is the quickest
//! way to see how lossy the path is.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameStats {
    pub data_sent: u64,
    pub data_recv: u64,
    pub req_sent: u64,
    pub req_recv: u64,
    pub ack_sent: u64,
    pub ack_recv: u64,
    pub ping_sent: u64,
    pub ping_recv: u64,
    pub pong_sent: u64,
    pub pong_recv: u64,
    pub data_sent_per_id: HashMap<u32, u32>,
    pub data_recv_per_id: HashMap<u32, u32>,
    pub req_sent_per_id: HashMap<u32, u32>,
    pub req_recv_per_id: HashMap<u32, u32>,
}

impl FrameStats {
    pub fn record_data_sent(&mut self, id: u32) {
        self.data_sent += 1;
        *self.data_sent_per_id.entry(id).or_default() += 1;
    }

    pub fn record_data_recv(&mut self, id: u32) {
        self.data_recv += 1;
        *self.data_recv_per_id.entry(id).or_default() += 1;
    }

    pub fn record_req_sent(&mut self, id: u32) {
        self.req_sent += 1;
        *self.req_sent_per_id.entry(id).or_default() += 1;
    }

    pub fn record_req_recv(&mut self, id: u32) {
        self.req_recv += 1;
        *self.req_recv_per_id.entry(id).or_default() += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Histogram of per-id counts: `"1->40,2->3"` means 40 ids were seen once and
/// 3 ids twice.
pub fn histogram(per_id: &HashMap<u32, u32>) -> String {
    let mut buckets: BTreeMap<u32, u32> = BTreeMap::new();
    for count in per_id.values() {
        *buckets.entry(*count).or_default() += 1;
    }
    if buckets.is_empty() {
        return "none".to_string();
    }
    buckets
        .iter()
        .map(|(times, ids)| format!("{times}->{ids}"))
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data {}/{} req {}/{} ack {}/{} ping {}/{} pong {}/{} \
             data_tx [{}] data_rx [{}] req_tx [{}] req_rx [{}]",
            self.data_sent,
            self.data_recv,
            self.req_sent,
            self.req_recv,
            self.ack_sent,
            self.ack_recv,
            self.ping_sent,
            self.ping_recv,
            self.pong_sent,
            self.pong_recv,
            histogram(&self.data_sent_per_id),
            histogram(&self.data_recv_per_id),
            histogram(&self.req_sent_per_id),
            histogram(&self.req_recv_per_id),
        )
    }
}

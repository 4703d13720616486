//! Classification of one tick's inbound frames.
//!
//! Everything that arrived since the previous tick is sorted by type before
//! any window is touched, so the manager can apply REQs and ACKs to the send
//! window and hand DATA to the reassembler in a fixed order.  Repeated ids are
//! collapsed here: the same DATA id twice in one batch is admitted once.

use std::collections::HashSet;

use crate::frame::{DataFrame, Frame, ID_LEN};

/// One tick's inbound frames, by type.
#[derive(Debug, Default)]
pub struct Inbound {
    /// Ids the peer asks us to resend.
    pub reqs: Vec<u32>,
    /// Ids the peer has accepted.
    pub acks: Vec<u32>,
    /// DATA frames, first copy of each id only.
    pub data: Vec<DataFrame>,
    /// Timestamps of PINGs to answer.
    pub pings: Vec<i64>,
    /// Timestamps echoed by PONGs.
    pub pongs: Vec<i64>,
}

impl Inbound {
    pub fn classify(frames: Vec<Frame>) -> Self {
        let mut out = Inbound::default();
        let mut seen_data = HashSet::new();
        let mut seen_req = HashSet::new();
        let mut seen_ack = HashSet::new();

        for frame in frames {
            match frame {
                Frame::Req(ids) => out
                    .reqs
                    .extend(ids.into_iter().filter(|id| seen_req.insert(*id))),
                Frame::Ack(ids) => out
                    .acks
                    .extend(ids.into_iter().filter(|id| seen_ack.insert(*id))),
                Frame::Data(d) => {
                    if seen_data.insert(d.id) {
                        out.data.push(d);
                    }
                }
                Frame::Ping(ts) => out.pings.push(ts),
                Frame::Pong(ts) => out.pongs.push(ts),
            }
        }
        out
    }
}

/// How many ids one ACK or REQ frame may carry so that it is no larger than
/// a full DATA frame.
pub fn ids_per_frame(max_payload: usize) -> usize {
    (max_payload / ID_LEN).max(1)
}

/// Pack `ids` into as few frames as `per_frame` allows, using `make` to build
/// each one (`Frame::Ack` or `Frame::Req`).
pub fn pack_ids(ids: &[u32], per_frame: usize, make: fn(Vec<u32>) -> Frame) -> Vec<Frame> {
    ids.chunks(per_frame.max(1))
        .map(|chunk| make(chunk.to_vec()))
        .collect()
}

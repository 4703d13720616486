//! Frame definitions and their wire format.
//!
//! A [`Frame`] is the atomic unit exchanged between two frame managers.  Each
//! encoded frame rides inside the payload of one echo packet (one UDP
//! datagram in [`crate::socket`]); the outer envelope is someone else's
//! concern.
//!
//! No I/O happens here.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  +--------+--------------------------------+-------------------------+
//!  |  type  |               id               |  body (depends on type) |
//!  |  u8    |               u32              |                         |
//!  +--------+--------------------------------+-------------------------+
//!
//!  DATA      kind:u8 | compressed:u8 | len:u16 | payload[len]
//!  ACK/REQ   count:u16 | ids:u32 * count
//!  PING/PONG timestamp:i64
//! ```
//!
//! `id` is only meaningful for DATA frames and is written as zero otherwise.

use thiserror::Error;

/// Byte length of the common `type | id` prefix.
pub const PREFIX_LEN: usize = 5;

/// Bytes taken by one id inside an ACK or REQ body.
pub const ID_LEN: usize = 4;

const TAG_DATA: u8 = 0;
const TAG_ACK: u8 = 1;
const TAG_REQ: u8 = 2;
const TAG_PING: u8 = 3;
const TAG_PONG: u8 = 4;

/// What a DATA frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Application bytes.
    UserData,
    /// The peer will send no more data.
    Close,
    /// Connection request.
    Conn,
    /// Answer to a [`DataKind::Conn`].
    ConnRsp,
}

impl DataKind {
    fn to_u8(self) -> u8 {
        match self {
            DataKind::UserData => 0,
            DataKind::Close => 1,
            DataKind::Conn => 2,
            DataKind::ConnRsp => 3,
        }
    }

    fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(DataKind::UserData),
            1 => Some(DataKind::Close),
            2 => Some(DataKind::Conn),
            3 => Some(DataKind::ConnRsp),
            _ => None,
        }
    }
}

/// A sequenced DATA frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    /// Circular sequence id in `[0, max_frame_id)`.
    pub id: u32,
    pub kind: DataKind,
    /// `payload` holds compressed bytes that must be inflated before delivery.
    pub compressed: bool,
    pub payload: Vec<u8>,
}

impl DataFrame {
    /// A payload-less frame of the given kind (CLOSE, CONN, CONNRSP).
    pub fn control(id: u32, kind: DataKind) -> Self {
        Self {
            id,
            kind,
            compressed: false,
            payload: Vec::new(),
        }
    }

    /// An uncompressed user-data frame.
    pub fn user(id: u32, payload: Vec<u8>) -> Self {
        Self {
            id,
            kind: DataKind::UserData,
            compressed: false,
            payload,
        }
    }
}

/// The protocol's atomic transport unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(DataFrame),
    /// Ids the sender may retire.
    Ack(Vec<u32>),
    /// Ids the receiver is missing and asks to be resent.
    Req(Vec<u32>),
    /// Keepalive probe carrying the sender's timestamp.
    Ping(i64),
    /// Echo of a [`Frame::Ping`] timestamp.
    Pong(i64),
}

impl Frame {
    /// Short upper-case name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Data(_) => "DATA",
            Frame::Ack(_) => "ACK",
            Frame::Req(_) => "REQ",
            Frame::Ping(_) => "PING",
            Frame::Pong(_) => "PONG",
        }
    }

    /// Number of bytes [`Frame::encode`] will produce.
    pub fn encoded_len(&self) -> usize {
        PREFIX_LEN
            + match self {
                Frame::Data(d) => 4 + d.payload.len(),
                Frame::Ack(ids) | Frame::Req(ids) => 2 + ids.len() * ID_LEN,
                Frame::Ping(_) | Frame::Pong(_) => 8,
            }
    }

    /// Serialise this frame into a newly allocated byte vector.
    ///
    /// Fails only when a length does not fit its 16-bit field.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        match self {
            Frame::Data(d) => {
                let len = u16::try_from(d.payload.len())
                    .map_err(|_| FrameError::PayloadTooLarge(d.payload.len()))?;
                buf.push(TAG_DATA);
                buf.extend_from_slice(&d.id.to_be_bytes());
                buf.push(d.kind.to_u8());
                buf.push(u8::from(d.compressed));
                buf.extend_from_slice(&len.to_be_bytes());
                buf.extend_from_slice(&d.payload);
            }
            Frame::Ack(ids) | Frame::Req(ids) => {
                let count =
                    u16::try_from(ids.len()).map_err(|_| FrameError::TooManyIds(ids.len()))?;
                buf.push(if matches!(self, Frame::Ack(_)) { TAG_ACK } else { TAG_REQ });
                buf.extend_from_slice(&0u32.to_be_bytes());
                buf.extend_from_slice(&count.to_be_bytes());
                for id in ids {
                    buf.extend_from_slice(&id.to_be_bytes());
                }
            }
            Frame::Ping(ts) | Frame::Pong(ts) => {
                buf.push(if matches!(self, Frame::Ping(_)) { TAG_PING } else { TAG_PONG });
                buf.extend_from_slice(&0u32.to_be_bytes());
                buf.extend_from_slice(&ts.to_be_bytes());
            }
        }
        Ok(buf)
    }

    /// Parse one [`Frame`] occupying the whole of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        let mut r = Reader { buf, pos: 0 };
        let tag = r.u8()?;
        let id = r.u32()?;

        let frame = match tag {
            TAG_DATA => {
                let raw_kind = r.u8()?;
                let kind =
                    DataKind::from_u8(raw_kind).ok_or(FrameError::UnknownDataKind(raw_kind))?;
                let compressed = r.u8()? != 0;
                let len = r.u16()? as usize;
                let payload = r.take(len)?.to_vec();
                Frame::Data(DataFrame {
                    id,
                    kind,
                    compressed,
                    payload,
                })
            }
            TAG_ACK | TAG_REQ => {
                let count = r.u16()? as usize;
                let mut ids = Vec::with_capacity(count.min(r.remaining() / ID_LEN));
                for _ in 0..count {
                    ids.push(r.u32()?);
                }
                if tag == TAG_ACK {
                    Frame::Ack(ids)
                } else {
                    Frame::Req(ids)
                }
            }
            TAG_PING => Frame::Ping(r.i64()?),
            TAG_PONG => Frame::Pong(r.i64()?),
            other => return Err(FrameError::UnknownType(other)),
        };

        if r.remaining() != 0 {
            return Err(FrameError::LengthMismatch);
        }
        Ok(frame)
    }
}

/// Errors that can arise when encoding or parsing a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("buffer too short for the frame it claims to hold")]
    BufferTooShort,
    #[error("trailing bytes after the frame body")]
    LengthMismatch,
    #[error("unknown frame type {0}")]
    UnknownType(u8),
    #[error("unknown data kind {0}")]
    UnknownDataKind(u8),
    #[error("payload of {0} bytes does not fit a frame")]
    PayloadTooLarge(usize),
    #[error("{0} ids do not fit one frame")]
    TooManyIds(usize),
}

/// Bounds-checked cursor over a byte slice.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        if self.remaining() < n {
            return Err(FrameError::BufferTooShort);
        }
        let buf = self.buf;
        let out = &buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FrameError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, FrameError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, FrameError> {
        self.array().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Result<u32, FrameError> {
        self.array().map(u32::from_be_bytes)
    }

    fn i64(&mut self) -> Result<i64, FrameError> {
        self.array().map(i64::from_be_bytes)
    }
}

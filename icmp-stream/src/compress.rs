//! Optional per-frame payload compression.
//!
//! Payloads longer than the configured threshold are compressed with zstd;
//! the compressed form is kept only when it is actually smaller.  Inflation is
//! bounded so a hostile or corrupt frame can never expand past what the
//! receive buffer could hold.

use std::io::{self, Read};

use thiserror::Error;

/// zstd level used for frame payloads.
const LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("decompression failed: {0}")]
    Decode(#[from] io::Error),
    #[error("inflated payload exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// Threshold-gated compressor.  A threshold of zero disables compression.
#[derive(Debug, Clone, Copy)]
pub struct Compressor {
    threshold: usize,
}

impl Compressor {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn enabled(&self) -> bool {
        self.threshold > 0
    }

    /// Compress `payload` when it is above the threshold and compression
    /// shrinks it.  Returns the bytes to put on the wire and whether they are
    /// compressed.
    pub fn maybe_compress(&self, payload: Vec<u8>) -> (Vec<u8>, bool) {
        if !self.enabled() || payload.len() <= self.threshold {
            return (payload, false);
        }
        match zstd::bulk::compress(&payload, LEVEL) {
            Ok(packed) if packed.len() < payload.len() => (packed, true),
            Ok(_) => (payload, false),
            Err(e) => {
                log::warn!("[frame] compression failed, sending raw: {e}");
                (payload, false)
            }
        }
    }
}

/// Inflate `data`, refusing output longer than `limit` bytes.
pub fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>, CompressError> {
    let decoder = zstd::stream::read::Decoder::new(data)?;
    let mut out = Vec::new();
    decoder.take(limit as u64 + 1).read_to_end(&mut out)?;
    if out.len() > limit {
        return Err(CompressError::TooLarge { limit });
    }
    Ok(out)
}

//! Cross-context hand-off of inbound frames.
//!
//! The network receive path and the tick run in different contexts.  They
//! meet only here: the receive path pushes decoded frames, and the tick takes
//! the whole batch with one swap under the lock.  The windows themselves are
//! never locked.

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::frame::Frame;

/// Cloneable handle to one manager's inbound queue.
#[derive(Debug, Clone, Default)]
pub struct InboxHandle {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl InboxHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one frame for the next tick.
    pub fn push(&self, frame: Frame) {
        self.lock().push(frame);
    }

    /// Take everything queued so far.
    pub fn take(&self) -> Vec<Frame> {
        mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The queue holds plain data, so a panic elsewhere cannot leave it
    // half-updated; keep using it after poisoning.
    fn lock(&self) -> MutexGuard<'_, Vec<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

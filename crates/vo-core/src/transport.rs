//! Transport clock snapshot
//!
//! The shared clock is owned by the host's video element; the engine only
//! ever sees read-only snapshots of it. One snapshot is captured per
//! reactive pass so every clip in the pass observes the same time.

use serde::{Deserialize, Serialize};

/// Snapshot of the shared transport clock.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportState {
    /// Current position in seconds.
    pub position: f64,
    /// Whether the clock is advancing.
    pub playing: bool,
}

impl TransportState {
    pub fn new(position: f64, playing: bool) -> Self {
        Self { position, playing }
    }

    pub fn playing_at(position: f64) -> Self {
        Self::new(position, true)
    }

    pub fn paused_at(position: f64) -> Self {
        Self::new(position, false)
    }

    /// Whether the clock currently sits inside `[start, end)`.
    #[inline]
    pub fn within(&self, start: f64, end: f64) -> bool {
        self.position >= start && self.position < end
    }
}

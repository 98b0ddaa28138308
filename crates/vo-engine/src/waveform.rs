//! Waveform peak store
//!
//! Display-only peak magnitudes per recording, fetched once from the
//! retrieval collaborator and kept until the clip leaves the timeline.
//! Entirely independent of playback.

use std::collections::{HashMap, HashSet};

use vo_core::RecordingId;

use crate::library::MediaLibrary;

/// Peak bucket count the retrieval side produces per recording.
pub const DEFAULT_PEAK_BUCKETS: usize = 128;

/// Vertical headroom left above the tallest bar.
const BAR_HEADROOM: f32 = 0.9;

#[derive(Default)]
pub struct WaveformStore {
    peaks: HashMap<RecordingId, Vec<f32>>,
    failed: HashSet<RecordingId>,
}

impl WaveformStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch peaks for a recording unless already present or already
    /// failed (single-flight; failures are not retried).
    pub fn ensure_peaks(&mut self, id: &RecordingId, library: &dyn MediaLibrary) {
        if self.peaks.contains_key(id) || self.failed.contains(id) {
            return;
        }
        match library.fetch_waveform(id) {
            Ok(peaks) if !peaks.is_empty() => {
                self.peaks.insert(id.clone(), peaks);
            }
            Ok(_) => {
                log::debug!("no waveform peaks for {id}");
                self.failed.insert(id.clone());
            }
            Err(e) => {
                log::warn!("waveform fetch failed for {id}: {e}");
                self.failed.insert(id.clone());
            }
        }
    }

    pub fn peaks(&self, id: &RecordingId) -> Option<&[f32]> {
        self.peaks.get(id).map(Vec::as_slice)
    }

    /// Drop peaks for recordings no longer on the timeline.
    pub fn retain(&mut self, active: &HashSet<RecordingId>) {
        self.peaks.retain(|id, _| active.contains(id));
        self.failed.retain(|id| active.contains(id));
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}

/// Map raw peaks to bar heights for a lane of the given pixel height:
/// normalized against the tallest peak, scaled from the center line with a
/// little headroom, and floored at one pixel so silence still draws.
pub fn bar_heights(peaks: &[f32], lane_height: f32) -> Vec<f32> {
    let center = lane_height / 2.0;
    let max_peak = peaks.iter().copied().fold(1.0_f32, f32::max);
    peaks
        .iter()
        .map(|p| ((p / max_peak) * center * BAR_HEADROOM).max(1.0))
        .collect()
}

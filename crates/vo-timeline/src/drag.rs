//! Pointer-driven drag editing
//!
//! Three independent drag sessions: clip repositioning, playhead scrubbing,
//! and the sidebar boundary. Each session is begun with the pointer-down
//! coordinates, fed pointer moves, and finished on release. Releasing
//! always commits; there is no cancel gesture.

use vo_core::RecordingId;

/// A drag result snaps to a target when the candidate lands within this
/// many pixels of it.
pub const SNAP_THRESHOLD_PX: f64 = 10.0;

pub const MIN_SIDEBAR_WIDTH_PX: f64 = 280.0;
pub const MAX_SIDEBAR_WIDTH_PX: f64 = 450.0;
pub const DEFAULT_SIDEBAR_WIDTH_PX: f64 = 280.0;

/// Edit produced by a drag session; applying it is the host's job.
#[derive(Debug, Clone, PartialEq)]
pub enum EditRequest {
    /// Persist a new start time for a recording.
    MoveRecording { id: RecordingId, timecode: f64 },
    /// Move the shared transport clock.
    Seek { time: f64 },
}

/// Pixel positions a clip drag can snap to: the playhead plus the left and
/// right edges of every other clip on the timeline.
#[derive(Debug, Clone, Default)]
pub struct SnapTargets {
    targets_px: Vec<f64>,
}

impl SnapTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, px: f64) {
        self.targets_px.push(px);
    }

    /// Collect targets for dragging `dragged`: the playhead pixel and both
    /// edges of every other clip, given as (id, left_px, width_px).
    pub fn for_clip<'a>(
        dragged: &RecordingId,
        playhead_px: f64,
        clips: impl IntoIterator<Item = (&'a RecordingId, f64, f64)>,
    ) -> Self {
        let mut targets = Self::new();
        targets.add(playhead_px);
        for (id, left, width) in clips {
            if id != dragged {
                targets.add(left);
                targets.add(left + width);
            }
        }
        targets
    }

    /// Nearest target within the snap threshold, if any.
    fn nearest(&self, px: f64) -> Option<f64> {
        self.targets_px
            .iter()
            .copied()
            .map(|t| (t, (t - px).abs()))
            .filter(|&(_, d)| d <= SNAP_THRESHOLD_PX)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(t, _)| t)
    }
}

/// In-progress clip reposition. The clip follows the pointer horizontally
/// from its original left edge, snapping and clamping live so the preview
/// matches what release will commit.
#[derive(Debug, Clone)]
pub struct ClipDrag {
    id: RecordingId,
    origin_x: f64,
    base_left_px: f64,
    position_px: f64,
}

impl ClipDrag {
    pub fn begin(id: RecordingId, pointer_x: f64, base_left_px: f64) -> Self {
        Self {
            id,
            origin_x: pointer_x,
            base_left_px,
            position_px: base_left_px,
        }
    }

    pub fn id(&self) -> &RecordingId {
        &self.id
    }

    /// Current left edge in track pixels, for rendering the preview.
    pub fn position_px(&self) -> f64 {
        self.position_px
    }

    pub fn update(&mut self, pointer_x: f64, snap: &SnapTargets) {
        let candidate = (self.base_left_px + pointer_x - self.origin_x).max(0.0);
        self.position_px = snap.nearest(candidate).unwrap_or(candidate).max(0.0);
    }

    /// Commit: the previewed position becomes the clip's new timecode.
    pub fn finish(self, pixels_per_second: f64) -> EditRequest {
        let timecode = (self.position_px / pixels_per_second).max(0.0);
        log::debug!("clip {} moved to {timecode:.3}s", self.id);
        EditRequest::MoveRecording {
            id: self.id,
            timecode,
        }
    }
}

/// In-progress playhead scrub. Emits a live [`EditRequest::Seek`] on every
/// pointer move so audio and video chase the handle in real time; release
/// just ends the session.
#[derive(Debug, Clone)]
pub struct PlayheadDrag {
    track_width: f64,
    duration: f64,
    /// Snap candidates in time space (clip starts and ends).
    snap_times: Vec<f64>,
}

impl PlayheadDrag {
    pub fn begin(track_width: f64, duration: f64, snap_times: Vec<f64>) -> Self {
        Self {
            track_width: track_width.max(1.0),
            duration,
            snap_times,
        }
    }

    /// Map a pointer move at `x` pixels into the track to the seek it
    /// implies. The snap threshold is the pixel threshold converted into
    /// time at the current zoom.
    pub fn update(&self, x: f64) -> EditRequest {
        let fraction = (x / self.track_width).clamp(0.0, 1.0);
        let mut time = fraction * self.duration;

        let threshold = SNAP_THRESHOLD_PX / self.track_width * self.duration;
        if let Some(snapped) = self
            .snap_times
            .iter()
            .copied()
            .map(|t| (t, (t - time).abs()))
            .filter(|&(_, d)| d <= threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(t, _)| t)
        {
            time = snapped;
        }

        EditRequest::Seek { time }
    }
}

/// In-progress sidebar boundary drag. Local layout state only; no edit
/// request is produced.
#[derive(Debug, Clone, Copy)]
pub struct SidebarDrag {
    start_x: f64,
    start_width: f64,
}

impl SidebarDrag {
    pub fn begin(pointer_x: f64, current_width: f64) -> Self {
        Self {
            start_x: pointer_x,
            start_width: current_width,
        }
    }

    pub fn update(&self, pointer_x: f64) -> f64 {
        (self.start_width + pointer_x - self.start_x)
            .clamp(MIN_SIDEBAR_WIDTH_PX, MAX_SIDEBAR_WIDTH_PX)
    }
}

//! Timeline coordinate model
//!
//! Maps between the shared time axis (seconds) and track pixels. Zoom is
//! expressed as pixels-per-second and is always anchored at the playhead:
//! changing the zoom recomputes scroll so the playhead keeps its on-screen
//! pixel position.

pub const MIN_PIXELS_PER_SECOND: f64 = 20.0;
pub const MAX_PIXELS_PER_SECOND: f64 = 150.0;
pub const DEFAULT_PIXELS_PER_SECOND: f64 = 50.0;

/// Horizontal padding on either side of the track area.
pub const PADDING_PX: f64 = 24.0;

/// The track never renders narrower than this, whatever the duration.
pub const MIN_TRACK_WIDTH_PX: f64 = 800.0;

/// Zoom increment per wheel step.
pub const ZOOM_STEP_PPS: f64 = 5.0;

/// While playing, the playhead is kept this fraction into the viewport.
pub const LEAD_FRACTION: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct TimelineView {
    pixels_per_second: f64,
    scroll: f64,
    duration: f64,
}

impl TimelineView {
    pub fn new(duration: f64) -> Self {
        Self {
            pixels_per_second: DEFAULT_PIXELS_PER_SECOND,
            scroll: 0.0,
            duration: duration.max(0.0),
        }
    }

    #[inline]
    pub fn pixels_per_second(&self) -> f64 {
        self.pixels_per_second
    }

    #[inline]
    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
    }

    /// Host scroll events write the viewport offset back.
    pub fn set_scroll(&mut self, scroll: f64) {
        self.scroll = scroll.max(0.0);
    }

    #[inline]
    pub fn time_to_pixel(&self, time: f64) -> f64 {
        time * self.pixels_per_second
    }

    #[inline]
    pub fn pixel_to_time(&self, px: f64) -> f64 {
        px / self.pixels_per_second
    }

    /// Playhead pixel within the scrollable content (padding included).
    #[inline]
    pub fn playhead_px(&self, time: f64) -> f64 {
        self.time_to_pixel(time) + PADDING_PX
    }

    pub fn track_width(&self) -> f64 {
        (self.duration * self.pixels_per_second).max(MIN_TRACK_WIDTH_PX)
    }

    pub fn content_width(&self) -> f64 {
        self.track_width() + PADDING_PX * 2.0
    }

    /// Apply a wheel zoom of the given step count (positive zooms in),
    /// anchored so the playhead's on-screen pixel position is preserved.
    pub fn zoom_by(&mut self, steps: i32, playhead_time: f64) {
        let old_pps = self.pixels_per_second;
        let new_pps = (old_pps + steps as f64 * ZOOM_STEP_PPS)
            .clamp(MIN_PIXELS_PER_SECOND, MAX_PIXELS_PER_SECOND);
        if new_pps == old_pps {
            return;
        }

        let playhead_in_view = playhead_time * old_pps + PADDING_PX - self.scroll;
        self.pixels_per_second = new_pps;
        self.scroll = (playhead_time * new_pps + PADDING_PX - playhead_in_view).max(0.0);
    }

    /// Scroll-to-follow while playing: keep the playhead at the lead
    /// fraction of the viewport. Never scrolls backward and never past the
    /// end of the content.
    pub fn follow_playhead(&mut self, playhead_time: f64, viewport_width: f64) {
        let target = (self.playhead_px(playhead_time) - viewport_width * LEAD_FRACTION).max(0.0);
        let max_scroll = self.content_width() - viewport_width;
        if target > self.scroll && target <= max_scroll {
            self.scroll = target;
        }
    }

    /// Seek target for a click at `x` pixels into the track area, clamped
    /// to the video duration.
    pub fn seek_from_click(&self, x: f64) -> f64 {
        self.pixel_to_time(x).clamp(0.0, self.duration)
    }
}

impl Default for TimelineView {
    fn default() -> Self {
        Self::new(0.0)
    }
}

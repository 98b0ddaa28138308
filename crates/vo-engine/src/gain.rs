//! Gain composition
//!
//! One linear gain per clip, composed from four independent modulation
//! sources: master volume, per-character volume, per-clip volume, and the
//! per-clip decibel trim. Mute wins outright.

use vo_core::Decibels;

/// Minimum gain delta worth writing to a graph node. Smaller changes are
/// skipped to avoid churning the mixing graph on every pass.
pub const GAIN_EPSILON: f64 = 1e-3;

/// Compose the final linear gain for one clip.
///
/// Pure and total; absent inputs default to neutral (`1`, `1`, `false`,
/// `1`, `0`) upstream, so a clip with no overrides composes to the master
/// volume.
#[inline]
pub fn compose(
    master_volume: f64,
    character_volume: f64,
    muted: bool,
    clip_volume: f64,
    gain_db: f64,
) -> f64 {
    if muted {
        return 0.0;
    }
    master_volume * character_volume * clip_volume * Decibels(gain_db).to_gain()
}

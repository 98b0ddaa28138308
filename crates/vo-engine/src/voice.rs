//! Per-clip transport primitives
//!
//! The engine never touches sample data; it drives each loaded resource
//! through this seam. Implementations wrap the platform media element
//! (or a test double).

use vo_core::{RecordingId, VoError, VoResult};

/// A playable audio resource for one recording.
pub trait AudioVoice: Send {
    /// Begin or resume playback.
    ///
    /// May fail with [`VoError::PlaybackRejected`] when the platform refuses
    /// playback (activation policy); the scheduler logs and retries on a
    /// later pass once the output stage has been resumed by a user gesture.
    fn play(&mut self) -> VoResult<()>;

    fn pause(&mut self);

    /// Seek to an offset in seconds from the start of the resource.
    fn seek(&mut self, offset: f64);

    /// Current playback offset in seconds.
    fn position(&self) -> f64;

    /// Duration reported by the decoded resource, once buffering has
    /// progressed far enough to know it. Preferred over the persisted clip
    /// duration when present.
    fn duration(&self) -> Option<f64>;

    fn is_paused(&self) -> bool;

    /// True once the resource can play through without stalling.
    fn is_ready(&self) -> bool;

    /// Decode error surfaced after load, if any. Draining; a voice that
    /// reported an error is torn down by the cache.
    fn take_error(&mut self) -> Option<VoError>;
}

/// Builds voices from raw encoded payloads.
///
/// The platform implementation hands the bytes to the media stack; failure
/// here is the spec's DecodeFailure and leaves the clip silent.
pub trait VoiceFactory {
    fn create_voice(&self, id: &RecordingId, payload: &[u8]) -> VoResult<Box<dyn AudioVoice>>;
}

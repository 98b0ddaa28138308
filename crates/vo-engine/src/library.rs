//! Collaborator interfaces
//!
//! The engine reaches the rest of the application through two narrow seams:
//! retrieval (raw audio payloads and waveform peaks) and persistence
//! mutations. Both may fail; failures are logged and treated as "no data",
//! never as fatal.

use crossbeam_channel::Sender;

use vo_core::{RecordingId, VoError, VoResult};

/// Completed (or failed) audio fetch for one recording.
#[derive(Debug)]
pub struct LoadReply {
    pub id: RecordingId,
    /// Encoded audio bytes, or the retrieval failure.
    pub payload: Result<Vec<u8>, VoError>,
}

/// Retrieval collaborator.
pub trait MediaLibrary {
    /// Begin fetching the encoded audio payload for a recording.
    ///
    /// The reply may be sent synchronously from this call or later from a
    /// worker; the engine drains replies at the start of each reactive
    /// pass. There is no mid-flight cancellation; a reply for a recording
    /// that has since left the active set is discarded on arrival.
    fn request_audio(&self, id: RecordingId, reply: Sender<LoadReply>);

    /// Precomputed waveform peak magnitudes for display. Independent of
    /// playback; an error or empty result just leaves the clip undrawn.
    fn fetch_waveform(&self, id: &RecordingId) -> VoResult<Vec<f32>>;
}

/// Persistence collaborator for timeline edits.
///
/// The engine applies each change optimistically to local display state and
/// expects the collaborator to come back with canonical project state on
/// the next snapshot.
pub trait ProjectSink {
    fn move_recording(&self, id: &RecordingId, timecode: f64) -> VoResult<()>;

    fn set_recording_volume(&self, id: &RecordingId, volume: f64) -> VoResult<()>;

    fn set_recording_gain_db(&self, id: &RecordingId, gain_db: f64) -> VoResult<()>;
}

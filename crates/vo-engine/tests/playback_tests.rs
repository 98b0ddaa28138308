//! PlaybackManager Integration Tests
//!
//! Tests for:
//! - Sounding window evaluation (half-open [timecode, timecode + duration))
//! - Seek correction threshold (0.5s)
//! - Single-flight resource loading and eviction
//! - Cache/active-set convergence
//! - Gain composition through the mixing graph (mute, character, clip, dB)
//! - Activation-policy rejection and retry
//! - Stale load replies after eviction
//! - Voice-reported duration overriding the persisted clip duration

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use vo_core::{Recording, RecordingId, TransportState, VoError, VoResult};
use vo_engine::{
    AudioVoice, EngineSnapshot, LoadReply, MediaLibrary, PlaybackManager,
    SummingGraph, VoiceFactory,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEST DOUBLES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct VoiceState {
    paused: bool,
    position: f64,
    duration: Option<f64>,
    ready: bool,
    reject_play: bool,
    error: Option<VoError>,
    seeks: Vec<f64>,
}

struct MockVoice {
    state: Arc<Mutex<VoiceState>>,
}

impl AudioVoice for MockVoice {
    fn play(&mut self) -> VoResult<()> {
        let mut state = self.state.lock();
        if state.reject_play {
            return Err(VoError::PlaybackRejected("activation required".into()));
        }
        state.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().paused = true;
    }

    fn seek(&mut self, offset: f64) {
        let mut state = self.state.lock();
        state.position = offset;
        state.seeks.push(offset);
    }

    fn position(&self) -> f64 {
        self.state.lock().position
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    fn take_error(&mut self) -> Option<VoError> {
        self.state.lock().error.take()
    }
}

/// Builds ready-to-play mock voices and keeps a shared handle to each so
/// tests can inspect and steer them after creation.
#[derive(Default)]
struct MockFactory {
    voices: Mutex<HashMap<RecordingId, Arc<Mutex<VoiceState>>>>,
    durations: Mutex<HashMap<RecordingId, f64>>,
    reject_play: Mutex<Vec<RecordingId>>,
}

impl MockFactory {
    fn report_duration(&self, id: &str, duration: f64) {
        self.durations.lock().insert(id.into(), duration);
    }

    fn reject_play_for(&self, id: &str) {
        self.reject_play.lock().push(id.into());
    }

    fn voice(&self, id: &str) -> Arc<Mutex<VoiceState>> {
        self.voices
            .lock()
            .get(&RecordingId::from(id))
            .cloned()
            .unwrap_or_else(|| panic!("no voice created for {id}"))
    }

    fn voice_count(&self) -> usize {
        self.voices.lock().len()
    }
}

impl VoiceFactory for MockFactory {
    fn create_voice(&self, id: &RecordingId, _payload: &[u8]) -> VoResult<Box<dyn AudioVoice>> {
        let state = Arc::new(Mutex::new(VoiceState {
            paused: true,
            ready: true,
            duration: self.durations.lock().get(id).copied(),
            reject_play: self.reject_play.lock().contains(id),
            ..VoiceState::default()
        }));
        self.voices.lock().insert(id.clone(), state.clone());
        Ok(Box::new(MockVoice { state }))
    }
}

/// Replies synchronously by default; with `defer()` it parks the reply
/// sender so a test can deliver it after the clip has been evicted.
#[derive(Default)]
struct MockLibrary {
    defer: bool,
    requests: Mutex<Vec<RecordingId>>,
    pending: Mutex<Vec<(RecordingId, Sender<LoadReply>)>>,
    failing: Mutex<Vec<RecordingId>>,
}

impl MockLibrary {
    fn deferred() -> Self {
        Self {
            defer: true,
            ..Self::default()
        }
    }

    fn fail_for(&self, id: &str) {
        self.failing.lock().push(id.into());
    }

    fn request_count(&self, id: &str) -> usize {
        let id = RecordingId::from(id);
        self.requests.lock().iter().filter(|r| **r == id).count()
    }

    /// Deliver every parked reply.
    fn flush(&self) {
        for (id, reply) in self.pending.lock().drain(..) {
            let _ = reply.send(LoadReply {
                id,
                payload: Ok(vec![0u8; 16]),
            });
        }
    }
}

impl MediaLibrary for MockLibrary {
    fn request_audio(&self, id: RecordingId, reply: Sender<LoadReply>) {
        self.requests.lock().push(id.clone());
        if self.defer {
            self.pending.lock().push((id, reply));
            return;
        }
        let payload = if self.failing.lock().contains(&id) {
            Err(VoError::Retrieval(format!("no payload for {id}")))
        } else {
            Ok(vec![0u8; 16])
        };
        let _ = reply.send(LoadReply { id, payload });
    }

    fn fetch_waveform(&self, _id: &RecordingId) -> VoResult<Vec<f32>> {
        Ok(Vec::new())
    }
}

struct Harness {
    manager: PlaybackManager,
    factory: Arc<MockFactory>,
    library: Arc<MockLibrary>,
}

impl Harness {
    fn new(library: MockLibrary) -> Self {
        init_logging();
        let factory = Arc::new(MockFactory::default());
        let library = Arc::new(library);
        let manager = PlaybackManager::new(
            Box::new(SummingGraph::new()),
            factory.clone(),
            library.clone(),
        );
        Self {
            manager,
            factory,
            library,
        }
    }

    /// Run passes until loads settle, then one pass at the given transport.
    fn settle(&mut self, recordings: &[Recording], transport: TransportState) {
        let mut snapshot = EngineSnapshot::new(recordings.to_vec(), transport);
        snapshot.transport.playing = false;
        self.manager.update(&snapshot); // request loads
        self.manager.update(&snapshot); // drain replies, flip readiness
        snapshot.transport = transport;
        self.manager.update(&snapshot);
    }

    fn node_gain(&self, id: &str) -> f64 {
        let entry = self
            .manager
            .cache()
            .get(&RecordingId::from(id))
            .expect("entry not loaded");
        self.manager.graph().gain(entry.node.expect("no gain node"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOUNDING WINDOW
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_clip_is_silent_just_before_its_timecode() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 10.0, 5.0)];

    h.settle(&clips, TransportState::playing_at(9.9));
    assert!(h.factory.voice("rec-1").lock().paused);
}

#[test]
fn test_clip_starts_at_offset_zero_on_its_timecode() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 10.0, 5.0)];

    h.settle(&clips, TransportState::playing_at(10.0));
    let voice = h.factory.voice("rec-1");
    let state = voice.lock();
    assert!(!state.paused);
    assert_eq!(state.position, 0.0);
}

#[test]
fn test_mid_window_entry_seeks_to_the_implied_offset() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 10.0, 5.0)];

    // Jumping straight to 12.5 implies an offset of 2.5 against a voice
    // still at 0: well past the correction threshold.
    h.settle(&clips, TransportState::playing_at(12.5));
    let voice = h.factory.voice("rec-1");
    let state = voice.lock();
    assert!(!state.paused);
    assert_eq!(state.seeks, vec![2.5]);
}

#[test]
fn test_clip_is_paused_at_its_end_boundary() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 10.0, 5.0)];

    // The window is half-open: position == end is outside it.
    h.settle(&clips, TransportState::playing_at(15.0));
    assert!(h.factory.voice("rec-1").lock().paused);
}

#[test]
fn test_nothing_plays_while_transport_is_paused() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 10.0, 5.0)];

    h.settle(&clips, TransportState::paused_at(12.0));
    assert!(h.factory.voice("rec-1").lock().paused);
}

#[test]
fn test_two_clips_hand_over_along_the_timeline() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![
        Recording::new("rec-a", "char-1", 0.0, 3.0),
        Recording::new("rec-b", "char-2", 5.0, 2.0),
    ];

    h.settle(&clips, TransportState::playing_at(1.0));
    assert!(!h.factory.voice("rec-a").lock().paused);
    assert!(h.factory.voice("rec-b").lock().paused);

    let snapshot = EngineSnapshot::new(clips, TransportState::playing_at(6.0));
    h.manager.update(&snapshot);
    assert!(h.factory.voice("rec-a").lock().paused);
    assert!(!h.factory.voice("rec-b").lock().paused);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEEK CORRECTION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_drift_above_threshold_is_corrected() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 10.0)];

    h.settle(&clips, TransportState::playing_at(0.0));
    h.factory.voice("rec-1").lock().position = 2.6;

    let snapshot = EngineSnapshot::new(clips, TransportState::playing_at(2.0));
    h.manager.update(&snapshot);
    assert_eq!(h.factory.voice("rec-1").lock().seeks, vec![2.0]);
}

#[test]
fn test_drift_below_threshold_is_left_alone() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 10.0)];

    h.settle(&clips, TransportState::playing_at(0.0));
    h.factory.voice("rec-1").lock().position = 2.3;

    let snapshot = EngineSnapshot::new(clips, TransportState::playing_at(2.0));
    h.manager.update(&snapshot);
    assert!(h.factory.voice("rec-1").lock().seeks.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOURCE LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_loads_are_single_flight() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 5.0)];

    let snapshot = EngineSnapshot::new(clips, TransportState::paused_at(0.0));
    for _ in 0..5 {
        h.manager.update(&snapshot);
    }
    assert_eq!(h.library.request_count("rec-1"), 1);
    assert_eq!(h.factory.voice_count(), 1);
}

#[test]
fn test_cache_converges_to_the_active_clip_set() {
    let mut h = Harness::new(MockLibrary::default());
    let a = Recording::new("rec-a", "char-1", 0.0, 3.0);
    let b = Recording::new("rec-b", "char-1", 5.0, 2.0);

    h.settle(&[a.clone(), b.clone()], TransportState::paused_at(0.0));
    assert_eq!(
        h.manager.cache().ids(),
        [a.id.clone(), b.id.clone()].into_iter().collect()
    );

    // Removing a clip evicts its resource on the next pass.
    let snapshot = EngineSnapshot::new(vec![a.clone()], TransportState::paused_at(0.0));
    h.manager.update(&snapshot);
    assert_eq!(h.manager.cache().ids(), [a.id].into_iter().collect());
    assert!(h.factory.voice("rec-b").lock().paused);
}

#[test]
fn test_retrieval_failure_stays_silent_and_is_not_retried() {
    let library = MockLibrary::default();
    library.fail_for("rec-1");
    let mut h = Harness::new(library);
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 5.0)];

    h.settle(&clips, TransportState::playing_at(1.0));
    assert_eq!(h.library.request_count("rec-1"), 1);
    assert_eq!(h.factory.voice_count(), 0);
    assert!(h.manager.cache().get(&"rec-1".into()).is_none());
}

#[test]
fn test_stale_reply_after_eviction_is_discarded() {
    let mut h = Harness::new(MockLibrary::deferred());
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 5.0)];

    let snapshot = EngineSnapshot::new(clips, TransportState::paused_at(0.0));
    h.manager.update(&snapshot);
    assert_eq!(h.manager.cache().len(), 1);

    // Clip leaves the timeline while its fetch is still in flight.
    let empty = EngineSnapshot::new(Vec::new(), TransportState::paused_at(0.0));
    h.manager.update(&empty);
    assert!(h.manager.cache().is_empty());

    // The reply lands afterwards and must not resurrect the entry.
    h.library.flush();
    h.manager.update(&empty);
    assert!(h.manager.cache().is_empty());
    assert_eq!(h.factory.voice_count(), 0);
}

#[test]
fn test_voice_reported_duration_wins_over_persisted() {
    let library = MockLibrary::default();
    let mut h = Harness::new(library);
    h.factory.report_duration("rec-1", 2.0);
    // Persisted duration says 5s but the decoded resource is only 2s long.
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 5.0)];

    h.settle(&clips, TransportState::playing_at(3.0));
    assert!(h.factory.voice("rec-1").lock().paused);

    let snapshot = EngineSnapshot::new(clips, TransportState::playing_at(1.0));
    h.manager.update(&snapshot);
    assert!(!h.factory.voice("rec-1").lock().paused);
}

// ═══════════════════════════════════════════════════════════════════════════════
// GAIN COMPOSITION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_muted_character_drives_gain_to_zero() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 5.0)];

    h.settle(&clips, TransportState::playing_at(1.0));
    let mut snapshot = EngineSnapshot::new(clips, TransportState::playing_at(1.0));
    snapshot.muted_characters.insert("char-1".into());
    h.manager.update(&snapshot);

    assert_eq!(h.node_gain("rec-1"), 0.0);
}

#[test]
fn test_gain_composes_master_character_and_clip_volumes() {
    let mut h = Harness::new(MockLibrary::default());
    let mut clip = Recording::new("rec-1", "char-1", 0.0, 5.0);
    clip.volume = 0.8;
    let clips = vec![clip];

    h.settle(&clips, TransportState::playing_at(1.0));
    let mut snapshot = EngineSnapshot::new(clips, TransportState::playing_at(1.0));
    snapshot.master_volume = 0.5;
    snapshot.character_volumes.insert("char-1".into(), 0.5);
    h.manager.update(&snapshot);

    assert!((h.node_gain("rec-1") - 0.2).abs() < 1e-9);
}

#[test]
fn test_live_gain_override_applies_without_persistence() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 5.0)];

    h.settle(&clips, TransportState::playing_at(1.0));
    let mut snapshot = EngineSnapshot::new(clips, TransportState::playing_at(1.0));
    snapshot.gain_overrides.insert("rec-1".into(), -6.0);
    h.manager.update(&snapshot);

    // -6 dB on an otherwise unity chain.
    assert!((h.node_gain("rec-1") - 10f64.powf(-6.0 / 20.0)).abs() < 1e-9);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIVATION POLICY
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_rejected_play_is_retried_on_a_later_pass() {
    let mut h = Harness::new(MockLibrary::default());
    h.factory.reject_play_for("rec-1");
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 5.0)];

    h.settle(&clips, TransportState::playing_at(1.0));
    assert!(h.factory.voice("rec-1").lock().paused);

    // The user gesture arrives; the very next pass succeeds.
    h.factory.voice("rec-1").lock().reject_play = false;
    let snapshot = EngineSnapshot::new(clips, TransportState::playing_at(1.0));
    h.manager.update(&snapshot);
    assert!(!h.factory.voice("rec-1").lock().paused);
}

#[test]
fn test_playback_resumes_the_suspended_output_stage() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 5.0)];

    assert!(h.manager.graph().is_suspended());
    h.settle(&clips, TransportState::playing_at(1.0));
    assert!(!h.manager.graph().is_suspended());
}

#[test]
fn test_decode_error_after_load_tears_the_voice_down() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 5.0)];

    h.settle(&clips, TransportState::playing_at(1.0));
    h.factory.voice("rec-1").lock().error =
        Some(VoError::Decode("truncated stream".into()));

    let snapshot = EngineSnapshot::new(clips, TransportState::playing_at(1.0));
    h.manager.update(&snapshot);
    assert!(h.manager.cache().get(&"rec-1".into()).is_none());
    assert!(h.factory.voice("rec-1").lock().paused);
}

#[test]
fn test_shutdown_releases_everything() {
    let mut h = Harness::new(MockLibrary::default());
    let clips = vec![Recording::new("rec-1", "char-1", 0.0, 5.0)];

    h.settle(&clips, TransportState::playing_at(1.0));
    h.manager.shutdown();
    assert!(h.manager.cache().is_empty());
    assert!(h.manager.graph().is_suspended());
    assert!(h.factory.voice("rec-1").lock().paused);
}

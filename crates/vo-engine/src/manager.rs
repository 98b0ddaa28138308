//! Playback scheduler
//!
//! The reactive core. The host calls [`PlaybackManager::update`] with a
//! fresh [`EngineSnapshot`] whenever transport time, the playing state, the
//! clip list, or any gain input changes. Each pass evaluates every clip
//! against one captured transport snapshot, so no clip ever observes a
//! newer time than another within the same pass.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use vo_core::{CharacterId, Recording, RecordingId, TransportState};

use crate::cache::ResourceCache;
use crate::gain::{GAIN_EPSILON, compose};
use crate::graph::MixerGraph;
use crate::library::MediaLibrary;
use crate::voice::VoiceFactory;

/// Correction threshold for drift between a voice's own position and the
/// offset the transport implies. Below this the voice is left alone so the
/// scheduler does not fight natural playback drift with constant re-seeks.
pub const SEEK_CORRECTION_SECS: f64 = 0.5;

/// Everything the scheduler reads in one reactive pass.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub recordings: Vec<Recording>,
    pub transport: TransportState,
    pub master_volume: f64,
    /// Transient per-session character volume; absent means 1.0.
    pub character_volumes: HashMap<CharacterId, f64>,
    pub muted_characters: HashSet<CharacterId>,
    /// Live gain-trim overrides, keyed by recording; absent means the
    /// persisted `gain_db`.
    pub gain_overrides: HashMap<RecordingId, f64>,
}

impl EngineSnapshot {
    pub fn new(recordings: Vec<Recording>, transport: TransportState) -> Self {
        Self {
            recordings,
            transport,
            master_volume: 1.0,
            character_volumes: HashMap::new(),
            muted_characters: HashSet::new(),
            gain_overrides: HashMap::new(),
        }
    }
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self::new(Vec::new(), TransportState::default())
    }
}

/// Drives every loaded voice from the shared transport clock.
pub struct PlaybackManager {
    cache: ResourceCache,
    graph: Box<dyn MixerGraph>,
    factory: Arc<dyn VoiceFactory>,
    library: Arc<dyn MediaLibrary>,
}

impl PlaybackManager {
    pub fn new(
        graph: Box<dyn MixerGraph>,
        factory: Arc<dyn VoiceFactory>,
        library: Arc<dyn MediaLibrary>,
    ) -> Self {
        Self {
            cache: ResourceCache::new(),
            graph,
            factory,
            library,
        }
    }

    /// One reactive pass.
    ///
    /// Order matters: completions are applied first, then stale entries are
    /// fully evicted before any new clip is considered for loading, so an
    /// id can never be torn down and loaded in the same pass.
    pub fn update(&mut self, snapshot: &EngineSnapshot) {
        let transport = snapshot.transport;

        self.cache
            .drain_completions(self.factory.as_ref(), self.graph.as_mut());

        let active: HashSet<RecordingId> = snapshot
            .recordings
            .iter()
            .map(|r| r.id.clone())
            .collect();
        self.cache.evict_missing(&active, self.graph.as_mut());
        for clip in &snapshot.recordings {
            self.cache.ensure_loaded(clip, self.library.as_ref());
        }
        self.cache.poll_voices(self.graph.as_mut());

        for clip in &snapshot.recordings {
            self.schedule_clip(clip, transport, snapshot);
        }
    }

    fn schedule_clip(
        &mut self,
        clip: &Recording,
        transport: TransportState,
        snapshot: &EngineSnapshot,
    ) {
        let Some(entry) = self.cache.get_mut(&clip.id) else {
            return;
        };
        if !entry.ready {
            return;
        }

        let effective_duration = entry.duration.unwrap_or(clip.duration);
        let start = clip.timecode;
        let in_range = transport.within(start, start + effective_duration);

        if in_range && transport.playing {
            let offset = (transport.position - start).clamp(0.0, effective_duration);
            let drift = entry.voice.position() - offset;
            if drift.abs() > SEEK_CORRECTION_SECS {
                log::debug!(
                    "correcting {:.2}s drift on {} (seek to {:.2})",
                    drift,
                    clip.id,
                    offset
                );
                entry.voice.seek(offset);
            }
            if entry.voice.is_paused() {
                if self.graph.is_suspended() {
                    if let Err(e) = self.graph.resume() {
                        log::warn!("output stage resume refused: {e}");
                    }
                }
                if let Err(e) = entry.voice.play() {
                    // Activation policy rejection; retried on a later pass.
                    log::warn!("playback rejected for {}: {e}", clip.id);
                }
            }
        } else if !entry.voice.is_paused() {
            entry.voice.pause();
        }

        let muted = snapshot.muted_characters.contains(&clip.character_id);
        let character_volume = snapshot
            .character_volumes
            .get(&clip.character_id)
            .copied()
            .unwrap_or(1.0);
        let gain_db = snapshot
            .gain_overrides
            .get(&clip.id)
            .copied()
            .unwrap_or(clip.gain_db);
        let target = compose(
            snapshot.master_volume,
            character_volume,
            muted,
            clip.volume,
            gain_db,
        );
        if let Some(node) = entry.node {
            if (self.graph.gain(node) - target).abs() > GAIN_EPSILON {
                self.graph.set_gain(node, target);
            }
        }
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn graph(&self) -> &dyn MixerGraph {
        self.graph.as_ref()
    }

    /// End the session: pause and release every resource, suspend the
    /// output stage.
    pub fn shutdown(&mut self) {
        self.cache.clear(self.graph.as_mut());
        self.graph.suspend();
    }
}

impl Drop for PlaybackManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

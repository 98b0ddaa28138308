//! Resource cache
//!
//! Owns the set of loaded audio resources keyed by recording id. Loads are
//! asynchronous and single-flight: at most one fetch is ever in flight per
//! id, and replies arriving for ids that have since been evicted are
//! discarded. After one evict + ensure pass the cache's key set equals the
//! active clip id set (modulo loads still settling).

use std::collections::{HashMap, HashSet};

use crossbeam_channel::{Receiver, Sender, unbounded};

use vo_core::{Recording, RecordingId};

use crate::graph::{MixerGraph, NodeId};
use crate::library::{LoadReply, MediaLibrary};
use crate::voice::{AudioVoice, VoiceFactory};

/// One loaded resource: the playable voice plus its gain stage.
pub struct CacheEntry {
    pub voice: Box<dyn AudioVoice>,
    /// Gain node in the mixing graph; `None` when attach failed and the
    /// clip plays unmixed (best effort).
    pub node: Option<NodeId>,
    /// False until the voice can play through without stalling. A clip
    /// without a ready entry is inert, not an error.
    pub ready: bool,
    /// Duration reported by the resource; preferred over the persisted
    /// clip duration once known.
    pub duration: Option<f64>,
}

enum LoadState {
    /// Fetch in flight; nothing playable yet.
    Loading,
    /// Voice constructed; `ready` flips once it can play through.
    Loaded(CacheEntry),
    /// Retrieval or decode failed. The clip stays silent and is not
    /// retried until it leaves and re-enters the active set.
    Failed,
}

pub struct ResourceCache {
    entries: HashMap<RecordingId, LoadState>,
    reply_tx: Sender<LoadReply>,
    reply_rx: Receiver<LoadReply>,
}

impl ResourceCache {
    pub fn new() -> Self {
        let (reply_tx, reply_rx) = unbounded();
        Self {
            entries: HashMap::new(),
            reply_tx,
            reply_rx,
        }
    }

    /// Begin loading a clip's audio unless any state already exists for its
    /// id (single-flight).
    pub fn ensure_loaded(&mut self, clip: &Recording, library: &dyn MediaLibrary) {
        if self.entries.contains_key(&clip.id) {
            return;
        }
        log::debug!("requesting audio payload for {}", clip.id);
        self.entries.insert(clip.id.clone(), LoadState::Loading);
        library.request_audio(clip.id.clone(), self.reply_tx.clone());
    }

    /// Apply queued load replies: build voices, attach gain nodes, record
    /// failures. Returns the number of voices constructed.
    pub fn drain_completions(
        &mut self,
        factory: &dyn VoiceFactory,
        graph: &mut dyn MixerGraph,
    ) -> usize {
        let mut built = 0;
        while let Ok(LoadReply { id, payload }) = self.reply_rx.try_recv() {
            if !matches!(self.entries.get(&id), Some(LoadState::Loading)) {
                // Evicted (or replaced) while the fetch was in flight.
                log::debug!("discarding stale load reply for {id}");
                continue;
            }
            let bytes = match payload {
                Ok(bytes) if !bytes.is_empty() => bytes,
                Ok(_) => {
                    log::warn!("empty audio payload for {id}; clip stays silent");
                    self.entries.insert(id, LoadState::Failed);
                    continue;
                }
                Err(e) => {
                    log::warn!("audio retrieval failed for {id}: {e}");
                    self.entries.insert(id, LoadState::Failed);
                    continue;
                }
            };
            match factory.create_voice(&id, &bytes) {
                Ok(voice) => {
                    let node = match graph.attach(&id) {
                        Ok(node) => Some(node),
                        Err(e) => {
                            log::error!("gain node attach failed for {id}: {e}");
                            None
                        }
                    };
                    let duration = voice.duration();
                    self.entries.insert(
                        id,
                        LoadState::Loaded(CacheEntry {
                            voice,
                            node,
                            ready: false,
                            duration,
                        }),
                    );
                    built += 1;
                }
                Err(e) => {
                    log::error!("audio decode failed for {id}: {e}");
                    self.entries.insert(id, LoadState::Failed);
                }
            }
        }
        built
    }

    /// Tear down every entry whose id is not in the active set: pause the
    /// voice, detach its gain node, drop the entry. Runs before
    /// `ensure_loaded` is applied to the new clip list.
    pub fn evict_missing(&mut self, active: &HashSet<RecordingId>, graph: &mut dyn MixerGraph) {
        let stale: Vec<RecordingId> = self
            .entries
            .keys()
            .filter(|id| !active.contains(*id))
            .cloned()
            .collect();
        for id in stale {
            log::debug!("evicting stale audio for {id}");
            if let Some(LoadState::Loaded(mut entry)) = self.entries.remove(&id) {
                entry.voice.pause();
                if let Some(node) = entry.node {
                    graph.detach(node);
                }
            }
        }
    }

    /// Refresh readiness and duration from each loaded voice, and tear down
    /// voices that surfaced a decode error after load.
    pub fn poll_voices(&mut self, graph: &mut dyn MixerGraph) {
        let mut failed = Vec::new();
        for (id, state) in self.entries.iter_mut() {
            let LoadState::Loaded(entry) = state else {
                continue;
            };
            if let Some(err) = entry.voice.take_error() {
                log::error!("decode failure for {id}: {err}");
                entry.voice.pause();
                if let Some(node) = entry.node.take() {
                    graph.detach(node);
                }
                failed.push(id.clone());
                continue;
            }
            if !entry.ready && entry.voice.is_ready() {
                entry.ready = true;
                if let Some(d) = entry.voice.duration() {
                    entry.duration = Some(d);
                }
                log::debug!("audio ready for {id}, duration {:?}", entry.duration);
            }
        }
        for id in failed {
            self.entries.insert(id, LoadState::Failed);
        }
    }

    pub fn get(&self, id: &RecordingId) -> Option<&CacheEntry> {
        match self.entries.get(id) {
            Some(LoadState::Loaded(entry)) => Some(entry),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: &RecordingId) -> Option<&mut CacheEntry> {
        match self.entries.get_mut(id) {
            Some(LoadState::Loaded(entry)) => Some(entry),
            _ => None,
        }
    }

    /// Every id the cache holds state for, including in-flight and failed
    /// loads.
    pub fn ids(&self) -> HashSet<RecordingId> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Session teardown: pause, detach, and release everything.
    pub fn clear(&mut self, graph: &mut dyn MixerGraph) {
        for (_, state) in self.entries.drain() {
            if let LoadState::Loaded(mut entry) = state {
                entry.voice.pause();
                if let Some(node) = entry.node {
                    graph.detach(node);
                }
            }
        }
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

//! Mixing graph
//!
//! One inline gain stage per loaded resource, summed into a single shared
//! output stage. The output stage is process-wide state with a defined
//! lifecycle: constructed lazily on the first `resume()` (browser-class
//! audio policies forbid activation outside a user gesture) and torn down
//! when the editor session ends.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use vo_core::{RecordingId, VoResult};

/// Identifier of an attached gain node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

/// The mixing graph the scheduler writes gains through.
pub trait MixerGraph {
    /// Attach a gain stage for one resource. Failure is non-fatal: the clip
    /// plays unmixed or stays silent.
    fn attach(&mut self, id: &RecordingId) -> VoResult<NodeId>;

    /// Detach and release a gain stage. Unknown nodes are ignored.
    fn detach(&mut self, node: NodeId);

    fn set_gain(&mut self, node: NodeId, gain: f64);

    fn gain(&self, node: NodeId) -> f64;

    /// Whether the shared output stage is currently suspended.
    fn is_suspended(&self) -> bool;

    /// Resume the output stage, constructing it on first use. Only called
    /// from user-initiated play paths.
    fn resume(&mut self) -> VoResult<()>;

    fn suspend(&mut self);
}

#[derive(Debug)]
struct OutputStage {
    master_gain: f64,
}

#[derive(Debug, Default)]
struct OutputState {
    stage: Option<OutputStage>,
    running: bool,
}

/// Cloneable handle to the shared output stage.
///
/// The host keeps a clone so its gesture handlers can resume the output
/// without reaching into the engine.
#[derive(Clone, Default)]
pub struct OutputHandle {
    state: Arc<Mutex<OutputState>>,
}

impl OutputHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct the stage if needed and mark it running.
    pub fn resume(&self) {
        let mut state = self.state.lock();
        if state.stage.is_none() {
            log::debug!("constructing shared output stage");
            state.stage = Some(OutputStage { master_gain: 1.0 });
        }
        state.running = true;
    }

    pub fn suspend(&self) {
        self.state.lock().running = false;
    }

    /// Release the stage entirely. Session teardown.
    pub fn teardown(&self) {
        let mut state = self.state.lock();
        state.stage = None;
        state.running = false;
    }

    pub fn is_running(&self) -> bool {
        let state = self.state.lock();
        state.running && state.stage.is_some()
    }

    pub fn master_gain(&self) -> f64 {
        self.state
            .lock()
            .stage
            .as_ref()
            .map(|s| s.master_gain)
            .unwrap_or(1.0)
    }

    pub fn set_master_gain(&self, gain: f64) {
        if let Some(stage) = self.state.lock().stage.as_mut() {
            stage.master_gain = gain;
        }
    }
}

struct GainNode {
    recording: RecordingId,
    gain: f64,
}

/// Software summing graph: the engine-owned bookkeeping of every per-clip
/// gain stage plus the shared output handle.
pub struct SummingGraph {
    nodes: HashMap<NodeId, GainNode>,
    next_node: u64,
    output: OutputHandle,
}

impl SummingGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_node: 0,
            output: OutputHandle::new(),
        }
    }

    /// Shared output handle for host-side gesture resume.
    pub fn output_handle(&self) -> OutputHandle {
        self.output.clone()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Recording id a node was attached for, if it is still attached.
    pub fn node_recording(&self, node: NodeId) -> Option<&RecordingId> {
        self.nodes.get(&node).map(|n| &n.recording)
    }
}

impl Default for SummingGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MixerGraph for SummingGraph {
    fn attach(&mut self, id: &RecordingId) -> VoResult<NodeId> {
        let node = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            node,
            GainNode {
                recording: id.clone(),
                gain: 1.0,
            },
        );
        log::debug!("attached gain node {node:?} for {id}");
        Ok(node)
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(n) = self.nodes.remove(&node) {
            log::debug!("detached gain node {node:?} for {}", n.recording);
        }
    }

    fn set_gain(&mut self, node: NodeId, gain: f64) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.gain = gain;
        }
    }

    fn gain(&self, node: NodeId) -> f64 {
        self.nodes.get(&node).map(|n| n.gain).unwrap_or(1.0)
    }

    fn is_suspended(&self) -> bool {
        !self.output.is_running()
    }

    fn resume(&mut self) -> VoResult<()> {
        self.output.resume();
        Ok(())
    }

    fn suspend(&mut self) {
        self.output.suspend();
    }
}

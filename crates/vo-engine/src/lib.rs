//! vo-engine: Multi-track voice-over playback engine
//!
//! Schedules and mixes recorded voice clips against an external transport
//! clock (the host video). The host pushes an [`EngineSnapshot`] on every
//! relevant state change; the engine decides per clip whether it should be
//! sounding, at what offset, and at what gain, and drives the per-clip
//! transport primitives through the [`AudioVoice`] seam.
//!
//! The engine owns no clock, performs no capture, and decodes nothing:
//! decoding and device output live behind the [`VoiceFactory`] and
//! [`MixerGraph`] seams.

mod cache;
mod gain;
mod graph;
mod library;
mod manager;
mod voice;
mod waveform;

pub use cache::*;
pub use gain::*;
pub use graph::*;
pub use library::*;
pub use manager::*;
pub use voice::*;
pub use waveform::*;

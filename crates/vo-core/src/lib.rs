//! vo-core: Shared types for Viover
//!
//! Foundational types used across all Viover crates: recording/character
//! models, the transport snapshot, decibel math, and the error taxonomy.

mod error;
mod gain;
mod model;
mod transport;

pub use error::*;
pub use gain::*;
pub use model::*;
pub use transport::*;

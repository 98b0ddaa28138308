//! Project model snapshots
//!
//! The engine never mutates these in place: the host hands a fresh snapshot
//! to each reactive pass, and edits travel back to the persistence layer as
//! explicit requests.

use serde::{Deserialize, Serialize};

/// Opaque unique key of a recording (one clip on the timeline).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingId(pub String);

impl RecordingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque unique key of a character (one track lane).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CharacterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One recorded clip on the shared timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub id: RecordingId,
    pub character_id: CharacterId,
    pub file_path: String,
    /// Start time on the shared axis, seconds.
    pub timecode: f64,
    /// Length in seconds; authoritative until the decoded resource reports
    /// its own duration.
    pub duration: f64,
    /// Linear volume scalar, UI domain [0, 1].
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Decibel offset on top of `volume`.
    #[serde(default)]
    pub gain_db: f64,
}

impl Recording {
    pub fn new(
        id: impl Into<RecordingId>,
        character_id: impl Into<CharacterId>,
        timecode: f64,
        duration: f64,
    ) -> Self {
        Self {
            id: id.into(),
            character_id: character_id.into(),
            file_path: String::new(),
            timecode,
            duration,
            volume: 1.0,
            gain_db: 0.0,
        }
    }

    /// End of the clip on the shared axis using the persisted duration.
    #[inline]
    pub fn end(&self) -> f64 {
        self.timecode + self.duration
    }
}

impl From<String> for RecordingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<String> for CharacterId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One voice track: a character grouping zero or more recordings.
///
/// Per-session volume and mute are transient engine state, not fields here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    /// Hex color for the track lane and its clips.
    pub color: String,
}

impl Character {
    pub fn new(id: impl Into<CharacterId>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Reference to the project's video file (the transport owner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    pub id: String,
    pub file_name: String,
    pub file_path: String,
}

/// Read-only project snapshot handed to the engine by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub video: Option<VideoRef>,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

fn default_volume() -> f64 {
    1.0
}

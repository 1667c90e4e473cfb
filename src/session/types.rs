// Session snapshot types
// What one poll of the live session looks like: tracks of clip slots

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a clip slot in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipKey {
    pub track_index: usize,
    pub clip_index: usize,
}

impl ClipKey {
    pub fn new(track_index: usize, clip_index: usize) -> Self {
        ClipKey {
            track_index,
            clip_index,
        }
    }
}

impl fmt::Display for ClipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track {} / clip {}", self.track_index, self.clip_index)
    }
}

/// A clip occupying a slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipSnapshot {
    #[serde(default)]
    pub name: Option<String>,
}

impl ClipSnapshot {
    pub fn named(name: impl Into<String>) -> Self {
        ClipSnapshot {
            name: Some(name.into()),
        }
    }

    /// Clip name, with an unnamed clip read as ""
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    #[serde(default)]
    pub name: Option<String>,

    /// Clip slots in order; `None` is an empty slot
    #[serde(default)]
    pub clips: Vec<Option<ClipSnapshot>>,
}

/// Every track and clip slot as seen by one poll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub tracks: Vec<TrackSnapshot>,
}

impl SessionSnapshot {
    /// Build a snapshot from clip names, `None` marking empty slots
    pub fn from_clip_names(tracks: &[&[Option<&str>]]) -> Self {
        SessionSnapshot {
            tracks: tracks
                .iter()
                .map(|slots| TrackSnapshot {
                    name: None,
                    clips: slots
                        .iter()
                        .map(|slot| slot.map(ClipSnapshot::named))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Every occupied slot in track order, then slot order
    pub fn clips(&self) -> impl Iterator<Item = (ClipKey, &ClipSnapshot)> {
        self.tracks.iter().enumerate().flat_map(|(t_idx, track)| {
            track
                .clips
                .iter()
                .enumerate()
                .filter_map(move |(c_idx, slot)| {
                    slot.as_ref().map(|clip| (ClipKey::new(t_idx, c_idx), clip))
                })
        })
    }
}

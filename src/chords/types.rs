// Chord Type Definitions
// Chord shapes and the structured sketch document returned by the generator

use serde::{Deserialize, Serialize};

/// Shape used whenever a line-mode chord yields no usable intervals
pub const DEFAULT_TRIAD: [i32; 3] = [0, 4, 7];

pub const DEFAULT_TEMPO_BPM: f64 = 90.0;

/// Middle C
pub const DEFAULT_BASE_NOTE: i32 = 60;

pub const DEFAULT_VELOCITY: i32 = 100;

pub const DEFAULT_DURATION_BEATS: f64 = 1.0;

/// A single chord: semitone offsets from a root plus how it is played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChordSpec {
    /// Signed semitone offsets from the chord root, in voicing order
    pub intervals: Vec<i32>,

    /// Length of the chord in beats
    pub duration_beats: f64,

    /// Note-on velocity, expected in [0, 127]
    pub velocity: i32,
}

impl Default for ChordSpec {
    fn default() -> Self {
        ChordSpec {
            intervals: Vec::new(),
            duration_beats: DEFAULT_DURATION_BEATS,
            velocity: DEFAULT_VELOCITY,
        }
    }
}

impl ChordSpec {
    /// Chord with the given intervals and default duration/velocity
    pub fn new(intervals: Vec<i32>) -> Self {
        ChordSpec {
            intervals,
            ..Default::default()
        }
    }

    pub fn major_triad() -> Self {
        Self::new(DEFAULT_TRIAD.to_vec())
    }

    /// A chord with no intervals sounds nothing
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Structured sketch returned by the generator in JSON mode
///
/// Every field is optional in the source document; missing fields take the
/// defaults above, so `SketchSpec::default()` is the "nothing usable" value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchSpec {
    pub tempo_bpm: f64,
    pub base_note: i32,
    pub chords: Vec<ChordSpec>,
}

impl Default for SketchSpec {
    fn default() -> Self {
        SketchSpec {
            tempo_bpm: DEFAULT_TEMPO_BPM,
            base_note: DEFAULT_BASE_NOTE,
            chords: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_defaults() {
        let chord = ChordSpec::default();
        assert!(chord.is_empty());
        assert_eq!(chord.duration_beats, 1.0);
        assert_eq!(chord.velocity, 100);
    }

    #[test]
    fn test_major_triad() {
        let chord = ChordSpec::major_triad();
        assert_eq!(chord.intervals, vec![0, 4, 7]);
        assert!(!chord.is_empty());
    }

    #[test]
    fn test_sketch_defaults() {
        let sketch = SketchSpec::default();
        assert_eq!(sketch.tempo_bpm, 90.0);
        assert_eq!(sketch.base_note, 60);
        assert!(sketch.chords.is_empty());
    }
}

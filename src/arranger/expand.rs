// Arrangement Expander - Fill a fixed number of chord slots
// Finite root and chord lists are repeated cyclically until every slot is filled

use crate::chords::{find_unknown_root, pitch_class_offset, ChordSpec};

use super::grid::{total_slots, Subdivision, TimeSignature, ValidationError};

/// One filled slot of an arrangement
#[derive(Debug, Clone, PartialEq)]
pub struct ChordSlot<'a> {
    /// Root as given by the caller
    pub root: &'a str,

    /// Semitones above C
    pub pitch_class: u8,

    pub chord: &'a ChordSpec,
}

/// A validated chord arrangement for the fixed-grid compiler
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub time_signature: TimeSignature,
    pub subdivision: Subdivision,
    pub bars: u32,
    pub roots: Vec<String>,
    pub chords: Vec<ChordSpec>,
    total_slots: usize,
}

impl Arrangement {
    /// Build an arrangement, rejecting anything the compiler could not use
    ///
    /// All checks happen here so that no MIDI work starts on bad input.
    pub fn new(
        time_signature: TimeSignature,
        subdivision: Subdivision,
        bars: u32,
        roots: Vec<String>,
        chords: Vec<ChordSpec>,
    ) -> Result<Self, ValidationError> {
        let total_slots = validate_layout(time_signature, subdivision, bars, &roots)?;
        if chords.is_empty() {
            return Err(ValidationError::NoChords);
        }

        Ok(Arrangement {
            time_signature,
            subdivision,
            bars,
            roots,
            chords,
            total_slots,
        })
    }

    pub fn total_slots(&self) -> usize {
        self.total_slots
    }

    /// Roots repeated to exactly `total_slots` entries
    pub fn expanded_roots(&self) -> Vec<&str> {
        expand_cyclic(&self.roots, self.total_slots)
            .into_iter()
            .map(String::as_str)
            .collect()
    }

    /// Chord shapes repeated to exactly `total_slots` entries
    pub fn expanded_chords(&self) -> Vec<&ChordSpec> {
        expand_cyclic(&self.chords, self.total_slots)
    }

    /// Every slot in playback order
    pub fn slots(&self) -> Vec<ChordSlot<'_>> {
        self.expanded_roots()
            .into_iter()
            .zip(self.expanded_chords())
            .map(|(root, chord)| ChordSlot {
                root,
                // Roots were checked in `new`
                pitch_class: pitch_class_offset(root).unwrap_or(0),
                chord,
            })
            .collect()
    }
}

/// Validate everything about an arrangement except its chord shapes
///
/// Returns the slot count. Used on its own by callers that must fail before
/// the chord shapes exist (e.g. before asking the generator for them).
pub fn validate_layout<S: AsRef<str>>(
    time_signature: TimeSignature,
    subdivision: Subdivision,
    bars: u32,
    roots: &[S],
) -> Result<usize, ValidationError> {
    let slots = total_slots(time_signature, subdivision, bars)?;
    if roots.is_empty() {
        return Err(ValidationError::NoRoots);
    }
    if let Some(unknown) = find_unknown_root(roots) {
        return Err(ValidationError::UnknownRoot(unknown.to_string()));
    }
    Ok(slots)
}

/// `result[i] = items[i % items.len()]` for `i` in `0..total`
///
/// An empty source yields an empty result.
pub fn expand_cyclic<T>(items: &[T], total: usize) -> Vec<&T> {
    if items.is_empty() {
        return Vec::new();
    }
    items.iter().cycle().take(total).collect()
}

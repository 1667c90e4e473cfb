// MIDI Event Compiler - Chords to timed note events
// Fixed-grid mode for arrangements, tempo-aware mode for generated sketches
//
// Both modes share one emission rule per chord: every note-on at zero delta,
// then every note-off, the first carrying the chord's full length and the
// rest zero (simultaneous attack, simultaneous release).

use thiserror::Error;

use crate::chords::{ChordSpec, SketchSpec, DEFAULT_TRIAD};

use super::expand::Arrangement;
use super::grid::TimeSignature;

/// Fixed-grid roots are anchored here
pub const MIDDLE_C: i32 = 60;

/// Largest delta a MIDI variable-length quantity can hold (28 bits)
const MAX_DELTA_TICKS: f64 = 0x0FFF_FFFF as f64;

/// Largest tempo a set-tempo meta event can hold (24 bits)
const MAX_TEMPO_US: f64 = 0x00FF_FFFF as f64;

/// A chord cannot be expressed as MIDI
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("pitch {0} is outside the MIDI range 0-127")]
    PitchOutOfRange(i64),

    #[error("velocity {0} is outside the MIDI range 0-127")]
    VelocityOutOfRange(i32),

    #[error("chord duration of {0} beats is not a positive length")]
    InvalidDuration(f64),

    #[error("tempo of {0} BPM cannot be written as a MIDI tempo")]
    InvalidTempo(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn,
    NoteOff,
}

/// A note event with its delta from the previous event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub kind: EventKind,
    pub pitch: u8,
    pub velocity: u8,
    pub delta_ticks: u32,
}

impl TimedEvent {
    pub fn note_on(pitch: u8, velocity: u8) -> Self {
        TimedEvent {
            kind: EventKind::NoteOn,
            pitch,
            velocity,
            delta_ticks: 0,
        }
    }

    pub fn note_off(pitch: u8, delta_ticks: u32) -> Self {
        TimedEvent {
            kind: EventKind::NoteOff,
            pitch,
            velocity: 0,
            delta_ticks,
        }
    }
}

/// Compiled single-track content, ready for the file writer
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTrack {
    /// Microseconds per beat for the leading tempo event, if any
    pub tempo_us_per_beat: Option<u32>,

    /// Time signature for the leading meta event, if any
    pub time_signature: Option<TimeSignature>,

    /// Note events in playback order
    pub events: Vec<TimedEvent>,
}

impl CompiledTrack {
    /// Count of (note-on, note-off) events
    pub fn note_counts(&self) -> (usize, usize) {
        let on = self
            .events
            .iter()
            .filter(|e| e.kind == EventKind::NoteOn)
            .count();
        (on, self.events.len() - on)
    }

    /// Total length in ticks
    pub fn length_ticks(&self) -> u64 {
        self.events.iter().map(|e| e.delta_ticks as u64).sum()
    }
}

/// Compile an arrangement with every slot the same length
///
/// Pitch is `60 + pitch_class(root) + interval`, velocity 100 from the chord.
/// An empty chord shape plays the default major triad.
pub fn compile_fixed_grid(
    arrangement: &Arrangement,
    ticks_per_beat: u16,
) -> Result<CompiledTrack, CompileError> {
    let note_length_ticks = arrangement.subdivision.ticks_per_slot(ticks_per_beat);
    let mut events = Vec::with_capacity(arrangement.total_slots() * 2 * DEFAULT_TRIAD.len());

    for slot in arrangement.slots() {
        let root = MIDDLE_C + slot.pitch_class as i32;
        let intervals: &[i32] = if slot.chord.is_empty() {
            &DEFAULT_TRIAD
        } else {
            &slot.chord.intervals
        };

        let pitches = chord_pitches(root, intervals)?;
        let velocity = midi_velocity(slot.chord.velocity)?;
        push_chord(&mut events, &pitches, velocity, note_length_ticks);
    }

    Ok(CompiledTrack {
        tempo_us_per_beat: None,
        time_signature: Some(arrangement.time_signature),
        events,
    })
}

/// Compile a generated sketch, honoring its tempo and per-chord durations
///
/// Pitch is `base_note + interval`. A chord with no intervals contributes no
/// events at all.
pub fn compile_sketch(
    sketch: &SketchSpec,
    ticks_per_beat: u16,
) -> Result<CompiledTrack, CompileError> {
    let tempo = tempo_from_bpm(sketch.tempo_bpm)?;
    let mut events = Vec::new();

    for chord in &sketch.chords {
        if chord.is_empty() {
            log::debug!("Skipping chord with no intervals");
            continue;
        }

        let duration_ticks = duration_ticks(chord, ticks_per_beat)?;
        let pitches = chord_pitches(sketch.base_note, &chord.intervals)?;
        let velocity = midi_velocity(chord.velocity)?;
        push_chord(&mut events, &pitches, velocity, duration_ticks);
    }

    Ok(CompiledTrack {
        tempo_us_per_beat: Some(tempo),
        time_signature: None,
        events,
    })
}

/// Microseconds per beat: 60,000,000 / bpm, rounded
pub fn tempo_from_bpm(bpm: f64) -> Result<u32, CompileError> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(CompileError::InvalidTempo(bpm));
    }
    let us_per_beat = (60_000_000.0 / bpm).round();
    if us_per_beat < 1.0 || us_per_beat > MAX_TEMPO_US {
        return Err(CompileError::InvalidTempo(bpm));
    }
    Ok(us_per_beat as u32)
}

/// round(ticks_per_beat * duration_beats)
pub fn duration_ticks(chord: &ChordSpec, ticks_per_beat: u16) -> Result<u32, CompileError> {
    let beats = chord.duration_beats;
    if !beats.is_finite() || beats <= 0.0 {
        return Err(CompileError::InvalidDuration(beats));
    }
    let ticks = (ticks_per_beat as f64 * beats).round();
    if ticks > MAX_DELTA_TICKS {
        return Err(CompileError::InvalidDuration(beats));
    }
    Ok(ticks as u32)
}

fn chord_pitches(root: i32, intervals: &[i32]) -> Result<Vec<u8>, CompileError> {
    intervals
        .iter()
        .map(|&interval| {
            let pitch = root as i64 + interval as i64;
            u8::try_from(pitch)
                .ok()
                .filter(|p| *p <= 127)
                .ok_or(CompileError::PitchOutOfRange(pitch))
        })
        .collect()
}

fn midi_velocity(velocity: i32) -> Result<u8, CompileError> {
    u8::try_from(velocity)
        .ok()
        .filter(|v| *v <= 127)
        .ok_or(CompileError::VelocityOutOfRange(velocity))
}

fn push_chord(events: &mut Vec<TimedEvent>, pitches: &[u8], velocity: u8, length_ticks: u32) {
    for &pitch in pitches {
        events.push(TimedEvent::note_on(pitch, velocity));
    }

    let mut delta = length_ticks;
    for &pitch in pitches {
        events.push(TimedEvent::note_off(pitch, delta));
        delta = 0;
    }
}

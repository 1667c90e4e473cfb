// Arranger - Chord grids, cyclic expansion, and MIDI compilation
// Turns roots and chord shapes (or generated sketches) into MIDI files

pub mod compile;
pub mod expand;
pub mod grid;
pub mod midi;

// Re-export main types
pub use compile::{
    compile_fixed_grid, compile_sketch, tempo_from_bpm, CompileError, CompiledTrack, EventKind,
    TimedEvent, MIDDLE_C,
};
pub use expand::{expand_cyclic, validate_layout, Arrangement, ChordSlot};
pub use grid::{total_slots, Subdivision, TimeSignature, ValidationError, MAX_TOTAL_SLOTS};
pub use midi::{export_midi, write_midi_file, MidiError, MidiExportOptions};

// Chordwatch - Chord sketches to MIDI, driven by clip renames in a live session
// Module declarations

pub mod arranger;
pub mod chords;
pub mod commands;
pub mod config;
pub mod generator;
pub mod pipeline;
pub mod session;

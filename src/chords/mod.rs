// Chords - Chord shapes, pitch classes and generator-output parsing

pub mod notes;
pub mod parse;
pub mod types;

pub use notes::{find_unknown_root, pitch_class_offset, PITCH_CLASS_NAMES};
pub use parse::{parse_simple, parse_simple_line, parse_structured, ParseFailure};
pub use types::{ChordSpec, SketchSpec, DEFAULT_TRIAD};

// Progression Generator - Roots plus a vibe in, fixed-grid chord MIDI out
// validate -> generator (line mode) -> cyclic expansion -> fixed-grid compile -> file

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::arranger::{
    compile_fixed_grid, validate_layout, write_midi_file, Arrangement, CompileError, MidiError,
    MidiExportOptions, Subdivision, TimeSignature, ValidationError,
};
use crate::chords::{parse_simple, ChordSpec};
use crate::generator::{request_nonce, voicing_prompt, GenerationError, Generator};

use super::naming::progression_filename;

#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error("Invalid progression request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Progression could not be compiled: {0}")]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Midi(#[from] MidiError),
}

/// Parameters for one progression file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionRequest {
    pub time_signature: TimeSignature,

    /// Slot length as a note value: one of 1, 2, 4, 8, 16
    pub subdivision: u32,

    /// Chord roots, cycled across the slots
    pub roots: Vec<String>,

    /// Free-text style description passed to the generator
    pub vibe: String,

    pub bars: u32,

    /// Output path; defaults to a name derived from the parameters
    pub filename: Option<PathBuf>,
}

impl ProgressionRequest {
    pub fn new(roots: Vec<String>, vibe: impl Into<String>) -> Self {
        ProgressionRequest {
            time_signature: TimeSignature::common(),
            subdivision: 4,
            roots,
            vibe: vibe.into(),
            bars: 4,
            filename: None,
        }
    }

    /// Check every parameter, returning the slot length and slot count
    pub fn validate(&self) -> Result<(Subdivision, usize), ValidationError> {
        let subdivision = Subdivision::try_from(self.subdivision)?;
        let slots = validate_layout(self.time_signature, subdivision, self.bars, &self.roots)?;
        Ok((subdivision, slots))
    }

    /// Where the file will be written when placed under `output_dir`
    pub fn output_path(&self, subdivision: Subdivision, output_dir: &Path) -> PathBuf {
        match &self.filename {
            Some(filename) => filename.clone(),
            None => output_dir.join(progression_filename(
                self.time_signature,
                subdivision,
                self.bars,
                &self.roots,
                &self.vibe,
            )),
        }
    }
}

/// Generate chord voicings for `request` and write them as a MIDI file
///
/// The request is validated before the generator runs, so a bad root or
/// subdivision never costs a generator call or leaves a file behind.
pub fn generate_progression<G: Generator + ?Sized>(
    request: &ProgressionRequest,
    generator: &G,
    output_dir: &Path,
    ticks_per_beat: u16,
) -> Result<PathBuf, ProgressionError> {
    let (subdivision, slots) = request.validate()?;

    log::info!(
        "Composing {} bar(s) in {} at 1/{} ({} chords), roots {} | vibe: {}",
        request.bars,
        request.time_signature,
        subdivision.value(),
        slots,
        request.roots.join(", "),
        request.vibe
    );

    let prompt = voicing_prompt(&request.vibe, &request.roots, &request_nonce());
    let output = generator.generate(&prompt)?;

    let mut chords = parse_simple(&output);
    if chords.is_empty() {
        log::warn!("Generator returned no voicings, using a major triad");
        chords.push(ChordSpec::major_triad());
    }
    log::debug!("Generator returned {} voicing(s)", chords.len());

    let arrangement = Arrangement::new(
        request.time_signature,
        subdivision,
        request.bars,
        request.roots.clone(),
        chords,
    )?;
    let compiled = compile_fixed_grid(&arrangement, ticks_per_beat)?;

    let path = request.output_path(subdivision, output_dir);
    write_midi_file(&compiled, &MidiExportOptions::with_ppq(ticks_per_beat), &path)?;

    log::info!("MIDI file saved as {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::{MidiMessage, Smf, TrackEventKind};
    use std::cell::Cell;
    use tempfile::TempDir;

    struct Voicings {
        reply: &'static str,
        calls: Cell<usize>,
    }

    impl Voicings {
        fn new(reply: &'static str) -> Self {
            Voicings {
                reply,
                calls: Cell::new(0),
            }
        }
    }

    impl Generator for Voicings {
        fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.reply.to_string())
        }
    }

    fn request(roots: &[&str]) -> ProgressionRequest {
        ProgressionRequest::new(roots.iter().map(|s| s.to_string()).collect(), "dreamy lofi")
    }

    fn note_ons(bytes: &[u8]) -> Vec<u8> {
        let smf = Smf::parse(bytes).unwrap();
        smf.tracks[0]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => Some(u8::from(key)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_progression_writes_default_named_file() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Voicings::new("[0, 4, 7]\n[0, 3, 7]\n");

        let path = generate_progression(&request(&["C", "A"]), &generator, temp_dir.path(), 480)
            .unwrap();

        assert_eq!(
            path,
            temp_dir
                .path()
                .join("chordprog_4-4_div4_bars4_roots_C-A_dreamy-lofi.mid")
        );

        // 16 slots; roots alternate C/A and shapes alternate major/minor
        let notes = note_ons(&std::fs::read(&path).unwrap());
        assert_eq!(notes.len(), 16 * 3);
        assert_eq!(&notes[..6], &[60, 64, 67, 69, 72, 76]);
    }

    #[test]
    fn test_progression_explicit_filename() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("mine.mid");
        let mut req = request(&["G"]);
        req.filename = Some(target.clone());
        req.bars = 1;

        let path = generate_progression(&req, &Voicings::new("[0, 4, 7, 10]"), temp_dir.path(), 480)
            .unwrap();
        assert_eq!(path, target);
        assert_eq!(note_ons(&std::fs::read(&path).unwrap()).len(), 4 * 4);
    }

    #[test]
    fn test_garbage_lines_still_sound() {
        let temp_dir = TempDir::new().unwrap();
        let mut req = request(&["C"]);
        req.bars = 1;

        let path =
            generate_progression(&req, &Voicings::new("Here you go:"), temp_dir.path(), 480).unwrap();
        let notes = note_ons(&std::fs::read(&path).unwrap());
        assert_eq!(&notes[..3], &[60, 64, 67]);
    }

    #[test]
    fn test_empty_reply_uses_triad() {
        let temp_dir = TempDir::new().unwrap();
        let mut req = request(&["D"]);
        req.bars = 1;

        let path = generate_progression(&req, &Voicings::new(""), temp_dir.path(), 480).unwrap();
        assert_eq!(note_ons(&std::fs::read(&path).unwrap()).len(), 4 * 3);
    }

    #[test]
    fn test_unknown_root_fails_before_generation() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Voicings::new("[0, 4, 7]");

        let result = generate_progression(&request(&["C", "H"]), &generator, temp_dir.path(), 480);

        assert!(matches!(
            result,
            Err(ProgressionError::Validation(ValidationError::UnknownRoot(ref r))) if r == "H"
        ));
        assert_eq!(generator.calls.get(), 0);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_subdivision_and_bars() {
        let mut req = request(&["C"]);
        req.subdivision = 3;
        assert_eq!(req.validate(), Err(ValidationError::InvalidSubdivision(3)));

        let mut req = request(&["C"]);
        req.bars = 0;
        assert_eq!(req.validate(), Err(ValidationError::InvalidBars(0)));
    }

    #[test]
    fn test_huge_bar_count_fails_before_generation() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Voicings::new("[0, 4, 7]");
        let mut req = request(&["C"]);
        req.bars = 4_000_000_000;

        let result = generate_progression(&req, &generator, temp_dir.path(), 480);

        assert!(matches!(
            result,
            Err(ProgressionError::Validation(ValidationError::TooManySlots { .. }))
        ));
        assert_eq!(generator.calls.get(), 0);
    }

    #[test]
    fn test_fractional_slots_rejected() {
        let mut req = request(&["C"]);
        req.time_signature = TimeSignature::new(3, 4);
        req.subdivision = 1;
        req.bars = 1;
        assert!(matches!(
            req.validate(),
            Err(ValidationError::FractionalSlots { .. })
        ));
    }
}

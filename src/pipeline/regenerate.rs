// Regeneration Orchestrator - Clip name in, fresh MIDI sketch out
// prompt -> generator -> JSON parse -> tempo-aware compile -> file

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::arranger::{compile_sketch, write_midi_file, CompileError, MidiError, MidiExportOptions};
use crate::chords::{parse_structured, SketchSpec};
use crate::generator::{request_nonce, sanitize_for_prompt, sketch_prompt, GenerationError, Generator};
use crate::session::{ClipKey, RenameHandler};

use super::naming::regen_filename;

/// Result of a regeneration that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenOutcome {
    /// A new MIDI file was written
    Written(PathBuf),

    /// The generator produced no chords; nothing was written
    NoChords,
}

/// A single regeneration attempt failed
#[derive(Debug, Error)]
pub enum RegenError {
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Sketch could not be compiled: {0}")]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Midi(#[from] MidiError),
}

/// Produces a new MIDI sketch for a clip name
pub struct Regenerator<G> {
    generator: G,
    output_dir: PathBuf,
    options: MidiExportOptions,
}

impl<G: Generator> Regenerator<G> {
    pub fn new(generator: G, output_dir: impl Into<PathBuf>) -> Self {
        Regenerator {
            generator,
            output_dir: output_dir.into(),
            options: MidiExportOptions::default(),
        }
    }

    pub fn with_ticks_per_beat(mut self, ticks_per_beat: u16) -> Self {
        self.options.ppq = ticks_per_beat;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Ask the generator for a sketch named after `clip_name` and write it
    ///
    /// Unparseable generator output is logged and treated like an empty
    /// sketch, which yields `RegenOutcome::NoChords` rather than an error.
    pub fn regenerate(&self, clip_name: &str) -> Result<RegenOutcome, RegenError> {
        let prompt = sketch_prompt(&sanitize_for_prompt(clip_name), &request_nonce());

        log::info!("Asking generator to compose for '{}'", clip_name);
        let output = self.generator.generate(&prompt)?;

        let sketch = parse_structured(&output).unwrap_or_else(|e| {
            log::warn!("{}", e);
            SketchSpec::default()
        });

        if sketch.chords.is_empty() {
            return Ok(RegenOutcome::NoChords);
        }

        let compiled = compile_sketch(&sketch, self.options.ppq)?;
        let path = self.output_dir.join(regen_filename(clip_name));
        write_midi_file(&compiled, &self.options, &path)?;

        log::debug!(
            "Wrote {} chord(s) at {} BPM to {}",
            sketch.chords.len(),
            sketch.tempo_bpm,
            path.display()
        );
        Ok(RegenOutcome::Written(path))
    }
}

impl<G: Generator> RenameHandler for Regenerator<G> {
    fn on_rename(&mut self, _key: ClipKey, new_name: &str) -> Result<RegenOutcome, RegenError> {
        self.regenerate(new_name)
    }
}
